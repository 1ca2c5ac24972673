//! Bundle assembly: ordered full-file list, excerpts, and the rendered
//! context pack artifact.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::dependencies::Dependencies;
use crate::error::Error;
use crate::excerpt;
use crate::grammar;
use crate::resolver::repo_relative;
use crate::scanner::read_text;
use crate::types::{Excerpt, Target};

/// Everything discovered for one target, ready to render.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    /// Same-topic documentation dumped whole.
    pub direct_docs: Vec<String>,
    /// Excerpts from documentation not in `full_files`.
    pub excerpts: Vec<Excerpt>,
    /// External URLs referenced by the target.
    pub external: Vec<String>,
    /// Files dumped whole: target, dependencies, incoming refs, direct docs.
    /// Unique by lowercased path, first occurrence wins.
    pub full_files: Vec<String>,
    /// Code files that reference the target.
    pub incoming: Vec<String>,
    /// Resolved local dependencies of the target.
    pub local: Vec<String>,
    /// Lowercased `full_files`, for identity checks.
    seen: HashSet<String>,
}

/// Run metadata printed in the artifact header.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Timestamp for the `Generated:` line.
    pub generated_at: DateTime<Utc>,
    /// Absolute artifact path.
    pub output_path: &'a Path,
    /// Canonical repository root.
    pub root: &'a Path,
    /// The page the bundle is about.
    pub target: &'a Target,
}

impl Bundle {
    /// Order the full-file list: target, dependencies, incoming references,
    /// direct docs. A path seen earlier (ignoring case) is not added again.
    pub fn new(target_rel: &str, deps: Dependencies, incoming: Vec<String>, direct_docs: Vec<String>) -> Self {
        let mut bundle = Self {
            direct_docs,
            external: deps.external,
            incoming,
            local: deps.local,
            ..Self::default()
        };

        bundle.add_full_file(target_rel);
        let discovered: Vec<String> = bundle
            .local
            .iter()
            .chain(bundle.incoming.iter())
            .chain(bundle.direct_docs.iter())
            .cloned()
            .collect();
        for rel_path in &discovered {
            bundle.add_full_file(rel_path);
        }
        return bundle;
    }

    /// Attach excerpts, dropping any whose file is already dumped whole.
    pub fn attach_excerpts(&mut self, excerpts: Vec<Excerpt>) {
        let kept: Vec<Excerpt> = excerpts.into_iter().filter(|e| return !self.is_full_file(&e.rel_path)).collect();
        self.excerpts = kept;
        return;
    }

    /// Lowercased full-file paths, used to skip them while excerpting.
    pub fn excluded_keys(&self) -> HashSet<String> {
        return self.seen.clone();
    }

    /// Whether `rel_path` is dumped whole, ignoring case.
    pub fn is_full_file(&self, rel_path: &str) -> bool {
        return self.seen.contains(&rel_path.to_lowercase());
    }

    /// Append a full-file path unless its lowercased form is already present.
    fn add_full_file(&mut self, rel_path: &str) {
        if self.seen.insert(rel_path.to_lowercase()) {
            self.full_files.push(rel_path.to_string());
        }
        return;
    }
}

/// Prefix each line with its right-aligned number, starting at `start_line`.
pub fn numbered_content(text: &str, start_line: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for (offset, line) in excerpt::split_lines(text).into_iter().enumerate() {
        if offset > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:4}: {line}", start_line.saturating_add(offset));
    }
    return out;
}

/// Render the full artifact text. Trailing whitespace is trimmed and a single
/// newline appended.
///
/// # Errors
///
/// Returns `Error::Io` if a full file that still exists cannot be read.
pub fn render(bundle: &Bundle, ctx: &RenderContext<'_>) -> Result<String, Error> {
    let mut lines: Vec<String> = Vec::new();
    push_header(&mut lines, bundle, ctx);
    push_manifest(&mut lines, bundle);

    lines.push("## Full File Dumps".to_string());
    lines.push(String::new());
    for rel_path in &bundle.full_files {
        push_full_file(&mut lines, ctx.root, rel_path)?;
    }

    lines.push("## Referenced Text Excerpts".to_string());
    lines.push(String::new());
    if bundle.excerpts.is_empty() {
        lines.push("No additional text excerpts were needed.".to_string());
        lines.push(String::new());
    }
    for excerpt in &bundle.excerpts {
        push_excerpt(&mut lines, excerpt);
    }

    let mut text = lines.join("\n").trim_end().to_string();
    text.push('\n');
    return Ok(text);
}

/// Title, description, run metadata, and discovery counts.
fn push_header(lines: &mut Vec<String>, bundle: &Bundle, ctx: &RenderContext<'_>) {
    let generated = ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC");
    let output_rel = repo_relative(ctx.output_path, ctx.root);

    lines.extend([
        format!("# LLM Context Pack: {}", ctx.target.title),
        String::new(),
        "This generated file is designed as a context bundle for LLM prompts.".to_string(),
        "It contains full source text for files directly associated with the tool, \
         plus extracted sections from broader docs that reference the tool."
            .to_string(),
        "Every included block is wrapped with explicit BEGIN/END markers for reliable chunking.".to_string(),
        String::new(),
        format!("Generated: {generated}"),
        format!("Repository: `{}`", ctx.root.display()),
        format!("Tool slug: `{}`", ctx.target.slug),
        format!("Tool page: `{}`", ctx.target.rel_path),
        format!("Output file: `{output_rel}`"),
        String::new(),
        "## Discovery Summary".to_string(),
        format!("- Full files included: {}", bundle.full_files.len()),
        format!("- Direct local dependencies: {}", bundle.local.len()),
        format!("- Incoming code references: {}", bundle.incoming.len()),
        format!("- Direct tool docs (full): {}", bundle.direct_docs.len()),
        format!("- Cross-file text excerpts: {}", bundle.excerpts.len()),
        format!("- External dependencies in tool page: {}", bundle.external.len()),
        String::new(),
    ]);
    return;
}

/// One excerpt block with numbering that starts at its first line.
fn push_excerpt(lines: &mut Vec<String>, excerpt: &Excerpt) {
    let marker = format!(
        "{} | {} (lines {}-{})",
        excerpt.rel_path, excerpt.label, excerpt.start_line, excerpt.end_line
    );
    lines.push(format!("----- BEGIN EXCERPT: {marker} -----"));
    lines.push("```text".to_string());
    lines.push(numbered_content(&excerpt.content, excerpt.start_line));
    lines.push("```".to_string());
    lines.push(format!("----- END EXCERPT: {marker} -----"));
    lines.push(String::new());
    return;
}

/// One full-file block, or a placeholder if the file vanished since discovery.
///
/// # Errors
///
/// Returns `Error::Io` if the file exists but cannot be read.
fn push_full_file(lines: &mut Vec<String>, root: &Path, rel_path: &str) -> Result<(), Error> {
    let path = root.join(rel_path);
    lines.push(format!("----- BEGIN FILE: {rel_path} -----"));
    if path.exists() {
        let text = read_text(&path)?;
        lines.push(format!("```{}", grammar::language_tag(&path)));
        lines.push(numbered_content(&text, 1));
        lines.push("```".to_string());
    } else {
        lines.push("Missing at dump time.".to_string());
    }
    lines.push(format!("----- END FILE: {rel_path} -----"));
    lines.push(String::new());
    return Ok(());
}

/// Included files and external dependencies.
fn push_manifest(lines: &mut Vec<String>, bundle: &Bundle) {
    lines.push("## Included Full Files".to_string());
    lines.extend(bundle.full_files.iter().map(|rel| return format!("- `{rel}`")));
    lines.push(String::new());

    lines.push("## External Dependencies".to_string());
    if bundle.external.is_empty() {
        lines.push("- None detected".to_string());
    }
    lines.extend(bundle.external.iter().map(|dep| return format!("- `{dep}`")));
    lines.push(String::new());
    return;
}
