//! Context pack generation: resolve the run inputs, discover, render, write.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::bundle::{self, Bundle, RenderContext};
use crate::config::Config;
use crate::dependencies;
use crate::error::Error;
use crate::patterns::{self, ReferencePatternSet};
use crate::resolver::{normalize_path, relative_to_slash, repo_relative};
use crate::scanner;
use crate::types::Target;

/// How the run summary is printed on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryFormat {
    /// Pretty-printed JSON object.
    Json,
    /// Three human-readable lines.
    Text,
}

/// Resolved inputs for one generation run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Absolute artifact path.
    pub output_path: PathBuf,
    /// Canonical repository root.
    pub root: PathBuf,
    /// Normalized tool identifier.
    pub slug: String,
    /// Target page path relative to the root.
    pub target_relative: PathBuf,
}

/// Raw run inputs as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// `--context-lines` override.
    pub context_lines: Option<usize>,
    /// `--max-sections-per-file` override.
    pub max_sections_per_file: Option<usize>,
    /// `--output` path.
    pub output: Option<PathBuf>,
    /// `--repo-root` path.
    pub repo_root: Option<PathBuf>,
    /// `--target` page path.
    pub target: Option<PathBuf>,
    /// `--tool` identifier or page name.
    pub tool: Option<String>,
}

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Same-topic docs dumped whole.
    pub direct_docs: usize,
    /// Excerpt blocks rendered.
    pub excerpts: usize,
    /// External URLs referenced by the target.
    pub external_dependencies: usize,
    /// Files dumped whole, after deduplication.
    pub full_files: usize,
    /// Code files referencing the target.
    pub incoming_refs: usize,
    /// Resolved local dependencies.
    pub local_dependencies: usize,
    /// Where the artifact was written, lossily decoded.
    pub output_path: String,
    /// Repository-relative target path.
    pub target: String,
}

/// Discover, render, and write the context pack described by `plan`.
///
/// # Errors
///
/// Returns `Error::TargetNotFound` or `Error::TargetOutsideRoot` before any
/// walk, and `Error::Io`/`Error::Walk` for filesystem failures after that.
#[instrument(skip_all, fields(target = %plan.target_relative.display(), slug = %plan.slug))]
pub fn generate(plan: &RunPlan, config: &Config, generated_at: DateTime<Utc>) -> Result<Summary, Error> {
    let root = plan.root.as_path();
    let target = load_target(root, &plan.target_relative, &plan.slug, config)?;
    info!(page = %target.rel_path, title = %target.title, "loaded target");

    let deps = dependencies::collect(&target, root, config);
    let patterns = ReferencePatternSet::build(&target.rel_path, &target.slug, &target.title, &target.stem)?;
    if patterns.is_empty() {
        warn!("target has no usable identity, no backreferences can match");
    }
    debug!(patterns = patterns.len(), "built reference patterns");

    let mut walk_config = config.clone();
    walk_config.artifact_path = plan.output_path.strip_prefix(root).ok().map(relative_to_slash);

    let incoming = scanner::collect_incoming_code_refs(root, &target, &patterns, &walk_config)?;
    let direct_docs = scanner::collect_direct_docs(root, &target, &walk_config)?;
    info!(
        local = deps.local.len(),
        external = deps.external.len(),
        incoming = incoming.len(),
        direct_docs = direct_docs.len(),
        "discovery complete"
    );

    let mut bundle = Bundle::new(&target.rel_path, deps, incoming, direct_docs);
    let excerpts = scanner::collect_reference_excerpts(root, &patterns, &bundle.excluded_keys(), &walk_config)?;
    bundle.attach_excerpts(excerpts);
    info!(excerpts = bundle.excerpts.len(), "excerpts collected");

    let ctx = RenderContext { generated_at, output_path: &plan.output_path, root, target: &target };
    let text = bundle::render(&bundle, &ctx)?;
    write_artifact(&plan.output_path, &text)?;
    info!(path = %plan.output_path.display(), bytes = text.len(), "wrote context pack");

    return Ok(Summary {
        direct_docs: bundle.direct_docs.len(),
        excerpts: bundle.excerpts.len(),
        external_dependencies: bundle.external.len(),
        full_files: bundle.full_files.len(),
        incoming_refs: bundle.incoming.len(),
        local_dependencies: bundle.local.len(),
        output_path: plan.output_path.to_string_lossy().into_owned(),
        target: target.rel_path,
    });
}

/// Read the target page and derive its identity.
///
/// # Errors
///
/// Returns `Error::TargetNotFound` if the page is not a file, or
/// `Error::TargetOutsideRoot` if it resolves outside `root`.
pub fn load_target(root: &Path, target_relative: &Path, slug: &str, config: &Config) -> Result<Target, Error> {
    let requested = normalize_path(&root.join(target_relative));
    if !requested.is_file() {
        return Err(Error::TargetNotFound { path: requested });
    }

    let path = std::fs::canonicalize(&requested)?;
    let Ok(relative) = path.strip_prefix(root) else {
        return Err(Error::TargetOutsideRoot { path, root: root.to_path_buf() });
    };
    let rel_path = relative_to_slash(relative);

    let content = scanner::read_text(&path)?;
    let stem = path.file_stem().map(|s| return s.to_string_lossy().into_owned()).unwrap_or_default();
    let title = patterns::extract_title(&content, &stem, &config.title_suffixes);

    return Ok(Target { content, path, rel_path, slug: slug.to_string(), stem, title });
}

/// Turn CLI inputs plus config defaults into a concrete plan. No tree walk
/// happens here.
///
/// # Errors
///
/// Returns `Error::MissingTarget` when no page is named, or
/// `Error::TargetOutsideRoot` for an absolute target outside `root`.
pub fn plan(request: &Request, config: &Config, root: &Path) -> Result<RunPlan, Error> {
    let tool = request.tool.clone().or_else(|| return config.default_tool.clone());

    let target_relative = match (&request.target, &tool) {
        (Some(target), _) if target.is_absolute() => {
            // Nonexistent paths stay textual so load_target reports them as missing.
            let resolved = std::fs::canonicalize(target).unwrap_or_else(|_err| return normalize_path(target));
            let Ok(relative) = resolved.strip_prefix(root) else {
                return Err(Error::TargetOutsideRoot { path: target.clone(), root: root.to_path_buf() });
            };
            relative.to_path_buf()
        },
        (Some(target), _) => target.clone(),
        (None, Some(tool)) if ends_with_html(tool) => PathBuf::from(tool),
        (None, Some(tool)) => PathBuf::from(format!("{tool}.html")),
        (None, None) => return Err(Error::MissingTarget),
    };

    let slug_source = tool.unwrap_or_else(|| {
        return target_relative.file_stem().map(|s| return s.to_string_lossy().into_owned()).unwrap_or_default();
    });
    let slug = if ends_with_html(&slug_source) {
        let stem = Path::new(&slug_source).file_stem().map(|s| return s.to_string_lossy().into_owned());
        patterns::slugify(&stem.unwrap_or_default())
    } else {
        patterns::slugify(&slug_source)
    };

    let output = request
        .output
        .clone()
        .or_else(|| return config.default_output.clone())
        .unwrap_or_else(|| return Path::new(&config.dump_dir).join(format!("code-dump-{slug}.txt")));
    let output_path = if output.is_absolute() { normalize_path(&output) } else { normalize_path(&root.join(output)) };

    return Ok(RunPlan { output_path, root: root.to_path_buf(), slug, target_relative });
}

/// Print the success summary to stdout.
///
/// # Errors
///
/// Returns `Error::Json` if the summary cannot be serialized.
pub fn print_summary(summary: &Summary, format: SummaryFormat) -> Result<(), Error> {
    match format {
        SummaryFormat::Json => {
            let json = serde_json::to_string_pretty(summary)?;
            println!("{json}");
        },
        SummaryFormat::Text => {
            println!("Tool context dump complete: {}", summary.output_path);
            println!("Target page: {}", summary.target);
            println!("Files included (full): {}", summary.full_files);
        },
    }
    return Ok(());
}

/// Canonical repository root: `--repo-root`, else the parent of the directory
/// holding the running executable.
///
/// # Errors
///
/// Returns `Error::RepoRootNotFound` if the root does not exist, or
/// `Error::Io` if the executable location is unknown.
pub fn resolve_repo_root(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let exe = std::env::current_exe()?;
            let derived = exe.parent().and_then(Path::parent).map(Path::to_path_buf);
            match derived {
                Some(path) => path,
                None => std::env::current_dir()?,
            }
        },
    };
    return std::fs::canonicalize(&candidate).map_err(|_err| return Error::RepoRootNotFound { path: candidate });
}

/// Full run: root, config layering, plan, generate.
///
/// # Errors
///
/// Propagates configuration, target, and filesystem errors.
pub fn run(request: &Request) -> Result<Summary, Error> {
    let root = resolve_repo_root(request.repo_root.as_deref())?;
    let mut config = Config::load(&root)?;
    if let Some(n) = request.context_lines {
        config.context_lines = n;
    }
    if let Some(n) = request.max_sections_per_file {
        config.max_sections_per_file = n;
    }
    config.clamp_tunables();

    let plan = plan(request, &config, &root)?;
    debug!(
        root = %root.display(),
        output = %repo_relative(&plan.output_path, &root),
        max_sections = config.max_sections_per_file,
        context_lines = config.context_lines,
        "run plan ready"
    );
    return generate(&plan, &config, Utc::now());
}

/// Case-insensitive `.html` suffix check.
fn ends_with_html(value: &str) -> bool {
    return value.to_lowercase().ends_with(".html");
}

/// Write the artifact next to its final path, then rename it into place so a
/// failed run never leaves a truncated file.
///
/// # Errors
///
/// Returns `Error::Io` if the directory, temp file, or rename fails.
fn write_artifact(path: &Path, text: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, text)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }
    return Ok(());
}
