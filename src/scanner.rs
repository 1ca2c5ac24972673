//! Repository walks: incoming code references, same-topic docs, and
//! excerpts from documentation that mentions the target.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::excerpt;
use crate::patterns::{ReferencePatternSet, normalize_key};
use crate::resolver::repo_relative;
use crate::types::{Excerpt, Target};

/// A file found by a repository walk.
#[derive(Debug, Clone)]
pub struct RepoFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Repository-relative path, `/`-separated.
    pub rel_path: String,
}

/// Code-like files whose content mentions the target. Sorted case-insensitively.
///
/// # Errors
///
/// Returns `Error::Walk` if the root cannot be read, or `Error::Io` if a
/// matching candidate cannot be read.
pub fn collect_incoming_code_refs(
    root: &Path,
    target: &Target,
    patterns: &ReferencePatternSet,
    config: &Config,
) -> Result<Vec<String>, Error> {
    let mut incoming = Vec::new();
    for file in repo_files(root, config)? {
        if file.rel_path == target.rel_path || !config.is_code_file(&file.path) {
            continue;
        }
        let content = read_text(&file.path)?;
        if patterns.is_match(&content) {
            debug!(file = %file.rel_path, "incoming code reference");
            incoming.push(file.rel_path);
        }
    }
    return Ok(incoming);
}

/// Documentation files named after the target: the normalized file name
/// contains the normalized slug, or the normalized stem contains the
/// normalized target stem. Sorted case-insensitively.
///
/// # Errors
///
/// Returns `Error::Walk` if the root cannot be read.
pub fn collect_direct_docs(root: &Path, target: &Target, config: &Config) -> Result<Vec<String>, Error> {
    let slug_key = normalize_key(&target.slug);
    let stem_key = normalize_key(&target.stem);
    let mut docs = Vec::new();

    for file in repo_files(root, config)? {
        if file.rel_path == target.rel_path || !config.is_doc_file(&file.path) {
            continue;
        }
        let name_key = file.path.file_name().map(|n| return normalize_key(&n.to_string_lossy())).unwrap_or_default();
        let candidate_stem_key =
            file.path.file_stem().map(|s| return normalize_key(&s.to_string_lossy())).unwrap_or_default();

        let by_slug = !slug_key.is_empty() && name_key.contains(&slug_key);
        let by_stem = !stem_key.is_empty() && candidate_stem_key.contains(&stem_key);
        if by_slug || by_stem {
            debug!(file = %file.rel_path, "direct doc");
            docs.push(file.rel_path);
        }
    }
    return Ok(docs);
}

/// Excerpts from every documentation file that mentions the target and is
/// not already dumped in full. `excluded` holds lowercased relative paths.
/// Sorted by lowercased path, then start line.
///
/// # Errors
///
/// Returns `Error::Walk` if the root cannot be read, or `Error::Io` if a
/// candidate cannot be read.
pub fn collect_reference_excerpts(
    root: &Path,
    patterns: &ReferencePatternSet,
    excluded: &HashSet<String>,
    config: &Config,
) -> Result<Vec<Excerpt>, Error> {
    let mut excerpts: Vec<Excerpt> = Vec::new();

    for file in repo_files(root, config)? {
        if excluded.contains(&file.rel_path.to_lowercase()) || !config.is_doc_file(&file.path) {
            continue;
        }
        let content = read_text(&file.path)?;
        if !patterns.is_match(&content) {
            continue;
        }

        let sections = excerpt::extract_sections(
            &file.path,
            &content,
            patterns,
            config.max_sections_per_file,
            config.context_lines,
        );
        debug!(file = %file.rel_path, sections = sections.len(), "text excerpts");
        excerpts.extend(sections.into_iter().map(|s| return s.into_excerpt(&file.rel_path)));
    }

    excerpts.sort_by(|a, b| {
        return a.rel_path.to_lowercase().cmp(&b.rel_path.to_lowercase()).then(a.start_line.cmp(&b.start_line));
    });
    return Ok(excerpts);
}

/// Read a file as UTF-8, substituting replacement characters for invalid
/// bytes instead of failing.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read at all.
pub fn read_text(path: &Path) -> Result<String, Error> {
    let bytes = std::fs::read(path)?;
    return match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(path = %path.display(), "invalid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        },
    };
}

/// Every regular file under `root` outside ignored directories, except the
/// run's own artifact, sorted by
/// lowercased relative path with the exact path as tie-breaker.
///
/// Entries that cannot be read below the root are logged and skipped.
///
/// # Errors
///
/// Returns `Error::Walk` if `root` itself cannot be read.
pub fn repo_files(root: &Path, config: &Config) -> Result<Vec<RepoFile>, Error> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            return e.depth() == 0 || !e.path().strip_prefix(root).is_ok_and(|rel| return config.is_ignored_relative(rel));
        });

    for entry in walker {
        let entry = match entry {
            Err(e) if e.depth() == 0 => return Err(Error::Walk(e)),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            },
            Ok(entry) => entry,
        };
        if !entry.path().is_file() {
            continue;
        }
        let rel_path = repo_relative(entry.path(), root);
        if config.is_artifact(&rel_path) {
            continue;
        }
        files.push(RepoFile { path: entry.into_path(), rel_path });
    }

    sort_case_insensitive(&mut files, |f| return f.rel_path.as_str());
    return Ok(files);
}

/// Sort by lowercased key, breaking ties on the exact key so the order never
/// depends on the walk.
pub fn sort_case_insensitive<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        return ka.to_lowercase().cmp(&kb.to_lowercase()).then_with(|| return ka.cmp(kb));
    });
    return;
}
