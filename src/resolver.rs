//! Path resolution for raw `href`/`src` values found in the target page.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::types::Reference;

/// Prefixes that mark a reference as external.
const EXTERNAL_PREFIXES: &[&str] = &["//", "http://", "https://"];

/// Prefixes that mark a reference as something other than a file.
const NON_FILE_PREFIXES: &[&str] = &["#", "data:", "javascript:", "mailto:", "tel:"];

/// Classify one raw reference taken from the target page.
///
/// `target_file` and `root` must both be canonical. Nothing here fails:
/// anything that does not land on an eligible repository file is
/// `Reference::Unresolved`.
pub fn classify(raw: &str, target_file: &Path, root: &Path, config: &Config) -> Reference {
    let raw = raw.trim();
    if is_external(raw) {
        return Reference::External(raw.to_string());
    }
    if is_non_file(raw) {
        return Reference::NonFile;
    }

    let Some(path) = resolve_on_disk(raw, target_file, root) else {
        debug!(reference = raw, "reference does not exist on disk");
        return Reference::Unresolved;
    };
    let Ok(relative) = path.strip_prefix(root) else {
        debug!(reference = raw, resolved = %path.display(), "reference escapes repository root");
        return Reference::Unresolved;
    };
    if config.is_ignored_relative(relative) {
        debug!(reference = raw, "reference lands in an ignored directory");
        return Reference::Unresolved;
    }
    if !path.is_file() || !config.is_text_file(&path) {
        debug!(reference = raw, "reference is not a text file");
        return Reference::Unresolved;
    }

    let rel_path = relative_to_slash(relative);
    return Reference::Local { path, rel_path };
}

/// Absolute URL or protocol-relative reference.
pub fn is_external(reference: &str) -> bool {
    let lowered = reference.to_lowercase();
    return EXTERNAL_PREFIXES.iter().any(|p| return lowered.starts_with(p));
}

/// Data URI, mail/phone/script link, or fragment-only reference.
pub fn is_non_file(reference: &str) -> bool {
    let lowered = reference.to_lowercase();
    return NON_FILE_PREFIXES.iter().any(|p| return lowered.starts_with(p));
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Join path components with `/` regardless of platform.
pub fn relative_to_slash(relative: &Path) -> String {
    return relative
        .components()
        .filter_map(|c| {
            return match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                Component::CurDir | Component::Prefix(_) | Component::RootDir => None,
            };
        })
        .collect::<Vec<_>>()
        .join("/");
}

/// Map a repository path to its `/`-separated relative form. Paths outside
/// `root` keep their full, `/`-separated form.
pub fn repo_relative(path: &Path, root: &Path) -> String {
    return match path.strip_prefix(root) {
        Ok(relative) => relative_to_slash(relative),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    };
}

/// Handle a single path component during normalization.
/// Pops the last normal component for `..`, keeps it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            if matches!(components.last(), Some(Component::Normal(_))) {
                components.pop();
            } else if !matches!(components.last(), Some(Component::RootDir | Component::Prefix(_))) {
                components.push(component);
            }
        },
        other => components.push(other),
    }
    return;
}

/// Find the file a local reference points at, canonicalized.
///
/// Fragment and query suffixes are dropped. A leading `/` anchors at the
/// repository root; otherwise the referencing file's directory is tried
/// first and the repository root second.
fn resolve_on_disk(raw: &str, target_file: &Path, root: &Path) -> Option<PathBuf> {
    let without_fragment = raw.split('#').next().unwrap_or_default();
    let reference = without_fragment.split('?').next().unwrap_or_default().trim();
    if reference.is_empty() {
        return None;
    }

    if let Some(anchored) = reference.strip_prefix('/') {
        return std::fs::canonicalize(root.join(anchored.trim_start_matches('/'))).ok();
    }

    let relative: PathBuf = reference
        .split('/')
        .filter(|part| return !part.is_empty() && *part != ".")
        .collect();
    if relative.as_os_str().is_empty() {
        return None;
    }

    let base = target_file.parent().unwrap_or(root);
    if let Ok(found) = std::fs::canonicalize(base.join(&relative)) {
        return Some(found);
    }
    return std::fs::canonicalize(root.join(&relative)).ok();
}
