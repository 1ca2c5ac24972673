//! Outgoing asset references of the target page, one level deep.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::scanner::sort_case_insensitive;
use crate::types::{Reference, Target};

/// `href="..."` or `src='...'` attribute values, any case.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static ASSET_REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r#"(?i)(?:href|src)\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

/// The target's direct references, split by kind. Each list is deduplicated
/// and sorted case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    /// External URLs exactly as written in the page.
    pub external: Vec<String>,
    /// Repository-relative paths of resolved local files.
    pub local: Vec<String>,
}

/// Scan the target's markup for `href`/`src` values and classify each.
///
/// Dependencies of dependencies are never followed.
pub fn collect(target: &Target, root: &std::path::Path, config: &Config) -> Dependencies {
    let mut deps = Dependencies::default();

    for cap in ASSET_REFERENCE_PATTERN.captures_iter(&target.content) {
        let Some(raw) = cap.get(1).map(|m| return m.as_str().trim()) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }

        match crate::resolver::classify(raw, &target.path, root, config) {
            Reference::External(url) => deps.external.push(url),
            Reference::Local { path, rel_path } => {
                debug!(reference = raw, resolved = %path.display(), "local dependency");
                deps.local.push(rel_path);
            },
            Reference::NonFile => {},
            Reference::Unresolved => debug!(reference = raw, "dropping unresolved reference"),
        }
    }

    dedup_sorted(&mut deps.external);
    dedup_sorted(&mut deps.local);
    debug!(local = deps.local.len(), external = deps.external.len(), "collected dependencies");
    return deps;
}

/// Sort case-insensitively, then drop exact duplicates.
fn dedup_sorted(items: &mut Vec<String>) {
    sort_case_insensitive(items, String::as_str);
    items.dedup();
    return;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::*;

    fn target_in(root: &Path, rel: &str, content: &str) -> Target {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        return Target {
            content: content.to_string(),
            path: fs::canonicalize(&path).unwrap(),
            rel_path: rel.to_string(),
            slug: "demo".to_string(),
            stem: "demo".to_string(),
            title: "Demo".to_string(),
        };
    }

    fn canonical_root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        return (dir, root);
    }

    #[test]
    fn splits_local_external_and_drops_missing() {
        let (_dir, root) = canonical_root();
        fs::create_dir_all(root.join("tools")).unwrap();
        fs::write(root.join("tools/demo.js"), "// js").unwrap();
        let page = r#"<script src="demo.js"></script>
<script src="https://cdn.example.com/lib.js"></script>
<script src="missing.js"></script>"#;
        let target = target_in(&root, "tools/demo.html", page);

        let deps = collect(&target, &root, &Config::default());
        assert_eq!(deps.local, vec!["tools/demo.js"]);
        assert_eq!(deps.external, vec!["https://cdn.example.com/lib.js"]);
        assert!(!deps.local.iter().any(|p| p.contains("missing")));
    }

    #[test]
    fn non_file_references_land_nowhere() {
        let (_dir, root) = canonical_root();
        let page = r##"<a href="#top"></a><a href="mailto:x@y.z"></a><img src="data:image/png;base64,AA">
<a HREF='javascript:void(0)'></a><a href="tel:555"></a>"##;
        let target = target_in(&root, "page.html", page);
        assert_eq!(collect(&target, &root, &Config::default()), Dependencies::default());
    }

    #[test]
    fn duplicates_collapse_and_sort() {
        let (_dir, root) = canonical_root();
        fs::write(root.join("b.css"), "").unwrap();
        fs::write(root.join("A.js"), "").unwrap();
        let page = r#"<link href="b.css"><script src="./A.js"></script><link href='b.css?v=2'>
<script src="//cdn.x/z.js"></script><script src="//cdn.x/z.js"></script><script src="HTTPS://a.io/y.js"></script>"#;
        let target = target_in(&root, "page.html", page);

        let deps = collect(&target, &root, &Config::default());
        assert_eq!(deps.local, vec!["A.js", "b.css"]);
        assert_eq!(deps.external, vec!["//cdn.x/z.js", "HTTPS://a.io/y.js"]);
    }
}
