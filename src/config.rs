use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::Error;

/// Name of the optional per-repository config file.
pub const CONFIG_FILE_NAME: &str = ".toolctx.toml";

/// Code-like extensions: matched files are dumped whole.
const DEFAULT_CODE_EXTENSIONS: &[&str] = &[
    "css", "html", "js", "json", "jsx", "ps1", "py", "ts", "tsx", "xml",
];

/// Default line radius around a non-heading hit.
const DEFAULT_CONTEXT_LINES: usize = 10;

/// Documentation-like extensions: matched files are excerpted.
const DEFAULT_DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt"];

/// Directory that holds generated bundles; never scanned.
const DEFAULT_DUMP_DIR: &str = "context";

/// Version control, dependency, cache, and editor directories.
const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".idea",
    ".pytest_cache",
    ".venv",
    ".vscode",
    "__pycache__",
    "node_modules",
    "venv",
];

/// Default cap on excerpts taken from one documentation file.
const DEFAULT_MAX_SECTIONS_PER_FILE: usize = 3;

/// Extra extensions accepted as local dependencies of the target page.
const DEFAULT_TEXT_EXTENSIONS: &[&str] = &["csv", "ini", "svg", "toml", "tsv", "yaml", "yml"];

/// Site-name suffixes stripped from `<title>` text.
const DEFAULT_TITLE_SUFFIXES: &[&str] = &["Text Utilities"];

/// Lowest accepted value for either tunable.
const MIN_TUNABLE: usize = 1;

/// Run configuration, built once and threaded through every component.
/// Extensions are stored lowercase without a leading dot.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository-relative path of this run's artifact, skipped by walks.
    /// Set per run, never read from the config file.
    pub artifact_path: Option<String>,
    /// Extensions whose matching files are kept whole.
    pub code_extensions: BTreeSet<String>,
    /// Line radius for non-heading excerpts.
    pub context_lines: usize,
    /// Output path used when `--output` is absent.
    pub default_output: Option<PathBuf>,
    /// Tool id used when neither `--tool` nor `--target` is given.
    pub default_tool: Option<String>,
    /// Extensions whose matching files are excerpted.
    pub doc_extensions: BTreeSet<String>,
    /// Name of the bundle output directory, always ignored.
    pub dump_dir: String,
    /// Directory names skipped anywhere in the tree.
    pub ignored_dirs: BTreeSet<String>,
    /// Maximum excerpts per documentation file.
    pub max_sections_per_file: usize,
    /// Extra extensions accepted as local dependencies.
    pub text_extensions: BTreeSet<String>,
    /// Suffixes removed from `<title>` text when deriving the page title.
    pub title_suffixes: Vec<String>,
}

/// Raw TOML structure for `.toolctx.toml`. Every key is optional.
#[derive(serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ToolctxTomlConfig {
    code_extensions: Option<Vec<String>>,
    context_lines: Option<usize>,
    default_output: Option<PathBuf>,
    default_tool: Option<String>,
    doc_extensions: Option<Vec<String>>,
    dump_dir: Option<String>,
    ignored_dirs: Option<Vec<String>>,
    max_sections_per_file: Option<usize>,
    text_extensions: Option<Vec<String>>,
    title_suffixes: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            artifact_path: None,
            code_extensions: normalize_extensions(DEFAULT_CODE_EXTENSIONS),
            context_lines: DEFAULT_CONTEXT_LINES,
            default_output: None,
            default_tool: None,
            doc_extensions: normalize_extensions(DEFAULT_DOC_EXTENSIONS),
            dump_dir: DEFAULT_DUMP_DIR.to_string(),
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|d| return (*d).to_string()).collect(),
            max_sections_per_file: DEFAULT_MAX_SECTIONS_PER_FILE,
            text_extensions: normalize_extensions(DEFAULT_TEXT_EXTENSIONS),
            title_suffixes: DEFAULT_TITLE_SUFFIXES.iter().map(|s| return (*s).to_string()).collect(),
        };
    }
}

impl Config {
    /// Raise both tunables to their minimum of one.
    pub fn clamp_tunables(&mut self) {
        self.context_lines = self.context_lines.max(MIN_TUNABLE);
        self.max_sections_per_file = self.max_sections_per_file.max(MIN_TUNABLE);
        return;
    }

    /// Whether `rel_path` is this run's own artifact.
    pub fn is_artifact(&self, rel_path: &str) -> bool {
        return self.artifact_path.as_deref().is_some_and(|a| return a.eq_ignore_ascii_case(rel_path));
    }

    /// Whether `path` has a code-like extension.
    pub fn is_code_file(&self, path: &Path) -> bool {
        return self.code_extensions.contains(&extension_of(path));
    }

    /// Whether `path` has a documentation-like extension.
    pub fn is_doc_file(&self, path: &Path) -> bool {
        return self.doc_extensions.contains(&extension_of(path));
    }

    /// Whether a single directory or file name is skipped during walks.
    fn is_ignored_name(&self, name: &str) -> bool {
        return name == self.dump_dir || self.ignored_dirs.contains(name);
    }

    /// Whether a repository-relative path is ignored. A single-name
    /// `dump_dir` is ignored at any depth like `ignored_dirs`; a nested one
    /// only as a prefix of the path.
    pub fn is_ignored_relative(&self, relative: &Path) -> bool {
        let dump_dir = Path::new(&self.dump_dir);
        if dump_dir.components().nth(1).is_some() && relative.starts_with(dump_dir) {
            return true;
        }
        return relative.components().any(|c| {
            return match c {
                Component::Normal(name) => self.is_ignored_name(&name.to_string_lossy()),
                _ => false,
            };
        });
    }

    /// Whether `path` may be dumped as a local dependency.
    pub fn is_text_file(&self, path: &Path) -> bool {
        let ext = extension_of(path);
        return self.code_extensions.contains(&ext)
            || self.doc_extensions.contains(&ext)
            || self.text_extensions.contains(&ext);
    }

    /// Load config from `.toolctx.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. A file that exists but is
    /// malformed is an error; it never silently falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        debug!(path = %path.display(), "loading config file");
        return Self::parse(&content);
    }

    /// Parse `.toolctx.toml` content, layering each present key over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: ToolctxTomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(exts) = raw.code_extensions {
            config.code_extensions = normalize_extensions(&exts);
        }
        if let Some(exts) = raw.doc_extensions {
            config.doc_extensions = normalize_extensions(&exts);
        }
        if let Some(exts) = raw.text_extensions {
            config.text_extensions = normalize_extensions(&exts);
        }
        if let Some(dirs) = raw.ignored_dirs {
            config.ignored_dirs = dirs.into_iter().collect();
        }
        if let Some(dir) = raw.dump_dir {
            config.dump_dir = dir;
        }
        if let Some(n) = raw.context_lines {
            config.context_lines = n;
        }
        if let Some(n) = raw.max_sections_per_file {
            config.max_sections_per_file = n;
        }
        if let Some(suffixes) = raw.title_suffixes {
            config.title_suffixes = suffixes;
        }
        config.default_output = raw.default_output;
        config.default_tool = raw.default_tool;

        return Ok(config);
    }
}

/// Lowercased extension of `path` without the dot, or empty.
pub fn extension_of(path: &Path) -> String {
    return path
        .extension()
        .map(|e| return e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
}

/// Lowercase and strip a leading dot from each extension.
fn normalize_extensions<S: AsRef<str>>(exts: &[S]) -> BTreeSet<String> {
    return exts
        .iter()
        .map(|e| return e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| return !e.is_empty())
        .collect();
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn defaults_classify_extensions() {
        let config = Config::default();
        assert!(config.is_code_file(Path::new("tools/demo.HTML")));
        assert!(config.is_doc_file(Path::new("docs/guide.md")));
        assert!(!config.is_doc_file(Path::new("docs/guide.js")));
        assert!(config.is_text_file(Path::new("data/table.csv")));
        assert!(!config.is_text_file(Path::new("img/logo.png")));
    }

    #[test]
    fn dump_dir_is_always_ignored() {
        let config = Config::default();
        assert!(config.is_ignored_relative(Path::new("context/code-dump-x.txt")));
        assert!(config.is_ignored_relative(Path::new("web/node_modules/lib/a.js")));
        assert!(!config.is_ignored_relative(Path::new("tools/contextual.js")));
    }

    #[test]
    fn nested_dump_dir_is_ignored_by_prefix() {
        let config = Config::parse("dump_dir = \"build/context\"\n").unwrap();
        assert!(config.is_ignored_relative(Path::new("build/context")));
        assert!(config.is_ignored_relative(Path::new("build/context/code-dump-x.txt")));
        assert!(!config.is_ignored_relative(Path::new("build/other.txt")));
        assert!(!config.is_ignored_relative(Path::new("context/notes.txt")));
    }

    #[test]
    fn file_overrides_only_named_keys() {
        let config = Config::parse(
            "doc_extensions = [\".MD\", \"adoc\"]\nmax_sections_per_file = 5\ndefault_tool = \"json-tool\"\n",
        )
        .unwrap();
        assert!(config.is_doc_file(Path::new("a.md")));
        assert!(config.is_doc_file(Path::new("a.adoc")));
        assert!(!config.is_doc_file(Path::new("a.txt")));
        assert_eq!(config.max_sections_per_file, 5);
        assert_eq!(config.context_lines, DEFAULT_CONTEXT_LINES);
        assert_eq!(config.default_tool.as_deref(), Some("json-tool"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(Config::parse("context_lines = \"ten\""), Err(Error::TomlDe(_))));
        assert!(matches!(Config::parse("unknown_key = 1"), Err(Error::TomlDe(_))));
    }

    #[test]
    fn tunables_clamp_to_one() {
        let mut config = Config::parse("context_lines = 0\nmax_sections_per_file = 0\n").unwrap();
        config.clamp_tunables();
        assert_eq!(config.context_lines, 1);
        assert_eq!(config.max_sections_per_file, 1);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.max_sections_per_file, DEFAULT_MAX_SECTIONS_PER_FILE);
        assert_eq!(config.dump_dir, DEFAULT_DUMP_DIR);
    }
}
