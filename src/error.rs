//! Crate-level error types for toolctx runs.

use std::path::PathBuf;

/// Every fatal condition of a run. Unresolved references, lossy decodes, and
/// files that vanish before rendering are not errors and never reach here.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A reference pattern failed to compile.
    #[error("invalid reference pattern: {0}")]
    InvalidPattern(
        /// The wrapped regex compilation error.
        #[from]
        regex::Error,
    ),

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// The run summary could not be serialized as JSON.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// Neither `--tool`, `--target`, nor a configured default names a page.
    #[error("missing tool id: provide --tool, --target, or set default_tool in .toolctx.toml")]
    MissingTarget,

    /// The repository root does not exist or cannot be resolved.
    #[error("repository root not found: {}", path.display())]
    RepoRootNotFound {
        /// Root path as given or derived.
        path: PathBuf,
    },

    /// The target page does not exist on disk.
    #[error("unable to find target tool page: {}", path.display())]
    TargetNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The target page lies outside the repository root.
    #[error("target must be inside repository root ({}): {}", root.display(), path.display())]
    TargetOutsideRoot {
        /// Offending target path.
        path: PathBuf,
        /// Canonical repository root.
        root: PathBuf,
    },

    /// TOML deserialization of `.toolctx.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// Directory traversal failed below the repository root.
    #[error("walk: {0}")]
    Walk(
        /// The wrapped walkdir error.
        #[from]
        walkdir::Error,
    ),
}
