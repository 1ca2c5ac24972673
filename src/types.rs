//! Core domain types for toolctx targets, references, and excerpts.

use std::path::PathBuf;

/// A labeled text window cut from a documentation file that mentions the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    /// Extracted text, lines joined with `\n`.
    pub content: String,
    /// One-based last line, inclusive.
    pub end_line: usize,
    /// `Section: <heading>` or `Reference lines <s>-<e>`.
    pub label: String,
    /// Repository-relative path of the owning file, `/`-separated.
    pub rel_path: String,
    /// One-based first line.
    pub start_line: usize,
}

/// Classification of one raw `href`/`src` value found in the target page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `http://`, `https://`, or protocol-relative `//` URL.
    External(String),
    /// Maps to an existing text file inside the repository.
    Local {
        /// Canonical absolute path on disk.
        path: PathBuf,
        /// Repository-relative path, `/`-separated.
        rel_path: String,
    },
    /// `data:`, `mailto:`, `javascript:`, `tel:`, or a bare fragment.
    NonFile,
    /// Looked like a file but did not map to an eligible repository file.
    Unresolved,
}

/// One window produced by the excerpt extractor, before it is tied to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Extracted text, lines joined with `\n`.
    pub content: String,
    /// One-based last line, inclusive.
    pub end_line: usize,
    /// Human label for the window.
    pub label: String,
    /// One-based first line.
    pub start_line: usize,
}

/// The page under analysis. Immutable once loaded for a run.
#[derive(Debug, Clone)]
pub struct Target {
    /// Raw page text.
    pub content: String,
    /// Canonical absolute path on disk.
    pub path: PathBuf,
    /// Repository-relative path, `/`-separated.
    pub rel_path: String,
    /// Normalized identifier, e.g. `json-tool`.
    pub slug: String,
    /// File name without extension.
    pub stem: String,
    /// Human title from `<h2>`, `<title>`, or the humanized stem.
    pub title: String,
}

impl Section {
    /// Attach the section to its owning file.
    pub fn into_excerpt(self, rel_path: &str) -> Excerpt {
        return Excerpt {
            content: self.content,
            end_line: self.end_line,
            label: self.label,
            rel_path: rel_path.to_string(),
            start_line: self.start_line,
        };
    }
}
