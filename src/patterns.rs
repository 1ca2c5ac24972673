//! Target identity: slug and title derivation, and the reference patterns
//! that decide whether another file mentions the target.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::Error;

/// First `<h2>` element text.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static H2_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?i)<h2[^>]*>\s*([^<]+?)\s*</h2>").expect("valid regex"));

/// Runs of anything other than lowercase ASCII letters and digits.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Document `<title>` text, possibly spanning lines.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?is)<title[^>]*>\s*(.*?)\s*</title>").expect("valid regex"));

/// Runs of whitespace, collapsed to one space in titles.
#[allow(clippy::expect_used, reason = "hardcoded pattern")]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| return Regex::new(r"\s+").expect("valid regex"));

/// The ordered patterns that count as "this file mentions the target".
/// All are case-insensitive.
#[derive(Debug, Clone)]
pub struct ReferencePatternSet {
    /// Compiled patterns: path, file name, id association, stem, title.
    patterns: Vec<Regex>,
}

impl ReferencePatternSet {
    /// Build the pattern set for a target.
    ///
    /// Patterns, in order: the relative path with either separator, the bare
    /// file name, `id: "<slug>"` style associations, the file stem, the title.
    /// Everything is matched literally except the separators in the path
    /// pattern and the whitespace around the `id` association. Empty literals
    /// are skipped since they would match every file.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if a pattern fails to compile.
    pub fn build(rel_path: &str, slug: &str, title: &str, stem: &str) -> Result<Self, Error> {
        let file_name = Path::new(rel_path)
            .file_name()
            .map(|n| return n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut sources: Vec<String> = Vec::new();
        if !rel_path.is_empty() {
            sources.push(regex::escape(rel_path).replace('/', r"[\\/]"));
        }
        if !file_name.is_empty() {
            sources.push(regex::escape(&file_name));
        }
        if !slug.is_empty() {
            sources.push(format!(r#"id\s*:\s*['"]{}['"]"#, regex::escape(slug)));
        }
        for literal in [stem, title] {
            if !literal.is_empty() {
                sources.push(regex::escape(literal));
            }
        }

        let patterns = sources
            .iter()
            .map(|source| return RegexBuilder::new(source).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Self { patterns });
    }

    /// True when the target yielded no usable identity at all.
    pub fn is_empty(&self) -> bool {
        return self.patterns.is_empty();
    }

    /// Whether any pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        return self.patterns.iter().any(|p| return p.is_match(text));
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        return self.patterns.len();
    }
}

/// Derive a page title: first `<h2>`, then `<title>` minus any configured
/// site suffix, then the humanized file stem.
pub fn extract_title(content: &str, stem: &str, title_suffixes: &[String]) -> String {
    if let Some(cap) = H2_PATTERN.captures(content) {
        let heading = collapse_whitespace(cap.get(1).map_or("", |m| return m.as_str()));
        if !heading.is_empty() {
            return heading;
        }
    }

    if let Some(cap) = TITLE_PATTERN.captures(content) {
        let mut title = collapse_whitespace(cap.get(1).map_or("", |m| return m.as_str()));
        for suffix in title_suffixes {
            title = strip_title_suffix(&title, suffix);
        }
        if !title.is_empty() {
            return title;
        }
    }

    return humanize_stem(stem);
}

/// Title-case a file stem, treating `-` and `_` as spaces.
/// A letter is capitalized when the character before it is not a letter.
pub fn humanize_stem(stem: &str) -> String {
    let spaced = stem.replace(['-', '_'], " ");
    let mut out = String::with_capacity(spaced.len());
    let mut previous_is_letter = false;
    for ch in spaced.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    return out;
}

/// Lowercase and keep only ASCII letters and digits.
pub fn normalize_key(value: &str) -> String {
    return NON_ALNUM.replace_all(&value.to_lowercase(), "").into_owned();
}

/// Lowercase, collapse non-alphanumeric runs to `-`, trim dashes.
/// Falls back to `tool` when nothing is left.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let dashed = NON_ALNUM.replace_all(&lowered, "-");
    let slug = dashed.trim_matches('-');
    if slug.is_empty() {
        return "tool".to_string();
    }
    return slug.to_string();
}

/// Collapse whitespace runs to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    return WHITESPACE.replace_all(text, " ").trim().to_string();
}

/// Remove a trailing `- <suffix>` from a title, case-insensitively.
fn strip_title_suffix(title: &str, suffix: &str) -> String {
    let source = format!(r"\s*-\s*{}\s*$", regex::escape(suffix));
    let Ok(pattern) = RegexBuilder::new(&source).case_insensitive(true).build() else {
        return title.to_string();
    };
    return pattern.replace(title, "").into_owned();
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("JSON Tool"), "json-tool");
        assert_eq!(slugify("--Color__Chooser!!"), "color-chooser");
        assert_eq!(slugify("***"), "tool");
    }

    #[test]
    fn normalize_key_keeps_alphanumerics() {
        assert_eq!(normalize_key("Json-Tool.md"), "jsontoolmd");
    }

    #[test]
    fn title_prefers_h2() {
        let page = "<title>Other - Text Utilities</title><h2 class=\"x\">  JSON\n  Tool </h2>";
        assert_eq!(extract_title(page, "json-tool", &[]), "JSON Tool");
    }

    #[test]
    fn title_strips_site_suffix() {
        let page = "<TITLE>\n  Color Chooser - text utilities\n</TITLE>";
        let suffixes = vec!["Text Utilities".to_string()];
        assert_eq!(extract_title(page, "color-chooser", &suffixes), "Color Chooser");
    }

    #[test]
    fn title_falls_back_to_humanized_stem() {
        assert_eq!(extract_title("<p>no headings</p>", "json_tool-v2x", &[]), "Json Tool V2X");
        assert_eq!(extract_title("<h2> </h2>", "demo", &[]), "Demo");
    }

    #[test]
    fn pattern_set_matches_each_identity() {
        let set = ReferencePatternSet::build("tools/json-tool.html", "json-tool", "JSON Formatter", "json-tool").unwrap();
        assert_eq!(set.len(), 5);
        assert!(!set.is_empty());
        assert!(set.is_match(r#"<a href="tools\json-tool.html">"#));
        assert!(set.is_match("open JSON-TOOL.HTML"));
        assert!(set.is_match("{ id : 'json-tool', name: 'x' }"));
        assert!(set.is_match("the json formatter page"));
        assert!(!set.is_match("an unrelated yaml helper"));
    }

    #[test]
    fn id_association_requires_quotes() {
        let set = ReferencePatternSet::build("a/b.html", "my-slug", "Title", "b").unwrap();
        assert!(set.is_match("id: \"my-slug\""));
        assert!(!set.is_match("id: my_slug"));
    }

    #[test]
    fn empty_title_is_not_a_wildcard() {
        let set = ReferencePatternSet::build("x/page.html", "page", "", "page").unwrap();
        assert_eq!(set.len(), 4);
        assert!(!set.is_match("nothing to see"));
    }
}
