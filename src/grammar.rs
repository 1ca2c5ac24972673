//! Code-fence language tags by file extension.

use std::path::Path;

use crate::config::extension_of;

/// Map a file extension to the language tag used on its code fence.
/// Unknown extensions fall back to `text`.
pub fn language_tag(path: &Path) -> &'static str {
    return match extension_of(path).as_str() {
        "css" => "css",
        "html" => "html",
        "js" => "javascript",
        "json" => "json",
        "jsx" => "jsx",
        "md" => "markdown",
        "ps1" => "powershell",
        "py" => "python",
        "ts" => "typescript",
        "tsx" => "tsx",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        _ => "text",
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_fallback_tags() {
        assert_eq!(language_tag(Path::new("tools/demo.JS")), "javascript");
        assert_eq!(language_tag(Path::new("build.ps1")), "powershell");
        assert_eq!(language_tag(Path::new("ci.yml")), "yaml");
        assert_eq!(language_tag(Path::new("notes.rst")), "text");
        assert_eq!(language_tag(Path::new("Makefile")), "text");
    }
}
