use crate::language::Language;
use std::path::Path;

/// Outcome of classifying a repo-relative path against the ignore list and the
/// language table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Watch and index.
    Source(Language),
    /// A path component matched an ignore token.
    Ignored,
    /// Extension not present in the language table (includes `Language::Unknown`).
    NonSource,
}

/// Default ignore tokens, matched component-wise against every segment of a
/// repo-relative path. `IGNORE_PATHS` extends this list; it never replaces it.
pub const DEFAULT_IGNORE_TOKENS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    ".venv",
    "venv",
    "__pycache__",
    ".context-index",
    ".DS_Store",
];

#[derive(Debug, Clone)]
pub struct PathFilter {
    ignore_tokens: Vec<String>,
}

impl PathFilter {
    #[must_use]
    pub fn new(extra_ignore_tokens: &[String]) -> Self {
        let mut ignore_tokens: Vec<String> =
            DEFAULT_IGNORE_TOKENS.iter().map(|s| (*s).to_string()).collect();
        ignore_tokens.extend(extra_ignore_tokens.iter().cloned());
        Self { ignore_tokens }
    }

    /// Parse a comma-separated `IGNORE_PATHS` value into extra tokens.
    #[must_use]
    pub fn extra_tokens_from_csv(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Classify a repo-relative path.
    #[must_use]
    pub fn classify(&self, relative_path: &Path) -> PathClass {
        for component in relative_path.components() {
            let segment = component.as_os_str().to_string_lossy();
            if self.is_ignored_segment(&segment) {
                return PathClass::Ignored;
            }
        }

        let language = relative_path
            .extension()
            .and_then(|e| e.to_str())
            .map(Language::from_extension)
            .unwrap_or(Language::Unknown);

        if language.is_source() {
            PathClass::Source(language)
        } else {
            PathClass::NonSource
        }
    }

    fn is_ignored_segment(&self, segment: &str) -> bool {
        self.ignore_tokens.iter().any(|token| segment == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_source_file() {
        let filter = PathFilter::new(&[]);
        assert_eq!(
            filter.classify(Path::new("src/main.rs")),
            PathClass::Source(Language::Rust)
        );
    }

    #[test]
    fn classifies_ignored_directory() {
        let filter = PathFilter::new(&[]);
        assert_eq!(
            filter.classify(Path::new("node_modules/pkg/index.js")),
            PathClass::Ignored
        );
    }

    #[test]
    fn classifies_non_source_extension() {
        let filter = PathFilter::new(&[]);
        assert_eq!(
            filter.classify(Path::new("image.png")),
            PathClass::NonSource
        );
    }

    #[test]
    fn extra_ignore_tokens_apply() {
        let filter = PathFilter::new(&["vendor".to_string()]);
        assert_eq!(
            filter.classify(Path::new("vendor/lib.go")),
            PathClass::Ignored
        );
    }

    #[test]
    fn parses_csv_ignore_list() {
        let tokens = PathFilter::extra_tokens_from_csv(" foo, bar ,,baz");
        assert_eq!(tokens, vec!["foo", "bar", "baz"]);
    }
}
