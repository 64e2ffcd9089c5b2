//! Best-effort import-line extraction from a bounded file-header prefix.

use crate::language::Language;

/// Extract raw import/require/use lines from the first few lines of a file,
/// stopping at the first non-import, non-blank, non-comment line or at
/// `max_lines`, whichever comes first.
#[must_use]
pub fn extract_imports(language: Language, content: &str, max_lines: usize) -> Vec<String> {
    let patterns = language.import_patterns();
    if patterns.is_empty() {
        return Vec::new();
    }

    let comment_prefixes = language.comment_prefixes();
    let mut imports = Vec::new();

    for line in content.lines().take(max_lines.max(1) * 4) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }
        if comment_prefixes.iter().any(|p| trimmed.starts_with(p)) {
            continue;
        }

        if is_import_line(trimmed, patterns) {
            imports.push(trimmed.trim_end_matches(';').to_string());
            if imports.len() >= max_lines {
                break;
            }
            continue;
        }

        // First substantive, non-import line ends the header scan.
        break;
    }

    imports
}

fn is_import_line(line: &str, patterns: &[&str]) -> bool {
    let line = line.strip_prefix("pub ").unwrap_or(line);
    patterns.iter().any(|p| line.starts_with(p) || line.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_rust_use_lines() {
        let content = "use std::fmt;\nuse crate::error::Result;\n\nfn main() {}\n";
        let imports = extract_imports(Language::Rust, content, 10);
        assert_eq!(imports, vec!["use std::fmt", "use crate::error::Result"]);
    }

    #[test]
    fn stops_at_first_non_import_line() {
        let content = "import os\nimport sys\n\nclass Foo:\n    pass\n";
        let imports = extract_imports(Language::Python, content, 10);
        assert_eq!(imports, vec!["import os", "import sys"]);
    }

    #[test]
    fn unsupported_language_returns_empty() {
        assert!(extract_imports(Language::Markdown, "# Title\n", 10).is_empty());
    }

    #[test]
    fn respects_max_lines_cap() {
        let content = "use a;\nuse b;\nuse c;\nuse d;\n";
        let imports = extract_imports(Language::Rust, content, 2);
        assert_eq!(imports.len(), 2);
    }
}
