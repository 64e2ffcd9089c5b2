use std::path::Path;

/// Programming language classification, driven purely by file extension.
///
/// Unknown extensions map to [`Language::Unknown`] and are treated conservatively
/// as non-source: the path filter will not watch or chunk them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Dart,
    Go,
    Rust,
    Java,
    Kotlin,
    Swift,
    Ruby,
    Php,
    C,
    Cpp,
    CSharp,
    Shell,
    Markdown,
    Yaml,
    Json,
    Config,
    Sql,
    Html,
    Css,
    Unknown,
}

impl Language {
    /// Detect language from a bare extension (no leading dot), case-insensitive.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" | "pyi" => Self::Python,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "dart" => Self::Dart,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "java" => Self::Java,
            "kt" | "kts" => Self::Kotlin,
            "swift" => Self::Swift,
            "rb" => Self::Ruby,
            "php" | "php7" | "phtml" => Self::Php,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Self::Cpp,
            "cs" => Self::CSharp,
            "sh" | "bash" | "zsh" | "fish" | "ps1" | "bat" | "cmd" => Self::Shell,
            "md" | "mdx" | "rst" | "adoc" => Self::Markdown,
            "yaml" | "yml" => Self::Yaml,
            "json" | "jsonc" => Self::Json,
            "toml" | "ini" | "cfg" | "conf" | "properties" | "env" | "gradle" => Self::Config,
            "sql" | "dbml" => Self::Sql,
            "html" | "htm" => Self::Html,
            "css" | "scss" | "less" => Self::Css,
            _ => Self::Unknown,
        }
    }

    /// Detect language from a file path, falling back to a handful of well-known
    /// extension-less filenames.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .filter(|lang| !matches!(lang, Self::Unknown))
            .or_else(|| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .and_then(|name| match name {
                        "Makefile" | "makefile" | "GNUmakefile" => Some(Self::Shell),
                        "Dockerfile" => Some(Self::Shell),
                        _ => None,
                    })
            })
            .unwrap_or(Self::Unknown)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Dart => "dart",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::Swift => "swift",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Shell => "shell",
            Self::Markdown => "markdown",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Config => "config",
            Self::Sql => "sql",
            Self::Html => "html",
            Self::Css => "css",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this language is eligible to be watched/indexed as source at all.
    /// Unknown extensions are conservatively excluded, per the path filter's rules.
    #[must_use]
    pub const fn is_source(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Import/use/require statement prefixes, used to carve the header block out
    /// of a file for `imports` extraction.
    #[must_use]
    pub const fn import_patterns(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["use ", "extern crate "],
            Self::Python => &["import ", "from "],
            Self::JavaScript | Self::TypeScript => &["import ", "require(", "export "],
            Self::Dart => &["import ", "export "],
            Self::Go => &["import "],
            Self::Java | Self::Kotlin | Self::Swift => &["import "],
            Self::CSharp => &["using "],
            Self::Ruby => &["require ", "require_relative ", "include "],
            Self::Php => &["use ", "require ", "require_once ", "include ", "include_once "],
            Self::C | Self::Cpp => &["#include "],
            _ => &[],
        }
    }

    /// Comment-line prefixes, used to skip over header comments while scanning
    /// for the import block.
    #[must_use]
    pub const fn comment_prefixes(self) -> &'static [&'static str] {
        match self {
            Self::Rust
            | Self::JavaScript
            | Self::TypeScript
            | Self::Dart
            | Self::Go
            | Self::Java
            | Self::Kotlin
            | Self::Swift
            | Self::C
            | Self::Cpp
            | Self::CSharp
            | Self::Php => &["//", "/*", "*", "/**", "///"],
            Self::Python | Self::Ruby => &["#"],
            Self::Shell | Self::Yaml | Self::Config => &["#"],
            Self::Sql => &["--"],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_extension_covers_required_languages() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension("js"), Language::JavaScript);
        assert_eq!(Language::from_extension("dart"), Language::Dart);
        assert_eq!(Language::from_extension("go"), Language::Go);
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("java"), Language::Java);
        assert_eq!(Language::from_extension("kt"), Language::Kotlin);
        assert_eq!(Language::from_extension("swift"), Language::Swift);
        assert_eq!(Language::from_extension("rb"), Language::Ruby);
        assert_eq!(Language::from_extension("php"), Language::Php);
        assert_eq!(Language::from_extension("c"), Language::C);
        assert_eq!(Language::from_extension("cpp"), Language::Cpp);
        assert_eq!(Language::from_extension("cs"), Language::CSharp);
        assert_eq!(Language::from_extension("sh"), Language::Shell);
    }

    #[test]
    fn unknown_extension_is_not_source() {
        assert_eq!(Language::from_extension("xyz123"), Language::Unknown);
        assert!(!Language::Unknown.is_source());
        assert!(Language::Rust.is_source());
    }

    #[test]
    fn from_path_handles_extensionless_well_known_names() {
        assert_eq!(Language::from_path("Makefile"), Language::Shell);
        assert_eq!(Language::from_path("no_extension_at_all"), Language::Unknown);
        assert_eq!(Language::from_path("src/main.rs"), Language::Rust);
    }
}
