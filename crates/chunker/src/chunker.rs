use crate::contextual_imports::extract_imports;
use crate::error::{ChunkerError, Result};
use crate::language::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Best-effort structural category of a chunk's leading declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Function,
    Class,
    Interface,
    Type,
    Comment,
    Other,
}

impl ChunkKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Comment => "comment",
            Self::Other => "other",
        }
    }
}

/// The atomic indexed unit: a contiguous, non-overlapping slice of a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodeChunk {
    pub id: String,
    pub content: String,
    pub kind: ChunkKind,
    pub name: String,
    pub file_path: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, exclusive at the file end.
    pub end_line: usize,
    pub language: String,
    pub imports: Vec<String>,
    /// 1..5, saturating.
    pub complexity: u8,
}

/// Bounded prefix of a file scanned for import/require/use lines.
const IMPORT_LINE_CAP: usize = 20;

pub struct Chunker {
    patterns: &'static HashMap<Language, LangPatterns>,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            patterns: &PATTERNS,
        }
    }

    /// Read, decode, and chunk a file from disk.
    pub fn chunk_file(&self, path: &Path, relative_path: &str) -> Result<Vec<CodeChunk>> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes)
            .map_err(|e| ChunkerError::Decoding(format!("{}: {e}", path.display())))?;
        let language = Language::from_path(path);
        self.chunk_str(&content, language, relative_path)
    }

    /// Chunk in-memory file content. Deterministic: identical `(content, language,
    /// relative_path)` always yields the identical chunk id set (invariant 1).
    pub fn chunk_str(
        &self,
        content: &str,
        language: Language,
        relative_path: &str,
    ) -> Result<Vec<CodeChunk>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let imports = extract_imports(language, content, IMPORT_LINE_CAP);
        let lines: Vec<&str> = content.lines().collect();

        let raw_chunks = match self.patterns.get(&language) {
            Some(patterns) => split_by_boundaries(&lines, patterns),
            None => vec![RawChunk {
                start_line: 1,
                end_line: lines.len() + 1,
                lines: lines.clone(),
                kind: ChunkKind::Other,
            }],
        };

        let mut chunks = Vec::with_capacity(raw_chunks.len());
        for (sequence, raw) in raw_chunks.into_iter().enumerate() {
            let text = raw.lines.join("\n");
            let name = self
                .patterns
                .get(&language)
                .and_then(|p| extract_name(&raw.lines, p))
                .unwrap_or_else(|| "anonymous".to_string());
            let complexity = compute_complexity(&text);

            chunks.push(CodeChunk {
                id: format!("{relative_path}:{}:{sequence}", raw.start_line),
                content: text,
                kind: raw.kind,
                name,
                file_path: relative_path.to_string(),
                start_line: raw.start_line,
                end_line: raw.end_line,
                language: language.as_str().to_string(),
                imports: imports.clone(),
                complexity,
            });
        }

        Ok(chunks)
    }
}

struct RawChunk<'a> {
    start_line: usize,
    end_line: usize,
    lines: Vec<&'a str>,
    kind: ChunkKind,
}

/// Single forward scan over `lines`: a new chunk boundary is declared when a
/// line matches a function-start or class/interface/type-start pattern and the
/// current buffer is non-empty. The matching line becomes the first line of the
/// next chunk; any remaining buffer at EOF is emitted as a final chunk.
fn split_by_boundaries<'a>(lines: &[&'a str], patterns: &LangPatterns) -> Vec<RawChunk<'a>> {
    let mut chunks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut buffer_start = 1usize;
    let mut buffer_kind = ChunkKind::Other;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;

        if let Some(kind) = patterns.match_kind(line) {
            if !buffer.is_empty() {
                chunks.push(RawChunk {
                    start_line: buffer_start,
                    end_line: line_no,
                    lines: std::mem::take(&mut buffer),
                    kind: buffer_kind,
                });
                buffer_start = line_no;
            } else {
                buffer_start = line_no;
            }
            buffer_kind = kind;
        }

        buffer.push(line);
    }

    if !buffer.is_empty() {
        chunks.push(RawChunk {
            start_line: buffer_start,
            end_line: lines.len() + 1,
            lines: buffer,
            kind: buffer_kind,
        });
    }

    chunks
}

fn extract_name(lines: &[&str], patterns: &LangPatterns) -> Option<String> {
    for line in lines.iter().take(5) {
        if let Some(name) = patterns.capture_name(line) {
            return Some(name);
        }
    }
    None
}

/// `1 + count("if(") + 2*count("for(") + 2*count("while(")`, saturated at 5.
fn compute_complexity(text: &str) -> u8 {
    let ifs = text.matches("if(").count();
    let fors = text.matches("for(").count();
    let whiles = text.matches("while(").count();
    let score = 1 + ifs + 2 * fors + 2 * whiles;
    score.min(5) as u8
}

struct PatternGroup {
    regex: Regex,
    kind: ChunkKind,
}

struct LangPatterns {
    groups: Vec<PatternGroup>,
}

impl LangPatterns {
    fn match_kind(&self, line: &str) -> Option<ChunkKind> {
        self.groups
            .iter()
            .find(|g| g.regex.is_match(line))
            .map(|g| g.kind)
    }

    fn capture_name(&self, line: &str) -> Option<String> {
        self.groups.iter().find_map(|g| {
            g.regex
                .captures(line)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

fn group(pattern: &str, kind: ChunkKind) -> PatternGroup {
    PatternGroup {
        regex: Regex::new(pattern).expect("static chunker pattern must compile"),
        kind,
    }
}

static PATTERNS: Lazy<HashMap<Language, LangPatterns>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert(
        Language::Rust,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\s+([A-Za-z_]\w*)",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+([A-Za-z_]\w*)",
                    ChunkKind::Class,
                ),
                group(
                    r"^\s*impl(?:<[^>]*>)?\s+(?:[\w:]+\s+for\s+)?([A-Za-z_][\w:]*)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m.insert(
        Language::Python,
        LangPatterns {
            groups: vec![
                group(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)", ChunkKind::Function),
                group(r"^\s*class\s+([A-Za-z_]\w*)", ChunkKind::Class),
            ],
        },
    );

    m.insert(
        Language::JavaScript,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s+([A-Za-z_$]\w*)",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$]\w*)\s*=\s*(?:async\s*)?\(",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:export\s+)?(?:default\s+)?class\s+([A-Za-z_$]\w*)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m.insert(
        Language::TypeScript,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s+([A-Za-z_$]\w*)",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$]\w*)\s*(?::[^=]+)?=\s*(?:async\s*)?\(",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+([A-Za-z_$]\w*)",
                    ChunkKind::Class,
                ),
                group(
                    r"^\s*(?:export\s+)?interface\s+([A-Za-z_$]\w*)",
                    ChunkKind::Interface,
                ),
                group(r"^\s*(?:export\s+)?type\s+([A-Za-z_$]\w*)\s*=", ChunkKind::Type),
            ],
        },
    );

    m.insert(
        Language::Dart,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*(?:static\s+)?(?:Future<[^>]*>|void|[A-Za-z_]\w*)\s+([A-Za-z_]\w*)\s*\(",
                    ChunkKind::Function,
                ),
                group(r"^\s*(?:abstract\s+)?class\s+([A-Za-z_]\w*)", ChunkKind::Class),
            ],
        },
    );

    m.insert(
        Language::Go,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*type\s+([A-Za-z_]\w*)\s+(?:struct|interface)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m.insert(
        Language::Java,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*(?:public|private|protected|static|final|abstract|synchronized|\s)*[\w<>\[\],\s]+\s+([A-Za-z_]\w*)\s*\([^;]*$",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:public|private|protected)?\s*(?:abstract\s+|final\s+)?(?:class|interface|enum)\s+([A-Za-z_]\w*)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m.insert(
        Language::Kotlin,
        LangPatterns {
            groups: vec![
                group(r"^\s*(?:private|public|internal|protected)?\s*fun\s+([A-Za-z_]\w*)", ChunkKind::Function),
                group(
                    r"^\s*(?:private|public|internal|protected)?\s*(?:data\s+|sealed\s+|abstract\s+)?(?:class|interface|object)\s+([A-Za-z_]\w*)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m.insert(
        Language::Swift,
        LangPatterns {
            groups: vec![
                group(r"^\s*(?:public|private|internal|fileprivate)?\s*func\s+([A-Za-z_]\w*)", ChunkKind::Function),
                group(
                    r"^\s*(?:public|private|internal|fileprivate)?\s*(?:final\s+)?(?:class|struct|protocol|enum)\s+([A-Za-z_]\w*)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m.insert(
        Language::Ruby,
        LangPatterns {
            groups: vec![
                group(r"^\s*def\s+(?:self\.)?([A-Za-z_]\w*[?!=]?)", ChunkKind::Function),
                group(r"^\s*(?:class|module)\s+([A-Za-z_]\w*)", ChunkKind::Class),
            ],
        },
    );

    m.insert(
        Language::Php,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*(?:public|private|protected|static|\s)*function\s+&?([A-Za-z_]\w*)",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:abstract\s+|final\s+)?(?:class|interface|trait)\s+([A-Za-z_]\w*)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m.insert(
        Language::C,
        LangPatterns {
            groups: vec![group(
                r"^[A-Za-z_][\w\s\*]*\s([A-Za-z_]\w*)\s*\([^;]*\)\s*\{?\s*$",
                ChunkKind::Function,
            )],
        },
    );

    m.insert(
        Language::Cpp,
        LangPatterns {
            groups: vec![
                group(
                    r"^[A-Za-z_][\w\s:\*&<>,]*\s([A-Za-z_][\w:]*)\s*\([^;]*\)\s*(?:const)?\s*\{?\s*$",
                    ChunkKind::Function,
                ),
                group(r"^\s*(?:class|struct)\s+([A-Za-z_]\w*)", ChunkKind::Class),
            ],
        },
    );

    m.insert(
        Language::CSharp,
        LangPatterns {
            groups: vec![
                group(
                    r"^\s*(?:public|private|protected|internal|static|async|virtual|override|\s)*[\w<>\[\],]+\s+([A-Za-z_]\w*)\s*\([^;]*\)\s*$",
                    ChunkKind::Function,
                ),
                group(
                    r"^\s*(?:public|private|protected|internal)?\s*(?:abstract\s+|sealed\s+|static\s+)?(?:class|interface|struct|enum)\s+([A-Za-z_]\w*)",
                    ChunkKind::Class,
                ),
            ],
        },
    );

    m
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_has_no_chunks() {
        let chunker = Chunker::new();
        let chunks = chunker.chunk_str("", Language::Rust, "empty.rs").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn language_without_patterns_yields_single_chunk() {
        let chunker = Chunker::new();
        let content = "# a heading\n\nsome text\nmore text\n";
        let chunks = chunker
            .chunk_str(content, Language::Markdown, "README.md")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 5);
    }

    #[test]
    fn rust_splits_on_function_boundaries() {
        let chunker = Chunker::new();
        let content = "use std::fmt;\n\nfn foo() {\n    println!(\"a\");\n}\n\nfn bar() {\n    println!(\"b\");\n}\n";
        let chunks = chunker.chunk_str(content, Language::Rust, "a.rs").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].name, "foo");
        assert_eq!(chunks[1].name, "bar");
        assert_eq!(chunks[0].kind, ChunkKind::Function);
    }

    #[test]
    fn chunk_ids_are_stable_and_unique() {
        let chunker = Chunker::new();
        let content = "fn foo() {}\nfn bar() {}\n";
        let a = chunker.chunk_str(content, Language::Rust, "x.rs").unwrap();
        let b = chunker.chunk_str(content, Language::Rust, "x.rs").unwrap();
        let ids_a: Vec<_> = a.iter().map(|c| c.id.clone()).collect();
        let ids_b: Vec<_> = b.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(ids_a.len(), ids_a.iter().collect::<std::collections::HashSet<_>>().len());
    }

    #[test]
    fn python_class_and_method_boundaries() {
        let chunker = Chunker::new();
        let content = "class Bar:\n    def method(self):\n        pass\n";
        let chunks = chunker.chunk_str(content, Language::Python, "b.py").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].kind, ChunkKind::Class);
        assert_eq!(chunks[0].name, "Bar");
        assert_eq!(chunks[1].kind, ChunkKind::Function);
        assert_eq!(chunks[1].name, "method");
    }

    #[test]
    fn anonymous_when_name_not_extracted() {
        let chunker = Chunker::new();
        // No registered patterns for Json -> one whole-file chunk, name anonymous.
        let chunks = chunker
            .chunk_str("{\"a\": 1}\n", Language::Json, "a.json")
            .unwrap();
        assert_eq!(chunks[0].name, "anonymous");
    }

    #[test]
    fn complexity_saturates_at_five() {
        let text = "if(a){} if(b){} for(;;){} for(;;){} while(true){}";
        assert_eq!(compute_complexity(text), 5);
    }

    #[test]
    fn complexity_minimum_is_one() {
        assert_eq!(compute_complexity("let x = 1;"), 1);
    }
}
