//! File discovery, language classification, and structural chunking.
//!
//! Pipeline: [`PathFilter`] decides whether a repo-relative path is watched at
//! all, [`content_hash`] decides whether its content changed since the last
//! pass, and [`Chunker`] carves unchanged-but-new-to-the-index content into
//! [`CodeChunk`]s for embedding.

mod chunker;
mod contextual_imports;
mod error;
mod hasher;
mod language;
mod path_filter;

pub use chunker::{ChunkKind, Chunker, CodeChunk};
pub use contextual_imports::extract_imports;
pub use error::{ChunkerError, Result};
pub use hasher::content_hash;
pub use language::Language;
pub use path_filter::{PathClass, PathFilter, DEFAULT_IGNORE_TOKENS};
