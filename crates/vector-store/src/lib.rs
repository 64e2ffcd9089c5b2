//! Qdrant-compatible vector store adapter. The engine depends on exactly six
//! operations: `ensure_collection`, `collection_exists`, `point_count`,
//! `upsert`, `delete_by_file_path`, and `distinct_file_paths`.

mod error;
mod point_id;
mod store;

pub use error::{Result, VectorStoreError};
pub use point_id::chunk_point_id;
pub use store::{ChunkPayload, Point, QdrantStore, ScoredPayload};
