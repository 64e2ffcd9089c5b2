use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunker error: {0}")]
    Chunker(#[from] context_chunker::ChunkerError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] context_vector_store::VectorStoreError),

    #[error("governor error: {0}")]
    Governor(#[from] context_governor::GovernorError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("repair requested while the engine is not idle")]
    EngineBusy,

    #[error("{0}")]
    Other(String),
}
