use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("vector store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vector store response decoding failed: {0}")]
    Decoding(String),

    #[error("collection {name} expects dimension {expected}, got {actual}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("vector store returned an error for collection {name}: {detail}")]
    RemoteError { name: String, detail: String },
}
