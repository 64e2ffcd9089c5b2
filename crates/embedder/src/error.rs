use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbedderError>;

#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embedding response decoding failed: {0}")]
    Decoding(String),

    #[error(
        "embedding dimension mismatch: provider returned {actual}, configured dimension is {expected}"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding provider rejected the request: {0}")]
    Rejected(String),
}
