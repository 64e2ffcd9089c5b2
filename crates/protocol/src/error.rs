use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Design-level error taxonomy (§7). Every RPC operation returns this as data,
/// never as a thrown exception across the transport boundary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProtocolError {
    /// Missing required env, dimension mismatch, bad `REPO_PATH`. Fatal at boot.
    Configuration { message: String },
    /// Filesystem read error, network blip. Retried once upstream of this layer.
    TransientIo { message: String },
    /// 429 from the embedder, daily cap reached. Never surfaced as fatal.
    Quota { message: String },
    /// A chunk rejected by the provider or malformed content.
    PerChunkEmbedding { file_path: String, message: String },
    /// Collection present but zero points vs. non-empty state.
    VectorStoreCorruption { message: String },
    /// State file unreadable and unparseable even after backup.
    Unrecoverable { message: String },
    /// Request failed input validation (e.g. `limit` outside `[1, 20]`).
    Validation { message: String },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message }
            | Self::TransientIo { message }
            | Self::Quota { message }
            | Self::VectorStoreCorruption { message }
            | Self::Unrecoverable { message }
            | Self::Validation { message } => write!(f, "{message}"),
            Self::PerChunkEmbedding { file_path, message } => {
                write!(f, "{file_path}: {message}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

pub type Result<T> = std::result::Result<T, ProtocolError>;
