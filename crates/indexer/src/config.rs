use crate::error::{IndexerError, Result};
use context_chunker::PathFilter;
use std::env;
use std::path::PathBuf;

/// Engine configuration, read once at boot from environment variables.
/// Missing required keys or an invalid value is a fatal configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo_path: PathBuf,
    pub index_state_path: PathBuf,
    pub vector_store_url: String,
    pub vector_store_api_key: Option<String>,
    pub vector_collection: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub embedding_base_url: String,
    pub embedding_dimension: usize,
    pub watch_mode: bool,
    pub batch_size: usize,
    pub extra_ignore_tokens: Vec<String>,
}

impl Config {
    /// Parses the process environment. This is the only place the engine
    /// reads `std::env` directly.
    pub fn from_env() -> Result<Self> {
        let repo_path = require("REPO_PATH")?;
        let repo_path = PathBuf::from(repo_path);
        if !repo_path.is_absolute() {
            return Err(IndexerError::Configuration(format!(
                "REPO_PATH must be absolute, got {}",
                repo_path.display()
            )));
        }

        let index_state_path = optional("INDEX_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./memory/index-metadata.json"));

        let vector_store_url = require("VECTOR_STORE_URL")?;
        let vector_store_api_key = optional("VECTOR_STORE_API_KEY");
        let vector_collection = optional("VECTOR_COLLECTION").unwrap_or_else(|| "codebase".to_string());

        let embedding_api_key = require("EMBEDDING_API_KEY")?;
        let embedding_model =
            optional("EMBEDDING_MODEL").unwrap_or_else(|| "text-embedding-3-small".to_string());
        let embedding_base_url =
            optional("EMBEDDING_BASE_URL").unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let embedding_dimension = optional("EMBEDDING_DIMENSION")
            .map(|v| parse_usize("EMBEDDING_DIMENSION", &v))
            .transpose()?
            .unwrap_or(768);

        let watch_mode = optional("WATCH_MODE")
            .map(|v| parse_bool("WATCH_MODE", &v))
            .transpose()?
            .unwrap_or(true);

        let batch_size = optional("BATCH_SIZE")
            .map(|v| parse_usize("BATCH_SIZE", &v))
            .transpose()?
            .unwrap_or(25);

        let extra_ignore_tokens = optional("IGNORE_PATHS")
            .map(|csv| PathFilter::extra_tokens_from_csv(&csv))
            .unwrap_or_default();

        Ok(Self {
            repo_path,
            index_state_path,
            vector_store_url,
            vector_store_api_key,
            vector_collection,
            embedding_api_key,
            embedding_model,
            embedding_base_url,
            embedding_dimension,
            watch_mode,
            batch_size,
            extra_ignore_tokens,
        })
    }
}

fn require(key: &str) -> Result<String> {
    env::var(key).map_err(|_| IndexerError::Configuration(format!("missing required env var {key}")))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(IndexerError::Configuration(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| IndexerError::Configuration(format!("{key} must be a positive integer, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("WATCH_MODE", "true").unwrap());
        assert!(parse_bool("WATCH_MODE", "1").unwrap());
        assert!(!parse_bool("WATCH_MODE", "false").unwrap());
        assert!(parse_bool("WATCH_MODE", "garbage").is_err());
    }

    #[test]
    fn parse_usize_rejects_non_numeric() {
        assert!(parse_usize("BATCH_SIZE", "25").is_ok());
        assert!(parse_usize("BATCH_SIZE", "abc").is_err());
    }
}
