use crate::error::{ProtocolError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u8,
}

const fn default_limit() -> u8 {
    10
}

impl SearchRequest {
    /// Validates `limit ∈ [1, 20]` and a non-empty query.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(ProtocolError::Validation {
                message: "query must not be empty".to_string(),
            });
        }
        if !(1..=20).contains(&self.limit) {
            return Err(ProtocolError::Validation {
                message: format!("limit must be in [1, 20], got {}", self.limit),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub file_path: String,
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub language: String,
    /// Cosine similarity, normalized into `[0, 1]`.
    pub score: f32,
    pub content_preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_query() {
        let req = SearchRequest {
            query: "   ".to_string(),
            limit: 5,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_limit_out_of_range() {
        let req = SearchRequest {
            query: "parse config".to_string(),
            limit: 21,
        };
        assert!(req.validate().is_err());

        let req = SearchRequest {
            query: "parse config".to_string(),
            limit: 0,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn accepts_valid_request() {
        let req = SearchRequest {
            query: "parse config".to_string(),
            limit: 20,
        };
        assert!(req.validate().is_ok());
    }
}
