use crate::error::{EmbedderError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An attempt either produced vectors, was throttled (429/5xx/timeout — counts
/// against backoff), or was rejected outright (4xx other than 429, malformed
/// payload — does not warrant a retry-with-backoff).
pub enum AttemptOutcome {
    Ok(Vec<EmbeddingRow>),
    Throttled(String),
    Rejected(String),
}

pub struct EmbeddingRow {
    pub embedding: Vec<f32>,
    pub index: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client with static TLS config always builds");
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    /// POST `{base_url}/embeddings` with an OpenAI-compatible request body.
    /// Returns the actual reported token usage alongside the outcome so the
    /// caller can correct the governor's token window.
    pub async fn embed(&self, inputs: &[String]) -> (AttemptOutcome, u32) {
        let body = EmbedRequest {
            model: &self.model,
            input: inputs,
        };

        let response = match self
            .http
            .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return (AttemptOutcome::Throttled(format!("request timed out: {e}")), 0)
            }
            Err(e) => return (AttemptOutcome::Rejected(format!("transport error: {e}")), 0),
        };

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return (AttemptOutcome::Throttled(text), 0);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return (AttemptOutcome::Rejected(format!("{status}: {text}")), 0);
        }

        let parsed: EmbedResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                return (
                    AttemptOutcome::Rejected(format!("malformed response body: {e}")),
                    0,
                )
            }
        };

        let tokens = parsed.usage.map_or(0, |u| u.total_tokens);
        let rows = parsed
            .data
            .into_iter()
            .map(|d| EmbeddingRow {
                embedding: d.embedding,
                index: d.index,
            })
            .collect();
        (AttemptOutcome::Ok(rows), tokens)
    }
}

pub fn validate_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(EmbedderError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}
