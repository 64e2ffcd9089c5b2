use crate::client::{validate_dimension, AttemptOutcome, EmbeddingClient};
use crate::error::{EmbedderError, Result};
use context_governor::{Governor, Outcome};
use std::sync::Arc;

pub type Vector = Vec<f32>;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Fixed per run; mismatch with an existing collection is a fatal
    /// configuration error, checked by the caller at startup.
    pub dimension: usize,
    pub batch_size: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimension: 768,
            batch_size: 25,
        }
    }
}

/// Governed embedding client: every remote call goes through a shared
/// [`Governor`] reservation, so callers never need to reason about quotas.
/// Cheap to clone: the HTTP client and governor handle are both reference-
/// counted internally, which is what lets `embed_batch` fan a batch out
/// across `tokio::spawn` tasks.
#[derive(Clone)]
pub struct Embedder {
    client: EmbeddingClient,
    governor: Arc<Governor>,
    config: EmbedderConfig,
}

impl Embedder {
    #[must_use]
    pub fn new(config: EmbedderConfig, governor: Arc<Governor>) -> Self {
        let client = EmbeddingClient::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.model.clone(),
        );
        Self {
            client,
            governor,
            config,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Single governed call.
    pub async fn embed_query(&self, text: &str) -> Result<Vector> {
        let inputs = vec![text.to_string()];
        let results = self.embed_with_retries(&inputs).await;
        results
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| EmbedderError::Rejected("embedding failed after retries".to_string()))
    }

    /// Launches each chunk under its own reservation in parallel, rather than
    /// one multi-item remote call, so a single bad chunk cannot poison the
    /// whole batch. `None` marks a per-chunk failure after exhausting retries.
    /// Chunks are fanned out `config.batch_size` at a time: the caller may
    /// hand in a whole file's worth of chunks without blowing past the
    /// configured parallel-reservation ceiling.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Option<Vector>> {
        let batch_size = self.config.batch_size.max(1);
        let mut results = Vec::with_capacity(texts.len());

        for group in texts.chunks(batch_size) {
            let handles: Vec<_> = group
                .iter()
                .map(|text| {
                    let embedder = self.clone();
                    let input = vec![text.clone()];
                    tokio::spawn(async move {
                        embedder
                            .embed_with_retries(&input)
                            .await
                            .into_iter()
                            .next()
                            .flatten()
                    })
                })
                .collect();

            for handle in handles {
                results.push(handle.await.unwrap_or_else(|e| {
                    log::warn!("embedder: batch task panicked: {e}");
                    None
                }));
            }
        }

        results
    }

    async fn embed_with_retries(&self, inputs: &[String]) -> Vec<Option<Vector>> {
        let estimated_tokens = estimate_tokens(inputs);

        for attempt in 0..MAX_RETRIES {
            let permit = match self.governor.reserve(inputs.len() as u32, estimated_tokens).await
            {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("embedder: reservation denied: {e}");
                    return vec![None; inputs.len()];
                }
            };

            let (outcome, actual_tokens) = self.client.embed(inputs).await;

            match outcome {
                AttemptOutcome::Ok(rows) => {
                    self.governor.release(permit, actual_tokens, Outcome::Ok).await;
                    let mut out = vec![None; inputs.len()];
                    for row in rows {
                        if row.index < out.len() {
                            if validate_dimension(&row.embedding, self.config.dimension).is_ok() {
                                out[row.index] = Some(row.embedding);
                            } else {
                                log::warn!(
                                    "embedder: dropping vector with unexpected dimension {}",
                                    row.embedding.len()
                                );
                            }
                        }
                    }
                    return out;
                }
                AttemptOutcome::Throttled(reason) => {
                    self.governor
                        .release(permit, actual_tokens, Outcome::RateLimited)
                        .await;
                    log::warn!(
                        "embedder: throttled on attempt {}/{MAX_RETRIES}: {reason}",
                        attempt + 1
                    );
                    continue;
                }
                AttemptOutcome::Rejected(reason) => {
                    self.governor.release(permit, actual_tokens, Outcome::Failed).await;
                    log::warn!("embedder: rejected, not retrying: {reason}");
                    return vec![None; inputs.len()];
                }
            }
        }

        vec![None; inputs.len()]
    }
}

/// Rough token estimate (~4 bytes/token) used only to size the governor's
/// token-window reservation before the provider reports real usage.
fn estimate_tokens(inputs: &[String]) -> u32 {
    let total_bytes: usize = inputs.iter().map(String::len).sum();
    ((total_bytes / 4).max(1)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_is_at_least_one() {
        assert_eq!(estimate_tokens(&["".to_string()]), 1);
        assert_eq!(estimate_tokens(&["abcd".to_string()]), 1);
        assert_eq!(estimate_tokens(&["a".repeat(400)]), 100);
    }
}
