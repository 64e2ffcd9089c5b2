use crate::error::{Result, VectorStoreError};
use crate::point_id::chunk_point_id;
use context_chunker::CodeChunk;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Payload stored alongside each point. Mirrors [`CodeChunk`] minus the raw
/// embedding vector, which the store keeps in its own vector column.
pub type ChunkPayload = CodeChunk;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// One hit from [`QdrantStore::search`]: a payload plus its cosine similarity,
/// normalized into `[0, 1]` by the caller (Qdrant's cosine distance already
/// reports similarity, not distance, so this is a passthrough in practice).
#[derive(Debug, Clone)]
pub struct ScoredPayload {
    pub payload: ChunkPayload,
    pub score: f32,
}

impl Point {
    #[must_use]
    pub fn from_chunk(chunk: CodeChunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk_point_id(&chunk.id),
            vector,
            payload: chunk,
        }
    }
}

/// Adapter over a Qdrant-compatible REST API. The engine depends on exactly
/// the six operations below; nothing about collection internals leaks out.
pub struct QdrantStore {
    http: reqwest::Client,
    base_url: String,
}

impl QdrantStore {
    /// `api_key`, when set, is sent as a `api-key` header on every request,
    /// matching Qdrant's own auth convention (a bearer token would be wrong).
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = match api_key {
            Some(key) => {
                let mut headers = reqwest::header::HeaderMap::new();
                if let Ok(value) = reqwest::header::HeaderValue::from_str(&key) {
                    headers.insert("api-key", value);
                }
                reqwest::Client::builder()
                    .default_headers(headers)
                    .build()
                    .unwrap_or_default()
            }
            None => reqwest::Client::new(),
        };
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Idempotent create. No-ops if the collection already exists with a
    /// matching vector size.
    pub async fn ensure_collection(&self, name: &str, dim: usize) -> Result<()> {
        if let Some(existing_dim) = self.existing_dimension(name).await? {
            if existing_dim != dim {
                return Err(VectorStoreError::DimensionMismatch {
                    name: name.to_string(),
                    expected: dim,
                    actual: existing_dim,
                });
            }
            return Ok(());
        }

        let body = json!({
            "vectors": { "size": dim, "distance": "Cosine" }
        });
        let response = self
            .http
            .put(self.url(&format!("collections/{name}")))
            .json(&body)
            .send()
            .await?;
        ok_or_remote_error(response, name).await.map(|_| ())
    }

    async fn existing_dimension(&self, name: &str) -> Result<Option<usize>> {
        let response = self
            .http
            .get(self.url(&format!("collections/{name}")))
            .send()
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let value = ok_or_remote_error(response, name).await?;
        let size = value
            .pointer("/result/config/params/vectors/size")
            .and_then(Value::as_u64)
            .map(|s| s as usize);
        Ok(size)
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.url(&format!("collections/{name}")))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    pub async fn point_count(&self, name: &str) -> Result<u64> {
        let response = self
            .http
            .get(self.url(&format!("collections/{name}")))
            .send()
            .await?;
        let value = ok_or_remote_error(response, name).await?;
        Ok(value
            .pointer("/result/points_count")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    pub async fn upsert(&self, name: &str, points: Vec<Point>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let body = json!({ "points": points });
        let response = self
            .http
            .put(self.url(&format!("collections/{name}/points?wait=true")))
            .json(&body)
            .send()
            .await?;
        ok_or_remote_error(response, name).await.map(|_| ())
    }

    pub async fn delete_by_file_path(&self, name: &str, path: &str) -> Result<()> {
        let body = json!({
            "filter": {
                "must": [{ "key": "filePath", "match": { "value": path } }]
            }
        });
        let response = self
            .http
            .post(self.url(&format!("collections/{name}/points/delete?wait=true")))
            .json(&body)
            .send()
            .await?;
        ok_or_remote_error(response, name).await.map(|_| ())
    }

    /// Ranked nearest-neighbour search against `vector`, returning up to
    /// `limit` scored payloads. Backs the engine's `search` RPC; the
    /// incremental indexing path never calls this, only query time does.
    pub async fn search(
        &self,
        name: &str,
        vector: &[f32],
        limit: u8,
    ) -> Result<Vec<ScoredPayload>> {
        let body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
            "with_vector": false,
        });
        let response = self
            .http
            .post(self.url(&format!("collections/{name}/points/search")))
            .json(&body)
            .send()
            .await?;
        let value = ok_or_remote_error(response, name).await?;

        let hits = value
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut scored = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(payload) = hit.get("payload").cloned() else {
                continue;
            };
            let Ok(payload) = serde_json::from_value::<ChunkPayload>(payload) else {
                continue;
            };
            let score = hit.get("score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
            scored.push(ScoredPayload { payload, score });
        }
        Ok(scored)
    }

    /// Paginates the scroll endpoint collecting every distinct `filePath`,
    /// used by the reconciler and the check/repair surface.
    pub async fn distinct_file_paths(&self, name: &str) -> Result<HashSet<String>> {
        let mut paths = HashSet::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": 256,
                "with_payload": ["filePath"],
                "with_vector": false,
            });
            if let Some(o) = &offset {
                body["offset"] = o.clone();
            }

            let response = self
                .http
                .post(self.url(&format!("collections/{name}/points/scroll")))
                .json(&body)
                .send()
                .await?;
            let value = ok_or_remote_error(response, name).await?;

            let points = value
                .pointer("/result/points")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if points.is_empty() {
                break;
            }
            for point in &points {
                if let Some(path) = point.pointer("/payload/filePath").and_then(Value::as_str) {
                    paths.insert(path.to_string());
                }
            }

            offset = value.pointer("/result/next_page_offset").cloned();
            if offset.as_ref().map(Value::is_null).unwrap_or(true) {
                break;
            }
        }

        Ok(paths)
    }
}

async fn ok_or_remote_error(response: reqwest::Response, name: &str) -> Result<Value> {
    let status = response.status();
    let value: Value = response
        .json()
        .await
        .map_err(|e| VectorStoreError::Decoding(e.to_string()))?;
    if !status.is_success() {
        return Err(VectorStoreError::RemoteError {
            name: name.to_string(),
            detail: value.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_from_chunk_derives_deterministic_id() {
        let chunk = CodeChunk {
            id: "src/main.rs:1:0".to_string(),
            content: "fn main() {}".to_string(),
            kind: context_chunker::ChunkKind::Function,
            name: "main".to_string(),
            file_path: "src/main.rs".to_string(),
            start_line: 1,
            end_line: 2,
            language: "rust".to_string(),
            imports: vec![],
            complexity: 1,
        };
        let point = Point::from_chunk(chunk.clone(), vec![0.1, 0.2]);
        assert_eq!(point.id, chunk_point_id(&chunk.id));
        assert_eq!(point.vector, vec![0.1, 0.2]);
    }
}
