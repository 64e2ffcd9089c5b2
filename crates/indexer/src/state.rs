use crate::error::Result;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const STATE_FORMAT_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Indexed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub path: String,
    pub hash: String,
    pub last_indexed: i64,
    pub chunk_count: u32,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuota {
    pub date: String,
    pub chunks_indexed: u32,
    pub limit: u32,
}

impl DailyQuota {
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            date: today_utc(),
            chunks_indexed: 0,
            limit,
        }
    }

    /// Rolls the counter over at the UTC day boundary. Returns `true` if a
    /// rollover happened, signaling the caller to drain `pendingQueue`.
    pub fn roll_if_needed(&mut self) -> bool {
        let today = today_utc();
        if self.date != today {
            self.date = today;
            self.chunks_indexed = 0;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.chunks_indexed >= self.limit
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub new_files: u32,
    pub modified_files: u32,
    pub unchanged_files: u32,
    pub deleted_files: u32,
}

/// The singleton persisted document. Unknown top-level keys are preserved
/// verbatim across a rewrite so forward-compatible fields round-trip even
/// though this binary doesn't understand them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncrementalState {
    pub version: String,
    pub last_updated: i64,
    pub total_files: u32,
    pub indexed_files: HashMap<String, FileMetadata>,
    pub pending_queue: Vec<String>,
    pub daily_quota: DailyQuota,
    pub stats: ScanStats,
    #[serde(flatten)]
    pub unknown_fields: serde_json::Map<String, serde_json::Value>,
}

impl IncrementalState {
    #[must_use]
    pub fn new(daily_limit: u32) -> Self {
        Self {
            version: STATE_FORMAT_VERSION.to_string(),
            last_updated: now_ms(),
            total_files: 0,
            indexed_files: HashMap::new(),
            pending_queue: Vec::new(),
            daily_quota: DailyQuota::new(daily_limit),
            stats: ScanStats::default(),
            unknown_fields: serde_json::Map::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = now_ms();
    }
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn today_utc() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Atomic whole-document store backed by a single JSON file. Readers tolerate
/// an absent file (first run) and a malformed one (backed up, start fresh).
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self, daily_limit: u32) -> IncrementalState {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<IncrementalState>(&bytes) {
                Ok(mut state) => {
                    state.daily_quota.roll_if_needed();
                    state
                }
                Err(e) => {
                    log::warn!(
                        "state store: {} is malformed ({e}), backing up and starting fresh",
                        self.path.display()
                    );
                    self.backup_corrupt().await;
                    IncrementalState::new(daily_limit)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                IncrementalState::new(daily_limit)
            }
            Err(e) => {
                log::warn!(
                    "state store: failed to read {} ({e}), starting fresh",
                    self.path.display()
                );
                IncrementalState::new(daily_limit)
            }
        }
    }

    async fn backup_corrupt(&self) {
        let backup = self.path.with_extension("json.corrupt");
        if let Err(e) = tokio::fs::copy(&self.path, &backup).await {
            log::warn!("state store: failed to back up corrupt state file: {e}");
        }
    }

    /// Write to a sibling temporary path, then rename, per the atomic-write
    /// contract all checkpoints rely on.
    pub async fn save(&self, state: &IncrementalState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_absent_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("index-metadata.json"));
        let state = store.load(10_000).await;
        assert_eq!(state.version, STATE_FORMAT_VERSION);
        assert!(state.indexed_files.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index-metadata.json");
        let store = StateStore::new(&path);
        let mut state = IncrementalState::new(10_000);
        state.indexed_files.insert(
            "src/main.rs".to_string(),
            FileMetadata {
                path: "src/main.rs".to_string(),
                hash: "abc123".to_string(),
                last_indexed: now_ms(),
                chunk_count: 3,
                status: FileStatus::Indexed,
            },
        );
        store.save(&state).await.unwrap();

        let loaded = store.load(10_000).await;
        assert_eq!(loaded.indexed_files.len(), 1);
        assert_eq!(loaded.indexed_files["src/main.rs"].chunk_count, 3);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn malformed_file_is_backed_up_and_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index-metadata.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = StateStore::new(&path);

        let state = store.load(10_000).await;
        assert!(state.indexed_files.is_empty());
        assert!(path.with_extension("json.corrupt").exists());
    }

    #[test]
    fn unknown_top_level_keys_are_preserved() {
        let raw = serde_json::json!({
            "version": "1",
            "lastUpdated": 0,
            "totalFiles": 0,
            "indexedFiles": {},
            "pendingQueue": [],
            "dailyQuota": {"date": "2026-01-01", "chunksIndexed": 0, "limit": 100},
            "stats": {"newFiles": 0, "modifiedFiles": 0, "unchangedFiles": 0, "deletedFiles": 0},
            "futureFeatureFlag": true
        });
        let state: IncrementalState = serde_json::from_value(raw).unwrap();
        assert_eq!(
            state.unknown_fields.get("futureFeatureFlag"),
            Some(&serde_json::Value::Bool(true))
        );

        let roundtripped = serde_json::to_value(&state).unwrap();
        assert_eq!(roundtripped["futureFeatureFlag"], serde_json::json!(true));
    }

    #[test]
    fn daily_quota_rolls_over_on_new_day() {
        let mut quota = DailyQuota {
            date: "2020-01-01".to_string(),
            chunks_indexed: 50,
            limit: 100,
        };
        assert!(quota.roll_if_needed());
        assert_eq!(quota.chunks_indexed, 0);
        assert_ne!(quota.date, "2020-01-01");
    }
}
