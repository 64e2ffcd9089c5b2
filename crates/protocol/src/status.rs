use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueueSizes {
    pub pending: usize,
    pub in_flight: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub requests_per_minute_used: u32,
    pub requests_per_minute_limit: u32,
    pub tokens_per_minute_used: u32,
    pub tokens_per_minute_limit: u32,
    pub requests_per_day_used: u32,
    pub requests_per_day_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub new_files: u32,
    pub modified_files: u32,
    pub unchanged_files: u32,
    pub deleted_files: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub file_path: String,
    pub error: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub files_per_second: f32,
    pub average_chunk_embed_ms: f32,
    pub last_scan_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub indexing: bool,
    pub queue_sizes: QueueSizes,
    pub point_count: u64,
    pub storage_estimate_bytes: u64,
    pub quota: QuotaUsage,
    pub daily_quota_date: String,
    pub daily_chunks_indexed: u32,
    pub daily_chunk_limit: u32,
    pub category_counts: CategoryCounts,
    /// Last 10, most recent first.
    pub recent_errors: Vec<ErrorRecord>,
    pub performance: PerformanceMetrics,
}
