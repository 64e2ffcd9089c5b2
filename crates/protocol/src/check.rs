use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckIndexRequest {
    #[serde(default)]
    pub deep_scan: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// In the tree, not in the vector collection.
    pub missing_files: Vec<String>,
    /// In the vector collection, not in the tree.
    pub orphaned_payloads: Vec<String>,
    pub coverage_percentage: f32,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.missing_files.is_empty() && self.orphaned_payloads.is_empty()
    }
}
