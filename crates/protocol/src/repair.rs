use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RepairIssue {
    MissingFiles,
    OrphanedVectors,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairIndexRequest {
    /// Defaults to both issue kinds when omitted.
    pub issues: Option<Vec<RepairIssue>>,
    #[serde(default)]
    pub auto_fix: bool,
}

impl RepairIndexRequest {
    #[must_use]
    pub fn issues_or_default(&self) -> Vec<RepairIssue> {
        self.issues
            .clone()
            .unwrap_or_else(|| vec![RepairIssue::MissingFiles, RepairIssue::OrphanedVectors])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepairPlan {
    pub will_enqueue: Vec<String>,
    pub will_delete: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepairIndexResponse {
    pub plan: RepairPlan,
    /// True when `autoFix` actually ran the plan rather than only computing it.
    pub applied: bool,
}
