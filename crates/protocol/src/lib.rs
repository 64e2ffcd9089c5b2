//! Request/response types for the indexer's four RPC operations, plus the
//! structured error taxonomy the transport layer exposes instead of
//! exceptions (§7).

mod check;
mod error;
mod repair;
mod search;
mod status;

pub use check::{CheckIndexRequest, HealthReport};
pub use error::{ProtocolError, Result};
pub use repair::{RepairIndexRequest, RepairIndexResponse, RepairIssue, RepairPlan};
pub use search::{SearchHit, SearchRequest};
pub use status::{
    CategoryCounts, ErrorRecord, PerformanceMetrics, QueueSizes, QuotaUsage, StatusReport,
    StatusRequest,
};
