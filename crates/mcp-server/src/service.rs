//! The engine's four RPC operations, exposed as MCP tools. This module is a
//! thin adapter: every method below validates nothing itself and performs no
//! indexing logic of its own, it only shapes `Engine` results into
//! `CallToolResult`s. The transport/dispatch machinery (framing, JSON-RPC
//! envelopes, tool listing) is `rmcp`'s, not ours.

use context_indexer::Engine;
use context_protocol::{CheckIndexRequest, RepairIndexRequest, SearchRequest, StatusRequest};
use rmcp::handler::server::tool::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::sync::Arc;

#[derive(Clone)]
pub struct ContextIndexerService {
    engine: Arc<Engine>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

#[tool_router]
impl ContextIndexerService {
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Semantic search over the indexed repository. Returns ranked code \
                           snippets with file path, line range, language, and score.")]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.engine.search(&request).await {
            Ok(hits) => Ok(success_json(&hits)),
            Err(e) => Ok(error_json(&e)),
        }
    }

    #[tool(description = "Report indexing status: queue sizes, point count, quota usage, \
                           per-category file counts, and recent errors.")]
    async fn status(
        &self,
        Parameters(request): Parameters<StatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let report = self.engine.status(request.verbose).await;
        Ok(success_json(&report))
    }

    #[tool(description = "Compare the working tree against the vector collection and report \
                           missing files and orphaned payloads.")]
    async fn check_index(
        &self,
        Parameters(request): Parameters<CheckIndexRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.engine.check_index(&request).await {
            Ok(report) => Ok(success_json(&report)),
            Err(e) => Ok(error_json(&e)),
        }
    }

    #[tool(description = "Plan or apply fixes for missing files and orphaned vectors found by \
                           check_index. Requires the engine to be idle when autoFix is true.")]
    async fn repair_index(
        &self,
        Parameters(request): Parameters<RepairIndexRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.engine.repair_index(&request).await {
            Ok(response) => Ok(success_json(&response)),
            Err(e) => Ok(error_json(&e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for ContextIndexerService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "context-indexer-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Indexes a source repository into a semantic vector collection and exposes \
                 search/status/check_index/repair_index. Indexing runs continuously in the \
                 background; these tools only read its state or request repairs."
                    .to_string(),
            ),
        }
    }
}

/// Structured errors never cross the transport boundary as thrown exceptions;
/// every RPC failure becomes ordinary tool-result JSON instead.
fn error_json(error: &context_protocol::ProtocolError) -> CallToolResult {
    let body = serde_json::json!({ "error": error.to_string() });
    CallToolResult::success(vec![Content::text(body.to_string())])
}

fn success_json<T: serde::Serialize>(value: &T) -> CallToolResult {
    let body = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    CallToolResult::success(vec![Content::text(body)])
}
