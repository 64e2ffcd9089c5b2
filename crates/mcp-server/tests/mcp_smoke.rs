use anyhow::{Context, Result};
use rmcp::{service::ServiceExt, transport::TokioChildProcess};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

fn locate_context_indexer_mcp_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_context-indexer-mcp") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("context-indexer-mcp");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir
        .ancestors()
        .nth(2)
        .context("failed to resolve repo root from CARGO_MANIFEST_DIR")?;
    for rel in [
        "target/debug/context-indexer-mcp",
        "target/release/context-indexer-mcp",
    ] {
        let candidate = repo_root.join(rel);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!("failed to locate context-indexer-mcp binary")
}

/// The indexer engine reconciles against the vector store and begins an
/// initial scan as soon as it boots, in the background, but tool listing
/// doesn't wait on either: it should resolve even when the configured
/// store and embedding endpoints are unreachable.
#[tokio::test]
async fn mcp_exposes_the_four_tools() -> Result<()> {
    let bin = locate_context_indexer_mcp_bin()?;

    let tmp = tempfile::tempdir().context("tempdir")?;
    let root = tmp.path();
    std::fs::create_dir_all(root.join("src")).context("mkdir src")?;
    std::fs::write(
        root.join("src").join("main.rs"),
        "fn main() { println!(\"hi\"); }\n",
    )
    .context("write main.rs")?;

    let mut cmd = Command::new(bin);
    cmd.env("REPO_PATH", root.to_string_lossy().to_string());
    cmd.env(
        "INDEX_STATE_PATH",
        root.join("index-metadata.json").to_string_lossy().to_string(),
    );
    cmd.env("VECTOR_STORE_URL", "http://127.0.0.1:1");
    cmd.env("EMBEDDING_API_KEY", "test-key");
    cmd.env("WATCH_MODE", "false");
    cmd.env("RUST_LOG", "error");

    let transport = TokioChildProcess::new(cmd).context("spawn mcp server")?;
    let service = tokio::time::timeout(Duration::from_secs(10), ().serve(transport))
        .await
        .context("timeout starting MCP server")??;

    let tools = tokio::time::timeout(
        Duration::from_secs(10),
        service.list_tools(Default::default()),
    )
    .await
    .context("timeout listing tools")??;

    let tool_names: HashSet<&str> = tools.tools.iter().map(|t| t.name.as_ref()).collect();
    for expected in ["search", "status", "check_index", "repair_index"] {
        assert!(
            tool_names.contains(expected),
            "missing tool '{expected}' (available: {tool_names:?})"
        );
    }

    service.cancel().await.context("shutdown mcp service")?;
    Ok(())
}
