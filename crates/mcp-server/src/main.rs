//! Context Indexer MCP server.
//!
//! Boots the indexing engine (reconcile → initial scan → watch) as a
//! background task and exposes its `search`/`status`/`check_index`/
//! `repair_index` surface as MCP tools over stdio.
//!
//! ## Usage
//!
//! Add to an MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "context-indexer": {
//!       "command": "context-indexer-mcp",
//!       "env": {
//!         "REPO_PATH": "/absolute/path/to/repo",
//!         "VECTOR_STORE_URL": "http://localhost:6333",
//!         "EMBEDDING_API_KEY": "..."
//!       }
//!     }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use context_embedder::{Embedder, EmbedderConfig};
use context_governor::{Governor, GovernorConfig};
use context_indexer::{Config, Engine};
use context_vector_store::QdrantStore;
use rmcp::transport::io::stdio;
use rmcp::ServiceExt;
use std::env;
use std::sync::Arc;

mod service;

use service::ContextIndexerService;

fn print_help() {
    println!("Context Indexer MCP server");
    println!();
    println!("Usage: context-indexer-mcp [--version|--help]");
    println!();
    println!("Configuration is read from the environment: REPO_PATH, VECTOR_STORE_URL,");
    println!("EMBEDDING_API_KEY, and friends (see DESIGN.md for the full list).");
}

fn handle_cli_args() -> Option<i32> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        return None;
    }
    match args[0].as_str() {
        "--version" | "-V" => {
            println!("context-indexer-mcp {}", env!("CARGO_PKG_VERSION"));
            Some(0)
        }
        "--help" | "-h" => {
            print_help();
            Some(0)
        }
        _ => {
            eprintln!("Unknown arguments: {}", args.join(" "));
            print_help();
            Some(2)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Some(exit_code) = handle_cli_args() {
        std::process::exit(exit_code);
    }

    // stdout is reserved for the JSON-RPC protocol; all logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    log::info!("starting context indexer for {}", config.repo_path.display());

    let governor = Arc::new(Governor::new(GovernorConfig::default()));
    let embedder_config = EmbedderConfig {
        base_url: config.embedding_base_url.clone(),
        api_key: config.embedding_api_key.clone(),
        model: config.embedding_model.clone(),
        dimension: config.embedding_dimension,
        batch_size: config.batch_size,
    };
    let embedder = Embedder::new(embedder_config, Arc::clone(&governor));
    let store = QdrantStore::new(config.vector_store_url.clone(), config.vector_store_api_key.clone());

    let engine = Engine::new(config, governor, embedder, store).await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine_for_loop = Arc::clone(&engine);
    let engine_task = tokio::spawn(async move {
        if let Err(e) = engine_for_loop.run(shutdown_rx).await {
            log::error!("engine loop exited with error: {e}");
        }
    });

    let service = ContextIndexerService::new(Arc::clone(&engine));
    let server = service.serve(stdio()).await.context("failed to start MCP server")?;

    server.waiting().await.context("MCP server loop failed")?;

    let _ = shutdown_tx.send(true);
    let _ = engine_task.await;

    log::info!("context indexer MCP server stopped");
    Ok(())
}
