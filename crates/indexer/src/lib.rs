//! Incremental state machine: persisted per-file metadata, the scanner that
//! diffs the working tree against it, the reconciler that heals divergence
//! from the vector store on startup, the debounced watcher, and the engine
//! work loop that ties chunker, embedder, and vector store together.

mod config;
mod engine;
mod error;
mod reconciler;
mod scanner;
mod state;
mod watcher;

pub use config::Config;
pub use engine::{Engine, EngineState};
pub use error::{IndexerError, Result};
pub use reconciler::{ReconcileAction, Reconciler};
pub use scanner::{ScanEntry, ScanOutcome, Scanner, WorkItem};
pub use state::{
    now_ms, DailyQuota, FileMetadata, FileStatus, IncrementalState, ScanStats, StateStore,
};
pub use watcher::{WatchEvent, Watcher, WatcherGuard};
