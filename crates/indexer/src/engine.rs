use crate::config::Config;
use crate::error::{IndexerError, Result};
use crate::reconciler::Reconciler;
use crate::scanner::{Scanner, WorkItem};
use crate::state::{now_ms, FileMetadata, FileStatus, IncrementalState};
use crate::watcher::{WatchEvent, Watcher};
use context_chunker::{Chunker, PathFilter};
use context_embedder::Embedder;
use context_governor::Governor;
use context_protocol::{
    CategoryCounts, CheckIndexRequest, ErrorRecord, HealthReport, PerformanceMetrics, QueueSizes,
    QuotaUsage, RepairIndexRequest, RepairIndexResponse, RepairIssue, RepairPlan, SearchHit,
    SearchRequest, StatusReport,
};
use context_vector_store::{Point, QdrantStore};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};

const PREVIEW_CHAR_CAP: usize = 240;

/// Truncates chunk content to a bounded preview for the search RPC response.
fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHAR_CAP {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(PREVIEW_CHAR_CAP).collect();
    truncated.push('\u{2026}');
    truncated
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Booting,
    Reconciling,
    InitialScanning,
    Indexing,
    Watching,
    ShuttingDown,
}

const DEFAULT_CHECKPOINT_EVERY: u32 = 10;
const MAX_RECENT_ERRORS: usize = 10;

/// Orchestrates scanner → chunker → embedder (behind the governor) → vector
/// store + state store, owning the single work queue and is-indexing flag
/// the whole engine state machine hangs off of.
pub struct Engine {
    config: Config,
    chunker: Chunker,
    scanner: Scanner,
    governor: Arc<Governor>,
    embedder: Embedder,
    store: QdrantStore,
    state_store: crate::state::StateStore,
    state: Mutex<IncrementalState>,
    in_flight: Mutex<HashSet<String>>,
    recent_errors: Mutex<VecDeque<ErrorRecord>>,
    is_indexing: AtomicBool,
    phase: Mutex<EngineState>,
    chunks_since_checkpoint: AtomicU32,
    last_scan_duration_ms: AtomicU64,
}

impl Engine {
    pub async fn new(config: Config, governor: Arc<Governor>, embedder: Embedder, store: QdrantStore) -> Arc<Self> {
        let path_filter = PathFilter::new(&config.extra_ignore_tokens);
        let scanner = Scanner::new(config.repo_path.clone(), path_filter);
        let state_store = crate::state::StateStore::new(config.index_state_path.clone());
        let daily_limit = governor.config().requests_per_day;
        let mut state = state_store.load(daily_limit).await;
        state.daily_quota.limit = daily_limit;

        Arc::new(Self {
            config,
            chunker: Chunker::new(),
            scanner,
            governor,
            embedder,
            store,
            state_store,
            state: Mutex::new(state),
            in_flight: Mutex::new(HashSet::new()),
            recent_errors: Mutex::new(VecDeque::new()),
            is_indexing: AtomicBool::new(false),
            phase: Mutex::new(EngineState::Booting),
            chunks_since_checkpoint: AtomicU32::new(0),
            last_scan_duration_ms: AtomicU64::new(0),
        })
    }

    async fn set_phase(&self, phase: EngineState) {
        *self.phase.lock().await = phase;
    }

    /// Runs the full Booting → Reconciling → InitialScanning → Indexing →
    /// Watching state machine until `shutdown` fires.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.set_phase(EngineState::Reconciling).await;
        {
            let mut state = self.state.lock().await;
            let reconciler = Reconciler::new(&self.store, &self.config.vector_collection);
            match reconciler
                .reconcile(&mut state, self.embedder.dimension())
                .await
            {
                Ok(action) => log::info!("reconciler: {action:?}"),
                Err(e) => log::error!("reconciler: failed to reconcile, proceeding as-is: {e}"),
            }
        }

        self.set_phase(EngineState::InitialScanning).await;
        let (work_tx, mut work_rx) = mpsc::unbounded_channel::<WorkItem>();
        self.run_scan_pass(&work_tx).await;

        self.set_phase(EngineState::Indexing).await;
        self.drain_until_empty(&mut work_rx).await;
        self.checkpoint().await?;

        if !self.config.watch_mode {
            let _ = shutdown.changed().await;
            self.set_phase(EngineState::ShuttingDown).await;
            self.checkpoint().await?;
            return Ok(());
        }

        self.set_phase(EngineState::Watching).await;
        let watcher = Watcher::new(
            self.config.repo_path.clone(),
            PathFilter::new(&self.config.extra_ignore_tokens),
            Duration::from_millis(500),
        );
        let (guard, mut watch_rx) = watcher.spawn();

        let bridge_tx = work_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = watch_rx.recv().await {
                let item = match event {
                    WatchEvent::Changed(path) => WorkItem::Update(path),
                    WatchEvent::Removed(path) => WorkItem::Delete(path),
                };
                if bridge_tx.send(item).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                item = work_rx.recv() => {
                    match item {
                        Some(item) => {
                            self.is_indexing.store(true, Ordering::SeqCst);
                            self.process_item(item).await;
                            if work_rx.is_empty() {
                                self.is_indexing.store(false, Ordering::SeqCst);
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        drop(guard);
        self.set_phase(EngineState::ShuttingDown).await;
        self.checkpoint().await?;
        Ok(())
    }

    async fn run_scan_pass(&self, work_tx: &mpsc::UnboundedSender<WorkItem>) {
        let started = Instant::now();
        let outcome = {
            let state = self.state.lock().await;
            self.scanner.scan(&state)
        };

        {
            let mut state = self.state.lock().await;
            state.stats = outcome.stats.clone();
            state.total_files = (state.indexed_files.len() as u32)
                .saturating_add(outcome.stats.new_files)
                .saturating_add(outcome.stats.modified_files);
            state.touch();
        }

        for item in outcome.priority_order() {
            let _ = work_tx.send(item);
        }

        self.last_scan_duration_ms
            .store(started.elapsed().as_millis() as u64, Ordering::SeqCst);
    }

    async fn drain_until_empty(&self, work_rx: &mut mpsc::UnboundedReceiver<WorkItem>) {
        self.is_indexing.store(true, Ordering::SeqCst);
        while let Ok(item) = work_rx.try_recv() {
            self.process_item(item).await;
        }
        self.is_indexing.store(false, Ordering::SeqCst);
    }

    /// The per-file hot path: steps 1-8 of the engine's work loop.
    async fn process_item(&self, item: WorkItem) {
        let path = item.path().to_string();

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight.contains(&path) {
                return;
            }
            in_flight.insert(path.clone());
        }

        match item {
            WorkItem::Delete(path) => self.process_delete(&path).await,
            WorkItem::Update(path) => self.process_update(&path).await,
        }

        self.in_flight.lock().await.remove(&path);
    }

    async fn process_update(&self, path: &str) {
        {
            let mut state = self.state.lock().await;
            if state.daily_quota.roll_if_needed() {
                let drained: Vec<String> = state.pending_queue.drain(..).collect();
                drop(state);
                for p in drained {
                    Box::pin(self.process_update(&p)).await;
                }
                state = self.state.lock().await;
            }
            if state.daily_quota.is_exhausted() {
                state.pending_queue.push(path.to_string());
                return;
            }
        }

        let _ = self
            .store
            .delete_by_file_path(&self.config.vector_collection, path)
            .await;

        let Some(entry) = self.scanner.rescan_one(path) else {
            self.record_error(path, "file disappeared before it could be read").await;
            return;
        };

        let chunks = match self.chunker.chunk_file(&entry.absolute_path, path) {
            Ok(chunks) => chunks,
            Err(e) => {
                self.record_error(path, &e.to_string()).await;
                self.mark_failed(path, &entry.hash).await;
                return;
            }
        };

        if chunks.is_empty() {
            self.mark_indexed(path, &entry.hash, 0).await;
            return;
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await;

        let mut points = Vec::new();
        let mut failures = 0usize;
        for (chunk, vector) in chunks.into_iter().zip(vectors.into_iter()) {
            match vector {
                Some(v) => points.push(Point::from_chunk(chunk, v)),
                None => failures += 1,
            }
        }

        if points.is_empty() {
            self.record_error(path, "every chunk failed to embed").await;
            self.mark_failed(path, &entry.hash).await;
            return;
        }

        let chunk_count = points.len() as u32;
        if let Err(e) = self
            .store
            .upsert(&self.config.vector_collection, points)
            .await
        {
            self.record_error(path, &format!("upsert failed: {e}")).await;
        }

        if failures > 0 {
            log::warn!("{path}: {failures} chunk(s) failed to embed, indexed the rest");
        }

        self.mark_indexed(path, &entry.hash, chunk_count).await;
    }

    async fn process_delete(&self, path: &str) {
        let _ = self
            .store
            .delete_by_file_path(&self.config.vector_collection, path)
            .await;
        let mut state = self.state.lock().await;
        state.indexed_files.remove(path);
        state.stats.deleted_files += 1;
        state.touch();
    }

    async fn mark_indexed(&self, path: &str, hash: &str, chunk_count: u32) {
        let mut state = self.state.lock().await;
        state.indexed_files.insert(
            path.to_string(),
            FileMetadata {
                path: path.to_string(),
                hash: hash.to_string(),
                last_indexed: now_ms(),
                chunk_count,
                status: FileStatus::Indexed,
            },
        );
        state.daily_quota.chunks_indexed += chunk_count;
        state.touch();
        drop(state);

        let total = self
            .chunks_since_checkpoint
            .fetch_add(chunk_count.max(1), Ordering::SeqCst)
            + chunk_count.max(1);
        if total >= DEFAULT_CHECKPOINT_EVERY {
            self.chunks_since_checkpoint.store(0, Ordering::SeqCst);
            let _ = self.checkpoint().await;
        }
    }

    async fn mark_failed(&self, path: &str, prior_hash: &str) {
        let mut state = self.state.lock().await;
        let entry = state
            .indexed_files
            .entry(path.to_string())
            .or_insert_with(|| FileMetadata {
                path: path.to_string(),
                hash: prior_hash.to_string(),
                last_indexed: now_ms(),
                chunk_count: 0,
                status: FileStatus::Failed,
            });
        entry.status = FileStatus::Failed;
        state.touch();
    }

    async fn record_error(&self, path: &str, error: &str) {
        let mut errors = self.recent_errors.lock().await;
        if errors.len() >= MAX_RECENT_ERRORS {
            errors.pop_back();
        }
        errors.push_front(ErrorRecord {
            file_path: path.to_string(),
            error: error.to_string(),
            timestamp: now_ms(),
        });
    }

    pub async fn checkpoint(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.state_store.save(&state).await.map_err(IndexerError::from)
    }

    // --- RPC surface -------------------------------------------------

    pub async fn search(&self, request: &SearchRequest) -> context_protocol::Result<Vec<SearchHit>> {
        request.validate()?;

        let query_vector = self.embedder.embed_query(&request.query).await.map_err(|e| {
            context_protocol::ProtocolError::TransientIo {
                message: e.to_string(),
            }
        })?;

        let hits = self
            .store
            .search(&self.config.vector_collection, &query_vector, request.limit)
            .await
            .map_err(|e| context_protocol::ProtocolError::TransientIo {
                message: e.to_string(),
            })?;

        Ok(hits
            .into_iter()
            .map(|hit| SearchHit {
                file_path: hit.payload.file_path,
                name: hit.payload.name,
                start_line: hit.payload.start_line,
                end_line: hit.payload.end_line,
                language: hit.payload.language,
                score: hit.score.clamp(0.0, 1.0),
                content_preview: preview(&hit.payload.content),
            })
            .collect())
    }

    pub async fn status(&self, verbose: bool) -> StatusReport {
        let state = self.state.lock().await;
        let point_count = self
            .store
            .point_count(&self.config.vector_collection)
            .await
            .unwrap_or(0);
        let daily_remaining = self.governor.daily_remaining_requests().await;
        let governor_config = self.governor.config();

        let recent_errors = if verbose {
            self.recent_errors.lock().await.iter().cloned().collect()
        } else {
            Vec::new()
        };

        StatusReport {
            indexing: self.is_indexing.load(Ordering::SeqCst),
            queue_sizes: QueueSizes {
                pending: state.pending_queue.len(),
                in_flight: self.in_flight.lock().await.len(),
            },
            point_count,
            storage_estimate_bytes: point_count.saturating_mul(1536),
            quota: QuotaUsage {
                requests_per_minute_used: 0,
                requests_per_minute_limit: governor_config.requests_per_minute,
                tokens_per_minute_used: 0,
                tokens_per_minute_limit: governor_config.tokens_per_minute,
                requests_per_day_used: governor_config.requests_per_day.saturating_sub(daily_remaining),
                requests_per_day_limit: governor_config.requests_per_day,
            },
            daily_quota_date: state.daily_quota.date.clone(),
            daily_chunks_indexed: state.daily_quota.chunks_indexed,
            daily_chunk_limit: state.daily_quota.limit,
            category_counts: CategoryCounts {
                new_files: state.stats.new_files,
                modified_files: state.stats.modified_files,
                unchanged_files: state.stats.unchanged_files,
                deleted_files: state.stats.deleted_files,
            },
            recent_errors,
            performance: PerformanceMetrics {
                files_per_second: 0.0,
                average_chunk_embed_ms: 0.0,
                last_scan_duration_ms: self.last_scan_duration_ms.load(Ordering::SeqCst),
            },
        }
    }

    pub async fn check_index(&self, _request: &CheckIndexRequest) -> context_protocol::Result<HealthReport> {
        let state = self.state.lock().await;
        let tracked: HashSet<String> = state.indexed_files.keys().cloned().collect();
        drop(state);

        let collection_paths = self
            .store
            .distinct_file_paths(&self.config.vector_collection)
            .await
            .map_err(|e| context_protocol::ProtocolError::VectorStoreCorruption {
                message: e.to_string(),
            })?;

        let missing_files: Vec<String> = tracked.difference(&collection_paths).cloned().collect();
        let orphaned_payloads: Vec<String> = collection_paths.difference(&tracked).cloned().collect();
        let coverage_percentage = if tracked.is_empty() {
            100.0
        } else {
            100.0 * (tracked.len() - missing_files.len()) as f32 / tracked.len() as f32
        };

        Ok(HealthReport {
            missing_files,
            orphaned_payloads,
            coverage_percentage,
        })
    }

    pub async fn repair_index(
        &self,
        request: &RepairIndexRequest,
    ) -> context_protocol::Result<RepairIndexResponse> {
        if self.is_indexing.load(Ordering::SeqCst) {
            return Err(context_protocol::ProtocolError::Validation {
                message: "repair_index requires the engine to be idle".to_string(),
            });
        }

        let health = self
            .check_index(&CheckIndexRequest { deep_scan: false })
            .await?;
        let issues = request.issues_or_default();

        let will_enqueue = if issues.contains(&RepairIssue::MissingFiles) {
            health.missing_files.clone()
        } else {
            Vec::new()
        };
        let will_delete = if issues.contains(&RepairIssue::OrphanedVectors) {
            health.orphaned_payloads.clone()
        } else {
            Vec::new()
        };

        let plan = RepairPlan {
            will_enqueue: will_enqueue.clone(),
            will_delete: will_delete.clone(),
        };

        if !request.auto_fix {
            return Ok(RepairIndexResponse {
                plan,
                applied: false,
            });
        }

        for path in &will_delete {
            let _ = self
                .store
                .delete_by_file_path(&self.config.vector_collection, path)
                .await;
        }
        for path in &will_enqueue {
            Box::pin(self.process_update(path)).await;
        }

        Ok(RepairIndexResponse { plan, applied: true })
    }
}
