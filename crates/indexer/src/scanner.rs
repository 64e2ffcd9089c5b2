use crate::state::{IncrementalState, ScanStats};
use context_chunker::{content_hash, PathClass, PathFilter};
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub hash: String,
}

/// The four disjoint sets a scan pass produces, plus the stats block the
/// state store persists for the run.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub new_files: Vec<ScanEntry>,
    pub modified_files: Vec<ScanEntry>,
    pub unchanged_paths: Vec<String>,
    pub deleted_paths: Vec<String>,
    pub stats: ScanStats,
}

impl ScanOutcome {
    /// New and modified first in discovery order, deleted last, matching the
    /// engine's priority policy (unchanged files never get queued). Carries
    /// only paths: the engine re-reads and re-hashes at dequeue time so a
    /// watch-triggered event always sees the file's latest content rather
    /// than whatever it looked like when it was enqueued.
    #[must_use]
    pub fn priority_order(&self) -> Vec<WorkItem> {
        let mut items = Vec::with_capacity(self.new_files.len() + self.modified_files.len());
        for entry in &self.new_files {
            items.push(WorkItem::Update(entry.relative_path.clone()));
        }
        for entry in &self.modified_files {
            items.push(WorkItem::Update(entry.relative_path.clone()));
        }
        for path in &self.deleted_paths {
            items.push(WorkItem::Delete(path.clone()));
        }
        items
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Update(String),
    Delete(String),
}

impl WorkItem {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Update(path) | Self::Delete(path) => path,
        }
    }
}

pub struct Scanner {
    repo_root: PathBuf,
    path_filter: PathFilter,
}

impl Scanner {
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>, path_filter: PathFilter) -> Self {
        Self {
            repo_root: repo_root.into(),
            path_filter,
        }
    }

    /// Walks the tree respecting gitignore rules and the path filter, hashes
    /// every source-classified file, and diffs against `state.indexed_files`
    /// to produce new/modified/unchanged/deleted sets.
    pub fn scan(&self, state: &IncrementalState) -> ScanOutcome {
        let mut seen: HashMap<String, String> = HashMap::new();

        let walker = WalkBuilder::new(&self.repo_root)
            .follow_links(false)
            .hidden(true)
            .standard_filters(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.repo_root) else {
                continue;
            };
            if !matches!(self.path_filter.classify(relative), PathClass::Source(_)) {
                continue;
            }

            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            let hash = content_hash(&bytes);
            seen.insert(relative.to_string_lossy().replace('\\', "/"), hash);
        }

        self.categorize(state, seen)
    }

    fn categorize(
        &self,
        state: &IncrementalState,
        seen: HashMap<String, String>,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for (relative_path, hash) in &seen {
            match state.indexed_files.get(relative_path) {
                None => {
                    outcome.new_files.push(ScanEntry {
                        relative_path: relative_path.clone(),
                        absolute_path: self.repo_root.join(relative_path),
                        hash: hash.clone(),
                    });
                    outcome.stats.new_files += 1;
                }
                Some(meta) if &meta.hash != hash => {
                    outcome.modified_files.push(ScanEntry {
                        relative_path: relative_path.clone(),
                        absolute_path: self.repo_root.join(relative_path),
                        hash: hash.clone(),
                    });
                    outcome.stats.modified_files += 1;
                }
                Some(_) => {
                    outcome.unchanged_paths.push(relative_path.clone());
                    outcome.stats.unchanged_files += 1;
                }
            }
        }

        for path in state.indexed_files.keys() {
            if !seen.contains_key(path) {
                outcome.deleted_paths.push(path.clone());
            }
        }

        outcome
    }

    /// Single-file rehash used by the watcher's per-event path, bypassing a
    /// full tree walk.
    pub fn rescan_one(&self, relative_path: &str) -> Option<ScanEntry> {
        let absolute = self.repo_root.join(relative_path);
        let bytes = std::fs::read(&absolute).ok()?;
        Some(ScanEntry {
            relative_path: relative_path.to_string(),
            absolute_path: absolute,
            hash: content_hash(&bytes),
        })
    }

    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FileMetadata, FileStatus};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn categorizes_new_modified_unchanged_deleted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", "fn a() {}");
        write(&dir, "b.rs", "fn b() {}");

        let mut state = IncrementalState::new(10_000);
        state.indexed_files.insert(
            "b.rs".to_string(),
            FileMetadata {
                path: "b.rs".to_string(),
                hash: "stale-hash".to_string(),
                last_indexed: 0,
                chunk_count: 1,
                status: FileStatus::Indexed,
            },
        );
        state.indexed_files.insert(
            "c.rs".to_string(),
            FileMetadata {
                path: "c.rs".to_string(),
                hash: "whatever".to_string(),
                last_indexed: 0,
                chunk_count: 1,
                status: FileStatus::Indexed,
            },
        );

        let scanner = Scanner::new(dir.path(), PathFilter::new(&[]));
        let outcome = scanner.scan(&state);

        assert_eq!(outcome.new_files.len(), 1);
        assert_eq!(outcome.new_files[0].relative_path, "a.rs");
        assert_eq!(outcome.modified_files.len(), 1);
        assert_eq!(outcome.modified_files[0].relative_path, "b.rs");
        assert_eq!(outcome.deleted_paths, vec!["c.rs".to_string()]);
    }

    #[test]
    fn unchanged_file_is_ignored_not_queued() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", "fn a() {}");
        let hash = context_chunker::content_hash(b"fn a() {}");

        let mut state = IncrementalState::new(10_000);
        state.indexed_files.insert(
            "a.rs".to_string(),
            FileMetadata {
                path: "a.rs".to_string(),
                hash,
                last_indexed: 0,
                chunk_count: 1,
                status: FileStatus::Indexed,
            },
        );

        let scanner = Scanner::new(dir.path(), PathFilter::new(&[]));
        let outcome = scanner.scan(&state);
        assert!(outcome.new_files.is_empty());
        assert!(outcome.modified_files.is_empty());
        assert_eq!(outcome.unchanged_paths, vec!["a.rs".to_string()]);
        assert!(outcome.priority_order().is_empty());
    }

    #[test]
    fn ignored_directories_are_excluded() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        write(
            &dir,
            "node_modules/pkg.js",
            "module.exports = {}",
        );
        write(&dir, "index.js", "console.log(1)");

        let scanner = Scanner::new(dir.path(), PathFilter::new(&[]));
        let state = IncrementalState::new(10_000);
        let outcome = scanner.scan(&state);
        assert_eq!(outcome.new_files.len(), 1);
        assert_eq!(outcome.new_files[0].relative_path, "index.js");
    }
}
