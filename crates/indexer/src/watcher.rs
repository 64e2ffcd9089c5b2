use context_chunker::{PathClass, PathFilter};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcherTrait};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant as TokioInstant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(String),
    Removed(String),
}

impl WatchEvent {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Changed(p) | Self::Removed(p) => p,
        }
    }
}

/// Debounced filesystem change feed. Observes the repo tree after the initial
/// scan completes; directory events are implicitly ignored because directory
/// paths never classify as `PathClass::Source`. Symlinks are not followed
/// (the underlying `notify` backend watches inodes, not link targets) and
/// hidden files are excluded by the shared path filter.
pub struct Watcher {
    repo_root: PathBuf,
    path_filter: PathFilter,
    debounce: Duration,
}

impl Watcher {
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>, path_filter: PathFilter, debounce: Duration) -> Self {
        Self {
            repo_root: repo_root.into(),
            path_filter,
            debounce,
        }
    }

    /// Starts the OS-level watch and a debounce task, returning a channel of
    /// coalesced, filter-eligible events. The returned guard must be kept
    /// alive for the watch to continue; dropping it stops the feed.
    pub fn spawn(self) -> (WatcherGuard, mpsc::Receiver<WatchEvent>) {
        let (out_tx, out_rx) = mpsc::channel(1024);
        let (raw_tx, raw_rx) = std_mpsc::channel::<notify::Result<Event>>();

        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = raw_tx.send(res);
            },
            NotifyConfig::default(),
        )
        .expect("failed to initialize filesystem watcher backend");

        let mut watcher = watcher;
        if let Err(e) = watcher.watch(&self.repo_root, RecursiveMode::Recursive) {
            log::error!(
                "watcher: failed to watch {}: {e}",
                self.repo_root.display()
            );
        }

        let repo_root = self.repo_root.clone();
        let path_filter = self.path_filter.clone();
        let (classified_tx, mut classified_rx) = mpsc::channel::<ClassifiedEvent>(1024);

        std::thread::spawn(move || {
            while let Ok(result) = raw_rx.recv() {
                let Ok(event) = result else { continue };
                for classified in classify(&event, &repo_root, &path_filter) {
                    if classified_tx.blocking_send(classified).is_err() {
                        return;
                    }
                }
            }
        });

        let debounce = self.debounce;
        tokio::spawn(async move {
            let mut deadlines: HashMap<String, (Instant, bool)> = HashMap::new();

            loop {
                let next_deadline = deadlines.values().map(|(d, _)| *d).min();

                tokio::select! {
                    maybe_event = classified_rx.recv() => {
                        match maybe_event {
                            Some(ClassifiedEvent { path, removed }) => {
                                deadlines.insert(path, (Instant::now() + debounce, removed));
                            }
                            None => break,
                        }
                    }
                    () = sleep_until(TokioInstant::from_std(
                        next_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600))
                    )), if next_deadline.is_some() => {
                        let now = Instant::now();
                        let ready: Vec<String> = deadlines
                            .iter()
                            .filter(|(_, (deadline, _))| *deadline <= now)
                            .map(|(path, _)| path.clone())
                            .collect();
                        for path in ready {
                            if let Some((_, removed)) = deadlines.remove(&path) {
                                let event = if removed {
                                    WatchEvent::Removed(path)
                                } else {
                                    WatchEvent::Changed(path)
                                };
                                if out_tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        });

        (WatcherGuard { _watcher: watcher }, out_rx)
    }
}

/// Keeps the OS watch alive for as long as the caller holds it.
pub struct WatcherGuard {
    _watcher: RecommendedWatcher,
}

struct ClassifiedEvent {
    path: String,
    removed: bool,
}

fn classify(event: &Event, repo_root: &std::path::Path, filter: &PathFilter) -> Vec<ClassifiedEvent> {
    let removed = matches!(event.kind, EventKind::Remove(_));
    let is_relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    if !is_relevant {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter_map(|path| {
            let relative = path.strip_prefix(repo_root).ok()?;
            match filter.classify(relative) {
                PathClass::Source(_) => Some(ClassifiedEvent {
                    path: relative.to_string_lossy().replace('\\', "/"),
                    removed,
                }),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_modify_are_not_removed() {
        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Any));
        assert!(!matches!(event.kind, EventKind::Remove(_)));
    }

    #[test]
    fn watch_event_path_accessor() {
        let changed = WatchEvent::Changed("a.rs".to_string());
        let removed = WatchEvent::Removed("b.rs".to_string());
        assert_eq!(changed.path(), "a.rs");
        assert_eq!(removed.path(), "b.rs");
    }
}
