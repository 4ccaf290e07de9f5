//! Recursive file watcher for the package root.
//!
//! Changes inside `node_modules`, hidden paths and the build's own output
//! directories are dropped before they reach the channel.

use crate::error::{CliError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Quiet period that closes a batch of changes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    fn from_event(kind: &EventKind, path: PathBuf) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path)),
            EventKind::Modify(_) => Some(FileChange::Modified(path)),
            EventKind::Remove(_) => Some(FileChange::Removed(path)),
            _ => None,
        }
    }
}

/// Keeps the notify watcher alive; changes arrive on the receiver returned
/// by [`FileWatcher::new`].
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Watch `root` recursively, skipping anything under `ignored_dirs`.
    pub fn new(
        root: PathBuf,
        ignored_dirs: Vec<PathBuf>,
    ) -> Result<(Self, mpsc::Receiver<notify::Result<FileChange>>)> {
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(256);
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    let _ = tx.blocking_send(Err(err));
                    return;
                }
            };

            for path in event.paths {
                if should_ignore(&path, &filter_root, &ignored_dirs) {
                    continue;
                }
                if let Some(change) = FileChange::from_event(&event.kind, path) {
                    // Receiver gone means the loop has stopped
                    if tx.blocking_send(Ok(change)).is_err() {
                        return;
                    }
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "file watcher started");

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    /// Get the root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Whether a change at `path` should not trigger a rebuild.
pub(crate) fn should_ignore(path: &Path, root: &Path, ignored_dirs: &[PathBuf]) -> bool {
    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };

    if ignored_dirs.iter().any(|dir| path.starts_with(dir)) {
        return true;
    }

    rel_path.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name == "node_modules" || name.starts_with('.')
        }
        _ => false,
    })
}

/// Wait for the next batch of changes.
///
/// Blocks until one change arrives, then keeps collecting until `window`
/// passes without a new one. Returns `None` once the watcher is gone.
pub async fn next_batch(
    rx: &mut mpsc::Receiver<notify::Result<FileChange>>,
    window: Duration,
) -> Option<notify::Result<Vec<FileChange>>> {
    let first = match rx.recv().await? {
        Ok(change) => change,
        Err(err) => return Some(Err(err)),
    };

    let mut batch = vec![first];
    loop {
        match tokio::time::timeout(window, rx.recv()).await {
            Ok(Some(Ok(change))) => {
                if !batch.contains(&change) {
                    batch.push(change);
                }
            }
            Ok(Some(Err(err))) => return Some(Err(err)),
            // Channel closed or quiet period elapsed
            Ok(None) | Err(_) => break,
        }
    }

    Some(Ok(batch))
}
