//! File watcher for the documents directory. Re-scans when files change.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use notify_debouncer_mini::notify;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};

use crate::documents::{scan_documents, Document, ScanError};

const DEBOUNCE: Duration = Duration::from_millis(400);

/// Watches `root` and calls `on_change` with a fresh scan whenever files change (debounced).
/// Blocks until `stop` receives a message or its sender is dropped.
/// Returns Ok when stopped, Err on setup failure.
pub fn watch_documents(
    root: &Path,
    stop: mpsc::Receiver<()>,
    on_change: impl Fn(Result<Vec<Document>, ScanError>) + Send + 'static,
) -> Result<(), WatchError> {
    if !root.is_dir() {
        return Err(WatchError::NotADirectory(root.to_path_buf()));
    }
    let root = root.canonicalize().map_err(WatchError::Canonicalize)?;
    let root_for_callback = root.clone();

    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(events) => {
            tracing::debug!(events = events.len(), "documents changed");
            on_change(scan_documents(&root_for_callback));
        }
        Err(e) => tracing::warn!(error = %e, "watcher error"),
    })
    .map_err(|e| WatchError::Notify(e.to_string()))?;

    debouncer
        .watcher()
        .watch(&root, notify::RecursiveMode::NonRecursive)
        .map_err(|e| WatchError::Watch(e.to_string()))?;
    tracing::info!(root = %root.display(), "watching documents");

    stop.recv().ok();
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("not a directory: {0}")]
    NotADirectory(std::path::PathBuf),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("watcher init: {0}")]
    Notify(String),
    #[error("watch failed: {0}")]
    Watch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (_tx, rx) = mpsc::channel();
        let err = watch_documents(&dir.path().join("missing"), rx, |_| {}).unwrap_err();
        assert!(matches!(err, WatchError::NotADirectory(_)));
    }

    #[test]
    fn returns_when_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        assert!(watch_documents(dir.path(), rx, |_| {}).is_ok());
    }
}
