//! Filesystem watcher for a notes directory

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use notegraph_core::ContentItem;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::loader::{DEFAULT_NOTE_PATTERNS, LoadError, NoteLoader};

/// Events emitted by the file watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File or directory created or modified
    Changed(PathBuf),
    /// File or directory removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Changed(p) | WatchEvent::Removed(p) => p,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Silence required after the last event before a snapshot is taken.
    pub quiet_period: Duration,
    pub patterns: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(300),
            patterns: DEFAULT_NOTE_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// A full reload of the notes directory.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// 0 for the initial load, then one per batch of changes.
    pub sequence: u64,
    pub items: Vec<ContentItem>,
    /// Paths whose events triggered this snapshot.
    pub changed: Vec<PathBuf>,
}

/// Watches a notes directory and reloads it after bursts of changes.
///
/// Events are coalesced: the first relevant event opens a batch, which stays
/// open until `quiet_period` passes without another one.
pub struct NotesWatcher {
    // dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    loader: NoteLoader,
    config: WatcherConfig,
    sequence: u64,
}

impl NotesWatcher {
    /// Start watching `root` recursively.
    pub fn new(root: impl AsRef<Path>, config: WatcherConfig) -> Result<Self, LoadError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(LoadError::NotFound(root));
        }
        let loader = NoteLoader::new(root.clone(), config.patterns.as_slice())?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let filter = loader.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                debug!("File system event: {:?}", event);
                handle_notify_event(event, &filter, &event_tx);
            }
            Err(e) => {
                error!("File system watch error: {}", e);
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!("Watching notes directory: {}", root.display());

        Ok(Self {
            _watcher: watcher,
            event_rx,
            loader,
            config,
            sequence: 0,
        })
    }

    pub fn root(&self) -> &Path {
        self.loader.root()
    }

    /// Load the directory as it is now.
    pub fn snapshot(&self) -> Result<Snapshot, LoadError> {
        Ok(Snapshot {
            sequence: self.sequence,
            items: self.loader.load()?,
            changed: Vec::new(),
        })
    }

    /// Wait for the next batch of changes. `None` once the watcher is gone.
    pub async fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
        let first = self.event_rx.recv().await?;
        let mut paths = BTreeSet::from([first.path().to_path_buf()]);

        loop {
            match timeout(self.config.quiet_period, self.event_rx.recv()).await {
                Ok(Some(event)) => {
                    paths.insert(event.path().to_path_buf());
                }
                // channel closed: flush what we have
                Ok(None) => break,
                // quiet period elapsed
                Err(_) => break,
            }
        }

        debug!("Coalesced {} changed paths", paths.len());
        Some(paths.into_iter().collect())
    }

    /// Wait for a batch of changes and reload the directory.
    pub async fn next_snapshot(&mut self) -> Option<Result<Snapshot, LoadError>> {
        let changed = self.next_batch().await?;
        self.sequence += 1;
        let sequence = self.sequence;
        Some(self.loader.load().map(|items| {
            info!(sequence, items = items.len(), changed = changed.len(), "Reloaded notes");
            Snapshot {
                sequence,
                items,
                changed,
            }
        }))
    }
}

/// Convert a notify event into watch events for relevant paths.
fn handle_notify_event(event: notify::Event, loader: &NoteLoader, event_tx: &mpsc::UnboundedSender<WatchEvent>) {
    let removed = match event.kind {
        notify::EventKind::Create(_) | notify::EventKind::Modify(_) => false,
        notify::EventKind::Remove(_) => true,
        _ => return,
    };
    for path in event.paths {
        if !is_relevant(&path, loader) {
            continue;
        }
        let event = if removed {
            WatchEvent::Removed(path)
        } else {
            WatchEvent::Changed(path)
        };
        if let Err(e) = event_tx.send(event) {
            warn!("Failed to send watch event: {}", e);
        }
    }
}

/// Notes and folders under the root, excluding hidden entries.
fn is_relevant(path: &Path, loader: &NoteLoader) -> bool {
    let Ok(relative) = path.strip_prefix(loader.root()) else {
        return false;
    };
    let hidden = relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    });
    if hidden {
        return false;
    }
    // removed directories can no longer be stat'ed; extensionless paths count
    loader.is_note(path) || path.is_dir() || path.extension().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn loader(root: &Path) -> NoteLoader {
        NoteLoader::with_defaults(root).unwrap()
    }

    #[test]
    fn test_relevance_filter() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let loader = loader(root);
        assert!(is_relevant(&root.join("a.md"), &loader));
        assert!(is_relevant(&root.join("projects"), &loader));
        assert!(!is_relevant(&root.join("image.png"), &loader));
        assert!(!is_relevant(&root.join(".obsidian/workspace.md"), &loader));
        assert!(!is_relevant(Path::new("/elsewhere/a.md"), &loader));
    }

    #[test]
    fn test_notify_events_are_translated() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let loader = loader(root);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let event = notify::Event::new(notify::EventKind::Remove(notify::event::RemoveKind::File))
            .add_path(root.join("gone.md"))
            .add_path(root.join("skip.png"));
        handle_notify_event(event, &loader, &tx);

        assert_eq!(rx.try_recv().unwrap(), WatchEvent::Removed(root.join("gone.md")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = NotesWatcher::new(dir.path().join("missing"), WatcherConfig::default());
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_initial_snapshot() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "#tag").unwrap();
        let watcher = NotesWatcher::new(dir.path(), WatcherConfig::default()).unwrap();
        let snapshot = watcher.snapshot().unwrap();
        assert_eq!(snapshot.sequence, 0);
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.changed.is_empty());
    }
}
