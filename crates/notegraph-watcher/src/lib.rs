//! Notegraph Watcher - content item sources
//!
//! Loads item snapshots from a JSON file or a directory of notes, and
//! watches a notes directory for changes, emitting a fresh snapshot after
//! each burst of filesystem activity.

pub mod loader;
pub mod watcher;

pub use loader::{DEFAULT_NOTE_PATTERNS, LoadError, NoteLoader, ParsedNote, load_items, parse_note};
pub use watcher::{NotesWatcher, Snapshot, WatchEvent, WatcherConfig};
