//! Watch mode: file watching, change batching and build event reporting.

pub mod events;
pub mod watcher;

pub use events::{EventDispatcher, WatchEvent, events_for};
pub use watcher::{DEFAULT_DEBOUNCE, FileChange, FileWatcher, next_batch};
