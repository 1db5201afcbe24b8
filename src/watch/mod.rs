//! Change notification
//!
//! Event types and the watcher registry notified by storage mutations.

pub mod event;
pub mod registry;

pub use event::{ChangeType, FileSystemChangeEvent};
pub use registry::{FileSystemWatcher, WatcherError, WatcherRegistration, WatcherRegistry};
