//! tenantfs - tenant-isolated file storage
//!
//! Root-confined file and directory operations with streaming I/O, change
//! notification for watchers, and a directory-backed per-tenant user store.

pub mod auth;
pub mod config;
pub mod error;
pub mod storage;
pub mod utils;
pub mod watch;

pub use auth::{Argon2Hasher, PasswordHasher, UserRecord, UserStore};
pub use error::{StorageError, UserStoreError};
pub use storage::{FileReader, FileStore, FileWriter, PathComparison, PathResolver, WriteMode};
pub use watch::{ChangeType, FileSystemChangeEvent, FileSystemWatcher, WatcherRegistry};
