//! Change event types
//!
//! Events emitted by mutating storage operations and delivered to registered
//! watchers.

use std::fmt;

/// Kind of change observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
    FileAdded,
    FileDeleted,
    DirectoryAdded,
    DirectoryDeleted,
}

/// A single change produced by one mutating storage call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSystemChangeEvent {
    pub change_type: ChangeType,
    /// Path exactly as the caller supplied it, before resolution.
    pub affected_path: String,
}

impl FileSystemChangeEvent {
    pub fn new(change_type: ChangeType, affected_path: impl Into<String>) -> Self {
        Self {
            change_type,
            affected_path: affected_path.into(),
        }
    }

    pub fn file_added(path: impl Into<String>) -> Self {
        Self::new(ChangeType::FileAdded, path)
    }

    pub fn file_deleted(path: impl Into<String>) -> Self {
        Self::new(ChangeType::FileDeleted, path)
    }

    pub fn directory_added(path: impl Into<String>) -> Self {
        Self::new(ChangeType::DirectoryAdded, path)
    }

    pub fn directory_deleted(path: impl Into<String>) -> Self {
        Self::new(ChangeType::DirectoryDeleted, path)
    }
}

impl fmt::Display for FileSystemChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.change_type, self.affected_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_change_type() {
        assert_eq!(
            FileSystemChangeEvent::file_added("a").change_type,
            ChangeType::FileAdded
        );
        assert_eq!(
            FileSystemChangeEvent::file_deleted("a").change_type,
            ChangeType::FileDeleted
        );
        assert_eq!(
            FileSystemChangeEvent::directory_added("a").change_type,
            ChangeType::DirectoryAdded
        );
        assert_eq!(
            FileSystemChangeEvent::directory_deleted("a").change_type,
            ChangeType::DirectoryDeleted
        );
    }

    #[test]
    fn test_display() {
        let event = FileSystemChangeEvent::file_added("docs/x.txt");
        assert_eq!(event.to_string(), "FileAdded docs/x.txt");
    }
}
