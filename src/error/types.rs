//! Error types
//!
//! Defines domain-specific error types for each module of the storage core.

use std::io;

/// Storage module errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Path security violation: {0}")]
    PathSecurityViolation(String),
    #[error("Absolute path not allowed: {0}")]
    AbsolutePathNotAllowed(String),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),
    #[error("Unsupported write mode: {0}")]
    UnsupportedWriteMode(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("Invalid salt: {0}")]
    InvalidSalt(String),
    #[error("Hashing failed: {0}")]
    Failed(String),
}

/// User store errors
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("Invalid tenant: {0:?}")]
    InvalidTenant(String),
    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),
    #[error("Password must not be blank")]
    BlankPassword,
    #[error("User already exists: {0}")]
    AlreadyExists(String),
    #[error("Password hashing failed: {0}")]
    Hash(#[from] HashError),
    #[error("Metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts_into_storage_error() {
        let err: StorageError = io::Error::new(io::ErrorKind::Other, "disk on fire").into();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(err.to_string(), "IO error: disk on fire");
    }

    #[test]
    fn test_storage_error_messages_carry_path() {
        let err = StorageError::PathSecurityViolation("../secret".into());
        assert_eq!(err.to_string(), "Path security violation: ../secret");

        let err = StorageError::DirectoryNotEmpty("docs".into());
        assert_eq!(err.to_string(), "Directory not empty: docs");
    }

    #[test]
    fn test_hash_error_converts_into_user_store_error() {
        let err: UserStoreError = HashError::Failed("boom".into()).into();
        assert!(matches!(err, UserStoreError::Hash(_)));
    }
}
