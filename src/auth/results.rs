//! User record types
//!
//! Defines the metadata persisted for each user.

use serde::{Deserialize, Serialize};

/// Storage limit applied when none is given: 1 GiB.
pub const DEFAULT_STORAGE_LIMIT_BYTES: u64 = 1024 * 1024 * 1024;

/// Persisted user metadata. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_storage_limit")]
    pub storage_limit_bytes: u64,
}

fn default_storage_limit() -> u64 {
    DEFAULT_STORAGE_LIMIT_BYTES
}
