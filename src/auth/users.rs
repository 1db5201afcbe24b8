//! Tenant user store
//!
//! Persists one metadata record per user under `root/<tenant>/<username>/`,
//! next to the user's `files/` directory:
//!
//! ```text
//! root/
//! └── acme/             tenant
//!     └── alice/        user directory
//!         ├── user.json metadata record
//!         └── files/    user content
//! ```
//!
//! Paths here are built internally from validated usernames and do not go
//! through the `FileStore` resolver.

use log::{debug, error, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::hasher::PasswordHasher;
use super::results::{DEFAULT_STORAGE_LIMIT_BYTES, UserRecord};
use super::validator::is_valid_username;
use crate::error::UserStoreError;

pub const METADATA_FILE_NAME: &str = "user.json";
pub const FILES_DIR_NAME: &str = "files";

/// Directory-backed user records for a single tenant.
#[derive(Clone)]
pub struct UserStore {
    tenant_dir: PathBuf,
    metadata_file_name: String,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserStore {
    /// Create a store for `tenant_id` under `root`.
    pub fn new(
        root: impl AsRef<Path>,
        tenant_id: &str,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, UserStoreError> {
        if !is_valid_username(tenant_id) {
            return Err(UserStoreError::InvalidTenant(tenant_id.to_string()));
        }
        Ok(Self {
            tenant_dir: root.as_ref().join(tenant_id),
            metadata_file_name: METADATA_FILE_NAME.to_string(),
            hasher,
        })
    }

    /// Use a different metadata file name inside each user directory.
    pub fn with_metadata_file_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_file_name = name.into();
        self
    }

    pub fn tenant_dir(&self) -> &Path {
        &self.tenant_dir
    }

    /// Directory holding the user's files, or `None` for an invalid username.
    pub fn user_files_dir(&self, username: &str) -> Option<PathBuf> {
        is_valid_username(username).then(|| self.user_dir(username).join(FILES_DIR_NAME))
    }

    fn user_dir(&self, username: &str) -> PathBuf {
        self.tenant_dir.join(username)
    }

    fn metadata_path(&self, username: &str) -> PathBuf {
        self.user_dir(username).join(&self.metadata_file_name)
    }

    /// Load a user's record.
    ///
    /// Invalid usernames, missing directories, missing metadata and metadata
    /// that fails to parse all read as "no such user".
    pub async fn lookup(&self, username: &str) -> Option<UserRecord> {
        if !is_valid_username(username) {
            return None;
        }

        let path = self.metadata_path(username);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to read user metadata {}: {e}", path.display());
                }
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Unreadable user metadata {}: {e}", path.display());
                None
            }
        }
    }

    /// Create a user, reporting only success or failure.
    ///
    /// `storage_limit_bytes` defaults to 1 GiB. Failures are logged with their
    /// cause and collapsed to `false`.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
        storage_limit_bytes: Option<u64>,
    ) -> bool {
        match self
            .try_create(username, password, is_admin, storage_limit_bytes)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to create user {username:?}: {e}");
                false
            }
        }
    }

    /// Create a user atomically with respect to other creators.
    ///
    /// The user directory is created non-recursively, so exactly one of any
    /// racing creators succeeds and the rest get
    /// [`UserStoreError::AlreadyExists`].
    pub async fn try_create(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
        storage_limit_bytes: Option<u64>,
    ) -> Result<UserRecord, UserStoreError> {
        if !is_valid_username(username) {
            return Err(UserStoreError::InvalidUsername(username.to_string()));
        }
        if password.trim().is_empty() {
            return Err(UserStoreError::BlankPassword);
        }

        fs::create_dir_all(&self.tenant_dir).await?;

        let user_dir = self.user_dir(username);
        if let Err(e) = fs::create_dir(&user_dir).await {
            return Err(match e.kind() {
                io::ErrorKind::AlreadyExists => UserStoreError::AlreadyExists(username.to_string()),
                _ => e.into(),
            });
        }

        let result = self
            .populate(username, password, is_admin, storage_limit_bytes)
            .await;

        if result.is_err() {
            // Best effort: free the name so a retry is possible.
            if let Err(e) = fs::remove_dir_all(&user_dir).await {
                warn!(
                    "Could not remove partial user directory {}: {e}",
                    user_dir.display()
                );
            }
        }
        result
    }

    async fn populate(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
        storage_limit_bytes: Option<u64>,
    ) -> Result<UserRecord, UserStoreError> {
        fs::create_dir(self.user_dir(username).join(FILES_DIR_NAME)).await?;

        let hasher = Arc::clone(&self.hasher);
        let (plaintext, salt) = (password.to_string(), username.to_string());
        let password_hash =
            tokio::task::spawn_blocking(move || hasher.hash(&plaintext, &salt)).await??;

        let record = UserRecord {
            id: username.to_string(),
            password_hash,
            is_admin,
            storage_limit_bytes: storage_limit_bytes.unwrap_or(DEFAULT_STORAGE_LIMIT_BYTES),
        };

        let json = serde_json::to_vec_pretty(&record)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.metadata_path(username))
            .await?;
        file.write_all(&json).await?;
        file.flush().await?;

        info!(
            "Created user {username:?} in {} (admin: {is_admin})",
            self.tenant_dir.display()
        );
        Ok(record)
    }

    /// Return the user's record if `password` matches.
    ///
    /// Unknown users and wrong passwords both yield `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<UserRecord> {
        let record = self.lookup(username).await?;

        let hasher = Arc::clone(&self.hasher);
        let (plaintext, hash, salt) = (
            password.to_string(),
            record.password_hash.clone(),
            username.to_string(),
        );
        let valid = tokio::task::spawn_blocking(move || hasher.validate(&plaintext, &hash, &salt))
            .await
            .unwrap_or(false);

        if valid {
            Some(record)
        } else {
            debug!("Rejected credentials for {username:?}");
            None
        }
    }

    /// Usernames with a readable record in this tenant, sorted.
    pub async fn list_users(&self) -> Result<Vec<String>, UserStoreError> {
        let mut entries = match fs::read_dir(&self.tenant_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut users = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if self.lookup(&name).await.is_some() {
                users.push(name);
            }
        }
        users.sort();
        Ok(users)
    }
}
