//! Authentication and user records
//!
//! Handles password hashing, username validation and the per-tenant user store.

pub mod hasher;
pub mod results;
pub mod users;
pub mod validator;

pub use hasher::{Argon2Hasher, PasswordHasher};
pub use results::{DEFAULT_STORAGE_LIMIT_BYTES, UserRecord};
pub use users::{FILES_DIR_NAME, METADATA_FILE_NAME, UserStore};
pub use validator::is_valid_username;
