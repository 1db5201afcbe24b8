//! Password hashing
//!
//! The user store only depends on the [`PasswordHasher`] trait. [`Argon2Hasher`]
//! is the stock implementation: Argon2id producing PHC strings, salted from
//! the username.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use sha2::{Digest, Sha256};

use crate::error::HashError;

/// Hashing capability consumed by the user store.
pub trait PasswordHasher: Send + Sync {
    /// Hash `plaintext`, salted with `salt` (the username).
    fn hash(&self, plaintext: &str, salt: &str) -> Result<String, HashError>;

    /// Check `plaintext` against a hash produced by [`PasswordHasher::hash`]
    /// with the same salt.
    fn validate(&self, plaintext: &str, hash: &str, salt: &str) -> bool;
}

/// Argon2id hasher with a username-derived salt.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stretch the username into a fixed 16-byte salt so short names are valid.
    fn salt_for(salt: &str) -> Result<SaltString, HashError> {
        if salt.is_empty() {
            return Err(HashError::InvalidSalt("salt must not be empty".into()));
        }
        let digest = Sha256::digest(salt.as_bytes());
        SaltString::encode_b64(&digest[..16]).map_err(|e| HashError::InvalidSalt(e.to_string()))
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str, salt: &str) -> Result<String, HashError> {
        let salt = Self::salt_for(salt)?;
        let phc = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashError::Failed(e.to_string()))?;
        Ok(phc.to_string())
    }

    fn validate(&self, plaintext: &str, hash: &str, salt: &str) -> bool {
        let (Ok(parsed), Ok(expected_salt)) = (PasswordHash::new(hash), Self::salt_for(salt))
        else {
            return false;
        };

        // A hash lifted from another user's record must not validate here.
        if parsed.salt.map(|s| s.as_str()) != Some(expected_salt.as_str()) {
            return false;
        }

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_validates_same_password() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("pw", "alice").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.validate("pw", &hash, "alice"));
        assert!(!hasher.validate("wrong", &hash, "alice"));
    }

    #[test]
    fn test_hash_is_deterministic_per_username() {
        let hasher = Argon2Hasher::new();
        assert_eq!(
            hasher.hash("pw", "bob").unwrap(),
            hasher.hash("pw", "bob").unwrap()
        );
        assert_ne!(
            hasher.hash("pw", "bob").unwrap(),
            hasher.hash("pw", "carol").unwrap()
        );
    }

    #[test]
    fn test_hash_bound_to_username() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("pw", "alice").unwrap();
        assert!(!hasher.validate("pw", &hash, "mallory"));
    }

    #[test]
    fn test_rejects_empty_salt_and_garbage_hash() {
        let hasher = Argon2Hasher::new();
        assert!(matches!(
            hasher.hash("pw", ""),
            Err(HashError::InvalidSalt(_))
        ));
        assert!(!hasher.validate("pw", "not-a-phc-string", "alice"));
    }
}
