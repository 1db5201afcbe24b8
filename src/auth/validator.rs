//! Username validation
//!
//! User directories are built from usernames, so a username must be a single
//! plain path segment.

/// Returns true when `username` can name a user directory.
pub fn is_valid_username(username: &str) -> bool {
    !username.trim().is_empty()
        && username != "."
        && username != ".."
        && !username.contains(['/', '\\', '\0', '\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["alice", "bob.smith", "user_01", "Ünïcode"] {
            assert!(is_valid_username(name), "{name:?}");
        }
    }

    #[test]
    fn test_rejects_blank_and_path_like_names() {
        for name in ["", "   ", ".", "..", "a/b", "a\\b", "../alice", "nul\0", "line\nbreak"] {
            assert!(!is_valid_username(name), "{name:?}");
        }
    }
}
