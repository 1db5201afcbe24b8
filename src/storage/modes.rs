//! Write modes
//!
//! Policies for how an opened write stream treats existing content.

use std::fmt;
use std::str::FromStr;

use crate::error::StorageError;

/// Write stream policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate an existing file or create a new one.
    Overwrite,
    /// Open at the end; sequential writes only.
    Append,
    /// Open or create without truncating; seeking is allowed.
    /// Used for out-of-order chunk uploads.
    RandomAccess,
}

impl WriteMode {
    pub fn allows_seek(self) -> bool {
        !matches!(self, WriteMode::Append)
    }

    /// Whether releasing a writer in this mode emits `FileAdded`.
    pub fn emits_file_added(self) -> bool {
        !matches!(self, WriteMode::Append)
    }
}

impl FromStr for WriteMode {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(WriteMode::Overwrite),
            "append" => Ok(WriteMode::Append),
            "randomaccess" | "random_access" | "random-access" => Ok(WriteMode::RandomAccess),
            _ => Err(StorageError::UnsupportedWriteMode(s.to_string())),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteMode::Overwrite => "Overwrite",
            WriteMode::Append => "Append",
            WriteMode::RandomAccess => "RandomAccess",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_modes() {
        assert_eq!("Overwrite".parse::<WriteMode>().unwrap(), WriteMode::Overwrite);
        assert_eq!(" append ".parse::<WriteMode>().unwrap(), WriteMode::Append);
        assert_eq!(
            "RandomAccess".parse::<WriteMode>().unwrap(),
            WriteMode::RandomAccess
        );
        assert_eq!(
            "random_access".parse::<WriteMode>().unwrap(),
            WriteMode::RandomAccess
        );
    }

    #[test]
    fn test_parse_unknown_mode() {
        assert!(matches!(
            "truncate".parse::<WriteMode>(),
            Err(StorageError::UnsupportedWriteMode(m)) if m == "truncate"
        ));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mode in [WriteMode::Overwrite, WriteMode::Append, WriteMode::RandomAccess] {
            assert_eq!(mode.to_string().parse::<WriteMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_append_is_sequential_and_silent() {
        assert!(!WriteMode::Append.allows_seek());
        assert!(!WriteMode::Append.emits_file_added());
        assert!(WriteMode::RandomAccess.allows_seek());
        assert!(WriteMode::Overwrite.emits_file_added());
    }
}
