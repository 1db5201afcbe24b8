//! Path validation
//!
//! Resolves caller-supplied relative paths against a configured root and
//! rejects anything that could escape it. Traversal is checked twice: on the
//! normalized input segments and again by prefix containment of the result.

use log::warn;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

const SEPARATOR: char = '/';
const PARENT_SEGMENT: &str = "..";

/// How the resolved path is compared against the root for containment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathComparison {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

/// Resolves relative caller paths into absolute paths under a fixed root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Normalized absolute root, or `None` when operating unrooted.
    root: Option<String>,
    comparison: PathComparison,
}

impl PathResolver {
    /// Create a resolver confined to `root`.
    ///
    /// A relative root is made absolute against the current working directory.
    /// An empty root yields an unrooted resolver.
    pub fn new(root: impl AsRef<Path>, comparison: PathComparison) -> io::Result<Self> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Ok(Self::unrooted(comparison));
        }

        let absolute = std::path::absolute(root)?;
        Ok(Self {
            root: Some(normalize(&absolute.to_string_lossy())),
            comparison,
        })
    }

    /// Create a resolver with no root. Absolute caller paths are accepted as-is.
    pub fn unrooted(comparison: PathComparison) -> Self {
        Self {
            root: None,
            comparison,
        }
    }

    /// Returns the normalized root, if one is configured
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref().map(Path::new)
    }

    /// Resolve a caller path to an absolute path inside the root.
    pub fn resolve(&self, caller_path: &str) -> Result<PathBuf, StorageError> {
        if caller_path.trim().is_empty() {
            return Err(StorageError::InvalidPath(caller_path.to_string()));
        }

        let normalized = normalize(caller_path);

        if contains_traversal(&normalized) {
            warn!("Rejected traversal attempt: {caller_path:?}");
            return Err(StorageError::PathSecurityViolation(caller_path.to_string()));
        }

        let Some(root) = &self.root else {
            return Ok(PathBuf::from(normalized));
        };

        if is_rooted(&normalized) {
            warn!("Rejected absolute path under root {root}: {caller_path:?}");
            return Err(StorageError::AbsolutePathNotAllowed(
                caller_path.to_string(),
            ));
        }

        let candidate = normalize(&format!("{root}{SEPARATOR}{normalized}"));

        if !self.is_within_root(root, &candidate) {
            warn!("Resolved path {candidate} escapes root {root}");
            return Err(StorageError::PathSecurityViolation(caller_path.to_string()));
        }

        Ok(PathBuf::from(candidate))
    }

    /// Whether two resolved paths name the same entry under the comparison mode.
    pub fn same_path(&self, a: &Path, b: &Path) -> bool {
        let a = normalize(&a.to_string_lossy());
        let b = normalize(&b.to_string_lossy());
        match self.comparison {
            PathComparison::CaseSensitive => a == b,
            PathComparison::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }

    /// Segment-aware prefix containment honoring the comparison mode.
    fn is_within_root(&self, root: &str, candidate: &str) -> bool {
        let (root, candidate) = match self.comparison {
            PathComparison::CaseSensitive => (root.to_string(), candidate.to_string()),
            PathComparison::CaseInsensitive => (root.to_lowercase(), candidate.to_lowercase()),
        };

        if candidate == root {
            return true;
        }

        match candidate.strip_prefix(root.as_str()) {
            Some(rest) => root.ends_with(SEPARATOR) || rest.starts_with(SEPARATOR),
            None => false,
        }
    }
}

/// Normalize separators to `/`, collapse duplicates, drop `.` segments and
/// any trailing separator. Leading separators and drive prefixes are kept.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let leading = unified.starts_with(SEPARATOR);

    let segments: Vec<&str> = unified
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    let joined = segments.join("/");
    if leading {
        format!("{SEPARATOR}{joined}")
    } else {
        joined
    }
}

/// True when any segment of a normalized path is a parent-directory reference.
/// Catches leading (`../x`), mid-path (`a/../b`) and trailing (`a/..`) forms.
fn contains_traversal(normalized: &str) -> bool {
    normalized
        .split(SEPARATOR)
        .any(|segment| segment == PARENT_SEGMENT)
}

/// True for `/x`, and for drive-qualified paths such as `C:/x` or `C:x`.
fn is_rooted(normalized: &str) -> bool {
    if normalized.starts_with(SEPARATOR) {
        return true;
    }

    let mut chars = normalized.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}
