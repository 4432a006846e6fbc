//! Core domain types for station compilation.

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A station file found during discovery.
///
/// Identity is the `key`: the configured stations root followed by
/// `/`-separated path components (e.g. `./stations/SCT/KLAX.station`).
/// Filters and sorting operate on the key, never on the OS path, so the
/// result does not depend on the platform separator or the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Candidate {
    /// Normalized path string used for matching and ordering.
    pub key: String,
    /// Filesystem path used to read the file.
    pub path: PathBuf,
}

impl Candidate {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }

    /// True if any of `needles` occurs in the key.
    pub fn matches_any<S: AsRef<str>>(&self, needles: &[S]) -> bool {
        needles.iter().any(|n| self.key.contains(n.as_ref()))
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

// ---------------------------------------------------------------------------
// ProfileSpec
// ---------------------------------------------------------------------------

/// A profile document to rebuild, and the substrings selecting its stations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSpec {
    /// Path of the profile JSON document.
    pub target: PathBuf,
    /// Allow substrings, in configured order.
    pub filters: Vec<String>,
}

impl ProfileSpec {
    pub fn new(target: impl Into<PathBuf>, filters: Vec<String>) -> Self {
        Self {
            target: target.into(),
            filters,
        }
    }
}
