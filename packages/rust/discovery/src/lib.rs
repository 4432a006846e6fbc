//! Station file discovery and exclusion.
//!
//! Station files live exactly two levels below the stations root:
//! `<root>/<group>/<name>.<extension>`. Deeper or shallower files are ignored,
//! as are hidden entries, so a scan behaves like the shell glob
//! `<root>/*/*.<extension>`.

use std::path::{Path, PathBuf};

use stationforge_shared::{Candidate, Result, StationForgeError};
use tracing::{debug, info, instrument, warn};

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Where and what to scan.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Directory holding the station groups.
    pub root: PathBuf,
    /// Prefix of every candidate key (the root as configured).
    pub label: String,
    /// Station file extension, without the leading dot.
    pub extension: String,
}

impl DiscoveryOptions {
    pub fn new(root: impl Into<PathBuf>, label: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            label: label.into(),
            extension: extension.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry points
// ---------------------------------------------------------------------------

/// Find every station file under the configured root.
///
/// A missing root yields no candidates. The result is sorted by key so logs
/// are stable between runs; callers must not rely on that order.
#[instrument(skip_all, fields(root = %opts.root.display(), ext = %opts.extension))]
pub fn discover(opts: &DiscoveryOptions) -> Result<Vec<Candidate>> {
    if !opts.root.is_dir() {
        warn!("stations root is not a directory; no stations found");
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();

    for group in visible_entries(&opts.root)? {
        if !group.is_dir() {
            continue;
        }
        let Some(group_name) = file_name(&group) else {
            continue;
        };

        for file in visible_entries(&group)? {
            let Some(name) = file_name(&file) else {
                continue;
            };
            if !file.is_file() || !has_extension(&name, &opts.extension) {
                continue;
            }

            let key = format!("{}/{group_name}/{name}", opts.label);
            debug!(%key, "found station");
            candidates.push(Candidate::new(key, file));
        }
    }

    candidates.sort();
    info!(count = candidates.len(), "station discovery complete");

    Ok(candidates)
}

/// Drop every candidate whose key contains one of `deny`.
///
/// Builds a new list; an empty deny list returns the input unchanged.
pub fn exclude(candidates: Vec<Candidate>, deny: &[String]) -> Vec<Candidate> {
    if deny.is_empty() {
        return candidates;
    }

    let before = candidates.len();
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let hit = c.matches_any(deny);
            if hit {
                debug!(station = %c, "excluded");
            }
            !hit
        })
        .collect();

    info!(excluded = before - kept.len(), remaining = kept.len(), "applied exclusions");
    kept
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// List a directory, skipping dot-entries.
fn visible_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let read = std::fs::read_dir(dir).map_err(|e| StationForgeError::io(dir, e))?;

    let mut out = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| StationForgeError::io(dir, e))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        out.push(entry.path());
    }
    Ok(out)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// `*.<ext>` match on a file name; `ext` may itself contain dots.
fn has_extension(name: &str, ext: &str) -> bool {
    name.strip_suffix(ext)
        .and_then(|stem| stem.strip_suffix('.'))
        .is_some_and(|stem| !stem.is_empty())
}
