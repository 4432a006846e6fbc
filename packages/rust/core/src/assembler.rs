//! Profile assembler.
//!
//! Selects the stations belonging to a profile, loads them, and writes them
//! into the profile document's collection field.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use stationforge_shared::{
    Candidate, DuplicateMatches, ProfileSpec, Result, StationForgeError,
};

/// Field every profile document must carry.
pub const NAME_FIELD: &str = "name";

/// Output from assembling one profile.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    /// Path of the rewritten profile document.
    pub target: PathBuf,
    /// The profile's `name` value.
    pub name: String,
    /// Number of entries written to the collection field.
    pub station_count: usize,
}

/// Pick the candidates belonging to a profile, ordered by key.
///
/// With [`DuplicateMatches::Repeat`] a candidate matching several filters is
/// returned once per matching filter; otherwise once.
pub fn select(
    candidates: &[Candidate],
    filters: &[String],
    duplicates: DuplicateMatches,
) -> Vec<Candidate> {
    let mut selected: Vec<Candidate> = match duplicates {
        DuplicateMatches::Collapse => candidates
            .iter()
            .filter(|c| c.matches_any(filters))
            .cloned()
            .collect(),
        DuplicateMatches::Repeat => candidates
            .iter()
            .flat_map(|c| {
                filters
                    .iter()
                    .filter(|f| c.key.contains(f.as_str()))
                    .map(move |_| c.clone())
            })
            .collect(),
    };

    selected.sort_by(|a, b| a.key.cmp(&b.key));
    selected
}

/// Read and parse every station file, preserving order.
pub fn load_stations(stations: &[Candidate]) -> Result<Vec<Value>> {
    stations.iter().map(|s| read_json(&s.path)).collect()
}

/// Rebuild one profile document from its selected stations.
///
/// Stations are loaded before the profile is read; any failure aborts
/// without touching the profile. Fields other than `collection_field`
/// keep their values and order.
#[instrument(skip_all, fields(profile = %spec.target.display(), stations = selected.len()))]
pub fn assemble(
    spec: &ProfileSpec,
    selected: &[Candidate],
    collection_field: &str,
) -> Result<AssembleResult> {
    let merged = load_stations(selected)?;
    let station_count = merged.len();

    let mut profile = read_profile(&spec.target)?;
    let name = profile_name(&profile, &spec.target)?;

    profile.insert(collection_field.to_string(), Value::Array(merged));
    write_profile(&spec.target, &profile)?;

    info!(%name, station_count, "profile written");

    Ok(AssembleResult {
        target: spec.target.clone(),
        name,
        station_count,
    })
}

/// Read a profile document, requiring a JSON object with a string `name`.
pub fn read_profile(path: &Path) -> Result<Map<String, Value>> {
    let value = read_json(path)?;

    let Value::Object(map) = value else {
        return Err(StationForgeError::validation(format!(
            "profile {} is not a JSON object",
            path.display()
        )));
    };

    profile_name(&map, path)?;
    Ok(map)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn profile_name(profile: &Map<String, Value>, path: &Path) -> Result<String> {
    match profile.get(NAME_FIELD) {
        Some(Value::String(name)) => Ok(name.clone()),
        Some(_) => Err(StationForgeError::validation(format!(
            "profile {}: \"{NAME_FIELD}\" must be a string",
            path.display()
        ))),
        None => Err(StationForgeError::validation(format!(
            "profile {} has no \"{NAME_FIELD}\" field",
            path.display()
        ))),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| StationForgeError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| StationForgeError::parse(path, e))
}

/// Write a profile document (pretty-printed, 2-space indent).
///
/// Writes a sibling temp file, then renames it over the target.
fn write_profile(path: &Path, profile: &Map<String, Value>) -> Result<()> {
    let json = serde_json::to_string_pretty(profile)
        .map_err(|e| StationForgeError::Serialize(e.to_string()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| StationForgeError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| StationForgeError::io(path, e))?;

    debug!(path = %path.display(), "wrote profile");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
