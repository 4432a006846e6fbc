//! Application configuration for stationforge.
//!
//! The config file lives at `./stationforge.toml` next to the station tree.
//! A `--config` flag overrides the location; without a file the built-in
//! defaults (the ZLA profile table) apply.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, StationForgeError};
use crate::types::ProfileSpec;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "stationforge.toml";

// ---------------------------------------------------------------------------
// Config structs (matching stationforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where station files are found.
    #[serde(default)]
    pub stations: StationsConfig,

    /// How profile documents are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Profiles to rebuild, in processing order.
    #[serde(default = "default_profiles")]
    pub profiles: Vec<ProfileEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stations: StationsConfig::default(),
            output: OutputConfig::default(),
            profiles: default_profiles(),
        }
    }
}

/// `[stations]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    /// Root directory; station files live at `<root>/<group>/<name>.<extension>`.
    #[serde(default = "default_root")]
    pub root: String,

    /// Station file extension, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Substrings excluding a station from every profile.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extension: default_extension(),
            exclude: Vec::new(),
        }
    }
}

fn default_root() -> String {
    "./stations".into()
}
fn default_extension() -> String {
    "station".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Profile field replaced with the merged station array.
    #[serde(default = "default_collection_field")]
    pub collection_field: String,

    /// What to do when one station matches several filters of a profile.
    #[serde(default)]
    pub duplicate_matches: DuplicateMatches,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            collection_field: default_collection_field(),
            duplicate_matches: DuplicateMatches::default(),
        }
    }
}

fn default_collection_field() -> String {
    "stations".into()
}

/// Handling of a station matched by more than one filter in the same profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateMatches {
    /// Include the station once.
    #[default]
    Collapse,
    /// Include the station once per matching filter.
    Repeat,
}

/// `[[profiles]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Path to the profile JSON document.
    pub target: String,
    /// Substrings selecting the stations of this profile.
    #[serde(default)]
    pub filters: Vec<String>,
}

impl ProfileEntry {
    fn new(target: &str, filters: &[&str]) -> Self {
        Self {
            target: target.into(),
            filters: filters.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

fn default_profiles() -> Vec<ProfileEntry> {
    vec![
        ProfileEntry::new("./vATIS-Profile-JCF.json", &["/JCF"]),
        ProfileEntry::new("./vATIS-Profile-L30.json", &["/L30"]),
        ProfileEntry::new("./vATIS-Profile-SBA.json", &["/SBA"]),
        ProfileEntry::new("./vATIS-Profile-SCT.json", &["/SCT"]),
        ProfileEntry::new(
            "./vATIS-Profile-ZLA.json",
            &[
                "KBUR", "KLAS", "KLAX", "KONT", "KPSP", "KSAN", "KSBA", "KSNA", "KVNY",
            ],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Compile config (runtime, resolved against a base directory)
// ---------------------------------------------------------------------------

/// Runtime compile configuration, with paths resolved against a base directory.
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Directory scanned for station groups.
    pub stations_root: PathBuf,
    /// The root as written in the config; prefix of every candidate key.
    pub stations_label: String,
    /// Station file extension, without the leading dot.
    pub extension: String,
    /// Deny substrings.
    pub exclude: Vec<String>,
    /// Field replaced in each profile document.
    pub collection_field: String,
    /// Duplicate-match policy.
    pub duplicate_matches: DuplicateMatches,
    /// Profiles in processing order.
    pub profiles: Vec<ProfileSpec>,
}

impl CompileConfig {
    /// Resolve relative paths in `config` against `base_dir`.
    pub fn resolve(config: &AppConfig, base_dir: &Path) -> Self {
        Self {
            stations_root: base_dir.join(&config.stations.root),
            stations_label: config.stations.root.trim_end_matches('/').to_string(),
            extension: config.stations.extension.clone(),
            exclude: config.stations.exclude.clone(),
            collection_field: config.output.collection_field.clone(),
            duplicate_matches: config.output.duplicate_matches,
            profiles: config
                .profiles
                .iter()
                .map(|p| ProfileSpec::new(base_dir.join(&p.target), p.filters.clone()))
                .collect(),
        }
    }
}

impl From<&AppConfig> for CompileConfig {
    fn from(config: &AppConfig) -> Self {
        Self::resolve(config, Path::new(""))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the default config file (`./stationforge.toml`).
pub fn config_file_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load the config from the default location. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path();

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content =
        std::fs::read_to_string(path).map_err(|e| StationForgeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        StationForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Write a default config file to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(StationForgeError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| StationForgeError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| StationForgeError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Check a config for values that cannot produce a meaningful run.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let ext = &config.stations.extension;
    if ext.is_empty() {
        return Err(StationForgeError::config("stations.extension must not be empty"));
    }
    if ext.starts_with('.') {
        return Err(StationForgeError::config(format!(
            "stations.extension must not start with a dot (got {ext:?})"
        )));
    }
    if config.output.collection_field.is_empty() {
        return Err(StationForgeError::config(
            "output.collection_field must not be empty",
        ));
    }
    if config.stations.exclude.iter().any(String::is_empty) {
        return Err(StationForgeError::config(
            "stations.exclude contains an empty string, which would exclude every station",
        ));
    }

    let mut targets = HashSet::new();
    for profile in &config.profiles {
        if profile.filters.iter().any(String::is_empty) {
            return Err(StationForgeError::config(format!(
                "profile {} has an empty filter, which would match every station",
                profile.target
            )));
        }
        if profile.filters.is_empty() {
            warn!(profile = %profile.target, "profile has no filters; it will get no stations");
        }
        if !targets.insert(profile.target.as_str()) {
            warn!(profile = %profile.target, "profile target listed more than once; the last entry wins");
        }
    }

    Ok(())
}
