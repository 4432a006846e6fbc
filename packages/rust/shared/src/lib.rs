//! Shared types, error model, and configuration for stationforge.
//!
//! This crate is the foundation depended on by all other stationforge crates.
//! It provides:
//! - [`StationForgeError`] — the unified error type
//! - Domain types ([`Candidate`], [`ProfileSpec`])
//! - Configuration ([`AppConfig`], [`CompileConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, CompileConfig, DuplicateMatches, OutputConfig, ProfileEntry,
    StationsConfig, config_file_path, init_config, load_config, load_config_from,
    validate_config,
};
pub use error::{Result, StationForgeError};
pub use types::{Candidate, ProfileSpec};
