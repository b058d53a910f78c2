//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON integration job files and map snapshots
//! - Validate configuration legality
//! - Resolve the map snapshot path relative to the job file
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let job = ConfigLoader::load_job_from_path(Path::new("job.toml")).unwrap();
//! let map = ConfigLoader::load_map_from_path(&job.map).unwrap();
//! println!("Missions: {}", map.mission_ids().len());
//! ```

mod parser;
mod validator;

pub use contracts::IntegrationJob;
pub use parser::ConfigFormat;

use contracts::ContractError;
use depth_integration::memory::{InMemoryMap, MapSnapshot};
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load jobs and maps from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load an integration job from file path
    ///
    /// Detects format from the file extension (.toml / .json). A relative
    /// `map` path is resolved against the job file directory.
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_job_from_path(path: &Path) -> Result<IntegrationJob, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let mut job = Self::load_job_from_str(&content, format)?;

        if job.map.is_relative() {
            if let Some(dir) = path.parent() {
                job.map = dir.join(&job.map);
            }
        }
        Ok(job)
    }

    /// Load an integration job from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_job_from_str(content: &str, format: ConfigFormat) -> Result<IntegrationJob, ContractError> {
        let job = parser::parse(content, format)?;
        validator::validate_job(&job)?;
        Ok(job)
    }

    /// Load and validate a map snapshot without building the map
    pub fn load_snapshot_from_path(path: &Path) -> Result<MapSnapshot, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_snapshot_from_str(&content, format)
    }

    pub fn load_snapshot_from_str(content: &str, format: ConfigFormat) -> Result<MapSnapshot, ContractError> {
        let snapshot = parser::parse(content, format)?;
        validator::validate_map(&snapshot)?;
        Ok(snapshot)
    }

    /// Load a map snapshot and build the in-memory map
    ///
    /// # Errors
    /// Read, parse or validation failure, or dangling references in the snapshot.
    pub fn load_map_from_path(path: &Path) -> Result<InMemoryMap, ContractError> {
        InMemoryMap::try_from(Self::load_snapshot_from_path(path)?)
    }

    /// Serialize a job to TOML string
    pub fn to_toml(job: &IntegrationJob) -> Result<String, ContractError> {
        parser::serialize(job, ConfigFormat::Toml)
    }

    /// Serialize a job to JSON string
    pub fn to_json(job: &IntegrationJob) -> Result<String, ContractError> {
        parser::serialize(job, ConfigFormat::Json)
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
