//! Error types for CLI operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Job file not found
    #[error("Job file not found: {}", path.display())]
    JobNotFound { path: PathBuf },

    /// Map snapshot not found
    #[error("Map snapshot not found: {}", path.display())]
    MapNotFound { path: PathBuf },

    /// Integration worker did not finish cleanly
    #[error("Integration task failed: {message}")]
    Worker { message: String },
}

impl CliError {
    pub fn job_not_found(path: &Path) -> Self {
        Self::JobNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn map_not_found(path: &Path) -> Self {
        Self::MapNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }
}

/// Fail with [`CliError::JobNotFound`] unless `path` exists
pub fn ensure_job_exists(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::job_not_found(path))
    }
}

/// Fail with [`CliError::MapNotFound`] unless `path` exists
pub fn ensure_map_exists(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::map_not_found(path))
    }
}
