//! Error types for the test harness
//!
//! Only harness-level failures live here. Per-test problems (missing
//! artifacts, timeouts, mismatched output) are outcomes recorded in the
//! suite report, never errors.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Prerequisite Errors ===
    #[error("{what} missing. {hint}")]
    PrerequisiteMissing { what: String, hint: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file '{path}': {error}")]
    ConfigParse { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a prerequisite error with a hint on how to fix it
    pub fn prerequisite_missing(what: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::PrerequisiteMissing {
            what: what.into(),
            hint: hint.into(),
        }
    }

    /// Create a file read error for the given path
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
