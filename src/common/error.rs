//! Error types for the smoke-test runner
//!
//! Only failures that abort a run (or stop it from starting) live here.
//! Per-step outcomes such as an unexpected status code or a missing
//! prerequisite variable are recorded in the run report instead and never
//! surface as errors.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error type for the smoke-test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Network Errors ===
    #[error("Network error calling {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Run exceeded the overall deadline of {0} seconds")]
    RunTimeout(u64),

    // === Scenario Errors ===
    #[error("Unknown scenario '{0}'. Use 'smokerun list' for built-ins, or pass a path to a YAML file")]
    ScenarioNotFound(String),

    #[error("Failed to parse scenario: {0}")]
    ScenarioParse(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid variable '{0}': expected KEY=VALUE")]
    InvalidVar(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a network error tagged with the request URL
    pub fn network(url: &str, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            source,
        }
    }

    /// Create a file read error with the offending path
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
