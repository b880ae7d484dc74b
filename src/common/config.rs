//! Configuration file handling
//!
//! `config.toml` in the platform config directory carries per-deployment
//! settings: the base URL, the response envelope convention, timeouts and
//! extra context variables (seed data ids, pre-issued tokens). CLI flags
//! override file values, which override the built-in defaults.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// API response conventions
    #[serde(default)]
    pub api: ApiConfig,

    /// Extra variables seeded into every run context before the first step.
    /// Useful for deployment-specific ids (communityTagId) or a pre-issued
    /// accessToken when running authenticated steps without a login step.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Base URL of the API under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Overall deadline for a whole scenario run, in seconds
    #[serde(default = "default_run_timeout")]
    pub timeout_secs: u64,

    /// Per-request timeout, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_run_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}
fn default_run_timeout() -> u64 {
    120
}
fn default_request_timeout() -> u64 {
    30
}

/// Where response payloads live relative to the JSON root
///
/// The service is inconsistent: most routes wrap payloads as
/// `{"message", "detail", "data": ...}` while login and the AI routes
/// answer at the root. `auto` probes the wrapper first, then the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    /// Try `data.<path>`, then `<path>`
    #[default]
    Auto,
    /// Payloads always under the `data` wrapper
    Data,
    /// Payloads always at the JSON root
    Root,
}

/// API response conventions
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiConfig {
    /// Envelope convention used when expanding bare extraction paths
    #[serde(default)]
    pub envelope: Envelope,
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/smokerun/`
/// - macOS: `~/Library/Application Support/smokerun/`
/// - Windows: `%APPDATA%\smokerun\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "smokerun").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    })?;
                return toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }

    /// Parse a `KEY=VALUE` variable assignment from the command line
    pub fn parse_var(raw: &str) -> Result<(String, String)> {
        match raw.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(Error::InvalidVar(raw.to_string())),
        }
    }

    /// Validate settings that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        let base = &self.http.base_url;
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(Error::Config(format!(
                "base_url '{base}' must start with http:// or https://"
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.http.base_url, "http://localhost:8080/api");
        assert_eq!(config.http.timeout_secs, 120);
        assert_eq!(config.api.envelope, Envelope::Auto);
        assert!(config.vars.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [http]
            base_url = "https://staging.example.com/api"

            [api]
            envelope = "root"

            [vars]
            communityTagId = "7"
            "#,
        )
        .unwrap();
        assert_eq!(config.http.base_url, "https://staging.example.com/api");
        assert_eq!(config.http.timeout_secs, 120);
        assert_eq!(config.api.envelope, Envelope::Root);
        assert_eq!(config.vars.get("communityTagId").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(
            Config::parse_var("docId=42").unwrap(),
            ("docId".to_string(), "42".to_string())
        );
        // Values may contain '='
        assert_eq!(
            Config::parse_var("token=abc=def").unwrap(),
            ("token".to_string(), "abc=def".to_string())
        );
        assert!(Config::parse_var("no-equals").is_err());
        assert!(Config::parse_var("=value").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.http.base_url = "localhost:8080".to_string();
        assert!(config.validate().is_err());

        config.http.base_url = "http://localhost:8080/api".to_string();
        assert!(config.validate().is_ok());
    }
}
