//! Configuration types for Jsontape

use std::path::{Path, PathBuf};

use hyper::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::{JsontapeError, Result};

/// Default re-entry marker header
pub const DEFAULT_MARKER_HEADER: &str = "x-jsontape-recorded";

/// Default `Accept` value that makes a request eligible
pub const DEFAULT_ACCEPT: &str = "application/json";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory fixtures are written to; the user's documents directory if unset
    #[serde(default)]
    pub fixtures_dir: Option<PathBuf>,
    /// Header attached to re-issued requests so they are not claimed twice
    #[serde(default = "default_marker_header")]
    pub marker_header: String,
    /// Exact `Accept` value a request must carry to be recorded
    #[serde(default = "default_accept")]
    pub accept: String,
    /// Transport settings
    #[serde(default)]
    pub client: ClientSettings,
}

fn default_marker_header() -> String {
    DEFAULT_MARKER_HEADER.to_string()
}

fn default_accept() -> String {
    DEFAULT_ACCEPT.to_string()
}

/// Settings for the hyper transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Idle pooled connections are closed after this many seconds
    pub pool_idle_timeout_secs: u64,
    /// Maximum idle pooled connections per host
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixtures_dir: None,
            marker_header: default_marker_header(),
            accept: default_accept(),
            client: ClientSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| JsontapeError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| JsontapeError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.fixtures_dir {
            if !dir.is_dir() {
                return Err(JsontapeError::ConfigError(format!(
                    "Fixtures directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        self.marker_header_name()?;
        self.accept_value()?;

        Ok(())
    }

    /// Parsed re-entry marker header name
    ///
    /// # Errors
    ///
    /// Returns error if the configured name is not a valid header name
    pub fn marker_header_name(&self) -> Result<HeaderName> {
        HeaderName::from_bytes(self.marker_header.as_bytes()).map_err(|e| {
            JsontapeError::ConfigError(format!(
                "Invalid marker header '{}': {e}",
                self.marker_header
            ))
        })
    }

    /// Parsed `Accept` value
    ///
    /// # Errors
    ///
    /// Returns error if the configured value is empty or not a valid header value
    pub fn accept_value(&self) -> Result<HeaderValue> {
        if self.accept.is_empty() {
            return Err(JsontapeError::ConfigError(
                "accept cannot be empty".to_string(),
            ));
        }

        HeaderValue::from_str(&self.accept).map_err(|e| {
            JsontapeError::ConfigError(format!("Invalid accept value '{}': {e}", self.accept))
        })
    }
}
