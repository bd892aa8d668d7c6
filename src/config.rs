//! Configuration file management for certprobe.
//!
//! This module handles loading, parsing, and merging configuration from TOML files
//! and command-line arguments. The merged result is turned into a [`Settings`]
//! value once at startup and passed explicitly to the probe and the terminal view.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (certprobe.toml or specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! endpoints = ["https://example.com", "tcp://localhost:3306"]
//! timeout = 30
//! mode = "oneshot"
//! log_level = "warn"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Default TLS connection timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// How the endpoints are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Check every endpoint in order and print one JSON document each
    Oneshot,
    /// Pick endpoints from a list in the terminal
    Interactive,
}

/// Main configuration structure for certprobe.
///
/// All fields are optional to support partial configuration and merging.
/// Missing values will be filled in by defaults or overridden by CLI arguments.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Endpoints to check, as `scheme://host[:port]`
    pub endpoints: Option<Vec<String>>,
    /// TLS connection timeout in seconds
    pub timeout: Option<u64>,
    /// Execution mode: oneshot or interactive
    pub mode: Option<Mode>,
    /// Log filter directive, e.g. "warn" or "certprobe=debug"
    pub log_level: Option<String>,
}

/// Fully resolved settings, built once from a merged [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoints: Vec<String>,
    pub timeout: Duration,
    pub mode: Mode,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use certprobe::config::Config;
    /// let config = Config::from_file("certprobe.toml")?;
    /// # Ok::<(), certprobe::config::ConfigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Creates a configuration holding the built-in defaults.
    ///
    /// # Default Values
    ///
    /// - `endpoints`: None (must be provided)
    /// - `timeout`: 30 seconds
    /// - `mode`: oneshot
    /// - `log_level`: "warn"
    pub fn defaults() -> Self {
        Config {
            endpoints: None,
            timeout: Some(DEFAULT_TIMEOUT_SECS),
            mode: Some(Mode::Oneshot),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// For each field, if the `other` config has a value (Some), it overrides
    /// this config's value. If the `other` value is None, keeps the current value.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.endpoints.is_some() {
            self.endpoints = other.endpoints;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.mode.is_some() {
            self.mode = other.mode;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Only provided arguments (Some values) will override other configurations.
    /// An empty endpoint list counts as not provided, and `tui = false` leaves
    /// the mode untouched so a config file can still select interactive mode.
    pub fn from_cli_args(
        endpoints: Vec<String>,
        timeout: Option<u64>,
        tui: bool,
        log_level: Option<String>,
    ) -> Self {
        Config {
            endpoints: if endpoints.is_empty() {
                None
            } else {
                Some(endpoints)
            },
            timeout,
            mode: if tui { Some(Mode::Interactive) } else { None },
            log_level,
        }
    }

    /// Resolves the merged configuration into [`Settings`].
    ///
    /// Missing optional values fall back to the defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Validation` when no endpoint is configured or the timeout
    /// is zero.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let endpoints = self.endpoints.unwrap_or_default();
        if endpoints.is_empty() {
            return Err(ConfigError::Validation(
                "You must specify at least one endpoint".to_string(),
            ));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout == 0 {
            return Err(ConfigError::Validation(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Settings {
            endpoints,
            timeout: Duration::from_secs(timeout),
            mode: self.mode.unwrap_or(Mode::Oneshot),
            log_level: self
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// Generates an example configuration file in TOML format.
    ///
    /// # Example
    ///
    /// ```
    /// # use certprobe::config::Config;
    /// let example = Config::example_toml();
    /// println!("{}", example);
    /// // Save to file: std::fs::write("certprobe.toml", example)?;
    /// ```
    pub fn example_toml() -> String {
        let example = Config {
            endpoints: Some(vec![
                "https://example.com".to_string(),
                "https://example.com:8443".to_string(),
                "tcp://localhost:3306".to_string(),
                "https://expired.badssl.com".to_string(),
            ]),
            timeout: Some(DEFAULT_TIMEOUT_SECS),
            mode: Some(Mode::Oneshot),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("IO Error: {0}")]
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    #[error("Parse Error: {0}")]
    Parse(String),
    /// Validation error (missing required fields, invalid values, etc.)
    #[error("Validation Error: {0}")]
    Validation(String),
}
