//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Root directory of the manual site checkout.
    #[serde(default)]
    pub content_root: Option<PathBuf>,

    /// Content subdirectory under the root, e.g. `docs/content`.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Returns the directory the corpus is loaded from: `content_root`
    /// (default `.`) joined with `content_dir`.
    #[must_use]
    pub fn content_base(&self) -> PathBuf {
        self.content_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(&self.content_dir)
    }

    /// Applies `MANUAL_ROOT`, `MANUAL_CONTENT` and `PORT` environment
    /// overrides on top of the file-supplied values.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(root) = std::env::var("MANUAL_ROOT") {
            if !root.is_empty() {
                self.content_root = Some(PathBuf::from(root));
            }
        }
        if let Ok(dir) = std::env::var("MANUAL_CONTENT") {
            if !dir.is_empty() {
                self.content_dir = dir;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            self.http.port = port.parse().map_err(|_| ConfigError::ValidationError {
                message: format!("Invalid PORT environment value '{port}'"),
            })?;
        }
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }
        if self.http.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "HTTP port must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            content_root: None,
            content_dir: default_content_dir(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_content_dir() -> String {
    "content".to_string()
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3080
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
