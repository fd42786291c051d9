use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/mcpanel/config.toml` on Linux, or the platform
    /// equivalent via `dirs::config_dir()`. Falls back to the current
    /// directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("mcpanel").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()` (validated).
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides.
    ///
    /// `PORT` replaces the port of `server.bind_addr`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = std::env::var("PORT") {
            self.override_port(&port)?;
        }
        Ok(())
    }

    fn override_port(&mut self, port: &str) -> Result<(), ConfigError> {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::ValidationError {
            message: format!("PORT '{}' is not a valid port number", port),
        })?;
        let mut addr = self.bind_addr()?;
        addr.set_port(port);
        self.server.bind_addr = addr.to_string();
        Ok(())
    }

    /// Parsed `server.bind_addr`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("Invalid bind address '{}': {}", self.server.bind_addr, e),
            })
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The bind address parses
    /// - A jar file name is set
    /// - At least one readiness marker, none of them empty
    /// - A non-zero observer queue
    /// - Tokens are present and non-empty when auth is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.process.jar_file.trim().is_empty() {
            return Err(invalid("process.jar_file must not be empty"));
        }

        let markers = &self.process.readiness_markers;
        if markers.is_empty() || markers.iter().any(|m| m.is_empty()) {
            return Err(invalid(
                "process.readiness_markers needs at least one non-empty marker",
            ));
        }

        if self.hub.observer_queue == 0 {
            return Err(invalid("hub.observer_queue must be greater than zero"));
        }

        if self.auth.enabled {
            if self.auth.tokens.is_empty() {
                return Err(invalid(
                    "auth is enabled but no tokens are configured (set auth.enabled = false to disable)",
                ));
            }
            if let Some(entry) = self.auth.tokens.iter().find(|t| t.token.is_empty()) {
                return Err(ConfigError::ValidationError {
                    message: format!("Token for '{}' is empty", entry.name),
                });
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}
