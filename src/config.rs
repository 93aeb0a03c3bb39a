//! Host configuration loaded from `config.toml`.
//!
//! Every section is optional; a missing file section falls back to its
//! defaults.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [fetch]
//! bypass_url = "http://flaresolverr:8191/v1"
//!
//! [catalog]
//! path = "/etc/scour/sources.toml"
//! ```

use crate::error::{Result, ServiceError};
use scour_search::{FetchConfig, OrchestratorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScourConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub orchestrator: OrchestratorConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

/// WebSocket server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Events buffered per connected session.
    pub session_buffer: usize,
    /// How long a delivery may wait on a full session buffer.
    pub delivery_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            session_buffer: 64,
            delivery_timeout_ms: 2000,
        }
    }
}

/// Location of the sources file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: config_dir().join("sources.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}

impl ScourConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// holds invalid values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from [`default_config_path`] when it
    /// exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit or existing default file is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default = default_config_path();
        if default.is_file() {
            Self::from_file(&default)
        } else {
            tracing::debug!(path = %default.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        if self.server.session_buffer == 0 {
            return Err(ServiceError::Config(
                "server.session_buffer must be greater than 0".into(),
            ));
        }
        if self.server.delivery_timeout_ms == 0 {
            return Err(ServiceError::Config(
                "server.delivery_timeout_ms must be greater than 0".into(),
            ));
        }
        self.fetch.validate()?;
        self.orchestrator.validate()?;
        Ok(())
    }
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/scour/` by default. Override with the
/// `SCOUR_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SCOUR_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("scour"))
        .unwrap_or_else(|| PathBuf::from("/tmp/scour-config"))
}

/// Returns the default config file path: `<config_dir>/config.toml`.
#[must_use]
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}
