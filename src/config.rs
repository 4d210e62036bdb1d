//! TOML configuration.
//!
//! Looked up at `--config <path>`, else `<config_dir>/mars-locator/config.toml`.
//! Every field has a default, so a partial file (or none at all) is fine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    pub server: ServerConfig,
    pub cities: CitiesConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://gc.ditu.aliyun.com/regeocoding".into(),
            timeout_secs: 10,
            user_agent: format!("mars-locator/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CitiesConfig {
    /// Replaces the bundled city table when set.
    pub table_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "Cannot read config: {}", msg),
            Self::Parse(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load an explicit config file. Missing or malformed files are errors.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if given, else from the default location, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        match Self::load_from(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("{}. Using defaults.", e);
                Ok(Self::default())
            }
        }
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mars-locator").join("config.toml"))
    }
}
