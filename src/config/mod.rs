//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::abbrev::{AbbreviationConfig, SkippableWargearRules};

/// Default config file looked up when none is named.
pub const DEFAULT_CONFIG_PATH: &str = "roster-compactor.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON rules: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Lowest classifier confidence accepted before parsing
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// JSON file with skippable wargear rules
    #[serde(default)]
    pub skippable_wargear_path: Option<PathBuf>,

    /// JSON object of fixed abbreviation codes
    #[serde(default)]
    pub abbreviation_overrides_path: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_confidence() -> f64 {
    0.25
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            min_confidence: default_min_confidence(),
            skippable_wargear_path: None,
            abbreviation_overrides_path: None,
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the named file, or the default file if it exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Validation(format!(
                "min_confidence must be between 0 and 1, got {}",
                self.min_confidence
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Read the skip rules and overrides named by this config.
    pub fn load_abbreviation_config(&self) -> Result<AbbreviationConfig, ConfigError> {
        let skippable: SkippableWargearRules = match &self.skippable_wargear_path {
            Some(path) => read_json(path)?,
            None => SkippableWargearRules::new(),
        };
        let overrides: IndexMap<String, String> = match &self.abbreviation_overrides_path {
            Some(path) => read_json(path)?,
            None => IndexMap::new(),
        };
        if skippable.is_empty() && overrides.is_empty() {
            warn!("No skippable wargear rules or abbreviation overrides configured");
        }
        Ok(AbbreviationConfig {
            skippable,
            overrides,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
