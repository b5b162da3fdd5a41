//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `CAMPUS__SECTION__KEY` environment variables.

use crate::error::{CampusError, CampusResult, ErrorContext};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_seconds: 30,
            user_agent: format!("campus/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Query cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched entry is served without a round trip
    pub stale_time_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the bearer token is persisted. Defaults to
    /// `<config dir>/campus/token`.
    pub token_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn token_path(&self) -> CampusResult<PathBuf> {
        if let Some(path) = &self.token_file {
            return Ok(path.clone());
        }

        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|dir| dir.join("campus").join("token"))
            .ok_or_else(|| CampusError::Config {
                message: "Could not determine a directory for the token file".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("token_path")
                    .with_suggestion("Set storage.token_file explicitly"),
            })
    }
}

impl CampusConfig {
    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("campus").join("config.toml"))
    }

    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> CampusResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else if let Some(default_path) = Self::default_path() {
            builder = builder.add_source(config::File::from(default_path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| CampusError::Config {
                message: format!("Failed to read configuration: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("load")
                    .with_suggestion("Check if the config file exists and is valid TOML"),
            })?;

        let config: CampusConfig =
            settings
                .try_deserialize()
                .map_err(|e| CampusError::Config {
                    message: format!("Failed to parse configuration: {}", e),
                    source: Some(Box::new(e)),
                    context: ErrorContext::new("config").with_operation("deserialize"),
                })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> CampusResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| CampusError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| CampusError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> CampusResult<()> {
        let base_url = url::Url::parse(&self.api.base_url).map_err(|e| CampusError::Config {
            message: format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute URL such as http://localhost:8000/api"),
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CampusError::Config {
                message: format!("Unsupported scheme in api.base_url: {}", base_url.scheme()),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(CampusError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value"),
            });
        }

        Ok(())
    }
}
