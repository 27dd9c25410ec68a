//! Application configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup: a `stockvault.db` store in the working directory, a
//! `stock_list.csv` directory next to it, one-day staleness tolerance and a
//! one-year initial lookback.

use crate::indicators::{IndicatorError, IndicatorOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<IndicatorError> for ConfigError {
    fn from(e: IndicatorError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub directory: DirectoryConfig,
    pub refresh: RefreshConfig,
    pub quotes: QuoteConfig,
    pub indicators: IndicatorOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("stockvault.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub stock_list: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            stock_list: PathBuf::from("stock_list.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Days the latest stored date may trail today before a refresh fetches.
    pub tolerance_days: i64,
    /// How far back to start when a symbol has no stored history.
    pub lookback_days: i64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            tolerance_days: 1,
            lookback_days: 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub breaker_threshold: u32,
    pub breaker_cooldown_secs: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            breaker_threshold: 3,
            breaker_cooldown_secs: 30 * 60,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Load `path` if given (it must exist), otherwise `default_path` if it
    /// exists, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>, default_path: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if default_path.exists() => Self::from_file(default_path),
            None => {
                debug!(path = %default_path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh.tolerance_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "refresh.tolerance_days must be >= 0, got {}",
                self.refresh.tolerance_days
            )));
        }
        if self.refresh.lookback_days < 1 {
            return Err(ConfigError::Invalid(format!(
                "refresh.lookback_days must be >= 1, got {}",
                self.refresh.lookback_days
            )));
        }
        if self.quotes.timeout_secs == 0 {
            return Err(ConfigError::Invalid("quotes.timeout_secs must be >= 1".into()));
        }
        self.indicators.validate()?;
        Ok(())
    }
}
