//! Configuration management for signal-diary.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::patterns::Timeframe;
use crate::providers::Region;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "signal-diary";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "diary.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SIGNAL_DIARY_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SIGNAL_DIARY_`, sections split on `__`)
/// 2. TOML config file at `~/.config/signal-diary/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Location suggestion configuration.
    pub locations: LocationsConfig,
    /// Pattern view configuration.
    pub analysis: AnalysisConfig,
    /// Export configuration.
    pub report: ReportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/signal-diary/diary.db`
    pub database_path: Option<PathBuf>,
}

/// Location suggestion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationsConfig {
    /// How many recent locations to suggest.
    pub recent_limit: usize,
    /// Minimum uses before a location counts as common.
    pub common_threshold: usize,
    /// How many common locations to list.
    pub common_limit: usize,
}

/// Pattern view configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Default window for pattern views.
    pub timeframe: Timeframe,
    /// How many locations the location breakdown shows.
    pub top_locations: usize,
}

/// Export configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Window used for the report's status and summary numbers.
    pub timeframe: Timeframe,
    /// Region used when the profile doesn't set one.
    pub region: Option<Region>,
}

impl Default for LocationsConfig {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            common_threshold: 2,
            common_limit: 10,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::Week,
            top_locations: 5,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::Month,
            region: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `SIGNAL_DIARY_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("locations.recent_limit", self.locations.recent_limit),
            ("locations.common_threshold", self.locations.common_threshold),
            ("locations.common_limit", self.locations.common_limit),
            ("analysis.top_locations", self.analysis.top_locations),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be greater than 0"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Render the effective configuration for display.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
