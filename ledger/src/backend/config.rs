//! # Ledger Configuration
//!
//! Settings are read from a YAML file. Every field has a default, so a missing
//! file or a partial file is fine.
//!
//! ```yaml
//! data_directory: "/home/me/Documents/Inventory Ledger"
//! export_directory: "/home/me/Exports"
//! utc_offset_minutes: 60
//! log_level: "debug"
//! free_tier:
//!   max_materiels: 10
//!   max_personnes: 10
//!   max_emplacements: 3
//! ```

use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::backend::domain::entitlement::FreeTierLimits;
use crate::backend::domain::period::CalendarZone;
use crate::backend::storage::csv::connection::default_data_directory;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Could not serialize config for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Could not write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown log level '{0}'")]
    LogLevel(String),
    #[error("UTC offset of {0} minutes is out of range")]
    UtcOffset(i32),
    #[error("Could not determine a data directory: {0}")]
    DataDirectory(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// Where `operations.csv` lives; defaults to ~/Documents/Inventory Ledger
    pub data_directory: Option<PathBuf>,
    /// Default destination of exports when the user does not pick one
    pub export_directory: Option<PathBuf>,
    /// Fixed calendar offset; the system time zone is used when absent
    pub utc_offset_minutes: Option<i32>,
    pub log_level: Option<String>,
    pub free_tier: FreeTierLimits,
}

impl LedgerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    /// Load the config, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn from_yaml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty file deserializes to unit rather than a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        config.log_level_filter()?;
        config.calendar_zone()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let to_write_error = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let content = serde_yaml::to_string(self).map_err(|source| ConfigError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(to_write_error)?;
        }

        // Create a temporary file for atomic write
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(to_write_error)?;
        fs::rename(&temp_path, path).map_err(to_write_error)?;
        Ok(())
    }

    pub fn resolved_data_directory(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_directory {
            Some(directory) => Ok(directory.clone()),
            None => default_data_directory().map_err(|e| ConfigError::DataDirectory(e.to_string())),
        }
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        match &self.log_level {
            Some(level) => LevelFilter::from_str(level).map_err(|_| ConfigError::LogLevel(level.clone())),
            None => Ok(LevelFilter::Info),
        }
    }

    pub fn calendar_zone(&self) -> Result<CalendarZone, ConfigError> {
        match self.utc_offset_minutes {
            Some(minutes) => CalendarZone::from_offset_minutes(minutes).ok_or(ConfigError::UtcOffset(minutes)),
            None => Ok(CalendarZone::Local),
        }
    }
}
