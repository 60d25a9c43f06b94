//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use questlog_core::QuestSettings;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the `users` and `tasks-storage` snapshots.
    pub storage_dir: PathBuf,
    pub log_level: Level,
    pub bonus_probability: f64,
    pub min_password_length: usize,
    pub refresh_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./questlog-data"),
            log_level: Level::INFO,
            bonus_probability: QuestSettings::default().bonus_probability,
            min_password_length: 6,
            refresh_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Storage ---
        let storage_dir = lookup("QUESTLOG_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        // --- Logging ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Quest and Session Policy ---
        let bonus_probability = match lookup("BONUS_QUEST_PROBABILITY") {
            Some(raw) => {
                let value = raw.parse::<f64>().map_err(|e| {
                    ConfigError::InvalidValue("BONUS_QUEST_PROBABILITY".to_string(), e.to_string())
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(ConfigError::InvalidValue(
                        "BONUS_QUEST_PROBABILITY".to_string(),
                        format!("{} is outside [0, 1]", value),
                    ));
                }
                value
            }
            None => defaults.bonus_probability,
        };

        let min_password_length = match lookup("MIN_PASSWORD_LENGTH") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("MIN_PASSWORD_LENGTH".to_string(), e.to_string())
            })?,
            None => defaults.min_password_length,
        };

        let refresh_interval = match lookup("REFRESH_INTERVAL_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidValue("REFRESH_INTERVAL_SECS".to_string(), e.to_string())
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        "REFRESH_INTERVAL_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.refresh_interval,
        };

        Ok(Self {
            storage_dir,
            log_level,
            bonus_probability,
            min_password_length,
            refresh_interval,
        })
    }

    pub fn quest_settings(&self) -> QuestSettings {
        QuestSettings {
            bonus_probability: self.bonus_probability,
            ..QuestSettings::default()
        }
    }
}
