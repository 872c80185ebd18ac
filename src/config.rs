//! Runtime settings shared by the CLI and HTTP front-ends.
//!
//! Values are layered: built-in defaults, then an optional JSON file named by
//! `TASK_SCHEDULER_CONFIG`, then individual environment overrides.

use crate::calendar::{default_break, default_headstart};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_CONFIG_FILE: &str = "TASK_SCHEDULER_CONFIG";
pub const ENV_BREAK_MINUTES: &str = "TASK_SCHEDULER_BREAK_MINUTES";
pub const ENV_HEADSTART_MINUTES: &str = "TASK_SCHEDULER_HEADSTART_MINUTES";
pub const ENV_DATABASE: &str = "TASK_SCHEDULER_DB";
pub const ENV_HTTP_ADDR: &str = "TASK_SCHEDULER_HTTP_ADDR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub break_minutes: i64,
    pub headstart_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    pub http_addr: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            break_minutes: default_break().num_minutes(),
            headstart_minutes: default_headstart().num_minutes(),
            database_path: None,
            http_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl PlannerConfig {
    /// Defaults, then the config file, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same layering as [`PlannerConfig::load`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_CONFIG_FILE) {
            Some(path) if !path.trim().is_empty() => Self::from_json_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(file).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_BREAK_MINUTES) {
            self.break_minutes = parse_minutes(ENV_BREAK_MINUTES, &value)?;
        }
        if let Some(value) = lookup(ENV_HEADSTART_MINUTES) {
            self.headstart_minutes = parse_minutes(ENV_HEADSTART_MINUTES, &value)?;
        }
        if let Some(value) = lookup(ENV_DATABASE) {
            self.database_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_HTTP_ADDR) {
            self.http_addr = value;
        }
        Ok(())
    }

    /// Configured break, or the default when the stored value is unusable.
    pub fn break_time(&self) -> Duration {
        checked_minutes(self.break_minutes).unwrap_or_else(default_break)
    }

    pub fn headstart(&self) -> Duration {
        checked_minutes(self.headstart_minutes).unwrap_or_else(default_headstart)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, minutes) in [
            (ENV_BREAK_MINUTES, self.break_minutes),
            (ENV_HEADSTART_MINUTES, self.headstart_minutes),
        ] {
            if checked_minutes(minutes).is_none() {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: minutes.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn checked_minutes(minutes: i64) -> Option<Duration> {
    if minutes < 0 {
        return None;
    }
    Duration::try_minutes(minutes)
}

fn parse_minutes(key: &'static str, value: &str) -> Result<i64, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(minutes) if checked_minutes(minutes).is_some() => Ok(minutes),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
