// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assigner configuration.
//!
//! Precedence, lowest first: defaults, optional TOML file, environment.

use crate::env;
use bf_core::DEFAULT_ENUMERATION_WARN_THRESHOLD;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_PRIORITY_PERCENTAGE: u8 = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the assignment loop and capability indexing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignerConfig {
    /// Longest the loop idles between passes when nothing registers.
    pub poll_interval: Duration,
    /// Chance, in percent, that a pass hands out leases by priority
    /// rather than by age.
    pub priority_percentage: u8,
    /// Warn when a bot declares more capability pairs than this.
    pub enumeration_warn_threshold: usize,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            priority_percentage: DEFAULT_PRIORITY_PERCENTAGE,
            enumeration_warn_threshold: DEFAULT_ENUMERATION_WARN_THRESHOLD,
        }
    }
}

/// On-disk form; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    poll_interval_ms: Option<u64>,
    priority_percentage: Option<u8>,
    enumeration_warn_threshold: Option<usize>,
}

impl AssignerConfig {
    /// Defaults overlaid with `path`, then the environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(ms) = file.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(pct) = file.priority_percentage {
            config.priority_percentage = pct;
        }
        if let Some(threshold) = file.enumeration_warn_threshold {
            config.enumeration_warn_threshold = threshold;
        }
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env::poll_interval() {
            self.poll_interval = value.map_err(|value| ConfigError::InvalidEnv {
                name: env::POLL_MS_VAR,
                value,
            })?;
        }
        if let Some(value) = env::priority_percentage() {
            self.priority_percentage = value.map_err(|value| ConfigError::InvalidEnv {
                name: env::PRIORITY_PERCENTAGE_VAR,
                value,
            })?;
        }
        if let Some(value) = env::enumeration_warn_threshold() {
            self.enumeration_warn_threshold = value.map_err(|value| ConfigError::InvalidEnv {
                name: env::ENUM_WARN_VAR,
                value,
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.priority_percentage > 100 {
            return Err(ConfigError::Invalid(format!(
                "priority_percentage must be at most 100, got {}",
                self.priority_percentage
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
