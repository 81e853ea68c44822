//! Configuration management with validation and defaults
//!
//! Sources are applied in order: TOML file (optional), environment
//! overrides, then validation of the merged result.

use crate::errors::{ConfigurationError, FairDiceResult};
use crate::games::settings::BetProgressionConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairDiceConfig {
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Settings used by the CLI when none are given on the command line
    #[serde(default)]
    pub settings: Option<BetProgressionConfig>,
}

/// Batch verification limits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Replays allowed to run at once
    pub max_concurrency: usize,
    /// Capacity of the verification event channel
    pub event_buffer: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            event_buffer: 1024,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigurationError::InvalidValue {
                field: "logging.level".to_string(),
                value: s.to_string(),
                reason: "expected one of error, warn, info, debug, trace".to_string(),
            }),
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from file and process environment
    pub fn load(&self) -> FairDiceResult<FairDiceConfig> {
        self.load_with_env(|key| env::var(key).ok())
    }

    /// Load configuration, reading overrides through `lookup`
    pub fn load_with_env<F>(&self, lookup: F) -> FairDiceResult<FairDiceConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.config_path {
            Some(path) => self.load_from_file(path)?,
            None => FairDiceConfig::default(),
        };

        apply_env_overrides(&mut config, lookup)?;
        validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &Path) -> FairDiceResult<FairDiceConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }
}

fn apply_env_overrides<F>(config: &mut FairDiceConfig, lookup: F) -> FairDiceResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = lookup("FAIRDICE_LOG_LEVEL") {
        config.logging.level = level.parse().map_err(|_| ConfigurationError::InvalidValue {
            field: "FAIRDICE_LOG_LEVEL".to_string(),
            value: level,
            reason: "Invalid log level".to_string(),
        })?;
    }
    if let Some(concurrency) = lookup("FAIRDICE_MAX_CONCURRENCY") {
        config.verifier.max_concurrency =
            concurrency.parse().map_err(|_| ConfigurationError::InvalidValue {
                field: "FAIRDICE_MAX_CONCURRENCY".to_string(),
                value: concurrency,
                reason: "Invalid concurrency value".to_string(),
            })?;
    }
    if let Some(buffer) = lookup("FAIRDICE_EVENT_BUFFER") {
        config.verifier.event_buffer = buffer.parse().map_err(|_| ConfigurationError::InvalidValue {
            field: "FAIRDICE_EVENT_BUFFER".to_string(),
            value: buffer,
            reason: "Invalid buffer size".to_string(),
        })?;
    }
    Ok(())
}

fn validate(config: &FairDiceConfig) -> FairDiceResult<()> {
    if config.verifier.max_concurrency == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "verifier.max_concurrency".to_string(),
            value: "0".to_string(),
            reason: "Concurrency cannot be zero".to_string(),
        }
        .into());
    }

    if config.verifier.event_buffer == 0 {
        return Err(ConfigurationError::InvalidValue {
            field: "verifier.event_buffer".to_string(),
            value: "0".to_string(),
            reason: "Event buffer cannot be zero".to_string(),
        }
        .into());
    }

    if let Some(settings) = &config.settings {
        settings
            .validate()
            .map_err(|e| ConfigurationError::ValidationFailed(e.to_string()))?;
    }

    Ok(())
}
