//! Store configuration
//!
//! Loaded from a JSON file, e.g. `docshape.json`:
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/docshape",
//!   "audit_capacity": 100,
//!   "log_level": "info",
//!   "log_format": "json"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::DEFAULT_AUDIT_CAPACITY;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "DOCSHAPE_CONFIG_READ",
            ConfigError::Parse(_) => "DOCSHAPE_CONFIG_PARSE",
            ConfigError::Invalid(_) => "DOCSHAPE_CONFIG_INVALID",
            ConfigError::Logging(_) => "DOCSHAPE_CONFIG_LOGGING",
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
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
    /// Returns a string usable as an `EnvFilter` directive
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

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory holding one sub-directory per store (required)
    pub data_dir: PathBuf,

    /// Audit entries kept per store (optional, default 100)
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: StoreConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audit_capacity == 0 {
            return Err(ConfigError::Invalid("audit_capacity must be > 0".into()));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        Ok(())
    }

    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }
}
