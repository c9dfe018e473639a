//! Configuration
//!
//! Layered configuration: built-in defaults, then the user's global config
//! file, then an explicit file, then `FRAMETREE_` environment variables
//! (`__` separates nested keys, e.g. `FRAMETREE_GATHER__INIT_TIMEOUT_MS`).

use crate::logging::LoggingConfig;
use crate::tree::context::DEFAULT_WINDOW_ID_ATTRIBUTE_PREFIX;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTreeConfig {
    /// Aggregation protocol settings
    #[serde(default)]
    pub gather: GatherConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Protocol timing and stamping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherConfig {
    /// How long a dispatched child may stay silent before its guard reports it
    /// timed out
    #[serde(default = "default_init_timeout_ms")]
    pub init_timeout_ms: u64,

    /// Extra time the origin allows for relayed reports before its sweep
    /// forces a node terminal
    #[serde(default = "default_relay_grace_ms")]
    pub relay_grace_ms: u64,

    /// Period of the origin's supervisory sweep
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Prefix of the attribute stamped on frame elements; the session id is
    /// appended
    #[serde(default = "default_window_id_attribute_prefix")]
    pub window_id_attribute_prefix: String,
}

fn default_init_timeout_ms() -> u64 {
    500
}

fn default_relay_grace_ms() -> u64 {
    250
}

fn default_sweep_interval_ms() -> u64 {
    100
}

fn default_window_id_attribute_prefix() -> String {
    DEFAULT_WINDOW_ID_ATTRIBUTE_PREFIX.to_string()
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            init_timeout_ms: default_init_timeout_ms(),
            relay_grace_ms: default_relay_grace_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            window_id_attribute_prefix: default_window_id_attribute_prefix(),
        }
    }
}

impl GatherConfig {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn relay_grace(&self) -> Duration {
        Duration::from_millis(self.relay_grace_ms)
    }

    /// Longest a node may stay non-terminal at the origin
    pub fn entry_deadline(&self) -> Duration {
        self.init_timeout() + self.relay_grace()
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.init_timeout_ms == 0 {
            return Err("init_timeout_ms must be greater than zero".to_string());
        }
        if self.sweep_interval_ms == 0 {
            return Err("sweep_interval_ms must be greater than zero".to_string());
        }
        if self.window_id_attribute_prefix.trim().is_empty() {
            return Err("window_id_attribute_prefix cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Gather(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Gather(msg) => write!(f, "Gather: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FrameTreeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.gather.validate() {
            errors.push(ValidationError::Gather(e));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "Invalid format '{}'",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "Invalid output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
