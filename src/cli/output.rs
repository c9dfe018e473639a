//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::GatherError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &GatherError) -> String {
    match e {
        GatherError::InvalidTree(msg) => format!("Invalid tree description: {}", msg),
        GatherError::ConfigError(msg) => format!("Configuration error: {}", msg),
        other => other.to_string(),
    }
}
