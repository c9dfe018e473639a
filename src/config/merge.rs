//! Merge rules: defaults and override order.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("gather.init_timeout_ms", 500)?
        .set_default("gather.relay_grace_ms", 250)?
        .set_default("gather.sweep_interval_ms", 100)?
        .set_default(
            "gather.window_id_attribute_prefix",
            crate::tree::context::DEFAULT_WINDOW_ID_ATTRIBUTE_PREFIX,
        )?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
