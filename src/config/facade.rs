//! Entry points for loading [`FrameTreeConfig`].

use super::merge::builder_with_defaults;
use super::sources;
use super::FrameTreeConfig;
use config::ConfigError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the full layered configuration. `explicit` overrides the global
    /// file; environment variables override both.
    pub fn load(explicit: Option<&Path>) -> Result<FrameTreeConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            builder = sources::explicit_file::add_to_builder(builder, path)?;
        }
        builder = sources::env::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Load defaults plus a single file, ignoring the global file and the
    /// environment.
    pub fn load_from_file(path: &Path) -> Result<FrameTreeConfig, ConfigError> {
        let builder = sources::explicit_file::add_to_builder(builder_with_defaults()?, path)?;
        builder.build()?.try_deserialize()
    }

    /// Built-in defaults only
    pub fn default() -> FrameTreeConfig {
        FrameTreeConfig::default()
    }
}
