//! CLI route: run context and the command table.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_assignments, format_records_json, format_records_text};
use crate::config::{ConfigLoader, FrameTreeConfig, GatherConfig};
use crate::error::GatherError;
use crate::record::NodeRecord;
use crate::session::options::{new_session_id, GatherOptions};
use crate::sim::{SimulatedTree, TreeSpec};
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime context for CLI execution: the loaded configuration.
pub struct RunContext {
    config: FrameTreeConfig,
}

impl RunContext {
    /// Load and validate configuration. `config_path` is layered over the
    /// global config file.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, GatherError> {
        let config = ConfigLoader::load(config_path.as_deref())?;
        Self::from_config(config)
    }

    pub fn from_config(config: FrameTreeConfig) -> Result<Self, GatherError> {
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            GatherError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(Self { config })
    }

    /// Execute a command and return its rendered output
    pub fn execute(&self, command: &Commands) -> Result<String, GatherError> {
        match command {
            Commands::Gather {
                tree,
                session,
                timeout_ms,
                from,
                no_content,
                format,
            } => {
                let mut gather = self.config.gather.clone();
                if let Some(ms) = timeout_ms {
                    gather.init_timeout_ms = *ms;
                }
                let session_id = session.clone().unwrap_or_else(new_session_id);
                let mut options = GatherOptions::new(session_id.clone());
                if *no_content {
                    options = options.with_setting("includeContent", Value::Bool(false));
                }
                let records = self.run_gather(tree, &gather, from.as_deref(), options)?;
                match format {
                    OutputFormat::Json => format_records_json(&session_id, &records, Utc::now()),
                    OutputFormat::Text => Ok(format_records_text(&session_id, &records)),
                }
            }
            Commands::Ids { tree, format } => {
                let spec = TreeSpec::from_file(tree)?;
                format_assignments(&spec, *format)
            }
        }
    }

    fn run_gather(
        &self,
        tree: &Path,
        gather: &GatherConfig,
        from: Option<&str>,
        options: GatherOptions,
    ) -> Result<Vec<NodeRecord>, GatherError> {
        let spec = TreeSpec::from_file(tree)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        runtime.block_on(async {
            let tree = SimulatedTree::launch(&spec, gather)?;
            let handle = match from {
                Some(path) => tree.context(path).cloned().ok_or_else(|| {
                    GatherError::InvalidTree(format!("no live context at '{}'", path))
                })?,
                None => tree.top().clone(),
            };
            info!(
                session_id = %options.session_id,
                origin = %handle.address(),
                "gathering"
            );
            let result = handle.gather(options).await;
            tree.shutdown().await;
            result
        })
    }
}
