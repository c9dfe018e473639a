//! CLI parse: clap types for frametree. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// frametree - gather per-frame records from a tree of isolated contexts
#[derive(Parser, Debug)]
#[command(name = "frametree")]
#[command(about = "Scatter/gather aggregation over a tree of isolated contexts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one aggregation session over a simulated tree
    Gather {
        /// Tree description (TOML)
        #[arg(long)]
        tree: PathBuf,
        /// Session id (generated when omitted)
        #[arg(long)]
        session: Option<String>,
        /// Override the per-child timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Originating context path, relative to the top (default: the top)
        #[arg(long)]
        from: Option<String>,
        /// Leave document content out of the records
        #[arg(long)]
        no_content: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the identifier assignment of a simulated tree
    Ids {
        /// Tree description (TOML)
        #[arg(long)]
        tree: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Gather { .. } => "gather",
            Commands::Ids { .. } => "ids",
        }
    }
}
