//! Command-line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "treelens")]
#[command(about = "Replay actions against a path-addressed state tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root used to locate config/treelens.toml
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply wire actions and print the resulting tree as JSON
    Replay {
        /// Schema descriptor (JSON)
        #[arg(long)]
        schema: PathBuf,
        /// Initial state (JSON); defaults to the schema default
        #[arg(long)]
        state: Option<PathBuf>,
        /// Array of wire actions (JSON)
        #[arg(long)]
        actions: PathBuf,
        /// Print only the node at this dotted path
        #[arg(long)]
        path: Option<String>,
        /// Validate every reduced tree against the schema
        #[arg(long)]
        validate: bool,
    },
}
