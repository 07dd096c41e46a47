//! Treelens CLI Binary
//!
//! Replays serialized actions against a schema-typed state tree.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path as FsPath;
use std::process;
use treelens::action::WireAction;
use treelens::cli::{Cli, Commands};
use treelens::config::{ConfigLoader, StoreConfig};
use treelens::logging::init_logging;
use treelens::replay::replay;
use treelens::store::StoreOptions;
use treelens::tree::{Node, Path};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli);

    let mut logging = config.logging.clone();
    if !cli.verbose {
        logging.level = "off".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match run(&cli, &config) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> StoreConfig {
    let loaded = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.root),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("Ignoring configuration: {}", e);
        ConfigLoader::default()
    })
}

fn read_json(path: &FsPath) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn run(cli: &Cli, config: &StoreConfig) -> Result<String> {
    match &cli.command {
        Commands::Replay {
            schema,
            state,
            actions,
            path,
            validate,
        } => {
            let schema = read_json(schema)?;
            let initial = match state {
                Some(state) => Some(Node::from(read_json(state)?)),
                None => None,
            };
            let actions: Vec<WireAction> = serde_json::from_value(read_json(actions)?)
                .context("Actions must be an array of { type?, path, value?, args? } objects")?;
            let path = path.as_deref().map(Path::parse);

            let mut options = StoreOptions::from(config);
            options.validate |= *validate;

            let report = replay(&schema, initial, actions, path.as_ref(), options)?;
            info!(applied = report.applied, commits = report.commits, "Replay complete");
            Ok(serde_json::to_string_pretty(&report.value.to_json())?)
        }
    }
}
