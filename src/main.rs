use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

mod cli;

use branchflow::{config, init_telemetry, BranchflowConfig};
use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = BranchflowConfig::load_env_file();
    let settings = match &cli.directory {
        Some(directory) => BranchflowConfig::load_from(directory)
            .with_context(|| format!("Failed to load settings from {}", directory.display()))?,
        None => config()?.clone(),
    };

    let level = if cli.verbose {
        "debug"
    } else {
        settings.observability.log_level.as_str()
    };
    init_telemetry(level, settings.observability.json)?;

    let directory = cli.directory.clone().unwrap_or_else(|| PathBuf::from("."));
    cli::commands::dispatch(cli.command, &directory, &settings)
}
