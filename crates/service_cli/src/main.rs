//! Exposure Check CLI - Command Line Operations for Exposure Aggregation
//!
//! This is the operational entry point for the exposure aggregation engine.
//!
//! # Commands
//!
//! - `exposure-check run` - Aggregate every configured desk/source pair and
//!   write envelopes, the consolidated report and missing-exposure alerts
//! - `exposure-check check` - Validate the job configuration
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate wires the configuration,
//! the file-backed fetch collaborator and the engine together.

use anyhow::Context;
use clap::{Parser, Subcommand};
use infra_config::JobConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod error;
mod sink;

pub use error::{CliError, Result};

/// Exposure aggregation and missing-measure detection CLI
#[derive(Parser)]
#[command(name = "exposure-check")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "exposure_job.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate exposures and write envelopes, report and alerts
    Run {
        /// Job timestamp (RFC 3339); defaults to now in the job timezone
        #[arg(short, long)]
        at: Option<String>,

        /// Only aggregate this desk
        #[arg(short, long)]
        desk: Option<String>,
    },

    /// Check the job configuration
    Check,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = JobConfig::load(&cli.config).map(JobConfig::with_env_override);
    let level = match (&loaded, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.log_level.to_lowercase(),
        (Err(_), false) => "info".to_string(),
    };
    init_tracing(&level);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let config =
        loaded.with_context(|| format!("loading job configuration {}", cli.config.display()))?;

    match cli.command {
        Commands::Run { at, desk } => commands::run::run(&config, at.as_deref(), desk.as_deref())?,
        Commands::Check => commands::check::run(&config)?,
    }
    Ok(())
}
