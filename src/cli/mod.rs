//! Command-line interface for Wordmill
//!
//! This module provides the main CLI structure and command handling for
//! Wordmill. It uses clap for argument parsing and provides a clean,
//! user-friendly interface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod output;

use commands::process::ProcessArgs;

/// Wordmill - Parallel Text Analytics for Tabular Records
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable quiet output (minimal)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the analysis pipeline over a CSV of records
    Process(ProcessArgs),
    /// Show version information
    Version,
}

impl Cli {
    /// Install the tracing subscriber. `RUST_LOG` wins over the verbosity
    /// flags; log lines go to stderr so machine-readable stdout stays clean.
    pub fn init_logging(&self) {
        let default_level = if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Process(args) => {
                commands::process::execute(args, self.config.as_deref(), self.quiet).await
            }
            Commands::Version => commands::version::execute().await,
        }
    }
}
