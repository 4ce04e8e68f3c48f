//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tripwire")]
#[command(about = "Tripwire - circuit breaker registry", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .tripwire/
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default .tripwire/config.yaml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Replay a sequence of outcomes against one breaker
    Simulate(SimulateArgs),

    /// List configured endpoints and their resolved breaker config
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective merged configuration
    Show,

    /// Load and validate the configuration
    Validate,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Endpoint name; overrides from the `endpoints` config apply
    #[arg(short, long)]
    pub endpoint: String,

    /// Outcome sequence, `s` for success and `f` for failure (e.g. "sffff,s")
    #[arg(short, long)]
    pub outcomes: String,

    /// Seconds the simulated clock advances after each step
    #[arg(long, default_value = "0")]
    pub step_secs: u64,
}
