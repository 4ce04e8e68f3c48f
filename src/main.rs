//! Tripwire CLI entry point.

use anyhow::Result;
use clap::Parser;

use tripwire::cli::commands::{self, load_config};
use tripwire::cli::{Cli, Commands};
use tripwire::domain::models::{Config, LoggingConfig};
use tripwire::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    let loaded = load_config(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    let _logger = match LoggerImpl::init(&logging) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };

    if let Err(err) = run(cli.command, loaded, json_mode).await {
        tripwire::cli::handle_error(err, json_mode);
    }
}

async fn run(command: Commands, loaded: Result<Config>, json_mode: bool) -> Result<()> {
    match command {
        Commands::Init { force } => commands::init::execute(force, json_mode),
        Commands::Config(cmd) => commands::config::execute(&cmd, loaded, json_mode),
        Commands::Simulate(args) => {
            let config = loaded?;
            commands::simulate::execute(args, &config, json_mode).await
        }
        Commands::Status => {
            let config = loaded?;
            commands::status::execute(&config, json_mode).await
        }
    }
}
