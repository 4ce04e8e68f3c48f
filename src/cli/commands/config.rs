//! Implementation of the `tripwire config` commands.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::cli::types::ConfigCommands;
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigShowOutput {
    pub config: Config,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config)
            .unwrap_or_else(|e| format!("Failed to render configuration: {e}"))
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    pub endpoints: usize,
    pub log_level: String,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        format!(
            "Configuration is valid ({} endpoint{}, log level {}).",
            self.endpoints,
            if self.endpoints == 1 { "" } else { "s" },
            self.log_level
        )
    }
}

/// Run a config subcommand. Loading and validation errors surface as `Err`.
pub fn execute(command: &ConfigCommands, loaded: Result<Config>, json_mode: bool) -> Result<()> {
    let config = loaded?;
    match command {
        ConfigCommands::Show => output(&ConfigShowOutput { config }, json_mode),
        ConfigCommands::Validate => output(
            &ConfigValidateOutput {
                valid: true,
                endpoints: config.endpoints.len(),
                log_level: config.logging.level,
            },
            json_mode,
        ),
    }
    Ok(())
}
