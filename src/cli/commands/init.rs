//! Implementation of the `tripwire init` command.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{init_project, SetupPaths};

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        if self.success {
            format!("{}\n  {}", self.message, self.config_file.display())
        } else {
            self.message.clone()
        }
    }
}

pub fn execute(force: bool, json_mode: bool) -> Result<()> {
    let paths = SetupPaths::new()?;
    let existed = paths.is_initialized();
    let written = init_project(&paths, force)?;

    let message = match (written, existed) {
        (false, _) => "Project already initialized. Use --force to overwrite the config.",
        (true, true) => "Configuration reset to defaults.",
        (true, false) => "Project initialized.",
    };

    output(
        &InitOutput {
            success: written,
            message: message.to_string(),
            config_file: paths.config_file,
        },
        json_mode,
    );
    Ok(())
}
