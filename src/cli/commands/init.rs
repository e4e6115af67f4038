//! Implementation of the `picsearch init` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{initialize, InitOutcome, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        format!("{}\n  {}", self.message, self.config_file.display())
    }
}

impl From<InitOutcome> for InitOutput {
    fn from(outcome: InitOutcome) -> Self {
        match outcome {
            InitOutcome::Created(config_file) => Self {
                success: true,
                message: "Wrote default configuration.".to_string(),
                config_file,
            },
            InitOutcome::Overwritten(config_file) => Self {
                success: true,
                message: "Replaced configuration with defaults.".to_string(),
                config_file,
            },
            InitOutcome::AlreadyInitialized(config_file) => Self {
                success: false,
                message: "Already initialized. Use --force to overwrite.".to_string(),
                config_file,
            },
        }
    }
}

pub fn execute(args: &InitArgs, json_mode: bool) -> Result<()> {
    let target = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let outcome = initialize(&SetupPaths::under(&target), args.force)?;
    output(&InitOutput::from(outcome), json_mode);
    Ok(())
}
