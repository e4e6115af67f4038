//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::compose::ComposeArgs;
use super::commands::init::InitArgs;
use super::commands::judge::JudgeArgs;
use super::commands::search::SearchArgs;

#[derive(Parser, Debug)]
#[command(name = "picsearch")]
#[command(about = "Find the one web image that best matches a description", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Config file to use instead of .picsearch/config.yaml
    #[arg(short, long, global = true, env = "PICSEARCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the web and run an elimination tournament over the results
    Search(SearchArgs),

    /// Ask the judge which tiles of a labeled grid image match an instruction
    Judge(JudgeArgs),

    /// Render a labeled grid from image URLs
    Compose(ComposeArgs),

    /// Write a default configuration file
    Init(InitArgs),
}
