//! picsearch CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use picsearch::cli::{commands, handle_error, Cli, Commands};
use picsearch::infrastructure::config::ConfigLoader;
use picsearch::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init(args) = &cli.command {
        return commands::init::execute(args, cli.json);
    }

    let config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    match cli.command {
        Commands::Search(args) => commands::search::execute(args, &config, cli.json).await,
        Commands::Judge(args) => commands::judge::execute(args, &config, cli.json).await,
        Commands::Compose(args) => commands::compose::execute(args, &config, cli.json).await,
        Commands::Init(_) => Ok(()),
    }
}
