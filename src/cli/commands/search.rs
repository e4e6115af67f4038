//! Implementation of the `picsearch search` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::adapters::judges::JudgeRegistry;
use crate::adapters::render::{GridCompositeRenderer, GridLayout};
use crate::adapters::search::BingImageSource;
use crate::cli::output::progress::{create_spinner, hidden_spinner, spawn_event_spinner};
use crate::cli::output::table::round_table;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Resolution};
use crate::services::{PicSearchService, ResultFinalizer, SearchReport, TournamentEngine};

const EVENT_BUFFER: usize = 64;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text sent to the image search
    pub query: String,

    /// What the chosen image should show
    pub instruction: String,

    /// How many candidates to collect
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Candidates per grid
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Write the winning image here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save every grid sent to the judge into this directory
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Seed for stalemate tie-breaking
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    #[serde(flatten)]
    pub report: SearchReport,
    pub content_type: Option<String>,
    pub bytes: usize,
    pub saved_to: Option<PathBuf>,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        let outcome = &self.report.outcome;
        let how = match outcome.resolution {
            Resolution::Unopposed => "the only candidate",
            Resolution::Judged => "chosen by the judge",
            Resolution::ForcedRandom => "picked at random after repeated ties",
        };

        let mut lines = vec![
            format!("Winner: {}", outcome.winner),
            format!(
                "  {how}, {} candidate(s), {} round(s)",
                self.report.candidates, outcome.rounds
            ),
        ];
        if !outcome.history.is_empty() {
            lines.push(round_table(&outcome.history).to_string());
        }
        match &self.saved_to {
            Some(path) => lines.push(format!("Saved {} bytes to {}", self.bytes, path.display())),
            None => lines.push(format!("Fetched {} bytes", self.bytes)),
        }
        lines.join("\n")
    }
}

fn build_service(args: &SearchArgs, config: &Config) -> Result<PicSearchService> {
    let fetcher = super::content_fetcher(config)?;
    let renderer = Arc::new(GridCompositeRenderer::new(
        fetcher.clone(),
        GridLayout::from(&config.render),
    ));
    let judge = JudgeRegistry::new(
        config.judge.clone(),
        config.rate_limit.clone(),
        config.retry.clone(),
    )
    .create_judge()
    .context("Failed to set up the judge")?;

    let mut executor = super::executor_config(&config.tournament);
    if let Some(dir) = &args.debug_dir {
        executor.debug_dir = Some(dir.clone());
    }

    let batch_size = args.batch_size.unwrap_or(config.tournament.batch_size);
    let mut engine = TournamentEngine::new(renderer, judge, batch_size, executor)?;
    if let Some(seed) = args.seed {
        engine = engine.with_seed(seed);
    }

    let source = BingImageSource::new(&config.search).context("Failed to build search client")?;
    Ok(PicSearchService::new(
        Arc::new(source),
        engine,
        ResultFinalizer::new(fetcher),
    ))
}

pub async fn execute(args: SearchArgs, config: &Config, json_mode: bool) -> Result<()> {
    let service = build_service(&args, config)?;
    let count = args.count.unwrap_or(config.search.default_count);

    let spinner = if json_mode {
        hidden_spinner()
    } else {
        create_spinner()
    };
    spinner.set_message(format!("Searching for \"{}\"", args.query));

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let progress = spawn_event_spinner(spinner, rx);
    let result = service
        .search_with_events(&args.query, &args.instruction, count, tx)
        .await;
    progress.await.ok();

    let report = result.with_context(|| format!("Search for \"{}\" failed", args.query))?;

    if let Some(path) = &args.output {
        tokio::fs::write(path, &report.content.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    output(
        &SearchOutput {
            content_type: report.content.content_type.clone(),
            bytes: report.content.bytes.len(),
            saved_to: args.output,
            report,
        },
        json_mode,
    );
    Ok(())
}
