//! Implementation of the `picsearch compose` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::adapters::render::{GridCompositeRenderer, GridLayout};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Candidate, Config};
use crate::domain::ports::CompositeRenderer;

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Image URLs, in label order
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Where to write the PNG grid
    #[arg(short, long)]
    pub output: PathBuf,

    /// Override the configured tile edge in pixels
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Override the configured number of columns
    #[arg(long)]
    pub columns: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Tile {
    pub label: u32,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ComposeOutput {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Tile>,
    /// URLs that could not be fetched or decoded.
    pub skipped: Vec<String>,
}

impl CommandOutput for ComposeOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Wrote {}x{} grid to {}",
            self.width,
            self.height,
            self.output.display()
        )];
        for tile in &self.tiles {
            lines.push(format!("  {:>2}  {}", tile.label, tile.url));
        }
        if !self.skipped.is_empty() {
            lines.push(format!("Skipped {} image(s):", self.skipped.len()));
            lines.extend(self.skipped.iter().map(|url| format!("  - {url}")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ComposeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let layout = GridLayout::new(
        args.tile_size.unwrap_or(config.render.tile_size),
        args.columns.unwrap_or(config.render.columns),
    );
    let renderer = GridCompositeRenderer::new(super::content_fetcher(config)?, layout);

    let batch: Vec<Candidate> = args.urls.iter().map(Candidate::new).collect();
    let rendered = renderer
        .render(&batch)
        .await
        .context("Failed to render grid")?
        .context("None of the images could be fetched and decoded")?;

    tokio::fs::write(&args.output, &rendered.composite.png)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let tiles: Vec<Tile> = (1u32..)
        .zip(&rendered.candidates)
        .map(|(label, candidate)| Tile {
            label,
            url: candidate.to_string(),
        })
        .collect();
    let skipped = batch
        .iter()
        .filter(|c| !rendered.candidates.contains(c))
        .map(ToString::to_string)
        .collect();

    output(
        &ComposeOutput {
            output: args.output,
            width: rendered.composite.width,
            height: rendered.composite.height,
            tiles,
            skipped,
        },
        json_mode,
    );
    Ok(())
}

