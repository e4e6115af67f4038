//! Implementation of the `picsearch judge` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::adapters::judges::JudgeRegistry;
use crate::adapters::render::composite_from_image_bytes;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::VisualJudge;

#[derive(Args, Debug)]
pub struct JudgeArgs {
    /// A labeled grid image, e.g. one written by `compose` or `--debug-dir`
    pub image: PathBuf,

    /// What the selected tiles should show
    pub instruction: String,
}

#[derive(Debug, Serialize)]
pub struct JudgeOutput {
    pub image: PathBuf,
    pub judge: String,
    pub selected: Vec<u32>,
}

impl CommandOutput for JudgeOutput {
    fn to_human(&self) -> String {
        if self.selected.is_empty() {
            return format!("{} selected nothing.", self.judge);
        }
        let labels: Vec<String> = self.selected.iter().map(ToString::to_string).collect();
        format!("{} selected: {}", self.judge, labels.join(", "))
    }
}

pub async fn execute(args: JudgeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let composite = composite_from_image_bytes(&bytes)
        .with_context(|| format!("{} is not a readable image", args.image.display()))?;

    let judge = JudgeRegistry::new(
        config.judge.clone(),
        config.rate_limit.clone(),
        config.retry.clone(),
    )
    .create_judge()
    .context("Failed to set up the judge")?;

    let verdict = judge
        .judge(&composite, &args.instruction)
        .await
        .context("Judge request failed")?;

    output(
        &JudgeOutput {
            image: args.image,
            judge: judge.name().to_string(),
            selected: verdict.labels().to_vec(),
        },
        json_mode,
    );
    Ok(())
}
