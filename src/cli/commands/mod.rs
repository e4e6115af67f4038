//! CLI command implementations.

pub mod compose;
pub mod init;
pub mod judge;
pub mod search;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::http::HttpContentFetcher;
use crate::domain::models::{Config, TournamentConfig};
use crate::services::RoundExecutorConfig;

/// Round executor settings from the `tournament` config section.
pub fn executor_config(config: &TournamentConfig) -> RoundExecutorConfig {
    RoundExecutorConfig {
        max_concurrent_batches: config.max_concurrent_batches,
        batch_timeout: Duration::from_secs(config.batch_timeout_secs),
        debug_dir: config.debug_dir.as_ref().map(PathBuf::from),
    }
}

/// Image downloader shared by the renderer and the finalizer.
pub fn content_fetcher(config: &Config) -> Result<Arc<HttpContentFetcher>> {
    let fetcher = HttpContentFetcher::new(Duration::from_secs(config.render.fetch_timeout_secs))
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(fetcher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_config_from_tournament_section() {
        let section = TournamentConfig {
            max_concurrent_batches: Some(3),
            batch_timeout_secs: 30,
            debug_dir: Some("grids".to_string()),
            ..TournamentConfig::default()
        };
        let executor = executor_config(&section);
        assert_eq!(executor.max_concurrent_batches, Some(3));
        assert_eq!(executor.batch_timeout, Duration::from_secs(30));
        assert_eq!(executor.debug_dir, Some(PathBuf::from("grids")));
    }
}
