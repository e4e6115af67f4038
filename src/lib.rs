//! picsearch - pick one image out of many with a vision-model tournament
//!
//! A text query goes to an image search, the results are tiled into labeled
//! grids, and a vision model repeatedly keeps the tiles that match a
//! description until one image is left.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): candidates, verdicts, tournament state, ports
//! - **Service Layer** (`services`): round executor, tournament engine, search pipeline
//! - **Adapters** (`adapters`): search, download, rendering and judge implementations
//! - **Infrastructure Layer** (`infrastructure`): config, logging, HTTP retry and rate limiting
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use picsearch::adapters::mock::{MockJudge, MockRenderer, MockVerdict};
//! use picsearch::{Candidate, Pool, RoundExecutorConfig, TournamentEngine};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let engine = TournamentEngine::new(
//!     Arc::new(MockRenderer::new()),
//!     Arc::new(MockJudge::always(MockVerdict::Labels(vec![1]))),
//!     8,
//!     RoundExecutorConfig::default(),
//! )?;
//! let pool: Pool = ["https://a.test/1.jpg", "https://a.test/2.jpg"]
//!     .into_iter()
//!     .map(Candidate::new)
//!     .collect();
//! let outcome = engine.run_tournament(pool, "a lighthouse at dusk").await?;
//! println!("{}", outcome.winner);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{PicSearchError, TournamentError};
pub use domain::models::{
    Candidate, Config, Pool, Resolution, TournamentEvent, TournamentOutcome,
};
pub use domain::ports::{CandidateSource, CompositeRenderer, ContentFetcher, VisualJudge};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{PicSearchService, RoundExecutorConfig, SearchReport, TournamentEngine};
