//! Project initialization: the `.picsearch/` directory and its config template.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::config::CONFIG_DIR;

/// Default configuration template content
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# picsearch configuration
# Override settings by editing this file, adding .picsearch/local.yaml,
# or setting environment variables with the PICSEARCH_ prefix
# (nested keys separated by a double underscore).
#
# Example environment variables:
#   export PICSEARCH_TOURNAMENT__BATCH_SIZE=9
#   export PICSEARCH_JUDGE__PROVIDER=anthropic
#   export PICSEARCH_LOGGING__LEVEL=debug

# Candidate discovery
search:
  # Image search page endpoint
  endpoint: "https://www.bing.com/images/search"

  # Candidates to collect when --count is not given
  default_count: 64

  # Pause between result pages in milliseconds
  page_delay_ms: 500

  # Per-page request timeout in seconds
  timeout_secs: 15

# Elimination tournament
tournament:
  # Candidates per composite grid
  batch_size: 16

  # Upper bound on batches judged at once (unbounded when omitted)
  # max_concurrent_batches: 4

  # Budget for rendering plus judging one batch, in seconds
  batch_timeout_secs: 180

  # Save every composite grid here for inspection
  # debug_dir: ".picsearch/debug"

# Composite grids
render:
  # Edge length of each square tile in pixels
  tile_size: 256

  # Tiles per row
  columns: 4

  # Per-image download timeout in seconds
  fetch_timeout_secs: 10

# Vision-model judge
judge:
  # Provider: openai (any OpenAI-compatible endpoint) or anthropic
  provider: "openai"

  # Model identifier
  model: "gpt-4o-mini"

  # Base URL override for self-hosted models and proxies
  # base_url: "http://localhost:11434/v1"

  # Environment variable holding the API key
  # (defaults to OPENAI_API_KEY or ANTHROPIC_API_KEY)
  # api_key_env: "OPENAI_API_KEY"

  # Maximum tokens in the judge's reply
  max_tokens: 512

  # Request timeout in seconds
  timeout_secs: 120

# Judge request rate limiting
rate_limit:
  # Requests per second allowed
  requests_per_second: 2.0

  # Burst size for token bucket algorithm
  burst_size: 4

# Retry policy for transient judge failures
retry:
  # Retries after the first attempt
  max_retries: 2

  # Initial backoff delay in milliseconds
  initial_backoff_ms: 2000

  # Maximum backoff delay in milliseconds
  max_backoff_ms: 30000

# Logging
logging:
  # Log level: trace, debug, info, warn, error
  level: "info"

  # Stderr format: json, pretty
  format: "pretty"

  # Directory for rotated JSON log files (stderr only when omitted)
  # log_dir: ".picsearch/logs"

  # Log file rotation: daily, hourly, never
  rotation: "daily"
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::under(&current_dir))
    }

    /// Paths for a project rooted at `root`
    pub fn under(root: &Path) -> Self {
        let config_dir = root.join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    /// Check if picsearch is already initialized
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// What `initialize` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    Overwritten(PathBuf),
    AlreadyInitialized(PathBuf),
}

/// Write the default config template, keeping an existing file unless `force`.
pub fn initialize(paths: &SetupPaths, force: bool) -> Result<InitOutcome> {
    let existed = paths.is_initialized();
    if existed && !force {
        return Ok(InitOutcome::AlreadyInitialized(paths.config_file.clone()));
    }

    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "Failed to create config directory {}",
            paths.config_dir.display()
        )
    })?;
    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).with_context(|| {
        format!("Failed to write config file {}", paths.config_file.display())
    })?;

    let path = paths.config_file.clone();
    Ok(if existed {
        InitOutcome::Overwritten(path)
    } else {
        InitOutcome::Created(path)
    })
}
