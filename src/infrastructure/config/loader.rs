use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project directory holding `config.yaml` and `local.yaml`.
pub const CONFIG_DIR: &str = ".picsearch";

/// Prefix for environment overrides; nested keys are split on `__`.
pub const ENV_PREFIX: &str = "PICSEARCH_";

/// Judge providers the registry knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "anthropic"];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid batch_size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid max_concurrent_batches: {0}. Must be at least 1 when set")]
    InvalidConcurrency(usize),

    #[error("Invalid {0}: must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("Invalid {0}: must be greater than 0")]
    InvalidGrid(&'static str),

    #[error("Unknown judge provider: {0}. Must be one of: openai, anthropic")]
    UnknownProvider(String),

    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the working directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.picsearch/config.yaml`, or `explicit` when given
    /// 3. `.picsearch/local.yaml` (optional overrides)
    /// 4. `PICSEARCH_*` environment variables
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        Self::load_from(Path::new("."), explicit)
    }

    /// [`Self::load`] with the project rooted at `root`.
    pub fn load_from(root: &Path, explicit: Option<&Path>) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let project_file = explicit.map_or_else(|| dir.join("config.yaml"), Path::to_path_buf);

        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(&project_file))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| {
                format!("Failed to load configuration ({})", project_file.display())
            })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a single file, without local or env layers.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let tournament = &config.tournament;
        if tournament.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(0));
        }
        if tournament.max_concurrent_batches == Some(0) {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if tournament.batch_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("tournament.batch_timeout_secs"));
        }

        if config.search.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("search.timeout_secs"));
        }
        if config.render.fetch_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("render.fetch_timeout_secs"));
        }
        if config.judge.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("judge.timeout_secs"));
        }

        if config.render.tile_size == 0 {
            return Err(ConfigError::InvalidGrid("render.tile_size"));
        }
        if config.render.columns == 0 {
            return Err(ConfigError::InvalidGrid("render.columns"));
        }

        if !KNOWN_PROVIDERS.contains(&config.judge.provider.as_str()) {
            return Err(ConfigError::UnknownProvider(config.judge.provider.clone()));
        }

        if config.rate_limit.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }
        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(0));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
