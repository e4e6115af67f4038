use serde::{Deserialize, Serialize};

/// Main configuration structure for picsearch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Candidate discovery (image search)
    #[serde(default)]
    pub search: SearchConfig,

    /// Elimination tournament settings
    #[serde(default)]
    pub tournament: TournamentConfig,

    /// Composite grid rendering
    #[serde(default)]
    pub render: RenderConfig,

    /// Vision-model judge
    #[serde(default)]
    pub judge: JudgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting for judge requests
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy for judge requests
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Image search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Search page endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Number of candidates to collect when the caller gives no count
    #[serde(default = "default_scrape_count")]
    pub default_count: usize,

    /// Pause between result pages in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Per-page request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_endpoint() -> String {
    "https://www.bing.com/images/search".to_string()
}

const fn default_scrape_count() -> usize {
    64
}

const fn default_page_delay_ms() -> u64 {
    500
}

const fn default_search_timeout() -> u64 {
    15
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            default_count: default_scrape_count(),
            page_delay_ms: default_page_delay_ms(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Tournament configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TournamentConfig {
    /// Candidates per composite grid
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound on batches judged at once within a round (unbounded if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_batches: Option<usize>,

    /// Budget for rendering plus judging a single batch, in seconds
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_secs: u64,

    /// Directory to save every composite grid into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<String>,
}

const fn default_batch_size() -> usize {
    16
}

const fn default_batch_timeout() -> u64 {
    180
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_batches: None,
            batch_timeout_secs: default_batch_timeout(),
            debug_dir: None,
        }
    }
}

/// Composite grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RenderConfig {
    /// Edge length of each square tile in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,

    /// Tiles per grid row
    #[serde(default = "default_columns")]
    pub columns: u32,

    /// Per-image download timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

const fn default_tile_size() -> u32 {
    256
}

const fn default_columns() -> u32 {
    4
}

const fn default_fetch_timeout() -> u64 {
    10
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_size: default_tile_size(),
            columns: default_columns(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

/// Vision-model judge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JudgeConfig {
    /// Provider: openai (any OpenAI-compatible endpoint) or anthropic
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the provider API (for self-hosted models and proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key (prefer `api_key_env`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Maximum tokens in the judge's reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_judge_timeout")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_max_tokens() -> u32 {
    512
}

const fn default_judge_timeout() -> u64 {
    120
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            api_key_env: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_judge_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated JSON log files (stderr only if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Log file rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Burst size for token bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> f64 {
    2.0
}

const fn default_burst_size() -> u32 {
    4
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    2000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
