pub mod batch;
pub mod candidate;
pub mod config;
pub mod tournament;
pub mod verdict;

pub use batch::{Batch, BatchReport, BatchStatus, CompositeImage, RenderResult};
pub use candidate::{Candidate, Pool};
pub use config::{
    Config, JudgeConfig, LoggingConfig, RateLimitConfig, RenderConfig, RetryConfig, SearchConfig,
    TournamentConfig,
};
pub use tournament::{
    Escalation, Resolution, RoundSummary, TournamentEvent, TournamentOutcome, TournamentPhase,
    TournamentState, FORCED_RESOLUTION_STALEMATES,
};
pub use verdict::{JudgeVerdict, ResolvedVerdict};
