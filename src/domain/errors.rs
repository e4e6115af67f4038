//! Domain errors for the picsearch tournament system.

use thiserror::Error;

use crate::domain::models::Candidate;

/// Errors that end a tournament without a winner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TournamentError {
    #[error("Round {round} produced no survivors across all batches")]
    NoSurvivors { round: u32 },

    #[error("Tournament concluded with an empty pool")]
    NoWinner,

    #[error("Invalid batch size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Failure to fetch a single candidate's bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid candidate URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP {status} while fetching {url}")]
    Status { url: String, status: u16 },

    #[error("Request for {url} timed out")]
    Timeout { url: String },

    #[error("Network error while fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Batch-level rendering failure. Always absorbed by the round executor.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to encode composite: {0}")]
    Encode(String),

    #[error("Compositing worker failed: {0}")]
    Worker(String),
}

/// Batch-level judging failure. Always absorbed by the round executor.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Vision model request failed: {0}")]
    Api(String),

    #[error("Vision model returned no text content")]
    EmptyResponse,

    #[error("Judge is not configured: {0}")]
    Unavailable(String),
}

pub type JudgeResult<T> = Result<T, JudgeError>;

/// Failure of the Candidate Source as a whole.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search query must not be empty")]
    EmptyQuery,
}

/// The winner could not be resolved back into deliverable content.
#[derive(Debug, Error)]
#[error("Failed to deliver winner {winner}: {source}")]
pub struct DeliveryError {
    pub winner: Candidate,
    #[source]
    pub source: FetchError,
}

/// Errors surfaced by the end-to-end search pipeline.
#[derive(Debug, Error)]
pub enum PicSearchError {
    #[error("No candidate images found for query '{0}'")]
    NoCandidates(String),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Tournament(#[from] TournamentError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl PicSearchError {
    /// The tournament winner, if one was decided before the failure.
    pub fn winner(&self) -> Option<&Candidate> {
        match self {
            Self::Delivery(err) => Some(&err.winner),
            _ => None,
        }
    }
}
