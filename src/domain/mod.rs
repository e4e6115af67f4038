//! Domain layer for picsearch
//!
//! Candidates, pools, batches, verdicts and tournament state, plus the port
//! traits the tournament engine drives.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    DeliveryError, FetchError, JudgeError, PicSearchError, RenderError, SearchError,
    TournamentError,
};
