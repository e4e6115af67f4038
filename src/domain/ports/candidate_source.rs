//! Candidate source port - interface for image discovery backends.

use async_trait::async_trait;

use crate::domain::errors::SearchError;
use crate::domain::models::Candidate;

/// Discovers candidate images for a short text query.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Source name for logs.
    fn name(&self) -> &'static str;

    /// Return up to `desired_count` candidates in discovery order.
    ///
    /// Best-effort: fewer than requested is a normal result. Implementations
    /// never return the same candidate twice.
    async fn discover(
        &self,
        query: &str,
        desired_count: usize,
    ) -> Result<Vec<Candidate>, SearchError>;
}
