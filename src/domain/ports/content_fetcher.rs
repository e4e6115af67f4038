//! Content fetcher port - resolves a candidate into its raw bytes.

use async_trait::async_trait;

use crate::domain::errors::FetchError;
use crate::domain::models::Candidate;

/// Raw bytes behind a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, candidate: &Candidate) -> Result<FetchedContent, FetchError>;
}
