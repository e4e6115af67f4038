//! Resolves a tournament winner back into its content.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::domain::errors::DeliveryError;
use crate::domain::models::Candidate;
use crate::domain::ports::{ContentFetcher, FetchedContent};

/// Re-fetches the winning candidate.
pub struct ResultFinalizer {
    fetcher: Arc<dyn ContentFetcher>,
}

impl ResultFinalizer {
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch the winner's bytes. A failure here leaves the decision intact:
    /// the error still names the winner.
    #[instrument(skip(self), fields(winner = %winner))]
    pub async fn finalize(&self, winner: &Candidate) -> Result<FetchedContent, DeliveryError> {
        match self.fetcher.fetch(winner).await {
            Ok(content) => {
                info!(bytes = content.bytes.len(), "winner delivered");
                Ok(content)
            }
            Err(source) => {
                warn!(error = %source, "could not deliver winner");
                Err(DeliveryError {
                    winner: winner.clone(),
                    source,
                })
            }
        }
    }
}
