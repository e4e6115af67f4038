//! End-to-end search: discover candidates, run the tournament, deliver the winner.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::domain::errors::PicSearchError;
use crate::domain::models::{Pool, TournamentEvent, TournamentOutcome};
use crate::domain::ports::{CandidateSource, FetchedContent};
use crate::services::result_finalizer::ResultFinalizer;
use crate::services::tournament_engine::TournamentEngine;

/// Everything a finished search produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub instruction: String,
    /// Distinct candidates entering round one.
    pub candidates: usize,
    pub outcome: TournamentOutcome,
    #[serde(skip)]
    pub content: FetchedContent,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Wires the candidate source, tournament engine and finalizer together.
pub struct PicSearchService {
    source: Arc<dyn CandidateSource>,
    engine: TournamentEngine,
    finalizer: ResultFinalizer,
}

impl PicSearchService {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        engine: TournamentEngine,
        finalizer: ResultFinalizer,
    ) -> Self {
        Self {
            source,
            engine,
            finalizer,
        }
    }

    /// Find the single image for `query` that best matches `instruction`.
    pub async fn search(
        &self,
        query: &str,
        instruction: &str,
        count: usize,
    ) -> Result<SearchReport, PicSearchError> {
        self.run(query, instruction, count, None).await
    }

    /// [`Self::search`], streaming tournament progress into `events`.
    pub async fn search_with_events(
        &self,
        query: &str,
        instruction: &str,
        count: usize,
        events: mpsc::Sender<TournamentEvent>,
    ) -> Result<SearchReport, PicSearchError> {
        self.run(query, instruction, count, Some(events)).await
    }

    #[instrument(skip(self, instruction, events), fields(source = self.source.name()))]
    async fn run(
        &self,
        query: &str,
        instruction: &str,
        count: usize,
        events: Option<mpsc::Sender<TournamentEvent>>,
    ) -> Result<SearchReport, PicSearchError> {
        let started_at = Utc::now();

        let pool: Pool = self.source.discover(query, count).await?.into();
        if pool.is_empty() {
            return Err(PicSearchError::NoCandidates(query.to_string()));
        }
        let candidates = pool.len();
        info!(candidates, "candidates discovered");

        let outcome = match events {
            Some(tx) => self.engine.run_with_events(pool, instruction, tx).await?,
            None => self.engine.run_tournament(pool, instruction).await?,
        };

        let content = self.finalizer.finalize(&outcome.winner).await?;

        Ok(SearchReport {
            query: query.to_string(),
            instruction: instruction.to_string(),
            candidates,
            outcome,
            content,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockCandidateSource, MockFetcher, MockJudge, MockRenderer, MockVerdict};
    use crate::domain::errors::TournamentError;
    use crate::services::round_executor::RoundExecutorConfig;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://img.test/{i}.jpg")).collect()
    }

    fn service(source: MockCandidateSource, judge: MockJudge, fetcher: MockFetcher) -> PicSearchService {
        let engine = TournamentEngine::new(
            Arc::new(MockRenderer::new()),
            Arc::new(judge),
            4,
            RoundExecutorConfig::default(),
        )
        .unwrap();
        PicSearchService::new(
            Arc::new(source),
            engine,
            ResultFinalizer::new(Arc::new(fetcher)),
        )
    }

    #[tokio::test]
    async fn test_search_delivers_winner() {
        let service = service(
            MockCandidateSource::new(urls(8)),
            MockJudge::always(MockVerdict::Labels(vec![1])),
            MockFetcher::new(),
        );

        let report = service.search("cats", "a tabby cat", 8).await.unwrap();
        assert_eq!(report.candidates, 8);
        assert_eq!(report.outcome.winner.as_str(), "https://img.test/0.jpg");
        assert_eq!(report.content.bytes, b"https://img.test/0.jpg");
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let service = service(
            MockCandidateSource::new(Vec::<String>::new()),
            MockJudge::always(MockVerdict::All),
            MockFetcher::new(),
        );
        let err = service.search("cats", "a cat", 8).await.unwrap_err();
        assert!(matches!(err, PicSearchError::NoCandidates(q) if q == "cats"));
    }

    #[tokio::test]
    async fn test_tournament_failure_is_reported() {
        let service = service(
            MockCandidateSource::new(urls(3)),
            MockJudge::always(MockVerdict::Nothing),
            MockFetcher::new(),
        );
        let err = service.search("cats", "a cat", 8).await.unwrap_err();
        assert!(matches!(
            err,
            PicSearchError::Tournament(TournamentError::NoSurvivors { round: 1 })
        ));
        assert!(err.winner().is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_winner() {
        let service = service(
            MockCandidateSource::new(urls(1)),
            MockJudge::always(MockVerdict::All),
            MockFetcher::new().missing(["https://img.test/0.jpg"]),
        );
        let err = service.search("cats", "a cat", 8).await.unwrap_err();
        assert_eq!(err.winner().map(|c| c.as_str()), Some("https://img.test/0.jpg"));
    }
}
