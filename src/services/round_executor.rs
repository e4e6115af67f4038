//! Round executor: fan out one round's batches, fan their survivors back in.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, instrument, warn, Instrument, Span};

use crate::domain::errors::TournamentError;
use crate::domain::models::{
    Batch, BatchReport, BatchStatus, CompositeImage, Escalation, Pool, TournamentEvent,
};
use crate::domain::ports::{CompositeRenderer, VisualJudge};
use crate::services::batch_partitioner::partition;
use crate::services::judging_instruction::effective_instruction;

/// Configuration for the round executor.
#[derive(Debug, Clone)]
pub struct RoundExecutorConfig {
    /// Maximum batches in flight at once; `None` dispatches the whole round.
    pub max_concurrent_batches: Option<usize>,
    /// Budget for rendering plus judging one batch.
    pub batch_timeout: Duration,
    /// Where to save each composite, if anywhere.
    pub debug_dir: Option<PathBuf>,
}

impl Default for RoundExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_batches: None,
            batch_timeout: Duration::from_secs(180),
            debug_dir: None,
        }
    }
}

/// Result of a round that kept at least one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Deduplicated survivors in batch order.
    pub survivors: Pool,
    /// One report per batch, by batch index.
    pub batches: Vec<BatchReport>,
}

/// Runs a single round over a pool.
pub struct RoundExecutor {
    renderer: Arc<dyn CompositeRenderer>,
    judge: Arc<dyn VisualJudge>,
    config: RoundExecutorConfig,
}

impl RoundExecutor {
    pub fn new(
        renderer: Arc<dyn CompositeRenderer>,
        judge: Arc<dyn VisualJudge>,
        config: RoundExecutorConfig,
    ) -> Self {
        Self {
            renderer,
            judge,
            config,
        }
    }

    /// Partition `pool`, render and judge every batch concurrently, and merge
    /// the survivors.
    ///
    /// Each batch gets `base_instruction` with the round's `escalation`
    /// directives, sized to the tiles it actually rendered. Batch-level
    /// failures cost that batch its survivors and nothing else. Only a round
    /// where every batch comes back empty is an error. Dropping the returned
    /// future aborts every batch still in flight.
    #[instrument(skip_all, fields(round = round, entrants = pool.len()))]
    pub async fn execute(
        &self,
        round: u32,
        pool: &Pool,
        batch_size: NonZeroUsize,
        base_instruction: &str,
        escalation: Escalation,
        events: Option<&mpsc::Sender<TournamentEvent>>,
    ) -> Result<RoundOutcome, TournamentError> {
        let batches = partition(pool.as_slice(), batch_size);
        let semaphore = self
            .config
            .max_concurrent_batches
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        let base_instruction: Arc<str> = Arc::from(base_instruction);

        let submitted: Vec<usize> = batches.iter().map(Batch::len).collect();
        let mut workers = JoinSet::new();
        for batch in batches {
            let index = batch.index;
            let batch_len = batch.len();
            let renderer = self.renderer.clone();
            let judge = self.judge.clone();
            let base_instruction = base_instruction.clone();
            let semaphore = semaphore.clone();
            let batch_timeout = self.config.batch_timeout;
            let debug_path = self
                .config
                .debug_dir
                .as_deref()
                .map(|dir| composite_path(dir, round, index));

            workers.spawn(
                async move {
                    let _permit = match semaphore {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    let work = run_batch(
                        renderer,
                        judge,
                        batch,
                        base_instruction,
                        escalation,
                        debug_path,
                    );
                    match timeout(batch_timeout, work).await {
                        Ok(report) => report,
                        Err(_) => {
                            warn!(batch = index + 1, ?batch_timeout, "batch timed out");
                            BatchReport::empty(index, batch_len, BatchStatus::TimedOut)
                        }
                    }
                }
                .instrument(Span::current()),
            );
        }

        let mut slots: Vec<Option<BatchReport>> = vec![None; submitted.len()];
        let mut aborted = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => {
                    let index = report.index;
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(report);
                    }
                }
                Err(err) => {
                    warn!(error = %err, "batch worker aborted");
                    aborted = Some(err.to_string());
                }
            }
        }

        // Merge in batch order so the result never depends on completion order.
        let mut reports = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            let report = slot.unwrap_or_else(|| {
                let reason = aborted
                    .clone()
                    .unwrap_or_else(|| "worker did not report".to_string());
                BatchReport::empty(index, submitted[index], BatchStatus::Aborted(reason))
            });
            notify(
                events,
                TournamentEvent::BatchCompleted {
                    round,
                    report: report.clone(),
                },
            );
            reports.push(report);
        }

        let survivors: Pool = reports
            .iter()
            .flat_map(|report| report.survivors.iter().cloned())
            .collect();

        if survivors.is_empty() {
            warn!(round, batches = reports.len(), "round produced no survivors");
            return Err(TournamentError::NoSurvivors { round });
        }

        info!(round, survivors = survivors.len(), "round complete");
        Ok(RoundOutcome {
            survivors,
            batches: reports,
        })
    }
}

/// Render and judge one batch; never fails, only reports.
async fn run_batch(
    renderer: Arc<dyn CompositeRenderer>,
    judge: Arc<dyn VisualJudge>,
    batch: Batch,
    base_instruction: Arc<str>,
    escalation: Escalation,
    debug_path: Option<PathBuf>,
) -> BatchReport {
    let index = batch.index;
    let submitted = batch.len();
    debug!(batch = index + 1, submitted, "rendering batch");

    let rendered = match renderer.render(&batch.candidates).await {
        Ok(Some(rendered)) if !rendered.candidates.is_empty() => rendered,
        Ok(_) => {
            warn!(batch = index + 1, "no image in batch could be fetched or decoded, skipping");
            return BatchReport::empty(index, submitted, BatchStatus::NothingRendered);
        }
        Err(err) => {
            warn!(batch = index + 1, error = %err, "rendering failed, skipping batch");
            return BatchReport::empty(index, submitted, BatchStatus::RenderFailed(err.to_string()));
        }
    };

    if let Some(path) = debug_path {
        save_composite(&path, &rendered.composite).await;
    }

    let instruction =
        effective_instruction(&base_instruction, escalation, rendered.candidates.len());
    debug!(
        batch = index + 1,
        rendered = rendered.candidates.len(),
        judge = judge.name(),
        "submitting composite to judge"
    );
    let verdict = match judge.judge(&rendered.composite, &instruction).await {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(batch = index + 1, error = %err, "judge failed, batch contributes no survivors");
            return BatchReport {
                rendered: rendered.candidates.len(),
                ..BatchReport::empty(index, submitted, BatchStatus::JudgeFailed(err.to_string()))
            };
        }
    };

    let resolved = verdict.resolve(&rendered);
    if !resolved.dropped_labels.is_empty() {
        warn!(
            batch = index + 1,
            dropped = ?resolved.dropped_labels,
            valid_range = rendered.candidates.len(),
            "judge returned out-of-range labels, ignoring them"
        );
    }
    if resolved.selected.is_empty() {
        warn!(batch = index + 1, "judge selected nothing from this batch");
    } else {
        info!(batch = index + 1, winners = resolved.selected.len(), "batch judged");
    }

    BatchReport {
        index,
        submitted,
        rendered: rendered.candidates.len(),
        labels: verdict.labels().to_vec(),
        dropped_labels: resolved.dropped_labels,
        survivors: resolved.selected,
        status: BatchStatus::Judged,
    }
}

fn composite_path(dir: &Path, round: u32, index: usize) -> PathBuf {
    dir.join(format!("round_{round:02}_batch_{:02}.png", index + 1))
}

async fn save_composite(path: &Path, composite: &CompositeImage) {
    if let Some(parent) = path.parent() {
        if let Err(err) = tokio::fs::create_dir_all(parent).await {
            warn!(path = %parent.display(), error = %err, "could not create debug directory");
            return;
        }
    }
    match tokio::fs::write(path, &composite.png).await {
        Ok(()) => debug!(path = %path.display(), "saved debug composite"),
        Err(err) => warn!(path = %path.display(), error = %err, "could not save debug composite"),
    }
}

/// Best-effort event delivery; a slow or absent listener never stalls a round.
pub(crate) fn notify(events: Option<&mpsc::Sender<TournamentEvent>>, event: TournamentEvent) {
    if let Some(tx) = events {
        if tx.try_send(event).is_err() {
            debug!("tournament event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockJudge, MockRenderer, MockVerdict};
    use crate::domain::models::Candidate;

    fn pool(n: usize) -> Pool {
        (0..n)
            .map(|i| Candidate::new(format!("https://img.test/{i}.jpg")))
            .collect()
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn executor(renderer: MockRenderer, judge: MockJudge) -> RoundExecutor {
        RoundExecutor::new(
            Arc::new(renderer),
            Arc::new(judge),
            RoundExecutorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_one_winner_per_batch() {
        let executor = executor(MockRenderer::new(), MockJudge::always(MockVerdict::Labels(vec![1])));
        let outcome = executor
            .execute(1, &pool(20), size(8), "cats", Escalation::default(), None)
            .await
            .unwrap();

        let winners: Vec<&str> = outcome.survivors.iter().map(Candidate::as_str).collect();
        assert_eq!(
            winners,
            vec![
                "https://img.test/0.jpg",
                "https://img.test/8.jpg",
                "https://img.test/16.jpg"
            ]
        );
        assert_eq!(outcome.batches.len(), 3);
        assert_eq!(outcome.batches[2].submitted, 4);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_abort_round() {
        let renderer = MockRenderer::new().failing_for(["https://img.test/0.jpg", "https://img.test/1.jpg"]);
        let executor = executor(renderer, MockJudge::always(MockVerdict::All));

        let outcome = executor
            .execute(1, &pool(4), size(2), "cats", Escalation::default(), None)
            .await
            .unwrap();

        assert_eq!(outcome.survivors.len(), 2);
        assert_eq!(outcome.batches[0].status, BatchStatus::NothingRendered);
        assert_eq!(outcome.batches[1].status, BatchStatus::Judged);
    }

    #[tokio::test]
    async fn test_out_of_range_labels_are_dropped() {
        let executor = executor(
            MockRenderer::new(),
            MockJudge::always(MockVerdict::Labels(vec![0, 2, 9])),
        );
        let outcome = executor
            .execute(1, &pool(3), size(3), "cats", Escalation::default(), None)
            .await
            .unwrap();

        assert_eq!(outcome.survivors.len(), 1);
        assert_eq!(outcome.batches[0].dropped_labels, vec![0, 9]);
    }

    #[tokio::test]
    async fn test_judge_error_degrades_to_zero_survivors() {
        let judge = MockJudge::always(MockVerdict::Labels(vec![2]))
            .with_rule("https://img.test/0.jpg", MockVerdict::Fail);
        let executor = RoundExecutor::new(
            Arc::new(MockRenderer::new()),
            Arc::new(judge),
            RoundExecutorConfig {
                max_concurrent_batches: Some(1),
                ..RoundExecutorConfig::default()
            },
        );

        let outcome = executor
            .execute(1, &pool(4), size(2), "cats", Escalation::default(), None)
            .await
            .unwrap();

        assert!(matches!(outcome.batches[0].status, BatchStatus::JudgeFailed(_)));
        assert_eq!(outcome.batches[0].rendered, 2);
        assert_eq!(
            outcome.survivors.as_slice(),
            &[Candidate::new("https://img.test/3.jpg")]
        );
    }

    #[tokio::test]
    async fn test_all_batches_empty_is_no_survivors() {
        let executor = executor(MockRenderer::new(), MockJudge::always(MockVerdict::Nothing));
        let err = executor
            .execute(3, &pool(5), size(2), "cats", Escalation::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err, TournamentError::NoSurvivors { round: 3 });
    }

    #[tokio::test]
    async fn test_slow_batch_times_out() {
        let judge = MockJudge::always(MockVerdict::All).with_delay(Duration::from_millis(200));
        let executor = RoundExecutor::new(
            Arc::new(MockRenderer::new()),
            Arc::new(judge),
            RoundExecutorConfig {
                batch_timeout: Duration::from_millis(20),
                ..RoundExecutorConfig::default()
            },
        );

        let err = executor
            .execute(1, &pool(2), size(2), "cats", Escalation::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err, TournamentError::NoSurvivors { round: 1 });
    }

    #[tokio::test]
    async fn test_debug_composites_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let executor = RoundExecutor::new(
            Arc::new(MockRenderer::new()),
            Arc::new(MockJudge::always(MockVerdict::All)),
            RoundExecutorConfig {
                debug_dir: Some(dir.path().join("grids")),
                ..RoundExecutorConfig::default()
            },
        );

        executor
            .execute(2, &pool(3), size(2), "cats", Escalation::default(), None)
            .await
            .unwrap();

        assert!(dir.path().join("grids/round_02_batch_01.png").exists());
        assert!(dir.path().join("grids/round_02_batch_02.png").exists());
    }

    #[tokio::test]
    async fn test_final_round_directive_counts_rendered_tiles() {
        let judge = Arc::new(MockJudge::always(MockVerdict::Labels(vec![1])));
        let renderer = MockRenderer::new().failing_for(["https://img.test/4.jpg"]);
        let executor = RoundExecutor::new(
            Arc::new(renderer),
            judge.clone(),
            RoundExecutorConfig::default(),
        );
        let escalation = Escalation {
            final_round: true,
            ..Escalation::default()
        };

        executor
            .execute(1, &pool(5), size(8), "cats", escalation, None)
            .await
            .unwrap();

        let instructions = judge.instructions();
        assert_eq!(instructions.len(), 1);
        assert!(instructions[0].contains("Select exactly 2 of the 4 images"));
        assert!(!instructions[0].contains("of the 5 images"));
    }

    #[tokio::test]
    async fn test_dropping_round_aborts_pending_batches() {
        let judge = Arc::new(
            MockJudge::always(MockVerdict::All).with_delay(Duration::from_millis(50)),
        );
        let executor = RoundExecutor::new(
            Arc::new(MockRenderer::new()),
            judge.clone(),
            RoundExecutorConfig {
                max_concurrent_batches: Some(1),
                ..RoundExecutorConfig::default()
            },
        );

        let cut_short = timeout(
            Duration::from_millis(10),
            executor.execute(1, &pool(6), size(2), "cats", Escalation::default(), None),
        )
        .await;
        assert!(cut_short.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(judge.calls(), 1);
    }
}
