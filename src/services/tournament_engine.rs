//! Tournament engine: the elimination state machine driving rounds to one winner.
//!
//! ```text
//! Running ──advance──► Running   (pool narrowed, or first stalemate)
//!    │
//!    ├──► Done      (one candidate left, or forced random pick)
//!    └──► Failed    (empty pool, or a round with no survivors)
//! ```
//!
//! Every `Running -> Running` step either shrinks the pool or bumps the
//! stalemate counter, and the counter reaching
//! [`FORCED_RESOLUTION_STALEMATES`] always ends the tournament, so the
//! driving loop terminates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{field, info, instrument, warn, Span};
use uuid::Uuid;

use crate::domain::errors::{TournamentError, TournamentResult};
use crate::domain::models::{
    Candidate, Pool, Resolution, RoundSummary, TournamentEvent, TournamentOutcome,
    TournamentPhase, TournamentState, FORCED_RESOLUTION_STALEMATES,
};
use crate::domain::ports::{CompositeRenderer, VisualJudge};
use crate::services::batch_partitioner::batch_count;
use crate::services::judging_instruction::escalation_for;
use crate::services::round_executor::{notify, RoundExecutor, RoundExecutorConfig};

/// Elimination tournament over a candidate pool.
pub struct TournamentEngine {
    executor: RoundExecutor,
    batch_size: NonZeroUsize,
    rng: Mutex<StdRng>,
}

impl TournamentEngine {
    /// Build an engine. `batch_size` is fixed for every tournament it runs.
    pub fn new(
        renderer: Arc<dyn CompositeRenderer>,
        judge: Arc<dyn VisualJudge>,
        batch_size: usize,
        round_config: RoundExecutorConfig,
    ) -> TournamentResult<Self> {
        let batch_size =
            NonZeroUsize::new(batch_size).ok_or(TournamentError::InvalidBatchSize(batch_size))?;
        Ok(Self {
            executor: RoundExecutor::new(renderer, judge, round_config),
            batch_size,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Make forced resolution reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub const fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Perform one transition from a running state.
    ///
    /// A pool of at most one candidate concludes without touching any
    /// collaborator. Otherwise exactly one round is played.
    pub async fn advance(
        &self,
        mut state: TournamentState,
        base_instruction: &str,
        events: Option<&mpsc::Sender<TournamentEvent>>,
    ) -> TournamentPhase {
        let entrants = state.current_pool.len();
        if entrants <= 1 {
            let Some(winner) = state.current_pool.first().cloned() else {
                return TournamentPhase::Failed(TournamentError::NoWinner);
            };
            let resolution = if state.history.is_empty() {
                Resolution::Unopposed
            } else {
                Resolution::Judged
            };
            return TournamentPhase::Done(conclude(state, winner, resolution));
        }

        let round = state.round_number;
        let escalation = escalation_for(entrants, self.batch_size.get(), state.stalemate_counter);

        info!(
            round,
            entrants,
            final_round = escalation.final_round,
            force_choice = escalation.force_choice,
            "starting round"
        );
        notify(
            events,
            TournamentEvent::RoundStarted {
                round,
                entrants,
                batches: batch_count(entrants, self.batch_size),
                escalation,
            },
        );

        let outcome = match self
            .executor
            .execute(
                round,
                &state.current_pool,
                self.batch_size,
                base_instruction,
                escalation,
                events,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => return TournamentPhase::Failed(err),
        };

        let next_pool = outcome.survivors;
        notify(
            events,
            TournamentEvent::RoundCompleted {
                round,
                survivors: next_pool.len(),
            },
        );

        if next_pool.len() == entrants && next_pool.len() > 1 {
            state.stalemate_counter += 1;
            warn!(
                round,
                pool = entrants,
                stalemates = state.stalemate_counter,
                "round did not narrow the pool"
            );
            notify(
                events,
                TournamentEvent::StalemateDetected {
                    round,
                    counter: state.stalemate_counter,
                },
            );
        } else {
            state.stalemate_counter = 0;
        }

        state.history.push(RoundSummary {
            round,
            entrants,
            survivors: next_pool.len(),
            escalation,
            stalemate_counter: state.stalemate_counter,
            batches: outcome.batches,
        });

        if state.stalemate_counter >= FORCED_RESOLUTION_STALEMATES {
            let Some(winner) = self.pick_at_random(&next_pool) else {
                return TournamentPhase::Failed(TournamentError::NoWinner);
            };
            warn!(
                round,
                remaining = next_pool.len(),
                winner = %winner,
                "judge keeps approving everything, picking a winner at random"
            );
            notify(
                events,
                TournamentEvent::ForcedResolution {
                    round,
                    winner: winner.clone(),
                },
            );
            return TournamentPhase::Done(conclude(state, winner, Resolution::ForcedRandom));
        }

        state.current_pool = next_pool;
        state.round_number += 1;
        TournamentPhase::Running(state)
    }

    /// Run rounds until a single winner remains.
    pub async fn run_tournament(
        &self,
        initial_pool: Pool,
        base_instruction: &str,
    ) -> TournamentResult<TournamentOutcome> {
        self.drive(initial_pool, base_instruction, None).await
    }

    /// [`Self::run_tournament`], streaming progress into `events`.
    pub async fn run_with_events(
        &self,
        initial_pool: Pool,
        base_instruction: &str,
        events: mpsc::Sender<TournamentEvent>,
    ) -> TournamentResult<TournamentOutcome> {
        self.drive(initial_pool, base_instruction, Some(&events)).await
    }

    #[instrument(skip_all, fields(tournament_id = field::Empty, entrants = initial_pool.len(), batch_size = self.batch_size.get()))]
    async fn drive(
        &self,
        initial_pool: Pool,
        base_instruction: &str,
        events: Option<&mpsc::Sender<TournamentEvent>>,
    ) -> TournamentResult<TournamentOutcome> {
        let tournament_id = Uuid::new_v4();
        Span::current().record("tournament_id", field::display(tournament_id));

        info!(entrants = initial_pool.len(), "tournament started");
        notify(
            events,
            TournamentEvent::Started {
                tournament_id,
                entrants: initial_pool.len(),
                batch_size: self.batch_size.get(),
            },
        );

        let mut phase = TournamentPhase::Running(TournamentState::new(initial_pool));
        let result = loop {
            phase = match phase {
                TournamentPhase::Running(state) => {
                    self.advance(state, base_instruction, events).await
                }
                TournamentPhase::Done(outcome) => break Ok(outcome),
                TournamentPhase::Failed(err) => break Err(err),
            };
        };

        match &result {
            Ok(outcome) => info!(
                winner = %outcome.winner,
                rounds = outcome.rounds,
                resolution = ?outcome.resolution,
                "tournament finished"
            ),
            Err(err) => warn!(error = %err, "tournament failed"),
        }
        notify(
            events,
            TournamentEvent::Finished {
                tournament_id,
                result: result.as_ref().map(|o| o.winner.clone()).map_err(Clone::clone),
            },
        );

        result
    }

    fn pick_at_random(&self, pool: &Pool) -> Option<Candidate> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.as_slice().choose(&mut *rng).cloned()
    }
}

fn conclude(state: TournamentState, winner: Candidate, resolution: Resolution) -> TournamentOutcome {
    TournamentOutcome {
        winner,
        resolution,
        rounds: u32::try_from(state.history.len()).unwrap_or(u32::MAX),
        history: state.history,
    }
}
