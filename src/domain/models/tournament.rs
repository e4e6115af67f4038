//! Tournament state machine types.

use serde::Serialize;
use uuid::Uuid;

use super::batch::BatchReport;
use super::candidate::{Candidate, Pool};
use crate::domain::errors::TournamentError;

/// Number of consecutive non-narrowing rounds that forces a random pick.
pub const FORCED_RESOLUTION_STALEMATES: u32 = 2;

/// Mutable bookkeeping for a running tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentState {
    pub current_pool: Pool,
    /// 1-based.
    pub round_number: u32,
    pub stalemate_counter: u32,
    pub history: Vec<RoundSummary>,
}

impl TournamentState {
    pub fn new(initial_pool: Pool) -> Self {
        Self {
            current_pool: initial_pool,
            round_number: 1,
            stalemate_counter: 0,
            history: Vec::new(),
        }
    }
}

/// How the winner was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The pool held a single candidate before any round was played.
    Unopposed,
    /// The judge narrowed the field to one.
    Judged,
    /// Picked uniformly at random after repeated stalemates.
    ForcedRandom,
}

/// A concluded tournament.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TournamentOutcome {
    pub winner: Candidate,
    pub resolution: Resolution,
    /// Rounds actually played.
    pub rounds: u32,
    pub history: Vec<RoundSummary>,
}

/// State machine positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TournamentPhase {
    Running(TournamentState),
    Done(TournamentOutcome),
    Failed(TournamentError),
}

impl TournamentPhase {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running(_))
    }
}

/// Directives layered onto the base instruction for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Escalation {
    /// A single batch decides the round; force roughly half to be cut.
    pub final_round: bool,
    /// The previous round did not narrow the field.
    pub force_choice: bool,
}

/// What happened in one round, kept for logging and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub entrants: usize,
    pub survivors: usize,
    pub escalation: Escalation,
    pub stalemate_counter: u32,
    pub batches: Vec<BatchReport>,
}

/// Progress notifications emitted while a tournament runs.
#[derive(Debug, Clone)]
pub enum TournamentEvent {
    Started {
        tournament_id: Uuid,
        entrants: usize,
        batch_size: usize,
    },
    RoundStarted {
        round: u32,
        entrants: usize,
        batches: usize,
        escalation: Escalation,
    },
    BatchCompleted {
        round: u32,
        report: BatchReport,
    },
    RoundCompleted {
        round: u32,
        survivors: usize,
    },
    StalemateDetected {
        round: u32,
        counter: u32,
    },
    ForcedResolution {
        round: u32,
        winner: Candidate,
    },
    Finished {
        tournament_id: Uuid,
        result: Result<Candidate, TournamentError>,
    },
}
