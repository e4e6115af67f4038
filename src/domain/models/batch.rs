//! Batches of candidates and their rendered composites.

use serde::Serialize;

use super::candidate::Candidate;

/// A contiguous slice of a round's pool, processed as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 0-based position of this batch within its round.
    pub index: usize,
    pub candidates: Vec<Candidate>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Encoded grid image shown to the judge.
#[derive(Clone, PartialEq, Eq)]
pub struct CompositeImage {
    /// PNG-encoded bytes.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for CompositeImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeImage")
            .field("bytes", &self.png.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A composite paired with the candidates it actually shows.
///
/// `candidates[n]` is drawn at grid position `n` and carries the judge-facing
/// label `n + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub composite: CompositeImage,
    pub candidates: Vec<Candidate>,
}

impl RenderResult {
    /// Candidate shown under a 1-based label, if the label is in range.
    pub fn candidate_for_label(&self, label: u32) -> Option<&Candidate> {
        let index = usize::try_from(label).ok()?.checked_sub(1)?;
        self.candidates.get(index)
    }
}

/// How a single batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BatchStatus {
    /// The judge answered and its labels were resolved.
    Judged,
    /// No candidate in the batch could be fetched and decoded.
    NothingRendered,
    RenderFailed(String),
    JudgeFailed(String),
    TimedOut,
    /// The batch worker died before reporting.
    Aborted(String),
}

/// Per-batch accounting produced by the round executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub index: usize,
    pub submitted: usize,
    pub rendered: usize,
    pub labels: Vec<u32>,
    /// Labels that did not map onto a rendered candidate.
    pub dropped_labels: Vec<u32>,
    pub survivors: Vec<Candidate>,
    pub status: BatchStatus,
}

impl BatchReport {
    pub(crate) fn empty(index: usize, submitted: usize, status: BatchStatus) -> Self {
        Self {
            index,
            submitted,
            rendered: 0,
            labels: Vec::new(),
            dropped_labels: Vec::new(),
            survivors: Vec::new(),
            status,
        }
    }
}
