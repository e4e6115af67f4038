//! Judge verdicts and their resolution against a rendered batch.

use serde::Serialize;

use super::batch::RenderResult;
use super::candidate::Candidate;

/// Labels picked by the visual judge for one composite, in the order given.
///
/// May contain duplicates or out-of-range labels; [`JudgeVerdict::resolve`]
/// is where those get filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JudgeVerdict {
    labels: Vec<u32>,
}

/// Outcome of mapping a verdict back onto candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedVerdict {
    pub selected: Vec<Candidate>,
    pub dropped_labels: Vec<u32>,
}

impl JudgeVerdict {
    pub fn new(labels: Vec<u32>) -> Self {
        Self { labels }
    }

    /// The judge selected nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Map labels to candidates via 1-based indexing.
    ///
    /// Out-of-range labels are collected in `dropped_labels`; a label chosen
    /// twice selects its candidate once.
    pub fn resolve(&self, rendered: &RenderResult) -> ResolvedVerdict {
        let mut resolved = ResolvedVerdict::default();
        for &label in &self.labels {
            match rendered.candidate_for_label(label) {
                Some(candidate) if !resolved.selected.contains(candidate) => {
                    resolved.selected.push(candidate.clone());
                }
                Some(_) => {}
                None => resolved.dropped_labels.push(label),
            }
        }
        resolved
    }
}

impl From<Vec<u32>> for JudgeVerdict {
    fn from(labels: Vec<u32>) -> Self {
        Self::new(labels)
    }
}
