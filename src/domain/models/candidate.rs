//! Candidate identifiers and the ordered, duplicate-free pool they live in.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// An opaque contender identifier (an image URL).
///
/// Cloning is a reference-count bump; the identifier itself is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(Arc<str>);

impl Candidate {
    pub fn new(locator: impl AsRef<str>) -> Self {
        Self(Arc::from(locator.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The still-alive contenders at the start of a round.
///
/// Construction deduplicates while keeping first-occurrence order, so a pool
/// is always an ordered set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Pool(Vec<Candidate>);

impl Pool {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Candidate> {
        self.0.first()
    }

    pub fn contains(&self, candidate: &Candidate) -> bool {
        self.0.contains(candidate)
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.0
    }
}

impl FromIterator<Candidate> for Pool {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let members = iter
            .into_iter()
            .filter(|candidate| seen.insert(candidate.clone()))
            .collect();
        Self(members)
    }
}

impl From<Vec<Candidate>> for Pool {
    fn from(candidates: Vec<Candidate>) -> Self {
        candidates.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Pool {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Pool {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
