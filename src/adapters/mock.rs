//! Mock collaborators for testing.
//!
//! `MockRenderer` writes the candidate locators of a batch, one per line,
//! into the composite bytes instead of drawing pixels. `MockJudge` reads them
//! back, which lets tests script verdicts per candidate without any images.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::errors::{FetchError, JudgeError, JudgeResult, RenderError, SearchError};
use crate::domain::models::{Candidate, CompositeImage, JudgeVerdict, RenderResult};
use crate::domain::ports::{
    CandidateSource, CompositeRenderer, ContentFetcher, FetchedContent, VisualJudge,
};

/// Lines of a mock composite, i.e. the rendered candidates in label order.
pub fn mock_composite_candidates(composite: &CompositeImage) -> Vec<String> {
    String::from_utf8_lossy(&composite.png)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Renderer that "draws" locators as text.
#[derive(Default)]
pub struct MockRenderer {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat these candidates as undownloadable.
    #[must_use]
    pub fn failing_for<I, S>(mut self, locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.extend(locators.into_iter().map(Into::into));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompositeRenderer for MockRenderer {
    async fn render(&self, batch: &[Candidate]) -> Result<Option<RenderResult>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let included: Vec<Candidate> = batch
            .iter()
            .filter(|candidate| !self.failing.contains(candidate.as_str()))
            .cloned()
            .collect();
        if included.is_empty() {
            return Ok(None);
        }

        let text = included
            .iter()
            .map(Candidate::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        let width = u32::try_from(included.len()).unwrap_or(u32::MAX);

        Ok(Some(RenderResult {
            composite: CompositeImage {
                png: text.into_bytes(),
                width,
                height: 1,
            },
            candidates: included,
        }))
    }
}

/// Scripted judge answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockVerdict {
    /// Return exactly these labels.
    Labels(Vec<u32>),
    /// Approve every tile in the composite.
    All,
    /// Select nothing.
    Nothing,
    /// Return a judge error.
    Fail,
}

/// Judge driven by scripted verdicts.
///
/// Precedence: a rule matching any candidate in the composite, then the next
/// queued verdict, then the default.
pub struct MockJudge {
    default: MockVerdict,
    rules: HashMap<String, MockVerdict>,
    queue: Mutex<VecDeque<MockVerdict>>,
    instructions: Mutex<Vec<String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockJudge {
    pub fn always(verdict: MockVerdict) -> Self {
        Self {
            default: verdict,
            rules: HashMap::new(),
            queue: Mutex::new(VecDeque::new()),
            instructions: Mutex::new(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer with `verdicts` in call order, then select nothing.
    pub fn scripted(verdicts: Vec<MockVerdict>) -> Self {
        let judge = Self::always(MockVerdict::Nothing);
        *judge.queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            verdicts.into();
        judge
    }

    /// Use `verdict` for any composite showing `locator`.
    #[must_use]
    pub fn with_rule(mut self, locator: impl Into<String>, verdict: MockVerdict) -> Self {
        self.rules.insert(locator.into(), verdict);
        self
    }

    /// Sleep before every answer.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every instruction received, in call order.
    pub fn instructions(&self) -> Vec<String> {
        self.instructions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn pick(&self, shown: &[String]) -> MockVerdict {
        if let Some(verdict) = shown.iter().find_map(|locator| self.rules.get(locator)) {
            return verdict.clone();
        }
        self.queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl VisualJudge for MockJudge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn judge(
        &self,
        composite: &CompositeImage,
        instruction: &str,
    ) -> JudgeResult<JudgeVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(instruction.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let shown = mock_composite_candidates(composite);
        match self.pick(&shown) {
            MockVerdict::Labels(labels) => Ok(JudgeVerdict::new(labels)),
            MockVerdict::All => {
                let count = u32::try_from(shown.len()).unwrap_or(u32::MAX);
                Ok(JudgeVerdict::new((1..=count).collect()))
            }
            MockVerdict::Nothing => Ok(JudgeVerdict::empty()),
            MockVerdict::Fail => Err(JudgeError::Api("mock judge failure".to_string())),
        }
    }
}

/// Candidate source backed by a fixed list.
pub struct MockCandidateSource {
    candidates: Vec<Candidate>,
    calls: AtomicUsize,
}

impl MockCandidateSource {
    pub fn new<I, S>(locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            candidates: locators.into_iter().map(Candidate::new).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateSource for MockCandidateSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn discover(
        &self,
        query: &str,
        desired_count: usize,
    ) -> Result<Vec<Candidate>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        Ok(self.candidates.iter().take(desired_count).cloned().collect())
    }
}

/// Fetcher that serves the locator itself as the body.
#[derive(Default)]
pub struct MockFetcher {
    missing: HashSet<String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond 404 for these locators.
    #[must_use]
    pub fn missing<I, S>(mut self, locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing.extend(locators.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(&self, candidate: &Candidate) -> Result<FetchedContent, FetchError> {
        if self.missing.contains(candidate.as_str()) {
            return Err(FetchError::Status {
                url: candidate.to_string(),
                status: 404,
            });
        }
        Ok(FetchedContent {
            bytes: candidate.as_str().as_bytes().to_vec(),
            content_type: Some("text/plain".to_string()),
        })
    }
}
