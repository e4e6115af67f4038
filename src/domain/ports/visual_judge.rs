//! Visual judge port - picks labels out of a composite grid.

use async_trait::async_trait;

use crate::domain::errors::JudgeResult;
use crate::domain::models::{CompositeImage, JudgeVerdict};

#[async_trait]
pub trait VisualJudge: Send + Sync {
    /// Judge name for logs.
    fn name(&self) -> &'static str;

    /// Ask the judge which labeled tiles satisfy `instruction`.
    ///
    /// Implementations own their retry and timeout policy. Once transient
    /// retries are exhausted they return an empty verdict rather than an
    /// error; an empty verdict is also the valid "nothing matches" answer.
    async fn judge(
        &self,
        composite: &CompositeImage,
        instruction: &str,
    ) -> JudgeResult<JudgeVerdict>;
}
