//! Visual judge backed by a vision-language model.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::vision_model::VisionModel;
use crate::domain::errors::{JudgeError, JudgeResult};
use crate::domain::models::{CompositeImage, JudgeVerdict};
use crate::domain::ports::VisualJudge;
use crate::infrastructure::http::{RetryPolicy, TokenBucketRateLimiter};
use crate::services::verdict_parser::{parse_verdict, SELECTION_FIELD};

/// Prompt sent with every composite.
pub fn grid_prompt(instruction: &str) -> String {
    format!(
        "This is a grid of images. Each image has a numeric label in its top-left corner, \
         starting at 1 and increasing left to right, top to bottom. Look at every labeled \
         image carefully.\n\n\
         Based on the following description, select the images that best match it:\n\
         {instruction}\n\n\
         Your response MUST be a JSON object containing a single key \"{SELECTION_FIELD}\" \
         whose value is the list of numeric labels of the images you selected. Do not include \
         any other text or markdown outside the JSON object.\n\n\
         Example of a valid response:\n\
         {{\"{SELECTION_FIELD}\": [1, 5, 8]}}"
    )
}

/// Judges composites by asking a [`VisionModel`].
///
/// Calls are throttled by a shared token bucket and retried on transient
/// provider errors. When retries run out the judge answers with an empty
/// verdict, so one flaky batch costs only its own survivors.
pub struct VlmJudge {
    model: Arc<dyn VisionModel>,
    limiter: TokenBucketRateLimiter,
    retry: RetryPolicy,
}

impl VlmJudge {
    pub fn new(
        model: Arc<dyn VisionModel>,
        limiter: TokenBucketRateLimiter,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            limiter,
            retry,
        }
    }
}

#[async_trait]
impl VisualJudge for VlmJudge {
    fn name(&self) -> &'static str {
        self.model.name()
    }

    #[instrument(skip_all, fields(provider = self.model.name(), model = self.model.model()))]
    async fn judge(
        &self,
        composite: &CompositeImage,
        instruction: &str,
    ) -> JudgeResult<JudgeVerdict> {
        let prompt = grid_prompt(instruction);
        let (prompt, png) = (prompt.as_str(), composite.png.as_slice());
        let (model, limiter) = (&self.model, &self.limiter);

        let reply = self
            .retry
            .execute(|| async move {
                limiter.acquire().await;
                model.complete(prompt, png).await
            })
            .await;

        match reply {
            Ok(text) => {
                debug!(reply = %text, "raw judge reply");
                Ok(JudgeVerdict::new(parse_verdict(&text).labels))
            }
            Err(err) if err.is_transient() => {
                warn!(
                    error = %err,
                    attempts = self.retry.max_retries() + 1,
                    "vision model unavailable after retries, treating as no selection"
                );
                Ok(JudgeVerdict::empty())
            }
            Err(err) => Err(JudgeError::Api(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::ApiError;
    use crate::domain::models::Escalation;
    use crate::services::judging_instruction::effective_instruction;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, ApiError>>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl VisionModel for ScriptedModel {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn complete(&self, prompt: &str, _png: &[u8]) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ApiError::Timeout))
        }
    }

    fn composite() -> CompositeImage {
        CompositeImage {
            png: vec![0x89, b'P', b'N', b'G'],
            width: 4,
            height: 4,
        }
    }

    fn judge(model: Arc<ScriptedModel>) -> VlmJudge {
        VlmJudge::new(
            model,
            TokenBucketRateLimiter::new(1000.0, 100),
            RetryPolicy::new(2, 1, 5),
        )
    }

    #[test]
    fn test_prompt_defers_count_to_instruction() {
        let escalation = Escalation {
            final_round: true,
            force_choice: true,
        };
        let prompt = grid_prompt(&effective_instruction("red cars", escalation, 6));

        assert!(!prompt.contains("all matching"));
        assert!(prompt.contains("best match"));
        assert!(prompt.contains("Select exactly 3 of the 6 images"));
    }

    #[tokio::test]
    async fn test_structured_reply_becomes_verdict() {
        let model = ScriptedModel::new(vec![Ok(r#"```json
{"selected_indices": [2, 4]}
```"#
            .to_string())]);
        let verdict = judge(model.clone())
            .judge(&composite(), "red cars")
            .await
            .unwrap();

        assert_eq!(verdict.labels(), &[2, 4]);
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("red cars"));
        assert!(prompts[0].contains("selected_indices"));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let model = ScriptedModel::new(vec![
            Err(ApiError::RateLimitExceeded),
            Ok("I pick 3".to_string()),
        ]);
        let verdict = judge(model.clone()).judge(&composite(), "x").await.unwrap();

        assert_eq!(verdict.labels(), &[3]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_yield_empty_verdict() {
        let model = ScriptedModel::new(vec![]);
        let verdict = judge(model.clone()).judge(&composite(), "x").await.unwrap();

        assert!(verdict.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_a_judge_error() {
        let model = ScriptedModel::new(vec![Err(ApiError::InvalidApiKey)]);
        let err = judge(model.clone()).judge(&composite(), "x").await.unwrap_err();

        assert!(matches!(err, JudgeError::Api(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reply_without_numbers_is_empty_selection() {
        let model = ScriptedModel::new(vec![Ok("none match".to_string())]);
        let verdict = judge(model.clone()).judge(&composite(), "x").await.unwrap();

        assert!(verdict.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
