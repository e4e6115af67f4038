//! Builds the configured visual judge.

use std::sync::Arc;
use tracing::info;

use super::anthropic::{AnthropicConfig, AnthropicVisionModel};
use super::openai_compat::{OpenAiCompatConfig, OpenAiCompatibleModel};
use super::vision_model::VisionModel;
use super::vlm_judge::VlmJudge;
use crate::domain::errors::JudgeError;
use crate::domain::models::{JudgeConfig, RateLimitConfig, RetryConfig};
use crate::domain::ports::VisualJudge;
use crate::infrastructure::http::{RetryPolicy, TokenBucketRateLimiter};

/// Registry of available judge providers.
pub struct JudgeRegistry {
    judge: JudgeConfig,
    rate_limit: RateLimitConfig,
    retry: RetryConfig,
}

impl JudgeRegistry {
    pub fn new(judge: JudgeConfig, rate_limit: RateLimitConfig, retry: RetryConfig) -> Self {
        Self {
            judge,
            rate_limit,
            retry,
        }
    }

    /// Environment variable consulted for the API key.
    pub fn api_key_env(&self) -> &str {
        self.judge
            .api_key_env
            .as_deref()
            .unwrap_or(match self.judge.provider.as_str() {
                "anthropic" => "ANTHROPIC_API_KEY",
                _ => "OPENAI_API_KEY",
            })
    }

    /// API key from config, falling back to the environment.
    pub fn api_key(&self) -> Option<String> {
        self.judge
            .api_key
            .clone()
            .or_else(|| std::env::var(self.api_key_env()).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Build the vision model for the configured provider.
    pub fn create_model(&self) -> Result<Arc<dyn VisionModel>, JudgeError> {
        let config = &self.judge;
        let api_key = self.api_key();

        let model: Arc<dyn VisionModel> = match config.provider.as_str() {
            "openai" => {
                // Self-hosted endpoints often need no key; the hosted API does.
                if api_key.is_none() && config.base_url.is_none() {
                    return Err(self.missing_key());
                }
                let defaults = OpenAiCompatConfig::default();
                Arc::new(
                    OpenAiCompatibleModel::new(OpenAiCompatConfig {
                        api_key,
                        base_url: config.base_url.clone().unwrap_or(defaults.base_url),
                        model: config.model.clone(),
                        max_tokens: config.max_tokens,
                        timeout_secs: config.timeout_secs,
                    })
                    .map_err(|e| JudgeError::Unavailable(e.to_string()))?,
                )
            }
            "anthropic" => {
                let api_key = api_key.ok_or_else(|| self.missing_key())?;
                let defaults = AnthropicConfig::new(api_key);
                Arc::new(
                    AnthropicVisionModel::new(AnthropicConfig {
                        base_url: config.base_url.clone().unwrap_or(defaults.base_url.clone()),
                        model: config.model.clone(),
                        max_tokens: config.max_tokens,
                        timeout_secs: config.timeout_secs,
                        ..defaults
                    })
                    .map_err(|e| JudgeError::Unavailable(e.to_string()))?,
                )
            }
            other => {
                return Err(JudgeError::Unavailable(format!(
                    "unknown judge provider '{other}'"
                )))
            }
        };

        info!(provider = model.name(), model = model.model(), "vision model ready");
        Ok(model)
    }

    /// Build the rate-limited, retrying judge.
    pub fn create_judge(&self) -> Result<Arc<dyn VisualJudge>, JudgeError> {
        let model = self.create_model()?;
        Ok(Arc::new(VlmJudge::new(
            model,
            TokenBucketRateLimiter::from_config(&self.rate_limit),
            RetryPolicy::from_config(&self.retry),
        )))
    }

    fn missing_key(&self) -> JudgeError {
        JudgeError::Unavailable(format!(
            "no API key for provider '{}': set judge.api_key or {}",
            self.judge.provider,
            self.api_key_env()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(judge: JudgeConfig) -> JudgeRegistry {
        JudgeRegistry::new(judge, RateLimitConfig::default(), RetryConfig::default())
    }

    #[test]
    fn test_default_key_env_follows_provider() {
        let openai = registry(JudgeConfig::default());
        assert_eq!(openai.api_key_env(), "OPENAI_API_KEY");

        let anthropic = registry(JudgeConfig {
            provider: "anthropic".to_string(),
            ..JudgeConfig::default()
        });
        assert_eq!(anthropic.api_key_env(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_key_is_read_from_named_env_var() {
        let registry = registry(JudgeConfig {
            api_key_env: Some("PICSEARCH_TEST_JUDGE_KEY".to_string()),
            ..JudgeConfig::default()
        });
        temp_env::with_var("PICSEARCH_TEST_JUDGE_KEY", Some("sk-test"), || {
            assert_eq!(registry.api_key().as_deref(), Some("sk-test"));
        });
    }

    #[test]
    fn test_hosted_openai_without_key_is_unavailable() {
        let registry = registry(JudgeConfig {
            api_key_env: Some("PICSEARCH_TEST_UNSET_KEY".to_string()),
            ..JudgeConfig::default()
        });
        temp_env::with_var_unset("PICSEARCH_TEST_UNSET_KEY", || {
            assert!(matches!(
                registry.create_judge(),
                Err(JudgeError::Unavailable(_))
            ));
        });
    }

    #[test]
    fn test_local_openai_endpoint_needs_no_key() {
        let registry = registry(JudgeConfig {
            api_key_env: Some("PICSEARCH_TEST_UNSET_KEY".to_string()),
            base_url: Some("http://localhost:11434/v1".to_string()),
            model: "llava".to_string(),
            ..JudgeConfig::default()
        });
        temp_env::with_var_unset("PICSEARCH_TEST_UNSET_KEY", || {
            let model = registry.create_model().unwrap();
            assert_eq!(model.name(), "openai");
            assert_eq!(model.model(), "llava");
        });
    }

    #[test]
    fn test_anthropic_with_configured_key() {
        let registry = registry(JudgeConfig {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            api_key: Some("sk-ant".to_string()),
            ..JudgeConfig::default()
        });
        let judge = registry.create_judge().unwrap();
        assert_eq!(judge.name(), "anthropic");
    }

    #[test]
    fn test_unknown_provider() {
        let registry = registry(JudgeConfig {
            provider: "gemini".to_string(),
            api_key: Some("k".to_string()),
            ..JudgeConfig::default()
        });
        assert!(matches!(
            registry.create_model(),
            Err(JudgeError::Unavailable(msg)) if msg.contains("gemini")
        ));
    }
}
