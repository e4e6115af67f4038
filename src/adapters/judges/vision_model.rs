//! Vision model port: one multimodal completion per call.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::infrastructure::http::ApiError;

/// A chat model that accepts one image alongside a text prompt.
///
/// Implementations make exactly one request per call; retries and rate
/// limiting live in [`super::VlmJudge`].
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    /// Send `prompt` and a PNG image, returning the reply text.
    async fn complete(&self, prompt: &str, png: &[u8]) -> Result<String, ApiError>;
}

/// `data:` URL carrying a PNG.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

pub fn png_base64(png: &[u8]) -> String {
    STANDARD.encode(png)
}
