//! Vision-model judges.

pub mod anthropic;
pub mod openai_compat;
pub mod registry;
pub mod vision_model;
pub mod vlm_judge;

pub use anthropic::{AnthropicConfig, AnthropicVisionModel};
pub use openai_compat::{OpenAiCompatConfig, OpenAiCompatibleModel};
pub use registry::JudgeRegistry;
pub use vision_model::VisionModel;
pub use vlm_judge::{grid_prompt, VlmJudge};
