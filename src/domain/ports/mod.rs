//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces the tournament engine and search pipeline drive:
//! - CandidateSource: query → ordered, de-duplicated candidate URLs
//! - ContentFetcher: candidate → raw bytes
//! - CompositeRenderer: batch → labeled grid image
//! - VisualJudge: grid image + instruction → chosen labels

pub mod candidate_source;
pub mod composite_renderer;
pub mod content_fetcher;
pub mod visual_judge;

pub use candidate_source::CandidateSource;
pub use composite_renderer::CompositeRenderer;
pub use content_fetcher::{ContentFetcher, FetchedContent};
pub use visual_judge::VisualJudge;
