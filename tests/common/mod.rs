//! Common test utilities for integration tests
//!
//! Scripted collaborator doubles and fixtures shared across test files.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use picsearch::adapters::mock::{MockJudge, MockRenderer};
use picsearch::domain::errors::JudgeResult;
use picsearch::domain::models::{Candidate, CompositeImage, JudgeVerdict, Pool};
use picsearch::domain::ports::VisualJudge;
use picsearch::services::{RoundExecutorConfig, TournamentEngine};

/// Distinct candidate URLs `https://img.test/0.jpg`, `.../1.jpg`, ...
pub fn urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://img.test/{i}.jpg")).collect()
}

pub fn pool(n: usize) -> Pool {
    urls(n).iter().map(Candidate::new).collect()
}

/// Engine over the in-crate mock renderer and `judge`.
pub fn engine(
    renderer: Arc<MockRenderer>,
    judge: Arc<MockJudge>,
    batch_size: usize,
) -> TournamentEngine {
    TournamentEngine::new(renderer, judge, batch_size, RoundExecutorConfig::default())
        .expect("batch size must be positive")
}

/// A solid-color PNG.
pub fn png(color: [u8; 3], size: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb(color)))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Judge that answers every grid with the same labels and remembers what it saw.
pub struct FixedLabelJudge {
    labels: Vec<u32>,
    seen: Mutex<Vec<(u32, u32)>>,
}

impl FixedLabelJudge {
    pub fn new(labels: Vec<u32>) -> Self {
        Self {
            labels,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Dimensions of every composite judged, in call order.
    pub fn seen(&self) -> Vec<(u32, u32)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisualJudge for FixedLabelJudge {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn judge(
        &self,
        composite: &CompositeImage,
        _instruction: &str,
    ) -> JudgeResult<JudgeVerdict> {
        image::load_from_memory(&composite.png).expect("composite should be a real PNG");
        self.seen
            .lock()
            .unwrap()
            .push((composite.width, composite.height));
        Ok(JudgeVerdict::new(self.labels.clone()))
    }
}

/// Setup test logging
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
