use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::domain::models::RateLimitConfig;

/// Token bucket throttling requests to a vision-model provider.
///
/// Shared between the batches of a round, so concurrent batches queue here
/// rather than tripping the provider's own rate limit.
#[derive(Clone)]
pub struct TokenBucketRateLimiter {
    /// Available tokens and the instant they were last topped up
    state: Arc<Mutex<(f64, Instant)>>,
    /// Maximum token capacity (burst)
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
}

impl TokenBucketRateLimiter {
    /// Bucket refilling at `requests_per_second`, holding at most `burst` tokens.
    ///
    /// Starts full. Non-positive inputs are clamped to the smallest usable bucket.
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            state: Arc::new(Mutex::new((capacity, Instant::now()))),
            capacity,
            refill_rate: requests_per_second.max(f64::EPSILON),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
    }

    /// Wait for and consume one token.
    pub async fn acquire(&self) {
        loop {
            let mut state = self.state.lock().await;
            let (tokens, last_refill) = &mut *state;

            let now = Instant::now();
            let elapsed = now.duration_since(*last_refill).as_secs_f64();
            let available = (*tokens + elapsed * self.refill_rate).min(self.capacity);

            if available >= 1.0 {
                *tokens = available - 1.0;
                *last_refill = now;
                return;
            }

            let wait_secs = (1.0 - available) / self.refill_rate;
            drop(state);
            sleep(Duration::from_secs_f64(wait_secs.max(0.01))).await;
        }
    }

    /// Tokens available right now.
    pub async fn available_tokens(&self) -> f64 {
        let state = self.state.lock().await;
        let elapsed = state.1.elapsed().as_secs_f64();
        (state.0 + elapsed * self.refill_rate).min(self.capacity)
    }
}
