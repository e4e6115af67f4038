//! HTTP plumbing shared by the vision-model providers.

pub mod errors;
pub mod rate_limiter;
pub mod retry;

pub use errors::ApiError;
pub use rate_limiter::TokenBucketRateLimiter;
pub use retry::RetryPolicy;
