//! HTTP pipeline for the ResolvePay API: rate limiting, retries and
//! response classification.

mod classify;
mod client;
mod rate_limiter;
mod retry;

pub use classify::{RequestInfo, classify, extract_error_message, retry_after};
pub use client::HttpClient;
pub use rate_limiter::{DEFAULT_CALLS_PER_SECOND, RateLimiter};
pub use retry::{
    AttemptOutcome, BASE_DELAY, DEFAULT_MAX_RETRIES, RETRYABLE_STATUSES, RetryPolicy, Sleeper,
    TokioSleeper, TransportFailure,
};

#[cfg(test)]
pub(crate) use retry::MockSleeper;
