//! Retry policy for ResolvePay requests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff before the first retry; doubles on every further attempt.
pub const BASE_DELAY: Duration = Duration::from_secs(1);

/// Statuses that are retried before being classified.
pub const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// What to do with a completed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Retryable status with attempts remaining.
    Retry,
    /// 2xx; hand to the classifier.
    Success,
    /// Terminal; hand to the classifier for a typed failure.
    Fatal,
}

/// Transport-level failures that never produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Connect,
    Other,
}

impl TransportFailure {
    /// Classifies a reqwest error.
    pub fn of(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportFailure::Timeout
        } else if error.is_connect() {
            TransportFailure::Connect
        } else {
            TransportFailure::Other
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, TransportFailure::Timeout | TransportFailure::Connect)
    }
}

/// Exponential backoff over a fixed set of retryable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the default one second base delay.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: BASE_DELAY,
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after 0-indexed attempt `attempt`: `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
    }

    fn has_retries_left(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Decides the fate of attempt `attempt` that returned `status`.
    pub fn outcome(&self, status: StatusCode, attempt: u32) -> AttemptOutcome {
        if RETRYABLE_STATUSES.contains(&status) && self.has_retries_left(attempt) {
            AttemptOutcome::Retry
        } else if status.is_success() {
            AttemptOutcome::Success
        } else {
            AttemptOutcome::Fatal
        }
    }

    /// Whether a transport failure on attempt `attempt` should be retried.
    pub fn should_retry_transport(&self, failure: TransportFailure, attempt: u32) -> bool {
        failure.is_retryable() && self.has_retries_left(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// Suspends the current task between attempts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryPolicy::default().max_attempts(), 4);
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }

    #[test]
    fn test_retryable_statuses_retry_while_attempts_remain() {
        let policy = RetryPolicy::new(2);

        for status in RETRYABLE_STATUSES {
            assert_eq!(policy.outcome(status, 0), AttemptOutcome::Retry);
            assert_eq!(policy.outcome(status, 1), AttemptOutcome::Retry);
            assert_eq!(policy.outcome(status, 2), AttemptOutcome::Fatal);
        }
    }

    #[test]
    fn test_non_retryable_statuses_are_terminal() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.outcome(StatusCode::OK, 0), AttemptOutcome::Success);
        assert_eq!(policy.outcome(StatusCode::NO_CONTENT, 0), AttemptOutcome::Success);
        assert_eq!(policy.outcome(StatusCode::BAD_REQUEST, 0), AttemptOutcome::Fatal);
        assert_eq!(policy.outcome(StatusCode::UNAUTHORIZED, 0), AttemptOutcome::Fatal);
        assert_eq!(policy.outcome(StatusCode::NOT_FOUND, 0), AttemptOutcome::Fatal);
        assert_eq!(policy.outcome(StatusCode::NOT_IMPLEMENTED, 0), AttemptOutcome::Fatal);
    }

    #[test]
    fn test_transport_retry() {
        let policy = RetryPolicy::new(1);

        assert!(policy.should_retry_transport(TransportFailure::Timeout, 0));
        assert!(policy.should_retry_transport(TransportFailure::Connect, 0));
        assert!(!policy.should_retry_transport(TransportFailure::Other, 0));
        assert!(!policy.should_retry_transport(TransportFailure::Timeout, 1));
    }
}
