//! Minimum-spacing rate limiter for outbound API calls.

use log::debug;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default ceiling used by the connector.
pub const DEFAULT_CALLS_PER_SECOND: u32 = 10;

/// Spaces calls at least `1 / calls_per_second` apart.
///
/// The read-wait-write on the last call timestamp happens while holding the
/// lock, so two concurrent callers never compute their wait from the same
/// stale timestamp. A ceiling of 0 disables limiting.
#[derive(Debug)]
pub struct RateLimiter {
    calls_per_second: u32,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Limiter allowing `calls_per_second` calls; 0 disables limiting.
    pub fn new(calls_per_second: u32) -> Self {
        let min_interval = if calls_per_second > 0 {
            Duration::from_secs_f64(1.0 / f64::from(calls_per_second))
        } else {
            Duration::ZERO
        };

        Self {
            calls_per_second,
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Configured calls per second.
    pub fn calls_per_second(&self) -> u32 {
        self.calls_per_second
    }

    /// Minimum spacing between two calls.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn is_unlimited(&self) -> bool {
        self.calls_per_second == 0
    }

    /// Time still owed before the next call may proceed.
    fn deficit(&self, last_call: Option<Instant>, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(last_call?);
        (elapsed < self.min_interval).then(|| self.min_interval - elapsed)
    }

    /// Waits until a call is permitted, suspending only the current task.
    pub async fn acquire(&self) {
        if self.is_unlimited() {
            return;
        }

        let mut last_call = self.last_call.lock().await;
        if let Some(wait) = self.deficit(*last_call, Instant::now()) {
            debug!("Rate limit: waiting {:?} before next call", wait);
            tokio::time::sleep(wait).await;
        }
        *last_call = Some(Instant::now());
    }

    /// Blocking variant of [`RateLimiter::acquire`] for callers outside an
    /// async runtime. Must not be called from within an async context.
    pub fn acquire_blocking(&self) {
        if self.is_unlimited() {
            return;
        }

        let mut last_call = self.last_call.blocking_lock();
        if let Some(wait) = self.deficit(*last_call, Instant::now()) {
            debug!("Rate limit: blocking {:?} before next call", wait);
            std::thread::sleep(wait);
        }
        *last_call = Some(Instant::now());
    }

    /// Forgets the last call so the next one proceeds immediately.
    pub async fn reset(&self) {
        *self.last_call.lock().await = None;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CALLS_PER_SECOND)
    }
}
