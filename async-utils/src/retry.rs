//! Exponential backoff retry policy.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry policy with exponential backoff.
///
/// `max_retries` counts total attempts: with the defaults an action is tried
/// three times, sleeping 1s and then 2s in between. The policy knows nothing
/// about the action it wraps; the last error is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and base delay.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that runs the action exactly once.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Set the attempt budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Total attempts this policy allows. Zero is treated as one.
    pub fn max_retries(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Backoff after the zero-indexed `attempt` failed: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `action`, retrying on every error until the budget is spent.
    pub async fn run<T, E, F, Fut>(&self, action: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_if(action, |_| true).await
    }

    /// Run `action`, retrying only errors for which `should_retry` holds.
    ///
    /// Errors rejected by the predicate are returned immediately without
    /// sleeping.
    pub async fn run_if<T, E, F, Fut, P>(&self, mut action: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let max_retries = self.max_retries();
        let mut attempt = 0;

        loop {
            match action().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("Succeeded after {} attempts", attempt + 1);
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if attempt + 1 >= max_retries || !should_retry(&err) {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Attempt {} failed: {err}. Retrying in {:.1}s...",
                        attempt + 1,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY)
    }
}
