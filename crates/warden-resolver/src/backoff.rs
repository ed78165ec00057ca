//! Bounded retry driver for remote fetches.
//!
//! Waits are driven by the server: a rate-limited response says how long to back off,
//! and that duration is honoured as long as it stays under the configured ceiling.
//! Transient server errors are retried straight away. Everything else is fatal.
//!
//! Once the retry budget is spent the driver makes one last unguarded call and hands
//! back whatever it yields, so callers always see a real attempt's outcome.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};
use warden_common::config::RetryConfig;
use warden_common::{WardenError, WardenResult};

/// Retry policy for a single remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    max_retries: u32,
    maximum: Duration,
}

impl Backoff {
    pub fn new(max_retries: u32, maximum: Duration) -> Self {
        Self { max_retries, maximum }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.max_wait())
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Longest server-suggested wait that is waited out rather than propagated.
    pub fn maximum(&self) -> Duration {
        self.maximum
    }

    /// Run `operation` under this policy.
    ///
    /// The attempt counter is local to each call, so one `Backoff` can drive every fetch
    /// of a permission query.
    ///
    /// If the last guarded attempt was rate limited, its wait is also honoured before the
    /// final unguarded call.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> WardenResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WardenResult<T>>,
    {
        let mut next_wait: Option<Duration> = None;

        for attempt in 1..=self.max_retries {
            if let Some(wait) = next_wait.take() {
                debug!(attempt, wait_ms = wait.as_millis() as u64, "backing off before retry");
                tokio::time::sleep(wait).await;
            }

            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match err.retry_after() {
                Some(wait) if wait > self.maximum => {
                    warn!(
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        max_ms = self.maximum.as_millis() as u64,
                        "rate limit wait exceeds maximum, giving up"
                    );
                    return Err(err);
                }
                Some(wait) => {
                    warn!(attempt, wait_ms = wait.as_millis() as u64, "rate limited, will retry");
                    next_wait = Some(wait);
                }
                None if err.is_retryable() => {
                    warn!(attempt, error = %err, "transient remote failure, retrying");
                }
                None => return Err(err),
            }
        }

        if let Some(wait) = next_wait {
            tokio::time::sleep(wait).await;
        }
        debug!(max_retries = self.max_retries, "retry budget spent, making final attempt");
        operation().await
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Shorthand for the error a remote directory reports when it is rate limited.
pub fn rate_limited(retry_after: Duration) -> WardenError {
    WardenError::RateLimited { retry_after_ms: retry_after.as_millis() as u64 }
}
