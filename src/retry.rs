//! Retrying locale reads that fail for transient reasons.

use crate::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How often and how patiently a fetch is repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, the first one included. Zero behaves like one.
    pub max_attempts: u32,
    /// Pause after the first failure; doubled after each further one.
    pub initial_delay: Duration,
    /// Cap on any single pause.
    pub max_delay: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
        }
    }

    pub fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Three attempts, pausing 200ms then 400ms.
    pub fn fetch() -> Self {
        Self::new(3, Duration::from_millis(200), Duration::from_secs(2))
    }

    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Pause after the `failures`-th failed attempt.
    fn pause_after(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fetch()
    }
}

/// Run `fetch` until it succeeds or fails for good.
///
/// Only [`FetchError::is_transient`] failures are retried; anything else, or
/// the last attempt's failure, is returned as is.
pub async fn retry_fetch<T, F, Fut>(config: &RetryConfig, what: &str, mut fetch: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = config.max_attempts.max(1);
    let mut failures = 0;

    loop {
        let error = match fetch().await {
            Ok(value) => {
                if failures > 0 {
                    debug!("{} succeeded after {} failed attempt(s)", what, failures);
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        failures += 1;
        if !error.is_transient() || failures >= attempts {
            return Err(error);
        }

        let pause = config.pause_after(failures);
        warn!(
            "{} failed ({}), attempt {} of {} in {:?}",
            what,
            error,
            failures + 1,
            attempts,
            pause
        );
        sleep(pause).await;
    }
}
