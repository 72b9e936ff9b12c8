//! Bounded retry
//!
//! Every fallible I/O step of the engine (address discovery, record lookup,
//! record update, startup resolution) goes through one [`RetryPolicy`].
//! Every error kind is retried the same way; there is no transient/permanent
//! split.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{Error, Result};

/// Default number of attempts per operation
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Bounded-retry executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Hard cap on attempts (at least 1)
    max_attempts: usize,

    /// Pause between attempts; zero retries immediately
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy that retries immediately
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }

    /// Set the pause between attempts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The attempt cap
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run `op` until it succeeds or the attempt cap is hit
    ///
    /// Each failure is logged at warning level with its attempt number.
    ///
    /// # Returns
    ///
    /// - `Ok(T)`: The first successful result
    /// - `Err(Error::RetryExhausted)`: All attempts failed; carries the last error
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("{}/{} Failed to {}: {}", attempt, self.max_attempts, operation, e);
                    last_error = Some(e);

                    if attempt < self.max_attempts && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        warn!("Retry limitation reached: {}", operation);
        let error = last_error.unwrap_or_else(|| Error::Other("no attempt was made".to_string()));
        Err(Error::retry_exhausted(operation, self.max_attempts, error))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self::new(config.max_attempts).with_delay(Duration::from_secs(config.retry_delay_secs))
    }
}
