use std::{future::Future, time::Duration};

use tokio::time::sleep;

use crate::{spotify::ApiError, warning};

/// Bounded exponential backoff for single remote calls.
///
/// Only transient failures ([`ApiError::is_transient`]) are retried. The wait
/// before retry `n` (zero-based) is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Total calls allowed, the first one included. Zero
    ///   behaves like one: the call is always made at least once.
    /// * `base_delay` - Wait before the first retry; it doubles per retry.
    ///
    /// # Example
    ///
    /// ```
    /// let retry = RetryPolicy::new(5, Duration::from_millis(200));
    /// let page = retry.run(|| client.saved_tracks(0, 50)).await?;
    /// ```
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Wait before retry number `attempt` (zero-based): `base_delay * 2^attempt`,
    /// saturating instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs `call` until it succeeds, fails permanently, or runs out of
    /// attempts. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_transient() || attempt + 1 >= max_attempts {
                        return Err(err);
                    }

                    let wait = self.delay_for(attempt);
                    warning!(
                        "Retry {}/{} after {}ms ({})",
                        attempt + 1,
                        max_attempts,
                        wait.as_millis(),
                        err
                    );
                    sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
