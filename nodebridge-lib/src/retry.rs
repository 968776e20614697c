//! Bounded retry of transport failures.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::{NodeBridgeError, Result};

/// Retries a logical call while it fails at the transport layer.
///
/// Attempts run strictly one after another. The wait before attempt `k + 1`
/// is `k * base_delay`. Any error that is not retryable ends the call at once.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy. At least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Total attempts per call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait inserted after a failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    if attempt >= self.max_attempts {
                        tracing::warn!("{} failed after {} attempts: {}", label, attempt, err);
                        return Err(NodeBridgeError::Unreachable {
                            attempts: attempt,
                            reason: err.to_string(),
                        });
                    }
                    let delay = self.delay_after(attempt);
                    tracing::debug!(
                        "{} attempt {} failed ({}), retrying in {:?}",
                        label,
                        attempt,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}
