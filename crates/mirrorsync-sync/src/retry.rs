//! Retry logic for network-sensitive operations
//!
//! Only transient failures are retried; permanent failures and not-found
//! answers are returned immediately. The schedule is a fixed delay, not
//! exponential backoff: transfers are long-running anyway and the failure
//! modes this guards against (connection resets, throttling blips) clear
//! within seconds or not at all.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use mirrorsync_core::config::SyncConfig;
use mirrorsync_core::error::StoreResult;

/// How many attempts an operation gets and how long to wait between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// A policy with `attempts` total attempts (not retries) and a fixed
    /// delay between them. At least one attempt always happens.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

/// Executes an async operation under the given policy.
///
/// Retries only failures whose class says so; the final attempt's error is
/// returned as-is, so callers still see its class.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: &str, f: F) -> StoreResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    for attempt in 1..=policy.attempts {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < policy.attempts => {
                warn!(operation, attempt, error = %err, "Transient failure, retrying");
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("retry loop returns on the final attempt")
}
