//! Exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;

/// Default number of retries after the first attempt.
const fn default_max_retries() -> u32 {
    3
}

/// Default delay before the first retry.
const fn default_base_delay_ms() -> u64 {
    1000
}

/// Default ceiling for a single delay.
const fn default_max_delay_ms() -> u64 {
    16_000
}

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = no retries).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before retry 0, doubled for each later retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on any single delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }

    /// Overrides the retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry `attempt` (0-indexed): `min(base * 2^attempt, max)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(exponential.min(self.max_delay_ms))
    }
}

/// Retry bookkeeping for one logical request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Set once the request has been re-dispatched at least once.
    pub retried: bool,
    /// Retries performed so far.
    pub attempt: u32,
}

impl RetryState {
    /// Returns `true` if `policy` allows another retry.
    #[must_use]
    pub const fn can_retry(&self, policy: &RetryPolicy) -> bool {
        self.attempt < policy.max_retries
    }

    /// Records a retry and returns the delay to wait before it.
    pub fn advance(&mut self, policy: &RetryPolicy) -> Duration {
        let delay = policy.delay_for(self.attempt);
        self.retried = true;
        self.attempt += 1;
        delay
    }
}

/// Runs `operation`, retrying retryable failures with backoff.
///
/// Works for any async operation that reports [`AppError`], independent of
/// the retries [`ApiClient`](crate::ApiClient) performs on its own. Attempts
/// are strictly sequential. Non-retryable errors are returned immediately;
/// after the last retry the last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut state = RetryState::default();
    loop {
        match operation().await {
            Ok(value) => {
                if state.retried {
                    info!(attempts = state.attempt + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if error.is_retryable() && state.can_retry(policy) => {
                let delay = state.advance(policy);
                warn!(
                    attempt = state.attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
