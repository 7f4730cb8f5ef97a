//! Retry-with-backoff around GitHub API calls
//!
//! Every attempt is classified into an [`Attempt`]: only transport failures
//! are retried, a 404 ends the loop with `Ok(None)`, and anything else is
//! returned immediately as an error.

use rand::Rng;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::{RETRY_BASE_DELAY_MS, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS};
use crate::error::{ApiError, Result};
use crate::platform::HttpResponse;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, the initial one included.
    pub max_attempts: u32,
    /// Base delay between retries. Actual delay = base * 2^attempt + jitter.
    pub base_delay: Duration,
    /// Hard cap on the computed delay.
    pub max_delay: Duration,
    /// When true, adds random jitter of [0, base_delay/2).
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately, for tests and latency-sensitive callers
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Compute the delay after a failed attempt (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let capped = self
            .base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        if !self.jitter {
            return capped;
        }

        let jitter_range_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX) / 2;
        let remaining_ms =
            u64::try_from(self.max_delay.saturating_sub(capped).as_millis()).unwrap_or(0);
        let jitter_limit_ms = jitter_range_ms.min(remaining_ms);
        if jitter_limit_ms == 0 {
            return capped;
        }

        let jitter_ms = rand::rng().random_range(0..jitter_limit_ms);
        capped + Duration::from_millis(jitter_ms)
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The call succeeded.
    Success(T),
    /// Connectivity failure; try again after a delay.
    Retry(ApiError),
    /// The authority answered 404; stop without an error.
    NotFound,
    /// Anything else; abort the enclosing operation.
    Fatal(ApiError),
}

impl Attempt<HttpResponse> {
    /// Parse a successful response body as JSON; a malformed body is fatal.
    pub fn json<T: DeserializeOwned>(self) -> Attempt<T> {
        match self {
            Attempt::Success(response) => match response.json() {
                Ok(value) => Attempt::Success(value),
                Err(e) => Attempt::Fatal(ApiError::upstream_error(format!(
                    "failed to parse response: {}",
                    e
                ))),
            },
            Attempt::Retry(e) => Attempt::Retry(e),
            Attempt::NotFound => Attempt::NotFound,
            Attempt::Fatal(e) => Attempt::Fatal(e),
        }
    }
}

/// Classify a raw HTTP result.
///
/// Transport errors are retryable, 404 is `NotFound`, any other non-2xx
/// status or non-transport error is fatal.
pub fn classify(result: Result<HttpResponse>) -> Attempt<HttpResponse> {
    match result {
        Err(e) if e.is_transient() => Attempt::Retry(e),
        Err(e) => Attempt::Fatal(e),
        Ok(response) if response.status == 404 => Attempt::NotFound,
        Ok(response) if response.is_success() => Attempt::Success(response),
        Ok(response) => Attempt::Fatal(ApiError::upstream_error(format!(
            "GitHub API error ({}): {}",
            response.status,
            response.text()
        ))),
    }
}

/// Execute an async operation with retry-and-backoff.
///
/// The `operation` closure receives the current attempt number (0-indexed).
/// Returns `Ok(Some(value))` on success, `Ok(None)` on [`Attempt::NotFound`],
/// and an error on [`Attempt::Fatal`] or once all attempts failed with
/// [`Attempt::Retry`].
pub async fn retry_with_backoff<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<Option<T>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 0..max_attempts {
        match operation(attempt).await {
            Attempt::Success(value) => return Ok(Some(value)),
            Attempt::NotFound => return Ok(None),
            Attempt::Fatal(err) => return Err(err),
            Attempt::Retry(err) => {
                if attempt + 1 >= max_attempts {
                    return Err(ApiError::retries_exhausted(max_attempts, err.to_string()));
                }
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying GitHub API call after transport error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    Err(ApiError::internal("retry loop exited without result"))
}
