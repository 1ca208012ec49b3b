//! Retry logic with exponential backoff
//!
//! Transient request failures are retried with a doubling delay ladder;
//! terminal failures (client errors other than rate limiting, malformed
//! bodies) short-circuit immediately. The delay before attempt `k` (k ≥ 2)
//! is `initial_delay * backoff_multiplier^(k-2)`, capped at `max_delay`, and
//! no delay follows the final attempt.

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, rate limiting, server errors)
/// return `true`. Permanent failures (other client errors, malformed
/// responses, configuration problems) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Rate limiting and server-side errors are worth another attempt
            Error::Status { code, .. } => *code == 429 || (500..=599).contains(code),
            // Timeouts and connection failures are transient
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            // A body that does not parse will not parse on a second fetch
            Error::Parse(_) => false,
            Error::Config { .. } => false,
            Error::Render(_) => false,
            Error::Io(_) => false,
            Error::Other(_) => false,
        }
    }
}

/// Execute an async request with bounded attempts and exponential backoff
///
/// `max_attempts` counts total calls. The operation runs until it succeeds,
/// fails terminally, or the attempt budget is exhausted; the error of the
/// last attempt is returned as-is.
pub async fn request_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt: u32 = 1;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "request failed, retrying"
                );

                let sleep_for = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(sleep_for).await;

                let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next.min(config.max_delay);
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "request failed after all attempts"
                    );
                } else {
                    tracing::error!(error = %e, "request failed with terminal error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to spread out concurrent retries
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay falls between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
