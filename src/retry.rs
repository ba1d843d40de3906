//! Bounded retry loop
//!
//! Runs an async operation up to `1 + max_retries` times. Each attempt is awaited
//! in turn inside one loop, so the value the caller receives is always the result
//! of the final attempt. Retries are immediate by default; a non-zero
//! `initial_delay` turns on exponential backoff with optional jitter.
//!
//! # Example
//!
//! ```no_run
//! use tarball_dl::retry::{IsRetryable, download_with_retry};
//! use tarball_dl::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let result = download_with_retry(&config, |_attempt| async {
//!     // Your operation here
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Anything that can change between attempts
            Error::Fetch { .. }
            | Error::HttpStatus { .. }
            | Error::MissingArtifact { .. }
            | Error::InvalidArchive { .. }
            | Error::Io(_)
            | Error::TaskPanicked(_)
            | Error::Other(_) => true,
            // Bad input stays bad
            Error::Config { .. }
            | Error::MalformedUrl { .. }
            | Error::UnsafeTarget { .. }
            | Error::Serialization(_) => false,
        }
    }
}

/// Retries left once `attempt` (0-based) has been made.
pub fn remaining_after(config: &RetryConfig, attempt: u32) -> u32 {
    config.max_retries.saturating_sub(attempt)
}

/// Execute an async operation, retrying retryable errors up to `config.max_retries` times
///
/// `operation` receives the 0-based attempt number.
///
/// # Returns
///
/// The first successful result, the first non-retryable error, or the last error
/// once every retry has been spent.
pub async fn download_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;

                tracing::debug!(
                    error = %e,
                    attempt = attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                if !delay.is_zero() {
                    let jittered_delay = if config.jitter {
                        add_jitter(delay)
                    } else {
                        delay
                    };
                    tokio::time::sleep(jittered_delay).await;

                    delay = next_delay(delay, config);
                }
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::debug!(
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Backoff step, capped at `max_delay`
///
/// The product is clamped in seconds before it becomes a `Duration`, so a large
/// multiplier saturates at the cap instead of overflowing.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let secs =
        (delay.as_secs_f64() * config.backoff_multiplier).min(config.max_delay.as_secs_f64());
    Duration::try_from_secs_f64(secs).unwrap_or(config.max_delay)
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::try_from_secs_f64(jittered_secs).unwrap_or(delay)
}
