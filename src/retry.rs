//! Retry logic with exponential backoff
//!
//! This module provides configurable retry logic for transient failures.
//! It implements exponential backoff with optional jitter to prevent thundering herd.
//!
//! Two signals decide whether a failure is retried:
//! - [`IsRetryable::is_retryable`] for failures without an HTTP status
//!   (refused/reset connections, timeouts)
//! - [`RetryConfig::retry_on_status`] for failures that carry a status,
//!   reported through [`IsRetryable::status`]
//!
//! # Example
//!
//! ```no_run
//! use bulk_dl::config::RetryConfig;
//! use bulk_dl::error::FetchError;
//! use bulk_dl::retry::download_with_retry;
//!
//! # async fn example(client: &reqwest::Client) -> Result<(), FetchError> {
//! let config = RetryConfig::default();
//! let response = download_with_retry(&config, || async move {
//!     let response = client
//!         .get("https://cdn.example.com/v/01.mp4")
//!         .send()
//!         .await
//!         .map_err(FetchError::Connection)?;
//!     let code = response.status().as_u16();
//!     if code >= 400 {
//!         // Retried only when `code` is in `config.retry_on_status`
//!         return Err(FetchError::Status(code));
//!     }
//!     Ok::<_, FetchError>(response)
//! })
//! .await?;
//! # drop(response);
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, connection reset) should return `true`.
/// Permanent failures (disk full, malformed URL) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;

    /// HTTP status carried by the error, if any.
    ///
    /// When this returns `Some`, the retry decision is taken from
    /// [`RetryConfig::retry_on_status`] instead of [`is_retryable`](Self::is_retryable).
    fn status(&self) -> Option<u16> {
        None
    }
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Connection(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            FetchError::Timeout(_) => true,
            // Classified by the configured status set
            FetchError::Status(_) => false,
            FetchError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            FetchError::Incomplete { .. } => false,
            FetchError::Client(_) => false,
            FetchError::Aborted(_) => false,
        }
    }

    fn status(&self) -> Option<u16> {
        FetchError::status(self)
    }
}

fn should_retry<E: IsRetryable>(config: &RetryConfig, error: &E) -> bool {
    match error.status() {
        Some(code) => config.retries_status(code),
        None => error.is_retryable(),
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, delays, backoff multiplier, jitter)
/// * `operation` - Async closure that returns Result<T, E> where E implements IsRetryable
///
/// # Returns
///
/// Returns the successful result or the last error after all retry attempts are exhausted.
/// The operation runs at most `config.max_attempts + 1` times.
pub async fn download_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if should_retry(config, &e) && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                let jittered_delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tokio::time::sleep(jittered_delay).await;

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => {
                if should_retry(config, &e) {
                    tracing::warn!(
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(
                        error = %e,
                        "Operation failed with non-retryable error"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay,
/// so the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}
