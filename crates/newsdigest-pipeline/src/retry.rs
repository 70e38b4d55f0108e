//! Fixed-delay retry for whole pipeline runs.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use newsdigest_core::AppConfig;

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.ingest_max_retries,
            Duration::from_secs(config.ingest_retry_delay_secs),
        )
    }

    /// A single attempt with no waiting.
    #[must_use]
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Runs `operation` up to `policy.max_attempts` times, sleeping
/// `policy.delay` between failed attempts. Returns the last error once all
/// attempts fail.
///
/// # Errors
///
/// Returns the error from the final attempt.
pub async fn retry_fixed<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= policy.max_attempts => {
                tracing::error!(
                    label,
                    attempts = attempt,
                    error = %err,
                    "all attempts failed"
                );
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_secs = policy.delay.as_secs(),
                    error = %err,
                    "attempt failed, retrying after fixed delay"
                );
            }
        }
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}
