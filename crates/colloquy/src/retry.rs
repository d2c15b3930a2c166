//! Bounded retries with exponential backoff for outbound requests
//!
//! The delay between attempts goes through a [`Sleeper`] so callers (and tests) decide how
//! waiting actually happens.
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::errors::{AttemptError, FetchError};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts; zero is treated as one
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay after the given failed attempt (1-based): `initial_backoff * 2^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff.saturating_mul(1_u32 << exponent)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_INITIAL_BACKOFF)
    }
}

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Waits on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Run `op` until it succeeds, fails fatally, or the attempt budget runs out
///
/// `op` receives the 1-based attempt number. Transient failures are retried after
/// [`RetryConfig::delay_for`]; fatal ones are returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let attempts = config.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Transient(cause)) if attempt >= attempts => {
                return Err(FetchError::Transient {
                    attempts: attempt,
                    last: cause,
                });
            }
            Err(AttemptError::Transient(cause)) => {
                let delay = config.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %cause,
                    "transient failure, retrying"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
