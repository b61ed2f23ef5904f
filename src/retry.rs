//! Exponential-backoff retry policy wrapping the repository's store call.
//!
//! Cancellation is checked before every attempt and raced against every sleep
//! via `tokio::select!`, so a client disconnect stops the retry loop promptly
//! instead of waiting out the full backoff.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::ForwarderError;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration, multiplier: f64, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: initial_delay.max(Duration::from_millis(1)),
            multiplier: if multiplier <= 1.0 { 2.0 } else { multiplier },
            max_delay: max_delay.max(Duration::from_millis(1)),
        }
    }
}

pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub async fn execute<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        mut thunk: F,
    ) -> Result<T, ForwarderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ForwarderError>>,
    {
        let mut delay = self.config.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(ForwarderError::Store("request cancelled".into()));
            }

            match thunk().await {
                Ok(value) => return Ok(value),
                Err(ForwarderError::Transient(reason)) => {
                    if attempt >= self.config.max_attempts {
                        return Err(ForwarderError::Store(format!(
                            "store retries exhausted after {attempt} attempts: {reason}"
                        )));
                    }

                    tracing::warn!(attempt, reason, "transient store failure, retrying");
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            return Err(ForwarderError::Store("request cancelled".into()));
                        }
                    }

                    let next = delay.as_secs_f64() * self.config.multiplier;
                    delay = Duration::from_secs_f64(next.min(self.config.max_delay.as_secs_f64()));
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_up_to_max_attempts() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10),
        });
        let cancel = CancellationToken::new();
        let attempts = AtomicU32::new(0);

        let result: Result<(), ForwarderError> = policy
            .execute(&cancel, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(ForwarderError::Transient("db unavailable".into())) }
            })
            .await;

        assert!(matches!(result, Err(ForwarderError::Store(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_without_retrying_on_first_success() {
        let policy = RetryPolicy::new(RetryConfig::default());
        let cancel = CancellationToken::new();
        let attempts = AtomicU32::new(0);

        let result = policy
            .execute(&cancel, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ForwarderError>(42) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let policy = RetryPolicy::new(RetryConfig::default());
        let cancel = CancellationToken::new();
        let attempts = AtomicU32::new(0);

        let result: Result<(), ForwarderError> = policy
            .execute(&cancel, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(ForwarderError::Store("constraint violation".into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let policy = RetryPolicy::new(RetryConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let attempts = AtomicU32::new(0);

        let result: Result<(), ForwarderError> = policy
            .execute(&cancel, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn config_coerces_invalid_multiplier_and_delays() {
        let config = RetryConfig::new(0, Duration::from_millis(0), 0.5, Duration::from_millis(0));
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.initial_delay, Duration::from_millis(1));
        assert_eq!(config.multiplier, 2.0);
        assert_eq!(config.max_delay, Duration::from_millis(1));
    }
}
