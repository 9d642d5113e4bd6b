//! Bounded exponential backoff for OTG calls

use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Retries retryable errors with exponential backoff, up to a fixed number
/// of attempts. Anything not retryable is returned on the attempt it occurs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        RetryPolicy { config }
    }

    /// Maximum attempts, never less than one
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.config.initial_interval)
            .with_max_interval(self.config.max_interval)
            .with_multiplier(self.config.multiplier)
            .with_randomization_factor(0.1)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Returns the final result
    /// along with the number of attempts made.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> (Result<T>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max = self.max_attempts();
        let attempts = AtomicU32::new(0);
        let counter = &attempts;

        let result = backoff::future::retry_notify(
            self.backoff(),
            move || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let fut = op(attempt);
                async move {
                    match fut.await {
                        Ok(value) => Ok(value),
                        Err(e) if e.is_retryable() && attempt < max => {
                            Err(backoff::Error::transient(e))
                        }
                        Err(e) => Err(backoff::Error::permanent(e)),
                    }
                }
            },
            |err: Error, delay: Duration| {
                warn!(
                    operation = label,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying: {}",
                    err
                );
            },
        )
        .await;

        let made = attempts.load(Ordering::SeqCst);
        debug!(operation = label, attempts = made, ok = result.is_ok(), "Retry loop finished");
        (result, made)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
