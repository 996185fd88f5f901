//! Exponential backoff for transient provider failures.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::LlmApiError;

/// Retry policy with exponential backoff.
///
/// Retries only errors for which [`LlmApiError::is_transient`] holds and
/// gives up after `max_retries` retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// No waiting between attempts; used against local mock servers.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(1),
        }
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, LlmApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmApiError>>,
    {
        let mut schedule = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(None)
            .build();
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempt, "provider call succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let wait = schedule.next_backoff().unwrap_or(self.max_interval);
                    warn!(
                        attempt = attempt + 1,
                        error = %err,
                        wait_ms = wait.as_millis() as u64,
                        "transient provider error, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
