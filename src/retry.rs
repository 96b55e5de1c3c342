//! Bounded retry with exponential backoff for remote calls.

use crate::config::Config;
use crate::types::StageError;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

/// Timeout and retry bounds applied to a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub backoff: Duration,
    /// Upper bound on a single attempt, from connect until the body is read.
    pub timeout: Duration,
}

/// Outcome of one failed attempt.
#[derive(Debug)]
pub(crate) struct AttemptFailure {
    pub(crate) error: StageError,
    pub(crate) retry: bool,
}

impl AttemptFailure {
    /// Failure whose retry decision follows [`StageError::is_retryable`].
    pub(crate) fn from_error(error: StageError) -> Self {
        let retry = error.is_retryable();
        Self { error, retry }
    }

    /// Non-2xx status; 4xx other than 408/429 are final.
    pub(crate) fn from_status(status: StatusCode, error: StageError) -> Self {
        let retry = status.is_server_error()
            || status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT;
        Self { error, retry }
    }
}

impl From<StageError> for AttemptFailure {
    fn from(error: StageError) -> Self {
        Self::from_error(error)
    }
}

impl RetryPolicy {
    /// Policy for service calls, derived from the loaded configuration.
    pub fn for_service(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff,
            timeout: config.request_timeout,
        }
    }

    /// Policy for document downloads: same attempts and backoff, download timeout.
    pub fn for_download(config: &Config) -> Self {
        Self {
            timeout: config.download_timeout,
            ..Self::for_service(config)
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }

    /// Run `attempt_fn` until it succeeds, fails permanently, or attempts run out.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        target: &str,
        mut attempt_fn: F,
    ) -> Result<T, StageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptFailure>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match attempt_fn().await {
                Ok(value) => {
                    tracing::debug!(target_url = target, attempt, "Remote call succeeded");
                    return Ok(value);
                }
                Err(failure) if failure.retry && attempt < max_attempts => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        target_url = target,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure.error,
                        "Remote call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    tracing::error!(
                        target_url = target,
                        attempt,
                        error = %failure.error,
                        "Remote call failed"
                    );
                    return Err(failure.error);
                }
            }
        }
    }
}
