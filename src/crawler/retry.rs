//! Bounded retry around text downloads
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Connection failure, attempts left | Sleep `delay`, retry |
//! | Connection failure, last attempt | Stop → `Exhausted` |
//! | HTTP 4xx/5xx | Stop → `Terminal` |
//! | Other request failure | Stop → `Terminal` |
//! | Redirect | Stop → `Redirected` |
//! | 2xx | Stop → success |
//!
//! The policy never returns an error; the outcome records how the sequence ended.

use crate::config::RetryConfig;
use crate::crawler::fetcher::{FetchError, FetchResult, Fetcher};
use crate::crawler::redirect::RedirectGuard;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Waits between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Why a retry sequence ended without a usable response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryFailure {
    /// Every attempt failed at the connection level
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: FetchError },

    /// A failure that retrying cannot fix
    #[error("{0}")]
    Terminal(FetchError),

    /// The server redirected, so the resource does not exist
    #[error("redirected to {final_url}")]
    Redirected { final_url: String },
}

/// Terminal value of a retry sequence
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub succeeded: bool,
    pub result: Option<FetchResult>,
    pub attempts_used: u32,
    pub failure: Option<RetryFailure>,
}

impl RetryOutcome {
    fn success(result: FetchResult, attempts_used: u32) -> Self {
        Self {
            succeeded: true,
            result: Some(result),
            attempts_used,
            failure: None,
        }
    }

    fn failed(failure: RetryFailure, attempts_used: u32) -> Self {
        Self {
            succeeded: false,
            result: None,
            attempts_used,
            failure: Some(failure),
        }
    }

    /// Converts the outcome into the response or the failure that ended it
    pub fn into_result(self) -> Result<FetchResult, RetryFailure> {
        match (self.result, self.failure) {
            (Some(result), _) => Ok(result),
            (None, Some(failure)) => Err(failure),
            (None, None) => Err(RetryFailure::Exhausted {
                attempts: self.attempts_used,
                last_error: FetchError::Transport {
                    message: "no response".to_string(),
                },
            }),
        }
    }
}

/// Fixed-delay retry bounded by an attempt count
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    guard: RedirectGuard,
}

impl RetryPolicy {
    /// Creates a policy; a `max_attempts` of 0 is treated as 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            guard: RedirectGuard::new(),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Fetches `url`, retrying connection failures
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Issues the individual GETs
    /// * `sleeper` - Performs the wait between attempts
    /// * `url` - The URL to fetch
    ///
    /// # Returns
    ///
    /// A `RetryOutcome`; this never fails
    pub async fn fetch_with_retry(
        &self,
        fetcher: &dyn Fetcher,
        sleeper: &dyn Sleeper,
        url: &Url,
    ) -> RetryOutcome {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match fetcher.fetch(url).await {
                Ok(result) => {
                    if !self.guard.is_valid(url, &result) {
                        return RetryOutcome::failed(
                            RetryFailure::Redirected {
                                final_url: result.final_url,
                            },
                            attempt,
                        );
                    }
                    return RetryOutcome::success(result, attempt);
                }
                Err(error) if error.is_retryable() => {
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            "Giving up on {} after {} attempts: {}",
                            url,
                            attempt,
                            error
                        );
                        return RetryOutcome::failed(
                            RetryFailure::Exhausted {
                                attempts: attempt,
                                last_error: error,
                            },
                            attempt,
                        );
                    }

                    tracing::warn!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        url,
                        error,
                        self.delay
                    );
                    sleeper.sleep(self.delay).await;
                }
                Err(error) => {
                    tracing::debug!("{} failed without retry: {}", url, error);
                    return RetryOutcome::failed(RetryFailure::Terminal(error), attempt);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
