//! Backoff executor
//!
//! Wraps a single remote call with permit acquisition, retry and delay.
//! It is the only place in the crate that retries.

use super::policy::BackoffPolicy;
use crate::error::{Error, Result};
use crate::limit::PermitSource;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Something that can wait between retries
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `delay`
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Records requested delays and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delay);
    }
}

/// Runs remote calls under a retry policy and a shared permit source
#[derive(Clone)]
pub struct BackoffExecutor {
    limiter: Arc<dyn PermitSource>,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl BackoffExecutor {
    /// Create an executor sleeping on the tokio timer
    pub fn new(limiter: Arc<dyn PermitSource>, policy: BackoffPolicy) -> Self {
        Self {
            limiter,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The retry policy
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Run `call` until it succeeds, fails fatally, or runs out of attempts
    ///
    /// Each attempt first acquires `permits` units against `resource`.
    /// Recoverable failures are retried after a backoff sleep; fatal ones are
    /// returned unchanged. When the attempt budget is spent the last failure
    /// is wrapped in [`Error::RetriesExhausted`].
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        resource: &str,
        permits: u32,
        mut call: F,
    ) -> Result<T>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        let mut state = self.policy.state();

        loop {
            self.limiter.acquire(resource, permits).await;
            state.record_attempt();

            let err = match call().await {
                Ok(value) => {
                    if state.attempts() > 1 {
                        debug!(
                            "{operation} on {resource} succeeded after {} attempts",
                            state.attempts()
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if state.exhausted() {
                warn!(
                    "{operation} on {resource} failed after {} attempts: {err}",
                    state.attempts()
                );
                return Err(Error::RetriesExhausted {
                    operation: operation.to_string(),
                    resource: resource.to_string(),
                    attempts: state.attempts(),
                    source: Box::new(err),
                });
            }

            let delay = state.next_delay();
            warn!(
                "{operation} on {resource} failed: {err}, attempt {}/{}, retrying in {delay:?}",
                state.attempts(),
                self.policy.max_attempts
            );
            self.sleeper.sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for BackoffExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackoffExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
