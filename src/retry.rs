//! Bounded retries around lookups that may observe a detached element, and
//! the retry budget used while the navigator waits for a recognisable screen.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RetryError<E: Display> {
    #[error("gave up on {what} after {attempts} attempts: {last}")]
    Exhausted { what: String, attempts: u32, last: E },

    #[error("{what} failed on attempt {attempt}: {error}")]
    Aborted { what: String, attempt: u32, error: E },
}

impl<E: Display> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Aborted { attempt, .. } => *attempt,
        }
    }
}

/// Fixed attempt ceiling with an optional fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or has
    /// been attempted exactly `max_attempts` times.
    pub async fn run<T, E, F, Fut, R>(&self, what: &str, is_retryable: R, mut op: F) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => {
                    return Err(RetryError::Aborted {
                        what: what.to_string(),
                        attempt,
                        error: e,
                    })
                }
                Err(e) if attempt >= max_attempts => {
                    warn!("Giving up on {} after {} attempts: {}", what, attempt, e);
                    return Err(RetryError::Exhausted {
                        what: what.to_string(),
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    debug!("Attempt {}/{} for {} failed: {}", attempt, max_attempts, what, e);
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }
    }
}

/// Consecutive-failure counter with a ceiling and a linearly growing pause.
#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    used: u32,
}

impl RetryBudget {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, used: 0 }
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    /// Count one failure. Returns the pause to observe before trying again,
    /// or `None` once the ceiling has been exceeded.
    pub fn spend(&mut self) -> Option<Duration> {
        self.used += 1;
        if self.used > self.policy.max_attempts {
            None
        } else {
            Some(self.policy.delay * self.used)
        }
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}
