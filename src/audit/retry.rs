//! Retry with exponential backoff for event store appends
//!
//! Only errors classified as transient by [`TrailError::is_transient`] are
//! retried. Anything else fails on the first attempt.

use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::TrailResult;

/// Configuration for retry behavior on transient append errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(250),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
pub fn retry_with_backoff<T, F>(config: &RetryConfig, what: &str, mut op: F) -> TrailResult<T>
where
    F: FnMut() -> TrailResult<T>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config.max_attempts => {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "{} failed, retrying",
                    what
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrailError;

    fn quick(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        };
        assert_eq!(config.delay_for(1), Duration::from_millis(10));
        assert_eq!(config.delay_for(2), Duration::from_millis(20));
        assert_eq!(config.delay_for(3), Duration::from_millis(40));
        assert_eq!(config.delay_for(4), Duration::from_millis(50));
        assert_eq!(config.delay_for(40), Duration::from_millis(50));
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let mut calls = 0;
        let result = retry_with_backoff(&quick(3), "append", || {
            calls += 1;
            if calls < 3 {
                Err(TrailError::Io("busy".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: TrailResult<()> = retry_with_backoff(&quick(2), "append", || {
            calls += 1;
            Err(TrailError::Io("busy".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_permanent_errors_fail_immediately() {
        let mut calls = 0;
        let result: TrailResult<()> = retry_with_backoff(&quick(5), "append", || {
            calls += 1;
            Err(TrailError::Storage("corrupt".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
