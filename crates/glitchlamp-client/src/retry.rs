//! Bounded retry for startup loads.

use std::time::Duration;

use glitchlamp_config::Settings;

use crate::backend::Backend;
use crate::error::ClientError;

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// Three attempts, two seconds apart.
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A single attempt.
    pub const fn once() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Runs `op` until it succeeds or attempts run out.
    ///
    /// Non-transient errors (bad URL, 4xx, decode) stop immediately. The
    /// last error is returned.
    pub fn run<T>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_transient() => {
                    tracing::warn!(attempt, attempts, "{what} failed, retrying: {e}");
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempt, "{what} failed: {e}");
                    return Err(e);
                }
            }
        }
    }
}

/// Loads settings with bounded retry.
pub fn load_settings_with_retry(
    backend: &dyn Backend,
    policy: RetryPolicy,
) -> Result<Settings, ClientError> {
    policy.run("settings load", || backend.settings())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn default_is_three_attempts_two_seconds_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn recovers_within_budget() {
        let backend = MemoryBackend::demo();
        backend.fail_next(2);
        assert!(load_settings_with_retry(&backend, fast(3)).is_ok());
    }

    #[test]
    fn gives_up_after_budget() {
        let backend = MemoryBackend::demo();
        backend.fail_next(3);
        assert!(load_settings_with_retry(&backend, fast(3)).is_err());
        // Exactly three attempts consumed the three failures.
        assert!(backend.settings().is_ok());
    }

    #[test]
    fn permanent_errors_stop_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = fast(3).run("op", || {
            calls += 1;
            Err(ClientError::Status {
                status: 404,
                message: String::new(),
            })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _ = fast(0).run("op", || {
            calls += 1;
            Ok::<_, ClientError>(())
        });
        assert_eq!(calls, 1);
    }
}
