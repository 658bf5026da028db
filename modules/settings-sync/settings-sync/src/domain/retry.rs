//! Bounded retry with exponential backoff around remote settings calls.

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use settings_sync_sdk::{ErrorKind, SettingsError};

/// Conditions that may trigger a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryTrigger {
    /// Transport-level failure (offline, connection reset, timeout)
    Network,
    /// The service failed while handling the request
    Server,
    /// Failure that must never be retried (validation, authorization, not found)
    NonRetryable,
}

/// Maps a failure onto its retry trigger.
pub trait RetryClassify {
    fn retry_trigger(&self) -> RetryTrigger;
}

impl RetryClassify for SettingsError {
    fn retry_trigger(&self) -> RetryTrigger {
        match self.kind() {
            ErrorKind::Network => RetryTrigger::Network,
            ErrorKind::Server => RetryTrigger::Server,
            ErrorKind::Validation | ErrorKind::Authorization | ErrorKind::NotFound => {
                RetryTrigger::NonRetryable
            }
        }
    }
}

/// Exponential backoff configuration for retries
///
/// Computes delay as: `min(initial * multiplier^attempt, max)` with optional jitter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExponentialBackoff {
    /// Initial backoff duration (default: 1s)
    #[serde(with = "crate::humantime_serde")]
    pub initial: Duration,

    /// Maximum backoff duration (default: 30s)
    #[serde(with = "crate::humantime_serde")]
    pub max: Duration,

    /// Backoff multiplier for exponential growth (default: 2.0)
    pub multiplier: f64,

    /// Add a random 0-25% to each delay (default: false)
    pub jitter: bool,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl ExponentialBackoff {
    /// Create fast backoff for testing (1ms initial, 10ms max, no jitter)
    #[must_use]
    pub fn fast() -> Self {
        Self {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(10),
            multiplier: 2.0,
            jitter: false,
        }
    }

    /// Delay before retry number `attempt + 1`.
    ///
    /// A non-finite or negative multiplier counts as 1. Delays never exceed
    /// `max`, itself capped at one day, before jitter is added.
    #[must_use]
    pub fn delay_for(&self, attempt: usize) -> Duration {
        const CEILING: Duration = Duration::from_secs(24 * 60 * 60);

        let cap = self.max.min(CEILING);
        let growth = if self.multiplier.is_finite() && self.multiplier >= 0.0 {
            self.multiplier
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * growth.powi(exponent);

        let delay = Duration::try_from_secs_f64(secs).map_or(cap, |d| d.min(cap));
        if self.jitter {
            delay.mul_f64(1.0 + rand::rng().random_range(0.0..=0.25))
        } else {
            delay
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt (0 = no retries, default: 2)
    /// Total attempts = 1 (initial) + `max_retries`
    pub max_retries: usize,

    /// Backoff strategy configuration
    pub backoff: ExponentialBackoff,

    /// Triggers that are retried. Default: `[Network, Server]`
    ///
    /// `NonRetryable` is ignored even if listed.
    pub retry_on: HashSet<RetryTrigger>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: ExponentialBackoff::default(),
            retry_on: HashSet::from([RetryTrigger::Network, RetryTrigger::Server]),
        }
    }
}

impl RetryConfig {
    /// Create config with no retries
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn should_retry(&self, trigger: RetryTrigger) -> bool {
        trigger != RetryTrigger::NonRetryable && self.retry_on.contains(&trigger)
    }
}

/// Runs remote operations under a [`RetryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Calls `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. Returns the result of the last attempt.
    ///
    /// # Errors
    /// Returns the error of the final attempt.
    pub async fn run<T, E, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryClassify + Display,
    {
        let mut attempt = 0usize;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(op = op_name, attempts = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let trigger = err.retry_trigger();
                    if !self.config.should_retry(trigger) {
                        tracing::debug!(op = op_name, error = %err, trigger = ?trigger, "Not retrying");
                        return Err(err);
                    }
                    if attempt >= self.config.max_retries {
                        tracing::warn!(
                            op = op_name,
                            attempts = attempt + 1,
                            error = %err,
                            "Retries exhausted"
                        );
                        return Err(err);
                    }

                    let backoff = self.config.backoff.delay_for(attempt);
                    tracing::debug!(
                        op = op_name,
                        retry = attempt + 1,
                        max_retries = self.config.max_retries,
                        error = %err,
                        trigger = ?trigger,
                        backoff_ms = backoff.as_millis(),
                        "Retrying after error"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            backoff: ExponentialBackoff::fast(),
            ..RetryConfig::default()
        })
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        let backoff = ExponentialBackoff::default();
        assert_eq!(backoff.delay_for(0), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(1), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(10), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_sanitizes_bad_multiplier() {
        let backoff = ExponentialBackoff {
            multiplier: f64::NAN,
            ..ExponentialBackoff::default()
        };
        assert_eq!(backoff.delay_for(5), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_overflow_is_capped_at_one_day() {
        let backoff = ExponentialBackoff {
            max: Duration::from_secs(u64::MAX),
            ..ExponentialBackoff::default()
        };
        assert_eq!(backoff.delay_for(100_000), Duration::from_secs(86_400));
    }

    #[test]
    fn test_backoff_jitter_stays_within_quarter() {
        let backoff = ExponentialBackoff {
            jitter: true,
            ..ExponentialBackoff::default()
        };
        for _ in 0..50 {
            let d = backoff.delay_for(1);
            assert!(d >= Duration::from_secs(2));
            assert!(d <= Duration::from_millis(2500));
        }
    }

    #[tokio::test]
    async fn test_retries_network_errors_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = fast_policy(2)
            .run("test", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(SettingsError::network("offline"))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy(2)
            .run("test", || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Err(SettingsError::server(503, format!("attempt {n}")))
                }
            })
            .await;

        assert_eq!(result, Err(SettingsError::server(503, "attempt 2")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_short_circuits() {
        for err in [
            SettingsError::validation("bad"),
            SettingsError::unauthorized("expired"),
            SettingsError::not_found(),
        ] {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = calls.clone();
            let expected = err.clone();

            let result: Result<(), _> = fast_policy(3)
                .run("test", || {
                    let counter = counter.clone();
                    let err = err.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Err(err)
                    }
                })
                .await;

            assert_eq!(result, Err(expected));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_disabled_config_makes_single_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = RetryPolicy::new(RetryConfig::disabled())
            .run("test", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(SettingsError::network("offline"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_on_can_exclude_server_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 3,
            backoff: ExponentialBackoff::fast(),
            retry_on: HashSet::from([RetryTrigger::Network]),
        });

        let result: Result<(), _> = policy
            .run("test", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(SettingsError::server(500, "boom"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
