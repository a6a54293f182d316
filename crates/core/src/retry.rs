//! Retry logic with exponential backoff
//!
//! Provides bounded retries for flaky async operations:
//! - Exponential backoff (base 2 by default) with optional jitter
//! - An injectable predicate deciding which errors are worth retrying
//! - The last error is returned unchanged once attempts run out
//!
//! Backoff sleeps on the tokio timer, so only the calling task is suspended.
//!
//! # Example
//!
//! ```rust,no_run
//! use farmacia_core::retry::{retry, RetryConfig};
//!
//! # async fn run() {
//! let result = retry(
//!     RetryConfig::default(),
//!     |err: &String| !err.contains("401"),
//!     || async { Ok::<_, String>("success") },
//! )
//! .await;
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Create a config for quick retries
    #[must_use]
    pub fn quick() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Create a config for patient retries
    #[must_use]
    pub fn patient() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Create a config with no retries
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Calculate the delay to wait before a given attempt (0-indexed)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());
        if !delay_secs.is_finite() || delay_secs <= 0.0 {
            return Duration::ZERO;
        }

        let final_delay = if self.jitter {
            // Add up to 25% jitter
            let jitter_factor = 1.0 + (rand_simple() * 0.25);
            delay_secs * jitter_factor
        } else {
            delay_secs
        };

        Duration::try_from_secs_f64(final_delay).unwrap_or(self.max_delay)
    }

    /// Check that the policy can produce sane delays
    ///
    /// The multiplier must be finite and at least 1.0.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(crate::Error::validation(format!(
                "backoff_multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            ))
            .with_suggestion("Use 2.0 for doubling delays or 1.0 for constant delays"));
        }
        Ok(())
    }
}

/// Simple pseudo-random number generator (0.0 to 1.0)
fn rand_simple() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    hasher.write_u32(nanos);
    f64::from(u32::try_from(hasher.finish() % 1000).unwrap_or_default()) / 1000.0
}

/// Errors that know whether retrying them could help
pub trait Retryable {
    /// Whether another attempt might succeed
    fn is_retryable(&self) -> bool;
}

/// Retry result with attempt information
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub value: T,
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent, delays included
    pub total_duration: Duration,
}

/// Run an async operation, retrying failures accepted by `should_retry`.
///
/// At most `config.max_attempts` attempts are made (at least one). Errors
/// rejected by the predicate are returned immediately; once attempts run out
/// the last error is returned as is.
pub async fn retry<F, Fut, T, E, P>(
    config: RetryConfig,
    should_retry: P,
    mut operation: F,
) -> Result<RetryResult<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = config.delay_for_attempt(attempt);
            debug!(
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying after delay"
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(value) => {
                return Ok(RetryResult {
                    value,
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                });
            }
            Err(e) => {
                attempt += 1;
                if !should_retry(&e) {
                    debug!(attempt, error = %e, "Error is not retryable");
                    return Err(e);
                }
                if attempt >= max_attempts {
                    warn!(attempts = attempt, error = %e, "Retry attempts exhausted");
                    return Err(e);
                }
                debug!(attempt, error = %e, "Attempt failed, will retry");
            }
        }
    }
}

/// Retry an operation whose error type carries its own retry predicate
pub async fn with_retry<F, Fut, T, E>(config: RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    retry(config, E::is_retryable, operation)
        .await
        .map(|result| result.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    enum FakeError {
        Unavailable(u32),
        Unauthorized,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Unavailable(n) => write!(f, "unavailable #{n}"),
                Self::Unauthorized => write!(f, "unauthorized"),
            }
        }
    }

    impl Retryable for FakeError {
        fn is_retryable(&self) -> bool {
            !matches!(self, Self::Unauthorized)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_first_attempt() {
        let result = retry(RetryConfig::default(), |_: &FakeError| true, || async {
            Ok::<_, FakeError>("success")
        })
        .await
        .unwrap();

        assert_eq!(result.value, "success");
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry(RetryConfig::default(), FakeError::is_retryable, move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(FakeError::Unavailable(n))
                } else {
                    Ok("success")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result.value, "success");
        assert_eq!(result.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles() {
        let start = tokio::time::Instant::now();
        let result = with_retry(RetryConfig::default(), || async {
            Err::<(), _>(FakeError::Unavailable(0))
        })
        .await;

        assert!(result.is_err());
        // 1s before attempt 2, 2s before attempt 3
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = with_retry(RetryConfig::default(), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err::<(), _>(FakeError::Unavailable(n))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err, FakeError::Unavailable(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = with_retry(RetryConfig::default(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FakeError::Unauthorized)
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err, FakeError::Unauthorized);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let _ = retry(config, |_: &FakeError| true, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FakeError::Unavailable(1))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_capped() {
        let config = RetryConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_bounds() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(100),
            jitter: true,
            ..Default::default()
        };

        let delay = config.delay_for_attempt(1);
        assert!(delay >= Duration::from_millis(100));
        assert!(delay <= Duration::from_millis(125));
    }

    #[test]
    fn test_negative_multiplier_never_panics() {
        let config = RetryConfig {
            backoff_multiplier: -1.0,
            ..RetryConfig::default()
        };

        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_multiplier_rejected() {
        let config = RetryConfig {
            backoff_multiplier: f64::NAN,
            ..RetryConfig::default()
        };

        assert_eq!(config.delay_for_attempt(2), Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ValidationError);
    }

    #[test]
    fn test_presets_validate() {
        assert!(RetryConfig::default().validate().is_ok());
        assert!(RetryConfig::quick().validate().is_ok());
        assert!(RetryConfig::patient().validate().is_ok());
        assert!(RetryConfig::no_retry().validate().is_ok());
    }
}
