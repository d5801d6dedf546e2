//! Retry classification and exponential backoff with jitter.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::{ClientOptions, CloudcraftError, DynError, Result};

const BACKOFF_FACTOR: u32 = 2;
const JITTER_FACTOR: f64 = 0.1;

/// Decides whether an attempt should be retried.
///
/// Receives the response status when one was received and the transport
/// error when the send failed.
pub type RetryPredicate =
    Arc<dyn Fn(Option<StatusCode>, Option<&DynError>) -> bool + Send + Sync>;

/// Retry settings shared read-only by every call made through one client.
#[derive(Clone)]
pub struct RetryPolicy {
    is_retryable: RetryPredicate,
    /// Retries after the initial attempt.
    pub max_retries: usize,
    /// Backoff before the first retry.
    pub min_retry_delay: Duration,
    /// Cap applied to the backoff before jitter.
    pub max_retry_delay: Duration,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("min_retry_delay", &self.min_retry_delay)
            .field("max_retry_delay", &self.max_retry_delay)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_options(&ClientOptions::default())
    }
}

impl RetryPolicy {
    /// Builds a policy using [`default_is_retryable`].
    ///
    /// The cap wins over the floor: when `min_retry_delay` exceeds
    /// `max_retry_delay`, every backoff is `max_retry_delay`. Only
    /// [`Config::validate`](crate::Config::validate) rejects such a pair.
    pub fn new(max_retries: usize, min_retry_delay: Duration, max_retry_delay: Duration) -> Self {
        Self {
            is_retryable: Arc::new(default_is_retryable),
            max_retries,
            min_retry_delay,
            max_retry_delay,
        }
    }

    pub(crate) fn from_options(options: &ClientOptions) -> Self {
        Self::new(
            options.max_retries,
            options.min_retry_delay,
            options.max_retry_delay,
        )
    }

    /// Replaces the retry predicate.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<StatusCode>, Option<&DynError>) -> bool + Send + Sync + 'static,
    {
        self.is_retryable = Arc::new(predicate);
        self
    }

    /// Applies the configured predicate.
    pub fn is_retryable(&self, status: Option<StatusCode>, error: Option<&DynError>) -> bool {
        (self.is_retryable)(status, error)
    }

    /// Unjittered delay for `attempt`: `min_retry_delay * 2^attempt`, capped
    /// at `max_retry_delay`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt).unwrap_or(u32::MAX);
        let multiplier = BACKOFF_FACTOR.saturating_pow(exp);
        self.min_retry_delay
            .saturating_mul(multiplier)
            .min(self.max_retry_delay)
    }

    /// [`RetryPolicy::backoff`] with ±10% symmetric jitter.
    pub fn jittered(&self, attempt: usize) -> Duration {
        let delay = self.backoff(attempt);
        let jitter = rand::rng().random_range(-JITTER_FACTOR..=JITTER_FACTOR);
        Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter)).unwrap_or(delay)
    }

    /// Sleeps for the jittered backoff of `attempt`.
    ///
    /// Returns [`CloudcraftError::Canceled`] as soon as `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken, attempt: usize) -> Result<()> {
        let delay = self.jittered(attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CloudcraftError::Canceled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

/// Default retry classification.
///
/// Retries on any transport error, and on statuses indicating the request
/// may succeed later: 202, 408, 429, 502, 503 and 504.
pub fn default_is_retryable(status: Option<StatusCode>, error: Option<&DynError>) -> bool {
    if error.is_some() {
        return true;
    }

    matches!(
        status,
        Some(
            StatusCode::ACCEPTED
                | StatusCode::REQUEST_TIMEOUT
                | StatusCode::TOO_MANY_REQUESTS
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    )
}

pub(crate) fn as_dyn(err: &reqwest::Error) -> &DynError {
    err
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use reqwest::StatusCode;
    use tokio_util::sync::CancellationToken;

    use super::{default_is_retryable, RetryPolicy};
    use crate::{CloudcraftError, DynError};

    fn policy(min_ms: u64, max_ms: u64) -> RetryPolicy {
        RetryPolicy::new(
            3,
            Duration::from_millis(min_ms),
            Duration::from_millis(max_ms),
        )
    }

    #[test]
    fn backoff_doubles_and_clamps() {
        let policy = policy(1_000, 30_000);
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(4), Duration::from_secs(16));
        assert_eq!(policy.backoff(5), Duration::from_secs(30));
        assert_eq!(policy.backoff(64), Duration::from_secs(30));
        assert_eq!(policy.backoff(usize::MAX), Duration::from_secs(30));
    }

    #[test]
    fn inverted_delays_always_back_off_by_max() {
        let policy = policy(5_000, 1_000);
        for attempt in [0, 1, 7] {
            assert_eq!(policy.backoff(attempt), Duration::from_secs(1));
        }
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let policy = policy(1_000, 30_000);
        for attempt in 0..8 {
            let base = policy.backoff(attempt);
            let slack = Duration::from_micros(1);
            let low = base.mul_f64(0.9).saturating_sub(slack);
            let high = base.mul_f64(1.1) + slack;
            for _ in 0..50 {
                let delay = policy.jittered(attempt);
                assert!(delay >= low && delay <= high, "{delay:?} outside {low:?}..={high:?}");
            }
        }
    }

    #[tokio::test]
    async fn wait_returns_promptly_when_canceled() {
        let policy = policy(10_000, 30_000);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let start = Instant::now();
        let err = policy.wait(&cancel, 1).await.expect_err("must be canceled");
        assert!(matches!(err, CloudcraftError::Canceled));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn wait_preempted_by_cancel_mid_sleep() {
        let policy = policy(10_000, 30_000);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let err = policy.wait(&cancel, 0).await.expect_err("must be canceled");
        assert!(err.is_canceled());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn wait_sleeps_clamped_delay() {
        let policy = policy(10, 20);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        policy.wait(&cancel, 4).await.expect("must complete");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(18));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn default_predicate_matches_retryable_set() {
        let retryable = [202u16, 408, 429, 502, 503, 504];
        for code in 100u16..600 {
            let status = StatusCode::from_u16(code).expect("valid status");
            assert_eq!(
                default_is_retryable(Some(status), None),
                retryable.contains(&code),
                "status {code}"
            );
        }
    }

    #[test]
    fn default_predicate_retries_errors_only_when_present() {
        let err = std::io::Error::other("connection reset");
        let dyn_err: &DynError = &err;
        assert!(default_is_retryable(None, Some(dyn_err)));
        assert!(default_is_retryable(Some(StatusCode::OK), Some(dyn_err)));
        assert!(!default_is_retryable(None, None));
    }

    #[test]
    fn custom_predicate_replaces_default() {
        let policy = policy(1, 1).with_predicate(|status, _| status == Some(StatusCode::CONFLICT));
        assert!(policy.is_retryable(Some(StatusCode::CONFLICT), None));
        assert!(!policy.is_retryable(Some(StatusCode::SERVICE_UNAVAILABLE), None));
    }
}
