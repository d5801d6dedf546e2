use std::time::Duration;

/// Default overall timeout for a single HTTP request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(80);
/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default delay before the first retry.
pub const DEFAULT_MIN_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Default upper bound for a single backoff delay.
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
/// Default client-side pacing, in requests per second.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 2.0;

/// Configures HTTP timeout, retry and pacing behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Overall per-request timeout enforced by the transport.
    pub timeout: Duration,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Backoff before the first retry; doubled for every further attempt.
    pub min_retry_delay: Duration,
    /// Upper bound for the backoff, applied before jitter.
    pub max_retry_delay: Duration,
    /// Client-side pacing of physical sends. `None` disables pacing.
    pub requests_per_second: Option<f64>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            min_retry_delay: DEFAULT_MIN_RETRY_DELAY,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
            requests_per_second: Some(DEFAULT_REQUESTS_PER_SECOND),
        }
    }
}
