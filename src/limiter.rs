//! Client-side request pacing.

use std::time::Duration;

use tokio::{sync::Mutex, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{CloudcraftError, Result};

/// Spaces physical sends at least `interval` apart (burst of one).
#[derive(Debug)]
pub(crate) struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Returns `None` for a non-positive or non-finite rate.
    pub(crate) fn per_second(requests_per_second: f64) -> Option<Self> {
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return None;
        }
        Some(Self {
            interval: Duration::try_from_secs_f64(1.0 / requests_per_second).ok()?,
            next_slot: Mutex::new(None),
        })
    }

    /// Reserves the next send slot and waits for it.
    ///
    /// A canceled wait hands its slot back unless a later caller has already
    /// queued behind it; in that case the slot stays spent.
    pub(crate) async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |reserved| reserved.max(now));
            *next = Some(slot + self.interval);
            slot
        };

        if slot <= Instant::now() {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            wait_ms = slot.saturating_duration_since(Instant::now()).as_millis() as u64,
            "pacing request"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.release(slot).await;
                Err(CloudcraftError::Canceled)
            }
            _ = tokio::time::sleep_until(slot) => Ok(()),
        }
    }

    async fn release(&self, slot: Instant) {
        let mut next = self.next_slot.lock().await;
        if *next == Some(slot + self.interval) {
            *next = Some(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use super::RateLimiter;

    #[test]
    fn rejects_non_positive_rates() {
        assert!(RateLimiter::per_second(0.0).is_none());
        assert!(RateLimiter::per_second(-1.0).is_none());
        assert!(RateLimiter::per_second(f64::NAN).is_none());
        assert!(RateLimiter::per_second(2.0).is_some());
    }

    #[tokio::test]
    async fn spaces_consecutive_sends() {
        let limiter = RateLimiter::per_second(20.0).expect("valid rate");
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire(&cancel).await.expect("must acquire");
        }
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn cancel_preempts_pacing_wait() {
        let limiter = RateLimiter::per_second(0.1).expect("valid rate");
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.expect("first slot is immediate");

        cancel.cancel();
        let err = limiter.acquire(&cancel).await.expect_err("must cancel");
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn canceled_wait_returns_its_slot() {
        let limiter = RateLimiter::per_second(5.0).expect("valid rate");
        let start = Instant::now();
        limiter
            .acquire(&CancellationToken::new())
            .await
            .expect("first slot is immediate");

        let canceled = CancellationToken::new();
        canceled.cancel();
        limiter
            .acquire(&canceled)
            .await
            .expect_err("must cancel");

        limiter
            .acquire(&CancellationToken::new())
            .await
            .expect("must acquire");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(190), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(350), "{elapsed:?}");
    }
}
