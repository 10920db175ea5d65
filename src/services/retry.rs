//! Bounded fixed-interval retry policy.
//!
//! The record-visibility polling loop in payment creation uses this instead
//! of an inline loop so the budget is testable with a paused clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_duration: Duration,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_duration: Duration, interval: Duration) -> Self {
        Self {
            max_duration,
            interval,
        }
    }

    /// Runs `op` until it yields a value or the wall-clock budget is spent.
    /// The first attempt always runs, even with a zero budget.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let deadline = Instant::now() + self.max_duration;
        loop {
            if let Some(value) = op().await {
                return Some(value);
            }
            if Instant::now() + self.interval > deadline {
                return None;
            }
            sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_value_on_first_success() {
        let policy = RetryPolicy::new(Duration::from_secs(1), Duration::from_millis(100));
        let result = policy.run(|| async { Some(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_value_appears() {
        let policy = RetryPolicy::new(Duration::from_secs(10), Duration::from_millis(100));
        let attempts = AtomicU32::new(0);

        let result = policy
            .run(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { (n >= 3).then_some("found") }
            })
            .await;

        assert_eq!(result, Some("found"));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget_and_returns_none() {
        let policy = RetryPolicy::new(Duration::from_millis(350), Duration::from_millis(100));
        let attempts = AtomicU32::new(0);

        let result: Option<()> = policy
            .run(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { None }
            })
            .await;

        assert_eq!(result, None);
        // 0ms, 100ms, 200ms, 300ms attempts fit inside the 350ms budget.
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_still_attempts_once() {
        let policy = RetryPolicy::new(Duration::ZERO, Duration::from_millis(100));
        let attempts = AtomicU32::new(0);

        let result: Option<()> = policy
            .run(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { None }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
