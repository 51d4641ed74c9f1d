//! Injectable time source for dwell and settle delays.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

/// Suspends the caller for a fixed duration.
///
/// Production code uses [`TokioWaiter`]; tests use [`NoWait`], which returns
/// immediately and records what was asked for.
#[async_trait]
pub trait Waiter: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Real-time waiter backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioWaiter;

#[async_trait]
impl Waiter for TokioWaiter {
    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Zero-delay waiter.  Clones share the record of requested delays.
#[derive(Debug, Clone, Default)]
pub struct NoWait {
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl NoWait {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration passed to [`Waiter::wait`] so far, in call order.
    pub fn requested(&self) -> Vec<Duration> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Waiter for NoWait {
    async fn wait(&self, duration: Duration) {
        match self.requested.lock() {
            Ok(mut r) => r.push(duration),
            Err(poisoned) => poisoned.into_inner().push(duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_wait_records_requests() {
        let waiter = NoWait::new();
        let shared: Arc<dyn Waiter> = Arc::new(waiter.clone());
        shared.wait(Duration::from_secs(1)).await;
        shared.wait(Duration::from_millis(200)).await;
        assert_eq!(
            waiter.requested(),
            vec![Duration::from_secs(1), Duration::from_millis(200)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_waiter_sleeps_for_duration() {
        let start = tokio::time::Instant::now();
        TokioWaiter.wait(Duration::from_secs(1)).await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
