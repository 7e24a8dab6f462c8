//! Deterministic clock for time-driven tests.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use sluice_core::Clock;

/// Virtual clock under test control.
///
/// `sleep` advances virtual time immediately instead of waiting, so retry
/// backoff and breaker cooldowns run instantly. `advance` moves time
/// forward explicitly, which is how tests cross the breaker's open-timeout
/// boundary.
#[derive(Clone)]
pub struct TestClock {
    elapsed_ns: Arc<AtomicU64>,
    base: Instant,
}

impl TestClock {
    /// Creates a clock anchored at the current instant.
    pub fn new() -> Self {
        Self { elapsed_ns: Arc::new(AtomicU64::new(0)), base: Instant::now() }
    }

    /// Moves virtual time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos().min(u128::from(u64::MAX))).unwrap_or(0);
        self.elapsed_ns.fetch_add(nanos, Ordering::AcqRel);
    }

    /// Virtual time elapsed since clock creation.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::Acquire))
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.advance(duration);
        Box::pin(tokio::task::yield_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_monotonic_time() {
        let clock = TestClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(42));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(42));
    }

    #[tokio::test]
    async fn sleep_advances_instead_of_waiting() {
        let clock = TestClock::new();
        let wall = Instant::now();

        clock.sleep(Duration::from_secs(3600)).await;

        assert_eq!(clock.elapsed(), Duration::from_secs(3600));
        assert!(wall.elapsed() < Duration::from_secs(1));
    }
}
