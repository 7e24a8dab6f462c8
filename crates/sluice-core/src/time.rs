//! Time source for backoff, cooldowns, and duration metrics.
//!
//! The pipeline touches time in exactly two ways: it measures how long
//! things took (publish durations, producer waits on a full channel, total
//! run time) and it suspends itself (retry backoff, the breaker's open
//! cooldown). [`Clock`] covers just those two operations; wall-clock
//! timestamps are not part of it, records carry their own.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

/// Injectable time source.
///
/// Production code uses [`RealClock`]; tests inject a virtual clock so
/// backoff schedules and breaker cooldowns run without real waiting.
pub trait Clock: Send + Sync {
    /// Current instant for duration measurements.
    fn now(&self) -> Instant;

    /// Suspends the caller for `duration`.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Production clock backed by tokio's timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Measures elapsed time against an injected clock.
///
/// Feeds the duration histograms: a publish is timed from first attempt to
/// terminal outcome, a pipeline run from fetch to aggregated stats.
pub struct Stopwatch {
    clock: Arc<dyn Clock>,
    started: Instant,
}

impl Stopwatch {
    /// Starts timing now.
    pub fn start(clock: Arc<dyn Clock>) -> Self {
        let started = clock.now();
        Self { clock, started }
    }

    /// Time elapsed since the stopwatch started.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().duration_since(self.started)
    }

    /// Elapsed time in fractional milliseconds, the histograms' unit.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwatch_reports_milliseconds() {
        let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
        let watch = Stopwatch::start(clock);

        std::thread::sleep(Duration::from_millis(5));

        assert!(watch.elapsed() >= Duration::from_millis(5));
        assert!(watch.elapsed_ms() >= 5.0);
    }
}
