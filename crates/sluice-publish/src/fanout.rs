//! Bounded-channel fan-out engine.
//!
//! Drains a finite batch of prepared messages through a pool of workers
//! with bounded in-flight memory. The producer enqueues in input order and
//! blocks when the channel is full (backpressure, recorded when the wait is
//! long enough to matter); workers drain concurrently and publish through
//! the shared resilient publisher. Published order across workers is not
//! guaranteed.
//!
//! ```text
//!  batch ──▶ producer ──▶ [bounded channel, cap 1000] ──▶ worker 1 ─┐
//!                                        │                          ├─▶ stats
//!                                        ├─────────────▶ worker 2 ─┤
//!                                        └─────────────▶ worker N ─┘
//! ```
//!
//! Per-worker success/failure tallies are worker-local; aggregation happens
//! only after every worker has drained, so no tally needs synchronization.

use std::{sync::Arc, time::Duration};

use futures::FutureExt;
use sluice_core::{telemetry, Clock, Message, PublishStats};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::publisher::ResilientPublisher;

/// Fan-out tuning.
#[derive(Debug, Clone)]
pub struct FanOutConfig {
    /// Bounded channel capacity between producer and workers.
    pub channel_capacity: usize,
    /// Upper bound on concurrent workers.
    pub max_workers: usize,
    /// Batch size that earns one additional worker.
    pub messages_per_worker: usize,
    /// Producer waits at or below this are treated as noise.
    pub backpressure_threshold: Duration,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            channel_capacity: crate::DEFAULT_CHANNEL_CAPACITY,
            max_workers: crate::DEFAULT_MAX_WORKERS,
            messages_per_worker: crate::DEFAULT_MESSAGES_PER_WORKER,
            backpressure_threshold: Duration::from_millis(5),
        }
    }
}

/// Fans a batch of messages out to the topic through a worker pool.
pub struct FanOutEngine {
    publisher: Arc<ResilientPublisher>,
    config: FanOutConfig,
    clock: Arc<dyn Clock>,
}

impl FanOutEngine {
    /// Creates an engine publishing through the given publisher.
    pub fn new(
        publisher: Arc<ResilientPublisher>,
        config: FanOutConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { publisher, config, clock }
    }

    /// Workers for a batch of `batch_len` messages.
    ///
    /// One worker per `messages_per_worker` messages, clamped to
    /// `1..=max_workers`: small batches stay single-worker, large batches
    /// cap outbound concurrency (and thus peak load on the breaker).
    pub fn worker_count(&self, batch_len: usize) -> usize {
        (batch_len / self.config.messages_per_worker).clamp(1, self.config.max_workers)
    }

    /// Drains the batch and returns the aggregate stats.
    ///
    /// Always completes for finite input: per-message failures (including a
    /// panicking publish) are counted and absorbed, never propagated. The
    /// returned counts sum to the batch size.
    pub async fn run(&self, messages: Vec<Message>) -> PublishStats {
        if messages.is_empty() {
            return PublishStats::default();
        }

        let total = messages.len();
        let worker_count = self.worker_count(total);
        debug!(batch_size = total, worker_count, "starting fan-out run");

        let (tx, rx) = mpsc::channel::<Message>(self.config.channel_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let rx = rx.clone();
            let publisher = self.publisher.clone();
            handles.push(tokio::spawn(worker_loop(worker_id, rx, publisher)));
        }

        let mut backpressure = Duration::ZERO;
        let mut undelivered = 0u64;
        for (sent, message) in messages.into_iter().enumerate() {
            let before = self.clock.now();
            if tx.send(message).await.is_err() {
                // Every receiver is gone; nothing more can be drained.
                undelivered = (total - sent) as u64;
                error!(undelivered, "fan-out channel closed early, counting remainder as failed");
                break;
            }
            let waited = self.clock.now().duration_since(before);
            if waited > self.config.backpressure_threshold {
                backpressure += waited;
            }
        }
        drop(tx);

        let mut stats = PublishStats {
            success_count: 0,
            failure_count: undelivered,
            backpressure_ms: u64::try_from(backpressure.as_millis()).unwrap_or(u64::MAX),
        };

        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok((success, failure)) => {
                    stats.success_count += success;
                    stats.failure_count += failure;
                },
                Err(join_error) => {
                    error!(worker_id, error = %join_error, "fan-out worker failed to join");
                },
            }
        }

        telemetry::CHANNEL_BACKPRESSURE_TIME.observe(stats.backpressure_ms as f64);
        info!(
            success_count = stats.success_count,
            failure_count = stats.failure_count,
            backpressure_ms = stats.backpressure_ms,
            "fan-out run complete"
        );

        stats
    }
}

/// Drains the shared channel until it closes, tallying outcomes locally.
///
/// The receiver lock is held only across `recv`, never across a publish, so
/// workers drain concurrently. A panicking publish is caught, logged, and
/// counted as a failure; the worker keeps draining.
async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Message>>>,
    publisher: Arc<ResilientPublisher>,
) -> (u64, u64) {
    let mut success = 0u64;
    let mut failure = 0u64;

    loop {
        let message = { rx.lock().await.recv().await };
        let Some(message) = message else { break };

        match std::panic::AssertUnwindSafe(publisher.publish(&message)).catch_unwind().await {
            Ok(outcome) if outcome.is_success() => success += 1,
            Ok(outcome) => {
                failure += 1;
                debug!(
                    worker_id,
                    message_key = %message.key,
                    error_kind = %outcome.kind(),
                    "message failed terminally"
                );
            },
            Err(panic) => {
                failure += 1;
                error!(
                    worker_id,
                    message_key = %message.key,
                    panic = panic_text(&panic),
                    "publisher panicked, counting message as failed"
                );
            },
        }
    }

    debug!(worker_id, success, failure, "worker drained");
    (success, failure)
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use sluice_core::RealClock;
    use sluice_testing::transport::ScriptedTransport;

    use super::*;
    use crate::publisher::{PublisherConfig, ResilientPublisher};

    fn engine_with(transport: Arc<ScriptedTransport>) -> FanOutEngine {
        let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
        let publisher = Arc::new(ResilientPublisher::new(
            transport,
            PublisherConfig::for_topic("arn:topic:test"),
            clock.clone(),
        ));
        FanOutEngine::new(publisher, FanOutConfig::default(), clock)
    }

    #[test]
    fn worker_sizing_clamps_between_one_and_twenty() {
        let engine = engine_with(Arc::new(ScriptedTransport::always_accepting()));

        assert_eq!(engine.worker_count(1), 1);
        assert_eq!(engine.worker_count(99), 1);
        assert_eq!(engine.worker_count(100), 1);
        assert_eq!(engine.worker_count(200), 2);
        assert_eq!(engine.worker_count(1999), 19);
        assert_eq!(engine.worker_count(2000), 20);
        assert_eq!(engine.worker_count(100_000), 20);
    }

    #[tokio::test]
    async fn empty_batch_returns_zeros_without_workers() {
        let transport = Arc::new(ScriptedTransport::always_accepting());
        let engine = engine_with(transport.clone());

        let stats = engine.run(Vec::new()).await;

        assert_eq!(stats, PublishStats::default());
        assert_eq!(transport.publish_calls(), 0);
    }

    #[tokio::test]
    async fn all_successes_are_counted() {
        let transport = Arc::new(ScriptedTransport::always_accepting());
        let engine = engine_with(transport.clone());

        let batch: Vec<Message> = (0..50).map(|i| Message::new(format!("m-{i}"))).collect();
        let stats = engine.run(batch).await;

        assert_eq!(stats.success_count, 50);
        assert_eq!(stats.failure_count, 0);
        assert_eq!(transport.publish_calls(), 50);
    }

    #[tokio::test]
    async fn invalid_messages_count_as_failures_without_aborting() {
        let transport = Arc::new(ScriptedTransport::always_accepting());
        let engine = engine_with(transport.clone());

        let mut batch: Vec<Message> = (0..10).map(|i| Message::new(format!("m-{i}"))).collect();
        batch.push(Message::new("   "));
        batch.push(Message::new(""));

        let stats = engine.run(batch).await;

        assert_eq!(stats.success_count, 10);
        assert_eq!(stats.failure_count, 2);
        assert_eq!(stats.total(), 12);
        // Invalid messages never reach the transport.
        assert_eq!(transport.publish_calls(), 10);
    }
}
