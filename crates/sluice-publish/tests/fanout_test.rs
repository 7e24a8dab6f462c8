//! Integration tests for the fan-out engine.
//!
//! Exercises worker sizing, stats conservation across mixed outcomes,
//! fault absorption, and draining batches larger than the channel.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use sluice_core::{Clock, Message, MessageId, PublishStats};
use sluice_publish::{
    FanOutConfig, FanOutEngine, PublishError, PublisherConfig, ResilientPublisher, RetryPolicy,
    TopicTransport,
};
use sluice_testing::{ScriptedTransport, TestClock};

fn engine_over(transport: Arc<dyn TopicTransport>) -> FanOutEngine {
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new());
    let publisher = Arc::new(ResilientPublisher::new(
        transport,
        PublisherConfig::for_topic("arn:topic:orders"),
        clock.clone(),
    ));
    FanOutEngine::new(publisher, FanOutConfig::default(), clock)
}

fn batch(count: usize) -> Vec<Message> {
    (0..count).map(|i| Message::new(format!("payload-{i}"))).collect()
}

#[tokio::test]
async fn hundred_message_batch_runs_single_worker() {
    let transport = Arc::new(ScriptedTransport::always_accepting());
    let engine = engine_over(transport.clone());

    assert_eq!(engine.worker_count(100), 1);

    let stats = engine.run(batch(100)).await;
    assert_eq!(stats.success_count, 100);
    assert_eq!(stats.failure_count, 0);
    assert_eq!(transport.publish_calls(), 100);
}

#[tokio::test]
async fn two_thousand_message_batch_caps_at_twenty_workers() {
    let transport = Arc::new(ScriptedTransport::always_accepting());
    let engine = engine_over(transport.clone());

    assert_eq!(engine.worker_count(2000), 20);

    let stats = engine.run(batch(2000)).await;
    assert_eq!(stats.success_count, 2000);
    assert_eq!(stats.failure_count, 0);
    assert_eq!(transport.publish_calls(), 2000);
}

#[tokio::test]
async fn batch_larger_than_channel_capacity_drains_fully() {
    // 1500 messages against the 1000-slot channel forces the producer to
    // block on a full channel at least once.
    let transport = Arc::new(ScriptedTransport::always_accepting());
    let engine = engine_over(transport.clone());

    let stats = engine.run(batch(1500)).await;

    assert_eq!(stats.success_count, 1500);
    assert_eq!(stats.failure_count, 0);
    assert_eq!(transport.publish_calls(), 1500);
}

#[tokio::test]
async fn mixed_outcomes_conserve_the_batch_size() {
    // First 40 transport calls fail with a non-retriable error (one call
    // per message), everything after is accepted.
    let transport = Arc::new(ScriptedTransport::scripted(
        (0..40)
            .map(|_| Err(PublishError::InvalidParameter { message: "bad".to_string() }))
            .collect(),
    ));
    let engine = engine_over(transport.clone());

    let stats = engine.run(batch(250)).await;

    assert_eq!(stats.failure_count, 40);
    assert_eq!(stats.success_count, 210);
    assert_eq!(stats.total(), 250);
    assert_eq!(transport.publish_calls(), 250);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let transport = Arc::new(ScriptedTransport::always_accepting());
    let engine = engine_over(transport.clone());

    let stats = engine.run(Vec::new()).await;

    assert_eq!(stats, PublishStats::default());
    assert_eq!(transport.publish_calls(), 0);
}

/// Transport that panics on poisoned payloads.
struct PoisonTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl TopicTransport for PoisonTransport {
    async fn publish(&self, _topic_arn: &str, body: &str) -> Result<MessageId, PublishError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        assert!(!body.contains("poison"), "poisoned payload");
        Ok(MessageId(format!("msg-{n}")))
    }

    async fn describe_topic(&self, _topic_arn: &str) -> Result<(), PublishError> {
        Ok(())
    }
}

#[tokio::test]
async fn panicking_publish_is_counted_not_propagated() {
    let transport = Arc::new(PoisonTransport { calls: AtomicUsize::new(0) });
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new());
    let publisher = Arc::new(ResilientPublisher::new(
        transport,
        PublisherConfig {
            retry: RetryPolicy { max_retries: 0, ..RetryPolicy::default() },
            ..PublisherConfig::for_topic("arn:topic:orders")
        },
        clock.clone(),
    ));
    let engine = FanOutEngine::new(publisher, FanOutConfig::default(), clock);

    let mut messages = batch(8);
    messages.insert(3, Message::new("poison pill"));
    messages.push(Message::new("poison pill"));

    let stats = engine.run(messages).await;

    assert_eq!(stats.success_count, 8);
    assert_eq!(stats.failure_count, 2);
    assert_eq!(stats.total(), 10);
}

#[tokio::test]
async fn tripped_breaker_fails_remaining_messages_without_transport_calls() {
    // Single-attempt publisher over a transport that always reports an
    // internal fault: the first ten messages trip the breaker, the rest
    // fail fast.
    let transport =
        Arc::new(ScriptedTransport::always_failing(PublishError::internal("outage")));
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new());
    let publisher = Arc::new(ResilientPublisher::new(
        transport.clone(),
        PublisherConfig {
            retry: RetryPolicy { max_retries: 0, ..RetryPolicy::default() },
            ..PublisherConfig::for_topic("arn:topic:orders")
        },
        clock.clone(),
    ));
    let engine = FanOutEngine::new(publisher, FanOutConfig::default(), clock);

    // Single worker keeps the trip deterministic.
    let stats = engine.run(batch(60)).await;

    assert_eq!(stats.success_count, 0);
    assert_eq!(stats.failure_count, 60);
    assert_eq!(transport.publish_calls(), 10);
}
