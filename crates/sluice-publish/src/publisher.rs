//! Resilient topic publisher.
//!
//! Wraps a [`TopicTransport`] with the composed policy
//! `retry(breaker(timeout(call)))`: the outer retry observes post-breaker,
//! post-timeout results, the per-attempt timeout bounds each physical call,
//! and the breaker between them short-circuits remaining retries the moment
//! it trips. The composition order is load-bearing; reordering changes when
//! the breaker trips and how retries count against it.

use std::{sync::Arc, time::Duration};

use sluice_core::{telemetry, Clock, ErrorKind, Message, MessageId, Outcome, Stopwatch};
use tracing::{field, info_span, warn, Instrument};

use crate::{
    circuit::{CircuitBreaker, CircuitConfig},
    error::{PublishError, Result},
    retry::RetryPolicy,
    transport::TopicTransport,
};

/// Configuration for a resilient publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Topic the publisher targets.
    pub topic_arn: String,
    /// Budget for each physical transport call.
    pub attempt_timeout: Duration,
    /// Retry schedule applied outside the breaker.
    pub retry: RetryPolicy,
    /// Breaker tuning.
    pub circuit: CircuitConfig,
}

impl PublisherConfig {
    /// Production defaults for the given topic.
    pub fn for_topic(topic_arn: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            attempt_timeout: crate::DEFAULT_ATTEMPT_TIMEOUT,
            retry: RetryPolicy::default(),
            circuit: CircuitConfig::default(),
        }
    }
}

/// Publishes messages through retry, circuit-breaking, and timeout policies.
///
/// One instance guards one topic; its breaker state is shared by every
/// worker that clones the surrounding `Arc`.
pub struct ResilientPublisher {
    transport: Arc<dyn TopicTransport>,
    config: PublisherConfig,
    breaker: CircuitBreaker,
    clock: Arc<dyn Clock>,
}

impl ResilientPublisher {
    /// Creates a publisher over the given transport.
    pub fn new(
        transport: Arc<dyn TopicTransport>,
        config: PublisherConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let breaker = CircuitBreaker::new(config.circuit.clone(), clock.clone());
        Self { transport, config, breaker, clock }
    }

    /// The breaker guarding this publisher.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// The topic this publisher targets.
    pub fn topic_arn(&self) -> &str {
        &self.config.topic_arn
    }

    /// Publishes one message, returning a categorized outcome.
    ///
    /// Empty or whitespace-only bodies fail with `InvalidInput` before any
    /// transport call, without consuming a retry slot or touching the
    /// breaker. All other failures come back categorized with a stable
    /// detail string; the raw transport error stays attached as the source.
    pub async fn publish(&self, message: &Message) -> Outcome<MessageId> {
        if message.body.trim().is_empty() {
            telemetry::SNS_PUBLISH_ATTEMPTS.inc();
            telemetry::SNS_PUBLISH_FAILURES
                .with_label_values(&[&ErrorKind::InvalidInput.to_string()])
                .inc();
            return Outcome::failure(ErrorKind::InvalidInput, "Message cannot be null or empty");
        }

        let span = info_span!(
            "SnsPublish",
            "messaging.system" = "sns",
            "messaging.destination" = %self.config.topic_arn,
            "sns.message_size" = message.size(),
            "sns.message_id" = field::Empty,
            "otel.status_code" = field::Empty,
            "error.type" = field::Empty,
            "error.message" = field::Empty,
        );

        telemetry::SNS_PUBLISH_ATTEMPTS.inc();
        let watch = Stopwatch::start(self.clock.clone());

        let result = self.run_policies(message).instrument(span.clone()).await;

        telemetry::SNS_PUBLISH_DURATION.observe(watch.elapsed_ms());

        match result {
            Ok(message_id) => {
                telemetry::SNS_PUBLISH_SUCCESSES.inc();
                span.record("sns.message_id", field::display(&message_id));
                span.record("otel.status_code", "OK");
                tracing::debug!(
                    message_key = %message.key,
                    message_id = %message_id,
                    duration_ms = watch.elapsed().as_millis(),
                    "message published"
                );
                Outcome::success(message_id)
            },
            Err(error) => {
                let kind = error.error_kind();
                let detail = error.detail();
                telemetry::SNS_PUBLISH_FAILURES.with_label_values(&[&kind.to_string()]).inc();
                span.record("otel.status_code", "ERROR");
                span.record("error.type", kind.to_string().as_str());
                span.record("error.message", detail.as_str());
                warn!(
                    message_key = %message.key,
                    error_kind = %kind,
                    detail = %detail,
                    "publish failed terminally"
                );
                Outcome::failure_with_source(kind, detail, Arc::new(error))
            },
        }
    }

    /// Drives the composed policy stack for one message.
    async fn run_policies(&self, message: &Message) -> Result<MessageId> {
        let mut last_error: Option<PublishError> = None;

        for attempt in 1..=self.config.retry.max_attempts() {
            if attempt > 1 {
                let retry = attempt - 1;
                let observed = last_error
                    .as_ref()
                    .map_or_else(|| ErrorKind::Unknown.to_string(), |e| e.error_kind().to_string());
                telemetry::SNS_RETRIES
                    .with_label_values(&[&observed, &retry.to_string()])
                    .inc();

                let delay = self.config.retry.delay_before(retry);
                warn!(
                    message_key = %message.key,
                    retry,
                    delay_ms = delay.as_millis(),
                    error = %observed,
                    "retrying publish after backoff"
                );
                self.clock.sleep(delay).await;
            }

            // A tripped breaker fails fast here; CircuitOpen is
            // non-retriable, so the remaining attempts are skipped.
            self.breaker.acquire().await?;

            let attempt_result = self.timed_attempt(message).await;

            match attempt_result {
                Ok(message_id) => {
                    self.breaker.record_success().await;
                    return Ok(message_id);
                },
                Err(error) => {
                    self.breaker.record_failure(error.trips_circuit()).await;

                    if error.is_retriable() && attempt < self.config.retry.max_attempts() {
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                },
            }
        }

        Err(last_error.unwrap_or_else(|| PublishError::unexpected("retry loop exhausted")))
    }

    /// One physical transport call bounded by the per-attempt timeout.
    async fn timed_attempt(&self, message: &Message) -> Result<MessageId> {
        let call = self.transport.publish(&self.config.topic_arn, &message.body);

        match tokio::time::timeout(self.config.attempt_timeout, call).await {
            Ok(result) => result,
            Err(_elapsed) => {
                telemetry::SNS_TIMEOUTS.inc();
                Err(PublishError::Timeout {
                    timeout_ms: u64::try_from(self.config.attempt_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                })
            },
        }
    }

    /// Probes topic health with a direct metadata lookup.
    ///
    /// Deliberately bypasses the resilience stack: a health check must
    /// reflect the transport's actual state, not the breaker's.
    pub async fn is_healthy(&self) -> bool {
        match self.transport.describe_topic(&self.config.topic_arn).await {
            Ok(()) => true,
            Err(error) => {
                warn!(topic = %self.config.topic_arn, error = %error, "topic health probe failed");
                false
            },
        }
    }
}
