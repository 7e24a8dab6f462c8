//! Prometheus metrics for the publishing pipeline.
//!
//! Per-process singletons registered once on first touch; counters and
//! histograms are concurrency-safe and shared by every worker. Metric names
//! are a stable contract for dashboards.
//!
//! # Metrics
//!
//! - `sns_publish_attempts` - publish operations started
//! - `sns_publish_successes` - messages the topic accepted
//! - `sns_publish_failures{error_type}` - terminal publish failures
//! - `sns_retries{error_type,attempt_number}` - retry attempts
//! - `sns_timeouts` - publish attempts that hit the per-call timeout
//! - `circuit_breaker_state_changes{state}` - breaker transitions
//! - `data_items_retrieved` - rows pulled from the source
//! - `data_items_transformed` - messages produced by the transformer
//! - `sns_publish_duration` - per-publish wall time (ms)
//! - `total_processing_time` - full pipeline wall time (ms)
//! - `channel_backpressure_time` - producer wait on the full channel (ms)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

lazy_static! {
    /// Publish operations started.
    pub static ref SNS_PUBLISH_ATTEMPTS: IntCounter = register_int_counter!(
        "sns_publish_attempts",
        "Publish operations started"
    )
    .unwrap();

    /// Messages the topic accepted.
    pub static ref SNS_PUBLISH_SUCCESSES: IntCounter = register_int_counter!(
        "sns_publish_successes",
        "Messages accepted by the topic"
    )
    .unwrap();

    /// Terminal publish failures by error category.
    pub static ref SNS_PUBLISH_FAILURES: CounterVec = register_counter_vec!(
        "sns_publish_failures",
        "Terminal publish failures",
        &["error_type"]
    )
    .unwrap();

    /// Retry attempts by observed error and attempt number.
    pub static ref SNS_RETRIES: CounterVec = register_counter_vec!(
        "sns_retries",
        "Publish retry attempts",
        &["error_type", "attempt_number"]
    )
    .unwrap();

    /// Publish attempts that exceeded the per-call timeout.
    pub static ref SNS_TIMEOUTS: IntCounter = register_int_counter!(
        "sns_timeouts",
        "Publish attempts that timed out"
    )
    .unwrap();

    /// Circuit breaker state transitions.
    pub static ref CIRCUIT_BREAKER_STATE_CHANGES: CounterVec = register_counter_vec!(
        "circuit_breaker_state_changes",
        "Circuit breaker state transitions",
        &["state"]
    )
    .unwrap();

    /// Rows pulled from the data source.
    pub static ref DATA_ITEMS_RETRIEVED: IntCounter = register_int_counter!(
        "data_items_retrieved",
        "Rows pulled from the data source"
    )
    .unwrap();

    /// Messages produced by the transformer.
    pub static ref DATA_ITEMS_TRANSFORMED: IntCounter = register_int_counter!(
        "data_items_transformed",
        "Messages produced by the transformer"
    )
    .unwrap();

    /// Per-publish wall time in milliseconds.
    pub static ref SNS_PUBLISH_DURATION: Histogram = register_histogram!(
        "sns_publish_duration",
        "Publish wall time in milliseconds",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap();

    /// Full pipeline wall time in milliseconds.
    pub static ref TOTAL_PROCESSING_TIME: Histogram = register_histogram!(
        "total_processing_time",
        "Pipeline wall time in milliseconds",
        vec![10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 15000.0, 30000.0, 60000.0, 120000.0]
    )
    .unwrap();

    /// Producer wait on the full channel in milliseconds.
    pub static ref CHANNEL_BACKPRESSURE_TIME: Histogram = register_histogram!(
        "channel_backpressure_time",
        "Producer wait on the full fan-out channel in milliseconds",
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap();
}
