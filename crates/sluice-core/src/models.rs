//! Batch pipeline data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned by the topic service to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A prepared wire message, ready to publish.
///
/// The body is an opaque non-empty UTF-8 payload produced by the
/// transformer. Each message is consumed by exactly one worker and dropped
/// once its publish outcome has been recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Local correlation key, used only for logging.
    pub key: Uuid,
    /// Serialized payload handed to the transport verbatim.
    pub body: String,
}

impl Message {
    /// Creates a message with a fresh correlation key.
    pub fn new(body: impl Into<String>) -> Self {
        Self { key: Uuid::new_v4(), body: body.into() }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// A source row pulled from the database, before transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Row identifier.
    pub id: Uuid,
    /// Raw payload column.
    pub payload: serde_json::Value,
    /// When the row was recorded at the source.
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate result of one fan-out run.
///
/// `success_count + failure_count` always equals the number of messages
/// handed to the engine; no per-message failure aborts the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Messages the topic accepted.
    pub success_count: u64,
    /// Messages that failed terminally.
    pub failure_count: u64,
    /// Accumulated producer wait on the full channel, in milliseconds.
    pub backpressure_ms: u64,
}

impl PublishStats {
    /// Total messages accounted for.
    pub fn total(&self) -> u64 {
        self.success_count + self.failure_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_size_counts_bytes() {
        let message = Message::new("héllo");
        assert_eq!(message.size(), 6);
    }

    #[test]
    fn stats_total_sums_both_counts() {
        let stats = PublishStats { success_count: 97, failure_count: 3, backpressure_ms: 12 };
        assert_eq!(stats.total(), 100);
    }
}
