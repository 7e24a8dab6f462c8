//! Record-to-message transformation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sluice_core::{Message, Record};
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// Reshapes source records into wire messages.
///
/// Pure with respect to its input; the only failure mode is
/// serialization, which the driver propagates as a fatal fault.
pub trait Transformer: Send + Sync {
    /// Transforms the full batch, preserving input order.
    fn transform(&self, records: Vec<Record>) -> Result<Vec<Message>>;
}

/// Envelope written to the topic for each record.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    record_id: Uuid,
    recorded_at: DateTime<Utc>,
    source: &'a str,
    payload: &'a serde_json::Value,
}

/// Transformer that wraps each record's payload in a JSON envelope.
pub struct JsonTransformer {
    service_name: String,
}

impl JsonTransformer {
    /// Creates a transformer stamping `service_name` into each envelope.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }
}

impl Transformer for JsonTransformer {
    fn transform(&self, records: Vec<Record>) -> Result<Vec<Message>> {
        records
            .into_iter()
            .map(|record| {
                let envelope = Envelope {
                    record_id: record.id,
                    recorded_at: record.recorded_at,
                    source: &self.service_name,
                    payload: &record.payload,
                };
                let body = serde_json::to_string(&envelope)
                    .map_err(|e| PipelineError::Transform(e.to_string()))?;
                Ok(Message::new(body))
            })
            .collect()
    }
}
