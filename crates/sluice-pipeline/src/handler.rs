//! Invocation entry point.
//!
//! The scheduler invokes the pipeline with an opaque event payload; the
//! payload carries nothing the pipeline needs and is ignored. A normal
//! completion (including one with per-message failures) is a successful
//! invocation; only source and transform faults fail it.

use sluice_core::PublishStats;
use tracing::debug;

use crate::{driver::Pipeline, error::Result, source::RecordSource, transform::Transformer};

/// Handles one scheduled invocation, ignoring the event payload.
///
/// # Errors
///
/// Propagates source and transform faults; per-message publish failures are
/// reported through the returned stats instead.
pub async fn handle<S: RecordSource, T: Transformer>(
    pipeline: &Pipeline<S, T>,
    event: serde_json::Value,
) -> Result<PublishStats> {
    debug!(event = %event, "invocation received");
    pipeline.run().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use sluice_core::{Clock, RealClock, Record};
    use sluice_publish::{FanOutConfig, FanOutEngine, PublisherConfig, ResilientPublisher};
    use sluice_testing::transport::ScriptedTransport;

    use super::*;
    use crate::transform::JsonTransformer;

    struct EmptySource;

    #[async_trait]
    impl RecordSource for EmptySource {
        async fn fetch_records(&self) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn event_payload_is_ignored() {
        let clock: Arc<dyn Clock> = Arc::new(RealClock::new());
        let publisher = Arc::new(ResilientPublisher::new(
            Arc::new(ScriptedTransport::always_accepting()),
            PublisherConfig::for_topic("arn:topic:test"),
            clock.clone(),
        ));
        let engine = FanOutEngine::new(publisher, FanOutConfig::default(), clock.clone());
        let pipeline =
            Pipeline::new(EmptySource, JsonTransformer::new("svc"), engine, clock);

        let stats = handle(&pipeline, serde_json::json!({"anything": ["at", "all"]}))
            .await
            .expect("handler should succeed");

        assert_eq!(stats.total(), 0);
    }
}
