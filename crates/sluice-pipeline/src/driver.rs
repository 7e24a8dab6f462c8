//! Pipeline driver: fetch, transform, fan out.
//!
//! Orchestrates one invocation end to end and records total wall time.
//! Source and transform faults are fatal and propagate to the invoker;
//! publish failures never do, they are absorbed into the returned stats.

use std::sync::Arc;

use sluice_core::{telemetry, Clock, PublishStats, Stopwatch};
use sluice_publish::FanOutEngine;
use tracing::{field, info, info_span, Instrument};

use crate::{error::Result, source::RecordSource, transform::Transformer};

/// One-invocation batch pipeline.
pub struct Pipeline<S, T> {
    source: S,
    transformer: T,
    engine: FanOutEngine,
    clock: Arc<dyn Clock>,
}

impl<S: RecordSource, T: Transformer> Pipeline<S, T> {
    /// Wires a pipeline from its collaborators.
    pub fn new(source: S, transformer: T, engine: FanOutEngine, clock: Arc<dyn Clock>) -> Self {
        Self { source, transformer, engine, clock }
    }

    /// Runs the pipeline once: fetch records, transform, fan out.
    ///
    /// # Errors
    ///
    /// Returns an error if the source or the transformer fails; the span is
    /// marked errored and the fault propagates to the invoker.
    pub async fn run(&self) -> Result<PublishStats> {
        let span = info_span!(
            "ProcessAndPublishData",
            "otel.status_code" = field::Empty,
            "error.type" = field::Empty,
            "error.message" = field::Empty,
        );

        let watch = Stopwatch::start(self.clock.clone());
        let result = self.execute().instrument(span.clone()).await;

        telemetry::TOTAL_PROCESSING_TIME.observe(watch.elapsed_ms());

        match &result {
            Ok(stats) => {
                span.record("otel.status_code", "OK");
                info!(
                    success_count = stats.success_count,
                    failure_count = stats.failure_count,
                    backpressure_ms = stats.backpressure_ms,
                    duration_ms = watch.elapsed().as_millis(),
                    "pipeline run complete"
                );
            },
            Err(error) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.type", error.label());
                span.record("error.message", error.to_string().as_str());
            },
        }

        result
    }

    async fn execute(&self) -> Result<PublishStats> {
        let records = self
            .source
            .fetch_records()
            .instrument(info_span!("DatabaseQuery"))
            .await?;
        telemetry::DATA_ITEMS_RETRIEVED.inc_by(records.len() as u64);
        info!(record_count = records.len(), "records retrieved");

        let messages = {
            let span = info_span!("TransformData");
            let _enter = span.enter();
            self.transformer.transform(records)?
        };
        telemetry::DATA_ITEMS_TRANSFORMED.inc_by(messages.len() as u64);
        info!(message_count = messages.len(), "records transformed");

        Ok(self.engine.run(messages).await)
    }
}
