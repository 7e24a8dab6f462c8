//! Batch pipeline driver for the Sluice publisher.
//!
//! Orchestrates one scheduled invocation: pull the pending batch from the
//! record source, transform it into wire messages, and hand the batch to
//! the fan-out engine. Configuration, the PostgreSQL source, and the JSON
//! transformer live here; the resilience machinery lives in
//! `sluice-publish`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod handler;
pub mod source;
pub mod transform;

pub use config::Config;
pub use driver::Pipeline;
pub use error::{PipelineError, Result};
pub use handler::handle;
pub use source::{PgRecordSource, RecordSource};
pub use transform::{JsonTransformer, Transformer};
