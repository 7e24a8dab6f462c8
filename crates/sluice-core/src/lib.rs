//! Core domain types for the Sluice publishing pipeline.
//!
//! Provides the `Outcome` result vocabulary shared by every publish path,
//! the batch data model, clock abstraction for testable timing, and the
//! process-wide telemetry registry. All other crates depend on these
//! foundational types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod models;
pub mod outcome;
pub mod telemetry;
pub mod time;

pub use models::{Message, MessageId, PublishStats, Record};
pub use outcome::{ErrorKind, Outcome};
pub use time::{Clock, RealClock, Stopwatch};
