//! Test fixtures for the Sluice pipeline.
//!
//! Provides a deterministic clock so time-driven behavior (retry backoff,
//! breaker cooldowns) runs instantly in tests, and a scripted in-memory
//! transport for exercising the publisher without a network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod time;
pub mod transport;

pub use time::TestClock;
pub use transport::{ScriptedTransport, StalledTransport};
