//! Resilient fan-out publishing for batch pipelines.
//!
//! Drains a finite batch of prepared messages through a pool of workers,
//! each publishing via a composed resilience policy: retry with exponential
//! backoff around a shared circuit breaker around a per-attempt timeout.
//! Per-message outcomes are categorized and aggregated; no single failure
//! aborts a batch.
//!
//! # Architecture
//!
//! ```text
//!                 ┌─────────────────────────────────────────┐
//!                 │              FanOutEngine               │
//!                 │   producer ──▶ bounded channel (1000)   │
//!                 └─────────────────────────────────────────┘
//!                        │              │             │
//!                        ▼              ▼             ▼
//!                 ┌──────────┐   ┌──────────┐   ┌──────────┐
//!                 │ Worker 1 │   │ Worker 2 │   │ Worker N │
//!                 └──────────┘   └──────────┘   └──────────┘
//!                        │              │             │
//!                        └──────────────┼─────────────┘
//!                                       ▼
//!                       ┌───────────────────────────────┐
//!                       │       ResilientPublisher      │
//!                       │ retry( breaker( timeout(■) )) │
//!                       └───────────────────────────────┘
//!                                       │
//!                                       ▼
//!                              topic transport (HTTP)
//! ```
//!
//! All workers share one publisher, so one breaker guards the topic: ten
//! consecutive retriable failures trip it and every worker fails fast until
//! the cooldown's half-open probe succeeds.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit;
pub mod error;
pub mod fanout;
pub mod publisher;
pub mod retry;
pub mod transport;

use std::time::Duration;

pub use circuit::{CircuitBreaker, CircuitConfig, CircuitState};
pub use error::{PublishError, Result};
pub use fanout::{FanOutConfig, FanOutEngine};
pub use publisher::{PublisherConfig, ResilientPublisher};
pub use retry::RetryPolicy;
pub use transport::{HttpTopicClient, TopicTransport, TransportConfig};

/// Default bounded channel capacity between producer and workers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default upper bound on concurrent fan-out workers.
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Default batch size that earns one additional worker.
pub const DEFAULT_MESSAGES_PER_WORKER: usize = 100;

/// Default budget for one physical transport call.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);
