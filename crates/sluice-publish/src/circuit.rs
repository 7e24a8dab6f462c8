//! Circuit breaker for sustained topic outages.
//!
//! A single breaker guards one publisher and is shared by every worker
//! publishing through it. Ten consecutive counting failures open the
//! circuit; while open, calls fail fast without touching the transport.
//! After the cooldown elapses the next arriving call moves the breaker to
//! half-open and exactly one probe is admitted: probe success closes the
//! circuit, probe failure reopens it with a fresh cooldown.
//!
//! # State machine
//!
//! ```text
//!            10 consecutive counting failures
//!   CLOSED ──────────────────────────────────▶ OPEN
//!     ▲                                          │
//!     │ probe                           cooldown │
//!     │ succeeds                        elapsed  │
//!     │                                          ▼
//!     └───────────────────────────────────── HALF-OPEN
//!                     probe fails ▲ │
//!                 (back to OPEN)  └─┘
//! ```

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use sluice_core::{telemetry, Clock};
use tokio::sync::Mutex;

use crate::error::{PublishError, Result};

/// Circuit breaker tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Consecutive counting failures that open the circuit.
    pub failure_threshold: u32,
    /// Time to stay open before admitting a probe.
    pub open_timeout: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self { failure_threshold: 10, open_timeout: Duration::from_secs(30) }
    }
}

/// Current breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation, all calls pass through.
    Closed,
    /// Failing fast, transport untouched.
    Open,
    /// Testing recovery with a single probe.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_admitted: bool,
}

impl CircuitInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_admitted: false,
        }
    }
}

/// Thread-safe circuit breaker shared across publish workers.
///
/// All transitions happen under one mutex so they are observably atomic
/// from concurrent workers.
pub struct CircuitBreaker {
    config: CircuitConfig,
    inner: Mutex<CircuitInner>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker").field("config", &self.config).finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Creates a breaker with the given tuning.
    pub fn new(config: CircuitConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, inner: Mutex::new(CircuitInner::new()), clock }
    }

    /// Admits or refuses a call.
    ///
    /// Returns `Err(CircuitOpen)` while the circuit is open or while a
    /// half-open probe is already in flight. Handles the open-to-half-open
    /// transition when the cooldown has elapsed.
    pub async fn acquire(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if inner.state == CircuitState::Open {
            let cooled_down = inner
                .opened_at
                .is_some_and(|at| self.clock.now().duration_since(at) >= self.config.open_timeout);
            if cooled_down {
                Self::transition(&mut inner, CircuitState::HalfOpen);
                inner.probe_admitted = false;
            }
        }

        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => Err(PublishError::CircuitOpen),
            CircuitState::HalfOpen => {
                if inner.probe_admitted {
                    Err(PublishError::CircuitOpen)
                } else {
                    inner.probe_admitted = true;
                    Ok(())
                }
            },
        }
    }

    /// Records a successful call.
    ///
    /// Resets the failure counter; a successful half-open probe closes the
    /// circuit.
    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures = 0;

        if inner.state == CircuitState::HalfOpen {
            Self::transition(&mut inner, CircuitState::Closed);
            inner.opened_at = None;
        }
    }

    /// Records a failed call.
    ///
    /// `counts` marks failures in the counting set; only those advance the
    /// consecutive-failure counter. Any failed half-open probe reopens the
    /// circuit regardless of `counts`.
    pub async fn record_failure(&self, counts: bool) {
        let mut inner = self.inner.lock().await;

        match inner.state {
            CircuitState::Closed => {
                if counts {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.config.failure_threshold {
                        Self::transition(&mut inner, CircuitState::Open);
                        inner.opened_at = Some(self.clock.now());
                    }
                }
            },
            CircuitState::Open => {},
            CircuitState::HalfOpen => {
                Self::transition(&mut inner, CircuitState::Open);
                inner.opened_at = Some(self.clock.now());
            },
        }
    }

    /// Current state. Open circuits whose cooldown has elapsed still read
    /// as open until a call arrives to take the probe.
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Consecutive counting failures observed in the closed state.
    pub async fn consecutive_failures(&self) -> u32 {
        self.inner.lock().await.consecutive_failures
    }

    /// Forces a state, bypassing the automaton. Test and admin use only.
    pub async fn force_state(&self, state: CircuitState) {
        let mut inner = self.inner.lock().await;
        inner.state = state;
        inner.probe_admitted = false;
        if state == CircuitState::Open {
            inner.opened_at = Some(self.clock.now());
        }
        if state == CircuitState::Closed {
            inner.consecutive_failures = 0;
            inner.opened_at = None;
        }
    }

    fn transition(inner: &mut CircuitInner, to: CircuitState) {
        match to {
            CircuitState::Open => tracing::warn!(
                consecutive_failures = inner.consecutive_failures,
                "circuit breaker opening"
            ),
            CircuitState::HalfOpen => {
                tracing::info!("circuit breaker half-open, admitting one probe");
            },
            CircuitState::Closed => tracing::info!("circuit breaker closed, topic recovered"),
        }

        inner.state = to;
        telemetry::CIRCUIT_BREAKER_STATE_CHANGES.with_label_values(&[&to.to_string()]).inc();
    }
}
