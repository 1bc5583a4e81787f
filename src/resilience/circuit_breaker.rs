//! # Run Circuit Breaker
//!
//! Counts failed search evaluations across all batches of a run and opens
//! once the total goes past the configured threshold. Successes do not reset
//! the count: an upstream failing most lookups must still stop the run. The
//! breaker is owned by a single run and never closes again.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Threshold exceeded, the run must stop
    Open,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    failures: u32,
    state: CircuitState,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u32) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = failure_threshold,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            failure_threshold,
            failures: 0,
            state: CircuitState::Closed,
        }
    }

    /// Failures recorded since the run started
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Record a failed evaluation and return the resulting state
    pub fn record_failure(&mut self) -> CircuitState {
        self.failures = self.failures.saturating_add(1);
        debug!(
            component = %self.name,
            failures = self.failures,
            "Failure recorded"
        );

        if self.state == CircuitState::Closed && self.failures > self.failure_threshold {
            self.state = CircuitState::Open;
            error!(
                component = %self.name,
                failures = self.failures,
                failure_threshold = self.failure_threshold,
                "🔴 Circuit breaker opened: too many failures in notification run"
            );
        }

        self.state
    }
}
