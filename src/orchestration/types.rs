//! # Orchestration Types
//!
//! Outcomes, states and counters shared by the batch coordinator and its callers.

use crate::error::GatewayError;
use crate::gateway::OfferPage;
use crate::models::SearchState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters of one notification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Searches evaluated and persisted
    pub searches_total: u64,
    pub successes: u64,
    pub failures: u64,
    /// Lookups rejected with HTTP 429
    pub rate_limited: u64,
    pub notifications_sent: u64,
    pub batches: u64,
    pub elapsed_ms: u64,
}

/// Settled result of one concurrent lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The gateway answered; the page may be empty
    Found(OfferPage),
    /// The gateway returned a classified failure
    Failed(GatewayError),
    /// The lookup task panicked or was cancelled
    Aborted(String),
}

impl LookupOutcome {
    /// `SUCCES` whenever the gateway answered, with or without results
    pub fn classification(&self) -> SearchState {
        match self {
            Self::Found(_) => SearchState::Succes,
            Self::Failed(_) | Self::Aborted(_) => SearchState::Echec,
        }
    }

    pub fn has_results(&self) -> bool {
        matches!(self, Self::Found(page) if page.has_results())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Failed(error) if error.is_rate_limited())
    }

    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Found(_) => None,
            Self::Failed(error) => Some(error.to_string()),
            Self::Aborted(reason) => Some(format!("lookup task aborted: {reason}")),
        }
    }
}

/// States of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Fetching and processing the next due batch
    Polling,
    /// Pausing before the next batch
    Waiting(Duration),
    /// Circuit breaker opened; the run ends in failure
    Halted,
    /// No due searches left; the run ends in success
    Drained,
}
