//! # Offer Search Gateway
//!
//! One upstream lookup per saved search. Implementations classify failures
//! into [`GatewayError::RateLimited`] and [`GatewayError::Other`] and never
//! retry: retry and backoff decisions belong to the batch coordinator, which
//! needs to see the rate-limit signal.

pub mod http;

use crate::error::GatewayError;
use crate::models::SearchKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use http::HttpOfferSearchGateway;

/// Page of offers matching a search; may be empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferPage {
    pub items: Vec<serde_json::Value>,
}

impl OfferPage {
    pub fn new(items: Vec<serde_json::Value>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_results(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
pub trait OfferSearchGateway: Send + Sync {
    /// Look up offers for `criteria` created after `not_before`
    async fn search(
        &self,
        kind: SearchKind,
        criteria: &serde_json::Value,
        not_before: DateTime<Utc>,
    ) -> Result<OfferPage, GatewayError>;
}
