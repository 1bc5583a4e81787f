//! # System Constants
//!
//! Operational defaults of the notification run. Every value here can be
//! overridden through [`crate::config::NotifierConfig`].

use crate::models::SearchKind;

/// Number of searches evaluated concurrently per batch
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// The run halts once the failure counter goes past this value
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 100;

/// Pause between batches when no rate limiting was observed
pub const DEFAULT_SHORT_DELAY_MS: u64 = 1_000;

/// Pause after a batch that received at least one HTTP 429
pub const DEFAULT_RATE_LIMITED_DELAY_MS: u64 = 10_000;

/// Upstream page size; the run only needs to know whether anything new exists
pub const DEFAULT_OFFER_PAGE_SIZE: u32 = 2;

/// Kinds evaluated by the run unless configured otherwise
pub const DEFAULT_SEARCH_KINDS: [SearchKind; 2] =
    [SearchKind::OffresEmploi, SearchKind::OffresAlternance];

/// Notification payload constants
pub mod notification {
    pub const NEW_OFFER_TYPE: &str = "NOUVELLE_OFFRE";
    pub const NEW_RESULTS_BODY: &str = "De nouveaux résultats sont disponibles";
}
