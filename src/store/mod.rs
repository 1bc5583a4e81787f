//! # Search State Store
//!
//! Persistence boundary of the run: selects the next due searches and writes
//! back each evaluation's timestamp and state.
//!
//! A search is due when its `last_searched_at` is strictly before the run's
//! polling instant. Processed searches are written back with that instant, so
//! repeated calls with an unchanged instant return fewer and fewer searches
//! until none are left.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{SavedSearch, SearchKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::InMemorySearchStateStore;
pub use postgres::PgSearchStateStore;

#[async_trait]
pub trait SearchStateStore: Send + Sync {
    /// Up to `limit` due searches of the given kinds, oldest first
    async fn find_due_before(
        &self,
        kinds: &[SearchKind],
        limit: usize,
        instant: DateTime<Utc>,
    ) -> Result<Vec<SavedSearch>>;

    /// Persist `last_searched_at` and `state` of one search; nothing else is written
    async fn save(&self, search: &SavedSearch) -> Result<()>;
}
