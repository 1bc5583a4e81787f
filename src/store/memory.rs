//! In-memory store with the same selection and write semantics as the
//! Postgres one. Used by tests and dry runs.

use super::SearchStateStore;
use crate::error::Result;
use crate::models::{SavedSearch, SearchKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemorySearchStateStore {
    searches: Mutex<HashMap<Uuid, SavedSearch>>,
    saves: Mutex<Vec<SavedSearch>>,
}

impl InMemorySearchStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_searches(searches: impl IntoIterator<Item = SavedSearch>) -> Self {
        let store = Self::new();
        for search in searches {
            store.insert(search);
        }
        store
    }

    pub fn insert(&self, search: SavedSearch) {
        self.searches.lock().insert(search.id, search);
    }

    pub fn get(&self, id: Uuid) -> Option<SavedSearch> {
        self.searches.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.searches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.lock().is_empty()
    }

    /// Every write received, in order
    pub fn saved(&self) -> Vec<SavedSearch> {
        self.saves.lock().clone()
    }
}

#[async_trait]
impl SearchStateStore for InMemorySearchStateStore {
    async fn find_due_before(
        &self,
        kinds: &[SearchKind],
        limit: usize,
        instant: DateTime<Utc>,
    ) -> Result<Vec<SavedSearch>> {
        let searches = self.searches.lock();
        let mut due: Vec<SavedSearch> = searches
            .values()
            .filter(|search| kinds.contains(&search.kind) && search.is_due_before(instant))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.last_searched_at
                .cmp(&b.last_searched_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        due.truncate(limit);
        Ok(due)
    }

    async fn save(&self, search: &SavedSearch) -> Result<()> {
        self.saves.lock().push(search.clone());

        let mut searches = self.searches.lock();
        if let Some(stored) = searches.get_mut(&search.id) {
            stored.last_searched_at = stored.last_searched_at.max(search.last_searched_at);
            stored.state = search.state;
        }
        Ok(())
    }
}
