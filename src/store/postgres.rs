//! # Postgres Search State Store
//!
//! Reads and updates the `recherche` table. Selection never locks rows: only
//! one notification run is expected to be active at a time.

use super::SearchStateStore;
use crate::error::{NotifierError, Result};
use crate::models::{SavedSearch, SavedSearchRow, SearchKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Clone)]
pub struct PgSearchStateStore {
    pool: PgPool,
}

impl PgSearchStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchStateStore for PgSearchStateStore {
    #[instrument(skip(self))]
    async fn find_due_before(
        &self,
        kinds: &[SearchKind],
        limit: usize,
        instant: DateTime<Utc>,
    ) -> Result<Vec<SavedSearch>> {
        let kind_names: Vec<String> = kinds.iter().map(|kind| kind.as_str().to_string()).collect();
        let limit = i64::try_from(limit).map_err(|_| {
            NotifierError::ConfigurationError(format!("Batch size {limit} is too large"))
        })?;

        let query = r#"
            SELECT id, id_jeune, type, titre, criteres,
                   date_derniere_recherche, etat_derniere_recherche
            FROM recherche
            WHERE type = ANY($1)
              AND date_derniere_recherche < $3
            ORDER BY date_derniere_recherche ASC, id ASC
            LIMIT $2
        "#;

        let rows = sqlx::query_as::<_, SavedSearchRow>(query)
            .bind(kind_names)
            .bind(limit)
            .bind(instant)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch due searches: {}", e);
                NotifierError::DatabaseError(format!("Due search selection failed: {e}"))
            })?;

        let searches: Vec<SavedSearch> = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                SavedSearch::try_from(row)
                    .map_err(|e| warn!(search_id = %id, error = %e, "Skipping invalid recherche row"))
                    .ok()
            })
            .collect();

        debug!(count = searches.len(), "Fetched due searches");
        Ok(searches)
    }

    #[instrument(skip(self, search), fields(search_id = %search.id))]
    async fn save(&self, search: &SavedSearch) -> Result<()> {
        let query = r#"
            UPDATE recherche
            SET date_derniere_recherche = GREATEST(date_derniere_recherche, $2),
                etat_derniere_recherche = $3
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(search.id)
            .bind(search.last_searched_at)
            .bind(search.state.map(|state| state.as_str()))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to save search state {}: {}", search.id, e);
                NotifierError::DatabaseError(format!("Search state update failed: {e}"))
            })?;

        if result.rows_affected() == 0 {
            warn!(
                search_id = %search.id,
                "Search disappeared before its state could be saved"
            );
        }

        Ok(())
    }
}
