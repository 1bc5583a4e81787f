use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Search domain of a saved search; selects the upstream endpoint and criteria shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchKind {
    /// Job offers
    OffresEmploi,
    /// Apprenticeship offers (same upstream as job offers, `alternance=true`)
    OffresAlternance,
    /// Immersion offers
    OffresImmersion,
    /// Civic service offers
    OffresServicesCivique,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OffresEmploi => "OFFRES_EMPLOI",
            Self::OffresAlternance => "OFFRES_ALTERNANCE",
            Self::OffresImmersion => "OFFRES_IMMERSION",
            Self::OffresServicesCivique => "OFFRES_SERVICES_CIVIQUE",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFRES_EMPLOI" => Ok(Self::OffresEmploi),
            "OFFRES_ALTERNANCE" => Ok(Self::OffresAlternance),
            "OFFRES_IMMERSION" => Ok(Self::OffresImmersion),
            "OFFRES_SERVICES_CIVIQUE" => Ok(Self::OffresServicesCivique),
            _ => Err(format!("Invalid search kind: {s}")),
        }
    }
}

/// Outcome of the last evaluation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchState {
    Succes,
    Echec,
}

impl SearchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succes => "SUCCES",
            Self::Echec => "ECHEC",
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCES" => Ok(Self::Succes),
            "ECHEC" => Ok(Self::Echec),
            _ => Err(format!("Invalid search state: {s}")),
        }
    }
}

/// A beneficiary's standing interest in a category of offers ("Recherche").
///
/// The engine only ever rewrites `last_searched_at` and `state`, and always
/// both at once through [`SavedSearch::record_attempt`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: Uuid,
    pub beneficiary_id: String,
    pub kind: SearchKind,
    pub title: String,
    pub criteria: serde_json::Value,
    pub last_searched_at: DateTime<Utc>,
    /// `None` until the search has been evaluated once
    pub state: Option<SearchState>,
}

impl SavedSearch {
    /// Copy of this search with its bookkeeping advanced to `searched_at`.
    ///
    /// The timestamp never moves backwards: an older `searched_at` keeps the
    /// current value.
    pub fn record_attempt(&self, searched_at: DateTime<Utc>, state: SearchState) -> Self {
        Self {
            last_searched_at: self.last_searched_at.max(searched_at),
            state: Some(state),
            ..self.clone()
        }
    }

    pub fn is_due_before(&self, instant: DateTime<Utc>) -> bool {
        self.last_searched_at < instant
    }
}

/// Raw `recherche` row as read by the Postgres store
#[derive(Debug, Clone, FromRow)]
pub struct SavedSearchRow {
    pub id: Uuid,
    pub id_jeune: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub titre: String,
    pub criteres: Option<serde_json::Value>,
    pub date_derniere_recherche: DateTime<Utc>,
    pub etat_derniere_recherche: Option<String>,
}

impl TryFrom<SavedSearchRow> for SavedSearch {
    type Error = String;

    fn try_from(row: SavedSearchRow) -> Result<Self, Self::Error> {
        // An unrecognised state is treated as never evaluated
        let state = match row.etat_derniere_recherche.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<SearchState>() {
                Ok(state) => Some(state),
                Err(_) => {
                    warn!(search_id = %row.id, state = raw, "Unknown search state, ignoring it");
                    None
                }
            },
        };

        Ok(Self {
            id: row.id,
            beneficiary_id: row.id_jeune,
            kind: row.kind.parse()?,
            title: row.titre,
            criteria: row.criteres.unwrap_or(serde_json::Value::Null),
            last_searched_at: row.date_derniere_recherche,
            state,
        })
    }
}
