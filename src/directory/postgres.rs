use super::BeneficiaryDirectory;
use crate::error::{NotifierError, Result};
use crate::models::PushTarget;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, instrument};

/// Push settings of a beneficiary as stored on the `jeune` table
#[derive(Debug, Clone, FromRow)]
pub struct PushSettingsRow {
    pub id: String,
    pub push_notification_token: Option<String>,
    pub notifications_alertes_offres: Option<bool>,
}

impl PushSettingsRow {
    /// A target only exists with a token and an explicit opt-in to offer alerts
    pub fn into_push_target(self) -> Option<PushTarget> {
        match (self.push_notification_token, self.notifications_alertes_offres) {
            (Some(token), Some(true)) if !token.is_empty() => Some(PushTarget::new(self.id, token)),
            _ => None,
        }
    }
}

/// Reads push tokens and offer-alert preferences of beneficiaries.
#[derive(Debug, Clone)]
pub struct PgBeneficiaryDirectory {
    pool: PgPool,
}

impl PgBeneficiaryDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BeneficiaryDirectory for PgBeneficiaryDirectory {
    #[instrument(skip(self))]
    async fn get_push_target(&self, beneficiary_id: &str) -> Result<Option<PushTarget>> {
        let query = r#"
            SELECT id, push_notification_token, notifications_alertes_offres
            FROM jeune
            WHERE id = $1
        "#;

        let row = sqlx::query_as::<_, PushSettingsRow>(query)
            .bind(beneficiary_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to read push settings for {}: {}", beneficiary_id, e);
                NotifierError::DirectoryError(format!("Push settings lookup failed: {e}"))
            })?;

        let target = row.and_then(PushSettingsRow::into_push_target);
        if target.is_none() {
            debug!(beneficiary_id = beneficiary_id, "No push target for beneficiary");
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(token: Option<&str>, alerts: Option<bool>) -> PushSettingsRow {
        PushSettingsRow {
            id: "jeune-1".to_string(),
            push_notification_token: token.map(str::to_string),
            notifications_alertes_offres: alerts,
        }
    }

    #[test]
    fn test_opted_in_beneficiary_with_token_is_a_target() {
        assert_eq!(
            row(Some("fcm-token"), Some(true)).into_push_target(),
            Some(PushTarget::new("jeune-1", "fcm-token"))
        );
    }

    #[test]
    fn test_opted_out_beneficiary_is_not_a_target() {
        assert_eq!(row(Some("fcm-token"), Some(false)).into_push_target(), None);
    }

    #[test]
    fn test_unset_preference_is_not_a_target() {
        assert_eq!(row(Some("fcm-token"), None).into_push_target(), None);
    }

    #[test]
    fn test_missing_token_is_not_a_target() {
        assert_eq!(row(None, Some(true)).into_push_target(), None);
        assert_eq!(row(Some(""), Some(true)).into_push_target(), None);
    }
}
