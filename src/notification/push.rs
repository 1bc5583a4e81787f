//! HTTP push gateway dispatcher.

use super::{NotificationDispatcher, NotificationMessage};
use crate::config::PushConfig;
use crate::error::{NotifierError, Result};
use crate::models::{PushTarget, SavedSearch};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PushNotificationDispatcher {
    client: Client,
    endpoint: Url,
    server_key: Option<String>,
}

impl std::fmt::Debug for PushNotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushNotificationDispatcher")
            .field("endpoint", &self.endpoint.as_str())
            .field("auth_enabled", &self.server_key.is_some())
            .finish()
    }
}

impl PushNotificationDispatcher {
    pub fn new(config: &PushConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            NotifierError::ConfigurationError(format!("Invalid push endpoint: {e}"))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                NotifierError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(endpoint = %config.endpoint, "Created push notification dispatcher");

        Ok(Self {
            client,
            endpoint,
            server_key: config.server_key.clone(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for PushNotificationDispatcher {
    async fn notify_new_results(&self, target: &PushTarget, search: &SavedSearch) -> Result<()> {
        let message = NotificationMessage::new_results(target, search);

        let mut request = self.client.post(self.endpoint.clone()).json(&message);
        if let Some(server_key) = &self.server_key {
            request = request.bearer_auth(server_key);
        }

        let response = request.send().await.map_err(|e| {
            NotifierError::NotificationError(format!("Push request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotifierError::NotificationError(format!(
                "Push gateway answered HTTP {status}: {body}"
            )));
        }

        debug!(
            search_id = %search.id,
            beneficiary_id = %target.beneficiary_id,
            "📣 New results notification sent"
        );
        Ok(())
    }
}
