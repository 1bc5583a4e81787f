//! # Notification Dispatch
//!
//! Push notifications telling a beneficiary that a saved search has new
//! results. Delivery is at-least-once: nothing here deduplicates, and a run
//! restarted mid-batch may notify the same search twice.

pub mod push;

use crate::constants::notification::{NEW_OFFER_TYPE, NEW_RESULTS_BODY};
use crate::error::Result;
use crate::models::{PushTarget, SavedSearch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use push::PushNotificationDispatcher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub token: String,
    pub notification: NotificationContent,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub id: String,
    pub kind: String,
}

impl NotificationMessage {
    /// "New results" message for a saved search
    pub fn new_results(target: &PushTarget, search: &SavedSearch) -> Self {
        Self {
            token: target.token.clone(),
            notification: NotificationContent {
                title: search.title.clone(),
                body: NEW_RESULTS_BODY.to_string(),
            },
            data: NotificationData {
                notification_type: NEW_OFFER_TYPE.to_string(),
                id: search.id.to_string(),
                kind: search.kind.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify_new_results(&self, target: &PushTarget, search: &SavedSearch) -> Result<()>;
}
