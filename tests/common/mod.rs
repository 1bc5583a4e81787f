//! Test doubles for the notification run.
//!
//! The scripted gateway reads its behavior from the search criteria
//! (`{"scenario": "results" | "empty" | "rate_limited" | "error" | "panic"}`),
//! so each saved search decides how its own lookup ends.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use search_notifier::directory::BeneficiaryDirectory;
use search_notifier::error::{GatewayError, NotifierError, Result};
use search_notifier::gateway::{OfferPage, OfferSearchGateway};
use search_notifier::models::{PushTarget, SavedSearch, SearchKind};
use search_notifier::notification::NotificationDispatcher;
use search_notifier::orchestration::{
    BatchCoordinator, CoordinatorConfig, FixedClock, Sleeper,
};
use search_notifier::store::{InMemorySearchStateStore, SearchStateStore};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub fn polling_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-02T06:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Saved search owned by `beneficiary`, last evaluated `age_minutes` before the polling instant
pub fn saved_search(scenario: &str, beneficiary: &str, age_minutes: i64) -> SavedSearch {
    SavedSearch {
        id: Uuid::new_v4(),
        beneficiary_id: beneficiary.to_string(),
        kind: SearchKind::OffresEmploi,
        title: format!("Recherche {scenario}"),
        criteria: json!({"scenario": scenario, "q": "cuisinier"}),
        last_searched_at: polling_instant() - ChronoDuration::minutes(age_minutes),
        state: None,
    }
}

/// `count` searches with the same scenario, oldest first
pub fn saved_searches(scenario: &str, beneficiary: &str, count: usize) -> Vec<SavedSearch> {
    (0..count)
        .map(|i| saved_search(scenario, beneficiary, (10_000 - i) as i64))
        .collect()
}

#[derive(Debug, Default)]
pub struct ScriptedGateway {
    calls: Mutex<Vec<(SearchKind, serde_json::Value, DateTime<Utc>)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(SearchKind, serde_json::Value, DateTime<Utc>)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl OfferSearchGateway for ScriptedGateway {
    async fn search(
        &self,
        kind: SearchKind,
        criteria: &serde_json::Value,
        not_before: DateTime<Utc>,
    ) -> std::result::Result<OfferPage, GatewayError> {
        self.calls.lock().push((kind, criteria.clone(), not_before));

        if let Some(delay_ms) = criteria["delay_ms"].as_u64() {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match criteria["scenario"].as_str().unwrap_or("empty") {
            "results" => Ok(OfferPage::new(vec![json!({"id": "offre-1"})])),
            "empty" => Ok(OfferPage::empty()),
            "rate_limited" => Err(GatewayError::from_status(429, "Too Many Requests")),
            "error" => Err(GatewayError::from_status(500, "Internal Server Error")),
            "panic" => panic!("offer gateway exploded"),
            other => Err(GatewayError::other(format!("unknown scenario {other}"))),
        }
    }
}

#[derive(Debug, Default)]
pub struct StaticDirectory {
    tokens: HashMap<String, String>,
    failing: bool,
}

impl StaticDirectory {
    pub fn with_tokens<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            tokens: entries
                .into_iter()
                .map(|(beneficiary, token)| (beneficiary.to_string(), token.to_string()))
                .collect(),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            tokens: HashMap::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl BeneficiaryDirectory for StaticDirectory {
    async fn get_push_target(&self, beneficiary_id: &str) -> Result<Option<PushTarget>> {
        if self.failing {
            return Err(NotifierError::DirectoryError("directory offline".to_string()));
        }
        Ok(self
            .tokens
            .get(beneficiary_id)
            .map(|token| PushTarget::new(beneficiary_id, token.clone())))
    }
}

#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<(String, Uuid)>>,
    failing: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// (token, search id) of every attempted notification
    pub fn sent(&self) -> Vec<(String, Uuid)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn notify_new_results(&self, target: &PushTarget, search: &SavedSearch) -> Result<()> {
        self.sent.lock().push((target.token.clone(), search.id));
        if self.failing {
            return Err(NotifierError::NotificationError(
                "push gateway unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

/// Store wrapper recording the size of every batch it hands out
#[derive(Debug)]
pub struct RecordingStore {
    inner: Arc<InMemorySearchStateStore>,
    batch_sizes: Mutex<Vec<usize>>,
    fail_saves: bool,
}

impl RecordingStore {
    pub fn new(inner: Arc<InMemorySearchStateStore>) -> Self {
        Self {
            inner,
            batch_sizes: Mutex::new(Vec::new()),
            fail_saves: false,
        }
    }

    pub fn failing_saves(inner: Arc<InMemorySearchStateStore>) -> Self {
        Self {
            fail_saves: true,
            ..Self::new(inner)
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }
}

#[async_trait]
impl SearchStateStore for RecordingStore {
    async fn find_due_before(
        &self,
        kinds: &[SearchKind],
        limit: usize,
        instant: DateTime<Utc>,
    ) -> Result<Vec<SavedSearch>> {
        let batch = self.inner.find_due_before(kinds, limit, instant).await?;
        self.batch_sizes.lock().push(batch.len());
        Ok(batch)
    }

    async fn save(&self, search: &SavedSearch) -> Result<()> {
        if self.fail_saves {
            return Err(NotifierError::DatabaseError(
                "connection reset by peer".to_string(),
            ));
        }
        self.inner.save(search).await
    }
}

/// Everything a coordinator test needs to inspect after a run
pub struct Harness {
    pub memory: Arc<InMemorySearchStateStore>,
    pub store: Arc<RecordingStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub sleeper: Arc<RecordingSleeper>,
    pub coordinator: BatchCoordinator,
}

pub struct HarnessBuilder {
    searches: Vec<SavedSearch>,
    directory: StaticDirectory,
    dispatcher: RecordingDispatcher,
    config: CoordinatorConfig,
    failing_saves: bool,
}

impl HarnessBuilder {
    pub fn new(searches: Vec<SavedSearch>) -> Self {
        Self {
            searches,
            directory: StaticDirectory::default(),
            dispatcher: RecordingDispatcher::new(),
            config: CoordinatorConfig::default(),
            failing_saves: false,
        }
    }

    pub fn directory(mut self, directory: StaticDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn dispatcher(mut self, dispatcher: RecordingDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn failing_saves(mut self) -> Self {
        self.failing_saves = true;
        self
    }

    pub fn build(self) -> Harness {
        let memory = Arc::new(InMemorySearchStateStore::with_searches(self.searches));
        let store = Arc::new(if self.failing_saves {
            RecordingStore::failing_saves(Arc::clone(&memory))
        } else {
            RecordingStore::new(Arc::clone(&memory))
        });
        let gateway = Arc::new(ScriptedGateway::new());
        let dispatcher = Arc::new(self.dispatcher);
        let sleeper = Arc::new(RecordingSleeper::default());

        let coordinator = BatchCoordinator::new(
            store.clone(),
            gateway.clone(),
            Arc::new(self.directory),
            dispatcher.clone(),
            self.config,
        )
        .with_sleeper(sleeper.clone())
        .with_clock(Arc::new(FixedClock(polling_instant())));

        Harness {
            memory,
            store,
            gateway,
            dispatcher,
            sleeper,
            coordinator,
        }
    }
}
