//! # Batch Coordinator
//!
//! ## Architecture: Settle-all Batches with Self-throttling
//!
//! The coordinator drives one notification run as a small state machine:
//!
//! ```text
//!            ┌──────────── batch empty ───────────▶ Drained (Ok)
//!            │
//! Polling ───┼──── breaker opened ─────────────────▶ Halted (Err)
//!    ▲       │
//!    │       └──── batch settled ──▶ Waiting(delay)
//!    └─────────────────────────────────────┘
//! ```
//!
//! Each poll fetches up to `batch_size` due searches, oldest first, and runs
//! one lookup per search on its own task. All lookups settle before anything
//! is written: a failed or panicking lookup never cancels its siblings. The
//! outcomes are then handled sequentially in due order: notify on new results,
//! persist the new timestamp and state, feed the circuit breaker, note any
//! rate-limit signal. The pause before the next poll comes from the
//! [`BackoffPolicy`].
//!
//! The polling instant is captured once per run. Every processed search is
//! written back with it, which is what eventually empties the due selection.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use search_notifier::config::NotifierConfig;
//! use search_notifier::directory::PgBeneficiaryDirectory;
//! use search_notifier::gateway::HttpOfferSearchGateway;
//! use search_notifier::notification::PushNotificationDispatcher;
//! use search_notifier::orchestration::BatchCoordinator;
//! use search_notifier::store::PgSearchStateStore;
//! use std::sync::Arc;
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let config = NotifierConfig::default();
//! let coordinator = BatchCoordinator::from_config(
//!     &config,
//!     Arc::new(PgSearchStateStore::new(pool.clone())),
//!     Arc::new(HttpOfferSearchGateway::new(&config.offer_api)?),
//!     Arc::new(PgBeneficiaryDirectory::new(pool)),
//!     Arc::new(PushNotificationDispatcher::new(&config.push)?),
//! );
//!
//! let stats = coordinator.run().await?;
//! println!("{} notifications sent", stats.notifications_sent);
//! # Ok(())
//! # }
//! ```

use crate::config::{BatchConfig, NotifierConfig};
use crate::directory::BeneficiaryDirectory;
use crate::error::{NotifierError, Result};
use crate::gateway::OfferSearchGateway;
use crate::logging::{log_run_summary, log_search_outcome};
use crate::models::{SavedSearch, SearchKind, SearchState};
use crate::notification::NotificationDispatcher;
use crate::orchestration::timing::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::orchestration::types::{CoordinatorState, LookupOutcome, RunStats};
use crate::resilience::{BackoffPolicy, CircuitBreaker, CircuitState};
use crate::store::SearchStateStore;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Batch sizing and breaker settings of the coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    pub batch_size: usize,
    pub failure_threshold: u32,
    pub kinds: Vec<SearchKind>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for CoordinatorConfig {
    fn from(config: &BatchConfig) -> Self {
        Self {
            batch_size: config.size,
            failure_threshold: config.failure_threshold,
            kinds: config.kinds.clone(),
        }
    }
}

/// Milliseconds of `duration`, saturating at `u64::MAX`
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Loop-local bookkeeping owned by a single `run()` call
struct RunContext {
    polling_instant: DateTime<Utc>,
    breaker: CircuitBreaker,
    stats: RunStats,
    started: Instant,
}

impl RunContext {
    fn finish(&mut self) -> RunStats {
        self.stats.elapsed_ms = duration_ms(self.started.elapsed());
        self.stats.clone()
    }
}

pub struct BatchCoordinator {
    store: Arc<dyn SearchStateStore>,
    gateway: Arc<dyn OfferSearchGateway>,
    directory: Arc<dyn BeneficiaryDirectory>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    config: CoordinatorConfig,
    backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCoordinator")
            .field("config", &self.config)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl BatchCoordinator {
    pub fn new(
        store: Arc<dyn SearchStateStore>,
        gateway: Arc<dyn OfferSearchGateway>,
        directory: Arc<dyn BeneficiaryDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            directory,
            dispatcher,
            config,
            backoff: BackoffPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(
        config: &NotifierConfig,
        store: Arc<dyn SearchStateStore>,
        gateway: Arc<dyn OfferSearchGateway>,
        directory: Arc<dyn BeneficiaryDirectory>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self::new(
            store,
            gateway,
            directory,
            dispatcher,
            CoordinatorConfig::from(&config.batch),
        )
        .with_backoff(BackoffPolicy::from_config(&config.backoff))
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Evaluate every due search until none is left or the circuit breaker opens
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn run(&self) -> Result<RunStats> {
        let mut run = RunContext {
            polling_instant: self.clock.now(),
            breaker: CircuitBreaker::new("offer_search_run", self.config.failure_threshold),
            stats: RunStats::default(),
            started: Instant::now(),
        };

        info!(
            polling_instant = %run.polling_instant,
            kinds = ?self.config.kinds,
            "🚀 Starting saved-search notification run"
        );

        let mut state = CoordinatorState::Polling;
        loop {
            state = match state {
                CoordinatorState::Polling => match self.poll(&mut run).await {
                    Ok(next) => next,
                    Err(e) => {
                        error!(error = %e, "Notification run stopped on unrecoverable error");
                        log_run_summary(&run.finish(), false);
                        return Err(e);
                    }
                },
                CoordinatorState::Waiting(delay) => {
                    debug!(
                        delay_ms = duration_ms(delay),
                        "⏳ Waiting before next batch"
                    );
                    self.sleeper.sleep(delay).await;
                    CoordinatorState::Polling
                }
                CoordinatorState::Drained => {
                    let stats = run.finish();
                    log_run_summary(&stats, true);
                    return Ok(stats);
                }
                CoordinatorState::Halted => {
                    let stats = run.finish();
                    log_run_summary(&stats, false);
                    return Err(NotifierError::CircuitBreakerTripped {
                        failures: run.breaker.failures(),
                        stats,
                    });
                }
            };
        }
    }

    /// Process one batch and decide the next state
    async fn poll(&self, run: &mut RunContext) -> Result<CoordinatorState> {
        let batch = self
            .store
            .find_due_before(&self.config.kinds, self.config.batch_size, run.polling_instant)
            .await?;

        if batch.is_empty() {
            debug!("No due searches left");
            return Ok(CoordinatorState::Drained);
        }

        run.stats.batches += 1;
        debug!(batch = run.stats.batches, size = batch.len(), "Processing batch");

        let outcomes = self.lookup_all(&batch).await;
        let mut rate_limited = false;

        for (search, outcome) in batch.iter().zip(outcomes) {
            if outcome.has_results() {
                self.notify(search, &mut run.stats).await;
            }

            let state = outcome.classification();
            self.store
                .save(&search.record_attempt(run.polling_instant, state))
                .await?;
            log_search_outcome(search, state, outcome.failure_reason().as_deref());
            run.stats.searches_total += 1;

            match state {
                SearchState::Succes => run.stats.successes += 1,
                SearchState::Echec => {
                    run.stats.failures += 1;
                    if run.breaker.record_failure() == CircuitState::Open {
                        error!(
                            search_id = %search.id,
                            failures = run.breaker.failures(),
                            "Too many failures in notification run, halting"
                        );
                        return Ok(CoordinatorState::Halted);
                    }
                }
            }

            if outcome.is_rate_limited() {
                run.stats.rate_limited += 1;
                rate_limited = true;
            }
        }

        if rate_limited {
            warn!(
                delay_ms = duration_ms(self.backoff.delay(true)),
                "Offer API rate limited this batch, cooling down"
            );
        }

        Ok(CoordinatorState::Waiting(self.backoff.delay(rate_limited)))
    }

    /// Run every lookup of the batch on its own task and collect the outcomes in batch order
    async fn lookup_all(&self, batch: &[SavedSearch]) -> Vec<LookupOutcome> {
        let handles: Vec<_> = batch
            .iter()
            .map(|search| {
                let gateway = Arc::clone(&self.gateway);
                let kind = search.kind;
                let criteria = search.criteria.clone();
                let not_before = search.last_searched_at;
                tokio::spawn(async move { gateway.search(kind, &criteria, not_before).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(Ok(page)) => LookupOutcome::Found(page),
                Ok(Err(e)) => LookupOutcome::Failed(e),
                Err(join_error) => LookupOutcome::Aborted(join_error.to_string()),
            })
            .collect()
    }

    /// Notification side effects never affect the search's outcome
    async fn notify(&self, search: &SavedSearch, stats: &mut RunStats) {
        let target = match self.directory.get_push_target(&search.beneficiary_id).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                debug!(
                    search_id = %search.id,
                    beneficiary_id = %search.beneficiary_id,
                    "No push target, skipping notification"
                );
                return;
            }
            Err(e) => {
                warn!(
                    search_id = %search.id,
                    beneficiary_id = %search.beneficiary_id,
                    error = %e,
                    "Push target lookup failed, skipping notification"
                );
                return;
            }
        };

        match self.dispatcher.notify_new_results(&target, search).await {
            Ok(()) => stats.notifications_sent += 1,
            Err(e) => warn!(
                search_id = %search.id,
                beneficiary_id = %search.beneficiary_id,
                error = %e,
                "Failed to send new results notification"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_secs(10)), 10_000);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_coordinator_config_follows_batch_config() {
        let config = CoordinatorConfig::from(&BatchConfig {
            size: 8,
            failure_threshold: 3,
            kinds: vec![SearchKind::OffresImmersion],
        });
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.kinds, vec![SearchKind::OffresImmersion]);
    }
}
