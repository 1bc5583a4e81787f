//! # Structured Logging Module
//!
//! Environment-aware structured logging for the notification run.
//! Human-readable output in development and test, JSON lines in production.
//! `RUST_LOG` overrides the environment's default level.

use crate::config::ConfigManager;
use crate::models::{SavedSearch, SearchState};
use crate::orchestration::types::RunStats;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let log_level = get_log_level(&environment);
        let filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
        };

        let console_layer = if environment == "production" {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter())
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter())
                .boxed()
        };

        // try_init so a subscriber installed by a host process or test harness wins
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - keeping it");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log the persisted outcome of one search evaluation
pub fn log_search_outcome(search: &SavedSearch, state: SearchState, details: Option<&str>) {
    tracing::debug!(
        search_id = %search.id,
        beneficiary_id = %search.beneficiary_id,
        kind = %search.kind,
        state = %state,
        details = details,
        "🔎 SEARCH_OUTCOME"
    );
}

/// Log the summary of a finished run
pub fn log_run_summary(stats: &RunStats, succeeded: bool) {
    if succeeded {
        tracing::info!(
            searches_total = stats.searches_total,
            successes = stats.successes,
            failures = stats.failures,
            rate_limited = stats.rate_limited,
            notifications_sent = stats.notifications_sent,
            batches = stats.batches,
            elapsed_ms = stats.elapsed_ms,
            "📋 RUN_SUMMARY: notification run completed"
        );
    } else {
        tracing::error!(
            searches_total = stats.searches_total,
            successes = stats.successes,
            failures = stats.failures,
            rate_limited = stats.rate_limited,
            notifications_sent = stats.notifications_sent,
            batches = stats.batches,
            elapsed_ms = stats.elapsed_ms,
            "📋 RUN_SUMMARY: notification run stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels_per_environment() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("test"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
