//! # Notifier Configuration
//!
//! Typed configuration for the notification run, layered by [`ConfigManager`]:
//! built-in defaults, then `config/search-notifier.toml`, then
//! `config/search-notifier.{environment}.toml`, then `SEARCH_NOTIFIER__*`
//! environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use search_notifier::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().batch.size;
//! let long_pause = manager.config().backoff.rate_limited_delay();
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_FAILURE_THRESHOLD, DEFAULT_OFFER_PAGE_SIZE,
    DEFAULT_RATE_LIMITED_DELAY_MS, DEFAULT_SEARCH_KINDS, DEFAULT_SHORT_DELAY_MS,
};
use crate::error::{NotifierError, Result};
use crate::models::SearchKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Batch sizing and circuit breaker
    pub batch: BatchConfig,

    /// Inter-batch pauses
    pub backoff: BackoffConfig,

    /// Saved-search and beneficiary database
    pub database: DatabaseConfig,

    /// Upstream offer search API
    pub offer_api: OfferApiConfig,

    /// Push notification gateway
    pub push: PushConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Searches fetched and evaluated concurrently per batch
    pub size: usize,
    /// Failure count past which the run halts
    pub failure_threshold: u32,
    /// Search kinds the run evaluates
    pub kinds: Vec<SearchKind>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_BATCH_SIZE,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            kinds: DEFAULT_SEARCH_KINDS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub short_delay_ms: u64,
    pub rate_limited_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            short_delay_ms: DEFAULT_SHORT_DELAY_MS,
            rate_limited_delay_ms: DEFAULT_RATE_LIMITED_DELAY_MS,
        }
    }
}

impl BackoffConfig {
    pub fn short_delay(&self) -> Duration {
        Duration::from_millis(self.short_delay_ms)
    }

    pub fn rate_limited_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limited_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/pass_emploi_development".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OfferApiConfig {
    pub base_url: String,
    /// Bearer token sent with every lookup, when set
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub page_size: u32,
}

impl Default for OfferApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            api_key: None,
            timeout_ms: 10_000,
            page_size: DEFAULT_OFFER_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    pub endpoint: String,
    pub server_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8082/send".to_string(),
            server_key: None,
            timeout_ms: 5_000,
        }
    }
}

impl NotifierConfig {
    /// Reject values the coordinator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch.size == 0 {
            return Err(NotifierError::ConfigurationError(
                "batch.size must be greater than 0".to_string(),
            ));
        }
        if self.batch.failure_threshold == 0 {
            return Err(NotifierError::ConfigurationError(
                "batch.failure_threshold must be greater than 0".to_string(),
            ));
        }
        if self.batch.kinds.is_empty() {
            return Err(NotifierError::ConfigurationError(
                "batch.kinds must list at least one search kind".to_string(),
            ));
        }
        if self.backoff.rate_limited_delay_ms < self.backoff.short_delay_ms {
            return Err(NotifierError::ConfigurationError(format!(
                "backoff.rate_limited_delay_ms ({}) must not be shorter than backoff.short_delay_ms ({})",
                self.backoff.rate_limited_delay_ms, self.backoff.short_delay_ms
            )));
        }
        if self.database.max_connections == 0 {
            return Err(NotifierError::ConfigurationError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_job_constants() {
        let config = NotifierConfig::default();
        assert_eq!(config.batch.size, 5);
        assert_eq!(config.batch.failure_threshold, 100);
        assert_eq!(
            config.batch.kinds,
            vec![SearchKind::OffresEmploi, SearchKind::OffresAlternance]
        );
        assert_eq!(config.backoff.short_delay(), Duration::from_secs(1));
        assert_eq!(config.backoff.rate_limited_delay(), Duration::from_secs(10));
        assert_eq!(config.offer_api.page_size, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = NotifierConfig::default();
        config.batch.size = 0;
        assert!(matches!(
            config.validate(),
            Err(NotifierError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_kinds() {
        let mut config = NotifierConfig::default();
        config.batch.kinds.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let mut config = NotifierConfig::default();
        config.backoff.short_delay_ms = 20_000;
        assert!(config.validate().is_err());
    }
}
