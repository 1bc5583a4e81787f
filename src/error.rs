//! Error types for the saved-search notifier.
//!

use crate::orchestration::types::RunStats;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotifierError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Offer search gateway error: {0}")]
    GatewayError(#[from] GatewayError),
    #[error("Notification error: {0}")]
    NotificationError(String),
    #[error("Beneficiary directory error: {0}")]
    DirectoryError(String),
    #[error("Too many failures in notification run: {failures} failed searches")]
    CircuitBreakerTripped { failures: u32, stats: RunStats },
}

impl NotifierError {
    /// Statistics gathered before the run stopped, when the error carries them
    pub fn stats(&self) -> Option<&RunStats> {
        match self {
            NotifierError::CircuitBreakerTripped { stats, .. } => Some(stats),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for NotifierError {
    fn from(error: config::ConfigError) -> Self {
        NotifierError::ConfigurationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;

/// Classified failure of a single offer lookup.
///
/// Only the rate-limit case changes the coordinator's behavior; everything
/// else (5xx, timeouts, transport and decoding errors) is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Rate limited by offer search API: {message}")]
    RateLimited { message: String },
    #[error("Offer search failed (status {status:?}): {message}")]
    Other {
        status: Option<u16>,
        message: String,
    },
}

impl GatewayError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        GatewayError::RateLimited {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        GatewayError::Other {
            status: None,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status returned by the upstream API
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == 429 {
            GatewayError::RateLimited {
                message: message.into(),
            }
        } else {
            GatewayError::Other {
                status: Some(status),
                message: message.into(),
            }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GatewayError::RateLimited { .. })
    }
}
