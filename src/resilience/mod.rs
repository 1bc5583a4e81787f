//! # Resilience Module
//!
//! Self-throttling of the notification run.
//!
//! - **Backoff**: pause between batches, escalated after an upstream rate-limit signal
//! - **Circuit Breaker**: stops a run once failures pile up past a threshold
//!
//! ## Usage
//!
//! ```rust
//! use search_notifier::resilience::{BackoffPolicy, CircuitBreaker, CircuitState};
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::default();
//! assert_eq!(policy.delay(true), Duration::from_secs(10));
//!
//! let mut breaker = CircuitBreaker::new("offer_search", 1);
//! breaker.record_failure();
//! assert_eq!(breaker.record_failure(), CircuitState::Open);
//! ```

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
