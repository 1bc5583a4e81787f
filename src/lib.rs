#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Search Notifier
//!
//! Saved-search notification batch engine.
//!
//! ## Overview
//!
//! Beneficiaries save offer searches ("recherches"). A scheduled run
//! re-evaluates every due search against the offer search API, pushes a
//! notification when new offers exist, and records the outcome of each
//! attempt on the search itself.
//!
//! ## Key Features
//!
//! - **Bounded batches**: at most `batch.size` lookups in flight, one batch at a time
//! - **Isolation**: a failing or panicking lookup never affects its siblings
//! - **Rate-limit aware backoff**: a 429 from upstream lengthens the pause between batches
//! - **Circuit breaker**: too many failures halt the run instead of spinning on an outage
//! - **At-least-once delivery**: duplicates are possible, lost notifications are not retried
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Batch coordinator and run state machine
//! - [`store`] - Due search selection and state persistence
//! - [`gateway`] - Offer search API lookups
//! - [`notification`] - Push notification dispatch
//! - [`directory`] - Beneficiary push target lookup
//! - [`resilience`] - Backoff policy and circuit breaker
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use search_notifier::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! println!("batch size: {}", manager.config().batch.size);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod notification;
pub mod orchestration;
pub mod resilience;
pub mod store;

pub use config::{ConfigManager, NotifierConfig};
pub use error::{GatewayError, NotifierError, Result};
pub use models::{PushTarget, SavedSearch, SearchKind, SearchState};
pub use orchestration::{BatchCoordinator, CoordinatorConfig, RunStats};
