//! # Data Models
//!
//! Saved searches and the push targets they notify.

pub mod push_target;
pub mod saved_search;

pub use push_target::PushTarget;
pub use saved_search::{SavedSearch, SavedSearchRow, SearchKind, SearchState};
