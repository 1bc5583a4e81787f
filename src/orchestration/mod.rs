//! # Orchestration
//!
//! The notification run: batch coordination, its state machine types and the
//! injectable time sources it waits on.

pub mod batch_coordinator;
pub mod timing;
pub mod types;

pub use batch_coordinator::{BatchCoordinator, CoordinatorConfig};
pub use timing::{Clock, FixedClock, Sleeper, SystemClock, TokioSleeper};
pub use types::{CoordinatorState, LookupOutcome, RunStats};
