//! Configuration module for the candle scheduler.

pub mod analysis;
pub mod catalog;

mod debug; // Private: use crate::config::DEBUG_FLAGS
pub use debug::DEBUG_FLAGS;

// Re-export commonly used items
pub use analysis::{ConfigIssue, SCHEDULER, SchedulerConfig, SchedulerSettings};
pub use catalog::{CATALOG, FALLBACK_PAIRS};
