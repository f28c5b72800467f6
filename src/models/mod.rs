// Records and read-only views produced by the scheduler

pub mod signal;
pub mod snapshot;

// Re-export key types for convenience
pub use signal::SignalRecord;
pub use snapshot::SchedulerSnapshot;
