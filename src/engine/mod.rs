pub mod core;
pub mod messages;
pub mod state;
pub mod worker;

// Re-export key components
pub use self::core::Scheduler;
pub use messages::{Command, Notice, NoticeLevel, SchedulerEvent, TriggerResult, TriggerTicket};
pub use state::GateState;
pub use worker::{SchedulerHandle, spawn_scheduler};
