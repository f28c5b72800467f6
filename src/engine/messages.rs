use crate::domain::{TrackedInstrument, WindowDescriptor, WindowId, WindowWidth};
use crate::models::SignalRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A non-fatal, human-readable report (config fallback, scorer failure, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Everything the scheduler publishes to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    WindowTick(WindowDescriptor),
    Rotated {
        live: Option<String>,
    },
    TriggerFired {
        instrument: String,
        window: WindowDescriptor,
    },
    SignalAccepted(SignalRecord),
    /// Scored but not kept: rejected by the scorer or under the confidence floor
    SignalDiscarded {
        instrument: String,
        window_id: WindowId,
        confidence: u8,
        min_confidence: u8,
    },
    Notice(Notice),
}

/// User-initiated changes, delivered to the runtime driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pause,
    Resume,
    SetWidth(WindowWidth),
    SetInstruments(Vec<TrackedInstrument>),
    SetMinConfidence(i64),
    Shutdown,
}

/// Claim on one `(instrument, window)` pair whose scoring runs asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerTicket {
    pub instrument: String,
    pub window: WindowDescriptor,
    /// Ledger generation at dispatch; results from an older generation are dropped
    pub generation: u64,
}

/// How one trigger ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerResult {
    Accepted(SignalRecord),
    Discarded { confidence: u8 },
    Failed(String),
    /// The ledger was reset while scoring was in flight
    Stale,
}
