use serde::Serialize;

use crate::domain::{WindowDescriptor, WindowWidth};
use crate::engine::GateState;
use crate::models::SignalRecord;

/// Read-only view of the scheduler for UI / observers. Never fed back in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerSnapshot {
    pub running: bool,
    /// Human-readable reason when the scheduler cannot run
    pub disabled_reason: Option<String>,
    pub width: WindowWidth,
    pub min_confidence: u8,
    pub window: Option<WindowDescriptor>,
    pub live_instrument: Option<String>,
    pub tracked: Vec<String>,
    pub gate: GateState,
    /// Newest first
    pub signals: Vec<SignalRecord>,
    pub average_confidence: Option<f64>,
}
