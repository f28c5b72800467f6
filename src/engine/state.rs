use serde::Serialize;

use crate::domain::WindowId;

/// Trigger-gate state for the current `(live instrument, window)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// No eligible window
    #[default]
    Idle,
    /// Window closed and the live instrument has not been processed for it
    Eligible { instrument: String, window: WindowId },
    /// Scoring dispatched asynchronously, ledger holds an in-flight claim
    InFlight { instrument: String, window: WindowId },
    /// Trigger dispatched and ledger updated for this pair
    Fired { instrument: String, window: WindowId },
}

impl GateState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, GateState::InFlight { .. })
    }

    /// The pair this state refers to, if any.
    pub fn pair(&self) -> Option<(&str, &WindowId)> {
        match self {
            GateState::Idle => None,
            GateState::Eligible { instrument, window }
            | GateState::InFlight { instrument, window }
            | GateState::Fired { instrument, window } => Some((instrument.as_str(), window)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateState::Idle => "idle",
            GateState::Eligible { .. } => "eligible",
            GateState::InFlight { .. } => "in-flight",
            GateState::Fired { .. } => "fired",
        }
    }
}
