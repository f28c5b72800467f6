use serde::{Deserialize, Serialize};

use crate::analysis::scoring::{Direction, ScoreOutcome};
use crate::domain::{WindowDescriptor, WindowId};

/// An accepted signal for one `(instrument, window)` pair.
///
/// The scheduler creates it and appends it to the result buffer; everything
/// past the key fields is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: String,
    pub instrument: String,
    pub window_id: WindowId,
    pub window_close_ms: i64,
    pub confidence: u8,
    pub direction: Direction,
    pub strategy: Option<String>,
    pub reasoning: Option<String>,
    pub created_at_ms: i64,
}

impl SignalRecord {
    pub fn from_outcome(
        id: String,
        instrument: &str,
        window: &WindowDescriptor,
        outcome: ScoreOutcome,
        created_at_ms: i64,
    ) -> Self {
        Self {
            id,
            instrument: instrument.to_string(),
            window_id: window.id,
            window_close_ms: window.end_ms,
            confidence: outcome.confidence,
            direction: outcome.direction,
            strategy: outcome.strategy,
            reasoning: outcome.reasoning,
            created_at_ms,
        }
    }

    pub fn description(&self) -> String {
        format!(
            "{} {} @ {}% ({})",
            self.instrument,
            self.direction,
            self.confidence,
            self.strategy.as_deref().unwrap_or("n/a")
        )
    }
}
