//! Fixed-width, wall-clock aligned windows ("candles").
//!
//! Everything here is a pure function of `(now_ms, width)`. No state is carried
//! between ticks, so any observer that evaluates the same instant with the same
//! width gets the same window identity.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::utils::TimeUtils;

/// The supported window widths.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
pub enum WindowWidth {
    #[default]
    #[serde(rename = "1m")]
    #[strum(serialize = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    #[strum(serialize = "2m")]
    TwoMinutes,
    #[serde(rename = "3m")]
    #[strum(serialize = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    #[strum(serialize = "5m")]
    FiveMinutes,
}

impl WindowWidth {
    pub fn as_ms(self) -> i64 {
        match self {
            WindowWidth::OneMinute => TimeUtils::MS_IN_MIN,
            WindowWidth::TwoMinutes => TimeUtils::MS_IN_2_MIN,
            WindowWidth::ThreeMinutes => TimeUtils::MS_IN_3_MIN,
            WindowWidth::FiveMinutes => TimeUtils::MS_IN_5_MIN,
        }
    }

    /// Window start for `now_ms`: `floor(now / width) * width`.
    /// Uses euclidean division so pre-epoch instants still floor downwards.
    pub fn window_start_ms(self, now_ms: i64) -> i64 {
        let width_ms = self.as_ms();
        now_ms.div_euclid(width_ms) * width_ms
    }
}

/// Stable identity of one window: its start instant plus its width.
///
/// Renders as `"{start_ms}:{width}"`, e.g. `1704110400000:1m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId {
    pub start_ms: i64,
    pub width: WindowWidth,
}

impl WindowId {
    pub fn new(start_ms: i64, width: WindowWidth) -> Self {
        Self { start_ms, width }
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.start_ms, self.width)
    }
}

/// When a window counts as closed: `seconds_remaining <= threshold_secs`.
///
/// `seconds_remaining` rounds up, so it never reaches zero strictly inside a
/// window. The threshold is therefore always at least one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePolicy {
    threshold_secs: i64,
}

impl ClosePolicy {
    pub const MIN_THRESHOLD_SECS: i64 = 1;
    pub const MAX_THRESHOLD_SECS: i64 = 10;

    /// Out-of-range thresholds are clamped into `1..=10`.
    pub fn near_close(threshold_secs: i64) -> Self {
        Self {
            threshold_secs: threshold_secs.clamp(Self::MIN_THRESHOLD_SECS, Self::MAX_THRESHOLD_SECS),
        }
    }

    pub fn threshold_secs(&self) -> i64 {
        self.threshold_secs
    }

    pub fn is_closed(&self, seconds_remaining: i64) -> bool {
        seconds_remaining <= self.threshold_secs
    }
}

/// Snapshot of the window containing one instant. Recomputed on every tick, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub id: WindowId,
    pub start_ms: i64,
    pub end_ms: i64,
    pub width: WindowWidth,
    pub seconds_remaining: i64,
    pub is_closed: bool,
}

impl WindowDescriptor {
    pub fn at(now_ms: i64, width: WindowWidth, policy: ClosePolicy) -> Self {
        let start_ms = width.window_start_ms(now_ms);
        let end_ms = start_ms + width.as_ms();
        let seconds_remaining = ceil_div(end_ms - now_ms, TimeUtils::MS_IN_S).max(0);

        Self {
            id: WindowId::new(start_ms, width),
            start_ms,
            end_ms,
            width,
            seconds_remaining,
            is_closed: policy.is_closed(seconds_remaining),
        }
    }
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    // numerator is in (0, width] for any instant inside the window
    (numerator + denominator - 1).div_euclid(denominator)
}
