//! Scheduler configuration: compile-time defaults plus the runtime config.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::domain::{ClosePolicy, TrackedInstrument, WindowWidth};

/// Bounds for the minimum-confidence slider
pub struct ConfidenceBounds {
    pub min: u8,
    pub max: u8,
    pub default: u8,
}

/// Timer cadences
pub struct CadenceSettings {
    // Window calculator re-evaluation period (milliseconds)
    pub clock_tick_ms: u64,
    // Attention rotation period (seconds). Unrelated to the window width.
    pub rotation_period_secs: u64,
    // Asynchronous scoring that takes longer than this is treated as failed
    pub scoring_timeout_ms: u64,
}

/// The Master Scheduler Configuration
pub struct SchedulerDefaults {
    pub window_width: WindowWidth,
    // A window counts as closed once this many seconds (or fewer) remain
    pub close_threshold_secs: i64,
    pub confidence: ConfidenceBounds,
    pub cadence: CadenceSettings,
    // Accepted signals kept in the result buffer (newest first)
    pub signal_buffer_capacity: usize,
    pub signal_buffer_capacity_max: usize,
    // Ledger entries older than this many window widths are evicted
    pub ledger_retention_windows: u32,
}

pub const SCHEDULER: SchedulerDefaults = SchedulerDefaults {
    window_width: WindowWidth::OneMinute,
    close_threshold_secs: 5,
    confidence: ConfidenceBounds {
        min: 50,
        max: 95,
        default: 75,
    },
    cadence: CadenceSettings {
        clock_tick_ms: 1000,
        rotation_period_secs: 5,
        scoring_timeout_ms: 10_000,
    },
    signal_buffer_capacity: 30,
    signal_buffer_capacity_max: 50,
    ledger_retention_windows: 4,
};

/// Runtime configuration as read from a JSON file / CLI. Values are unchecked;
/// call [`SchedulerConfig::validate`] to get usable [`SchedulerSettings`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub window_width: String,
    pub min_confidence: i64,
    pub tracked_instruments: Vec<TrackedInstrument>,
    pub rotation_period_secs: u64,
    pub running: bool,
    pub close_threshold_secs: i64,
    pub buffer_capacity: usize,
    /// `None` keeps every processed window for the whole session
    pub ledger_retention_windows: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window_width: SCHEDULER.window_width.to_string(),
            min_confidence: SCHEDULER.confidence.default as i64,
            tracked_instruments: Vec::new(),
            rotation_period_secs: SCHEDULER.cadence.rotation_period_secs,
            running: true,
            close_threshold_secs: SCHEDULER.close_threshold_secs,
            buffer_capacity: SCHEDULER.signal_buffer_capacity,
            ledger_retention_windows: Some(SCHEDULER.ledger_retention_windows),
        }
    }
}

/// A configuration problem. Every variant is recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    InvalidWidth(String),
    MinConfidenceOutOfRange(i64),
    ZeroRotationPeriod,
    CloseThresholdOutOfRange(i64),
    BufferCapacityOutOfRange(usize),
    NoInstruments,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConfigIssue::InvalidWidth(raw) => write!(
                f,
                "window width '{}' is not one of {}, using {}",
                raw,
                WindowWidth::iter()
                    .map(|w| w.to_string())
                    .collect::<Vec<_>>()
                    .join("/"),
                SCHEDULER.window_width
            ),
            ConfigIssue::MinConfidenceOutOfRange(v) => write!(
                f,
                "min confidence {} outside {}-{}, clamped",
                v, SCHEDULER.confidence.min, SCHEDULER.confidence.max
            ),
            ConfigIssue::ZeroRotationPeriod => write!(
                f,
                "rotation period must be positive, using {}s",
                SCHEDULER.cadence.rotation_period_secs
            ),
            ConfigIssue::CloseThresholdOutOfRange(v) => write!(
                f,
                "close threshold {}s outside {}-{}s, clamped",
                v,
                ClosePolicy::MIN_THRESHOLD_SECS,
                ClosePolicy::MAX_THRESHOLD_SECS
            ),
            ConfigIssue::BufferCapacityOutOfRange(v) => write!(
                f,
                "signal buffer capacity {} outside 1-{}, clamped",
                v, SCHEDULER.signal_buffer_capacity_max
            ),
            ConfigIssue::NoInstruments => write!(f, "no tracked instruments selected"),
        }
    }
}

/// Validated, typed settings the scheduler runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub width: WindowWidth,
    pub min_confidence: u8,
    pub instruments: Vec<TrackedInstrument>,
    pub rotation_period: Duration,
    pub running: bool,
    pub close_policy: ClosePolicy,
    pub buffer_capacity: usize,
    pub ledger_retention_windows: Option<u32>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerConfig::default().validate().0
    }
}

impl SchedulerConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scheduler config {:?}", path))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scheduler config {:?}", path))?;
        Ok(config)
    }

    /// Replace every bad value with a default (or clamp it) and report what was changed.
    pub fn validate(&self) -> (SchedulerSettings, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let width = match self.window_width.trim().parse::<WindowWidth>() {
            Ok(width) => width,
            Err(_) => {
                issues.push(ConfigIssue::InvalidWidth(self.window_width.clone()));
                SCHEDULER.window_width
            }
        };

        let (lo, hi) = (
            SCHEDULER.confidence.min as i64,
            SCHEDULER.confidence.max as i64,
        );
        if !(lo..=hi).contains(&self.min_confidence) {
            issues.push(ConfigIssue::MinConfidenceOutOfRange(self.min_confidence));
        }
        let min_confidence = self.min_confidence.clamp(lo, hi) as u8;

        let rotation_secs = if self.rotation_period_secs == 0 {
            issues.push(ConfigIssue::ZeroRotationPeriod);
            SCHEDULER.cadence.rotation_period_secs
        } else {
            self.rotation_period_secs
        };

        if !(ClosePolicy::MIN_THRESHOLD_SECS..=ClosePolicy::MAX_THRESHOLD_SECS)
            .contains(&self.close_threshold_secs)
        {
            issues.push(ConfigIssue::CloseThresholdOutOfRange(
                self.close_threshold_secs,
            ));
        }

        let cap_max = SCHEDULER.signal_buffer_capacity_max;
        if !(1..=cap_max).contains(&self.buffer_capacity) {
            issues.push(ConfigIssue::BufferCapacityOutOfRange(self.buffer_capacity));
        }

        if !self.tracked_instruments.iter().any(|i| i.active) {
            issues.push(ConfigIssue::NoInstruments);
        }

        let settings = SchedulerSettings {
            width,
            min_confidence,
            instruments: self.tracked_instruments.clone(),
            rotation_period: Duration::from_secs(rotation_secs),
            running: self.running,
            close_policy: ClosePolicy::near_close(self.close_threshold_secs),
            buffer_capacity: self.buffer_capacity.clamp(1, cap_max),
            ledger_retention_windows: self.ledger_retention_windows.filter(|n| *n > 0),
        };
        (settings, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_pairs(pairs: &[&str]) -> SchedulerConfig {
        SchedulerConfig {
            tracked_instruments: pairs.iter().map(|p| TrackedInstrument::new(*p)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_validate_cleanly_once_pairs_exist() {
        let (settings, issues) = with_pairs(&["EUR/USD OTC"]).validate();
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(settings.width, WindowWidth::OneMinute);
        assert_eq!(settings.min_confidence, 75);
        assert_eq!(settings.rotation_period, Duration::from_secs(5));
        assert_eq!(settings.close_policy.threshold_secs(), 5);
        assert_eq!(settings.buffer_capacity, 30);
    }

    #[test]
    fn bad_values_fall_back_with_issues() {
        let config = SchedulerConfig {
            window_width: "15m".to_string(),
            min_confidence: 120,
            rotation_period_secs: 0,
            buffer_capacity: 0,
            ..with_pairs(&["EUR/USD OTC"])
        };
        let (settings, issues) = config.validate();

        assert_eq!(settings.width, WindowWidth::OneMinute);
        assert_eq!(settings.min_confidence, 95);
        assert_eq!(settings.rotation_period, Duration::from_secs(5));
        assert_eq!(settings.buffer_capacity, 1);
        assert!(issues.contains(&ConfigIssue::InvalidWidth("15m".to_string())));
        assert!(issues.contains(&ConfigIssue::MinConfidenceOutOfRange(120)));
        assert!(issues.contains(&ConfigIssue::ZeroRotationPeriod));
        assert!(issues.contains(&ConfigIssue::BufferCapacityOutOfRange(0)));
    }

    #[test]
    fn empty_or_all_inactive_set_is_reported() {
        let (_, issues) = SchedulerConfig::default().validate();
        assert_eq!(issues, vec![ConfigIssue::NoInstruments]);

        let config = SchedulerConfig {
            tracked_instruments: vec![TrackedInstrument::inactive("EUR/USD OTC")],
            ..Default::default()
        };
        assert!(config.validate().1.contains(&ConfigIssue::NoInstruments));
    }

    #[test]
    fn json_config_uses_defaults_for_missing_fields() {
        let config: SchedulerConfig = serde_json::from_str(
            r#"{"window_width":"5m","tracked_instruments":[{"name":"AUD/CAD OTC"}]}"#,
        )
        .unwrap();
        let (settings, issues) = config.validate();
        assert!(issues.is_empty());
        assert_eq!(settings.width, WindowWidth::FiveMinutes);
        assert_eq!(settings.ledger_retention_windows, Some(4));
    }
}
