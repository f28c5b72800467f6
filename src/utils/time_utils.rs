use chrono::{DateTime, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_2_MIN: i64 = Self::MS_IN_S * 60 * 2;
    pub const MS_IN_3_MIN: i64 = Self::MS_IN_S * 60 * 3;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_S * 60 * 5;
    pub const CLOCK_TIME_FORMAT: &str = "%H:%M:%S";
}

/// Wall-clock `HH:MM:SS` (UTC) for an epoch-millisecond instant. Display only.
pub fn epoch_ms_to_clock(epoch_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(dt) => dt.format(TimeUtils::CLOCK_TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Countdown text such as `0:57` for a number of seconds.
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn utc_now_as_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_pads_seconds() {
        assert_eq!(format_countdown(57), "0:57");
        assert_eq!(format_countdown(183), "3:03");
        assert_eq!(format_countdown(-4), "0:00");
    }

    #[test]
    fn clock_format_is_utc() {
        // 2024-01-01T12:00:57Z
        assert_eq!(epoch_ms_to_clock(1_704_110_457_000), "12:00:57");
    }
}
