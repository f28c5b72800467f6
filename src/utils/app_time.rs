// src/utils/app_time.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use super::time_utils::utc_now_as_timestamp_ms;

/// Source of wall-clock instants (epoch milliseconds) for the window calculator.
///
/// Nothing downstream assumes the readings are monotonic: a clock stepping
/// backwards just yields a different (earlier) window.
pub trait WallClock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_ms(&self) -> i64 {
        utc_now_as_timestamp_ms()
    }
}

/// Hand-driven clock for tests and replays. Clones share the same reading.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl WallClock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
