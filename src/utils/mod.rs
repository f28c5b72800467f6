// Time helpers shared by the window calculator and the runtime
pub mod app_time;
pub mod time_utils;

pub use app_time::{ManualClock, SystemClock, WallClock};
pub use time_utils::TimeUtils;
