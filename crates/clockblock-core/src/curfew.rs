//! Night-owl (curfew) evaluation.
//!
//! The window is a plain closed interval `[window_start, window_end]` within
//! one day. It never wraps past midnight: a window whose start is after its
//! end cannot contain any time, so every moment reports night owl.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::schedule::{DayConfig, TimeOfDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurfewStatus {
    pub night_owl: bool,
    pub now: TimeOfDay,
    pub window_start: TimeOfDay,
    pub window_end: TimeOfDay,
}

/// True when `now` falls outside the day's play window.
pub fn is_night_owl(now: TimeOfDay, day: &DayConfig) -> bool {
    now < day.window_start || now > day.window_end
}

/// Evaluate with the window echoed back for display.
pub fn evaluate(now: TimeOfDay, day: &DayConfig) -> CurfewStatus {
    if day.window_start > day.window_end {
        warn!(
            day = %day.day_name,
            start = %day.window_start,
            end = %day.window_end,
            "play window starts after it ends; it does not wrap midnight"
        );
    }
    CurfewStatus {
        night_owl: is_night_owl(now, day),
        now,
        window_start: day.window_start,
        window_end: day.window_end,
    }
}
