//! Wall-clock time adapter.
//!
//! Provides session timestamps for the watering controller.  Timestamps
//! are wall-clock milliseconds so they stay comparable with the stored
//! history across restarts.

use chrono::Utc;

use crate::app::ports::Clock;

/// Clock backed by the system's real-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
