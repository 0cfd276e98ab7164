//! Outbound watering records.
//!
//! The [`WateringController`](super::controller::WateringController) emits a
//! [`WateringEvent`] through the
//! [`WateringEventSink`](super::ports::WateringEventSink) port each time a
//! session completes.  The event log stores it as a [`WateringRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One watering activation, from `start()` until now or until `stop()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WateringSession {
    /// Wall-clock start, milliseconds since the Unix epoch.
    pub started_at_ms: i64,
    pub triggered_by: String,
}

impl WateringSession {
    /// Whole seconds elapsed at `now_ms`, rounded down.  A clock that went
    /// backwards yields zero.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        (now_ms.saturating_sub(self.started_at_ms).max(0) / 1000) as u64
    }

    /// Close the session at `now_ms`.
    pub fn complete(self, now_ms: i64) -> WateringEvent {
        WateringEvent {
            duration_secs: self.elapsed_secs(now_ms),
            start_ms: self.started_at_ms,
            triggered_by: self.triggered_by,
        }
    }
}

/// A completed watering session handed to the event sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WateringEvent {
    pub start_ms: i64,
    pub duration_secs: u64,
    pub triggered_by: String,
}

/// A stored watering event as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WateringRecord {
    pub id: u64,
    /// Session start, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub duration_seconds: u64,
    pub triggered_by: String,
    pub created_at: DateTime<Utc>,
}
