//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ WateringController (domain)
//! ```
//!
//! Driven adapters (event log, clock) implement these traits.  The
//! controller holds them as shared trait objects so the HTTP layer and the
//! shutdown path can reach the same instance from any task.

use crate::error::SinkError;

use super::events::{WateringEvent, WateringRecord};

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → persistence)
// ───────────────────────────────────────────────────────────────

/// Receives every completed watering session.
///
/// Called at most once per successful stop, never retried.  Implementations
/// provide their own single-writer safety.
pub trait WateringEventSink: Send + Sync {
    fn record_watering_event(&self, event: &WateringEvent) -> Result<(), SinkError>;
}

// ───────────────────────────────────────────────────────────────
// History port (driven adapter: persistence → HTTP)
// ───────────────────────────────────────────────────────────────

/// Read side of the event log.  Results are ordered newest first.
pub trait WateringHistory: Send + Sync {
    /// The `limit` most recent records.
    fn recent(&self, limit: usize) -> Result<Vec<WateringRecord>, SinkError>;

    /// Records whose start timestamp lies in `[start_ms, end_ms]`.
    fn in_range(&self, start_ms: i64, end_ms: i64) -> Result<Vec<WateringRecord>, SinkError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for session timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}
