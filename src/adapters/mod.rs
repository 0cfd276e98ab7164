//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                          | Connects to            |
//! |-------------|-------------------------------------|------------------------|
//! | `event_log` | WateringEventSink, WateringHistory  | JSON-lines file / RAM  |
//! | `http`      | —                                   | axum router            |
//! | `time`      | Clock                               | system real-time clock |

pub mod event_log;
pub mod http;
pub mod time;
