//! Application core — the watering state machine and its ports.
//!
//! All interaction with the relay hardware, the event log and the clock
//! happens through the driver seam and the **port traits** defined in
//! [`ports`], keeping this layer testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
