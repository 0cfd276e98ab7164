//! Plant watering station — relay control library.
//!
//! Exposes the watering controller, its relay driver and adapters for
//! integration testing and for the `plantwater` daemon.  Real GPIO access
//! is compiled in only with the `rpi` feature; without it the controller
//! falls back to a simulated relay line.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
