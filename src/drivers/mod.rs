//! Relay line drivers.

#[cfg(feature = "rpi")]
pub mod cdev;
pub mod relay;
