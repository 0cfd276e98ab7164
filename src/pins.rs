//! GPIO assignments for the watering station (Raspberry Pi, BCM numbering).
//!
//! Single source of truth for the defaults; [`SystemConfig`](crate::config::SystemConfig)
//! may override them at startup.

// ---------------------------------------------------------------------------
// Watering relay
// ---------------------------------------------------------------------------

/// Character device of the Pi's main GPIO controller.
pub const GPIO_CHIP_PATH: &str = "/dev/gpiochip0";

/// Relay coil driving the pump. HIGH = relay ON = water flowing.
pub const RELAY_GPIO: u32 = 18;

/// Consumer label shown by `gpioinfo` for lines we hold.
pub const CONSUMER_LABEL: &str = "plantwater";
