//! Inbound commands to the watering controller.
//!
//! These represent actions requested by the outside world (HTTP toggle,
//! scheduled jobs) that the
//! [`WateringController`](super::controller::WateringController) interprets.

/// Trigger tag used when the caller does not name one.
pub const DEFAULT_TRIGGER: &str = "manual";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaterCommand {
    /// Open the relay.  Fails if already watering.
    Start { triggered_by: String },

    /// Close the relay and record the session.  Fails if idle.
    Stop,

    /// Drive the relay to the requested state.  Succeeds without doing
    /// anything if it is already there.
    Set { on: bool, triggered_by: String },
}

impl WaterCommand {
    pub fn start(triggered_by: impl Into<String>) -> Self {
        Self::Start {
            triggered_by: triggered_by.into(),
        }
    }

    pub fn set(on: bool, triggered_by: Option<String>) -> Self {
        Self::Set {
            on,
            triggered_by: triggered_by.unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
        }
    }
}
