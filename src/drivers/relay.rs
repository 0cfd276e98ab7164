//! Watering relay line driver.
//!
//! One digital output channel, either backed by a real pin opened through a
//! [`LineDriver`] or simulated in memory.  Both variants share the same
//! acquisition lifecycle:
//!
//! ```text
//!  (none) ──acquire/simulated──▶ ACQUIRED ──release──▶ RELEASED (terminal)
//! ```
//!
//! ## Safety contract
//!
//! A line always starts at LOW (relay OFF) and is forced LOW before its
//! handle is dropped.  If the initial LOW write fails the handle is dropped
//! immediately and acquisition fails, so a half-initialised relay is never
//! left energised.

use core::convert::Infallible;

use embedded_hal::digital::{Error as _, ErrorType, OutputPin, PinState};
use log::{error, info, warn};

use crate::error::{AcquireError, WriteError};

// ---------------------------------------------------------------------------
// Driver seam
// ---------------------------------------------------------------------------

/// Opens output pins on the real GPIO controller.
pub trait LineDriver {
    type Pin: OutputPin;

    /// Request `channel` as an output.  The returned pin's level is
    /// unspecified until the caller writes it.
    fn open_output(&mut self, channel: u32) -> Result<Self::Pin, AcquireError>;
}

/// Driver used when no GPIO backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDriver;

impl LineDriver for NoDriver {
    type Pin = SimulatedPin;

    fn open_output(&mut self, _channel: u32) -> Result<SimulatedPin, AcquireError> {
        Err(AcquireError::DriverUnavailable)
    }
}

/// In-memory pin that never fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedPin {
    high: bool,
}

impl ErrorType for SimulatedPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RelayLine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Unacquired,
    Acquired,
    Released,
}

enum Backend<P> {
    Hardware(P),
    Simulated,
    Detached,
}

pub struct RelayLine<P> {
    channel: u32,
    level: PinState,
    state: LineState,
    backend: Backend<P>,
}

impl<P: OutputPin> RelayLine<P> {
    /// Open `channel` through `driver`, configure it as output and drive it LOW.
    pub fn acquire<D>(driver: &mut D, channel: u32) -> Result<Self, AcquireError>
    where
        D: LineDriver<Pin = P>,
    {
        let mut pin = driver.open_output(channel)?;
        if let Err(e) = pin.set_low() {
            error!("relay: GPIO {channel} rejected initial OFF write: {e:?}");
            // Dropping `pin` here releases the handle.
            return Err(AcquireError::InitFailed(e.kind()));
        }
        info!("relay: initialised on GPIO {channel}");
        Ok(Self {
            channel,
            level: PinState::Low,
            state: LineState::Acquired,
            backend: Backend::Hardware(pin),
        })
    }

    /// A line that only tracks its level in memory.
    pub fn simulated(channel: u32) -> Self {
        info!("relay: GPIO {channel} simulated");
        Self {
            channel,
            level: PinState::Low,
            state: LineState::Acquired,
            backend: Backend::Simulated,
        }
    }

    pub fn write(&mut self, level: PinState) -> Result<(), WriteError> {
        let channel = self.channel;
        match &mut self.backend {
            Backend::Hardware(pin) => {
                pin.set_state(level).map_err(|e| {
                    warn!("relay: GPIO {channel} write {level:?} failed: {e:?}");
                    WriteError::Pin(e.kind())
                })?;
            }
            Backend::Simulated => {}
            Backend::Detached => return Err(WriteError::NotAcquired),
        }
        self.level = level;
        Ok(())
    }

    /// Force the line LOW and drop the handle.  Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.state == LineState::Released {
            return;
        }
        if let Err(e) = self.write(PinState::Low) {
            error!("relay: GPIO {} could not be forced OFF on release: {e}", self.channel);
        }
        self.backend = Backend::Detached;
        self.state = LineState::Released;
        info!("relay: GPIO {} released", self.channel);
    }

    /// Current level, `None` once released.
    pub fn level(&self) -> Option<PinState> {
        match self.state {
            LineState::Acquired => Some(self.level),
            _ => None,
        }
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.backend, Backend::Simulated)
    }
}
