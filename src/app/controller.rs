//! Watering controller — the relay state machine.
//!
//! [`WateringController`] owns the relay line and the current session.
//! Every transition goes through one lock, so two racing `start()` calls
//! cannot both see Idle and a `stop()` cannot interleave with a line write.
//!
//! ```text
//!            start() ok
//!   IDLE ───────────────▶ WATERING
//!    ▲                        │
//!    └────── stop() ok ───────┘      (emits WateringEvent)
//!
//!   any ──shutdown_cleanup()──▶ IDLE, line OFF and released, no event
//! ```
//!
//! A failed start leaves the system Idle.  A failed stop leaves it
//! Watering, since the relay is assumed to still be ON, so a retried stop
//! can succeed.

use std::sync::Arc;

use embedded_hal::digital::PinState;
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::config::{RunMode, SystemConfig};
use crate::drivers::relay::{LineDriver, LineState, RelayLine};
use crate::error::{ControlError, WriteError};

use super::commands::WaterCommand;
use super::events::{WateringEvent, WateringSession};
use super::ports::{Clock, WateringEventSink};

// ───────────────────────────────────────────────────────────────
// WateringController
// ───────────────────────────────────────────────────────────────

pub struct WateringController<D: LineDriver> {
    mode: RunMode,
    channel: u32,
    sink: Arc<dyn WateringEventSink>,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<D>>,
}

struct Inner<D: LineDriver> {
    driver: D,
    /// `None` until first use and again after cleanup; a released line is
    /// never reused.
    line: Option<RelayLine<D::Pin>>,
    /// `Some` exactly while watering.
    session: Option<WateringSession>,
}

impl<D: LineDriver> WateringController<D> {
    /// Construct an idle controller.  The relay line is not touched until
    /// [`initialize`](Self::initialize) or the first start.
    pub fn new(
        mode: RunMode,
        channel: u32,
        driver: D,
        sink: Arc<dyn WateringEventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!("watering: controller created (mode={mode:?}, GPIO {channel})");
        Self {
            mode,
            channel,
            sink,
            clock,
            inner: Mutex::new(Inner {
                driver,
                line: None,
                session: None,
            }),
        }
    }

    pub fn from_config(
        config: &SystemConfig,
        driver: D,
        sink: Arc<dyn WateringEventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(config.mode, config.relay_channel, driver, sink, clock)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Acquire the relay line ahead of the first start.  Only production
    /// mode opens hardware; other modes leave the line unacquired.
    pub fn initialize(&self) -> LineState {
        let mut inner = self.inner.lock();
        if self.mode.touches_hardware() {
            self.ensure_line(&mut inner);
        } else {
            info!("watering: {:?} mode, relay control simulated", self.mode);
        }
        line_state(&inner)
    }

    /// Force the relay OFF, release the line and drop any session without
    /// recording it.  Safe to call repeatedly.
    pub fn shutdown_cleanup(&self) {
        cleanup(&mut self.inner.lock());
    }

    // ── Transitions ───────────────────────────────────────────

    /// Open the relay.  Returns `false` if already watering or if the
    /// relay write failed.
    pub fn start(&self, triggered_by: &str) -> bool {
        let mut inner = self.inner.lock();
        self.start_locked(&mut inner, triggered_by)
    }

    /// Close the relay and report the session.  Returns `false` if idle or
    /// if the relay write failed.
    pub fn stop(&self) -> bool {
        let event = {
            let mut inner = self.inner.lock();
            self.stop_locked(&mut inner)
        };
        self.finish(event)
    }

    /// Drive the relay to `on`.  Requesting the current state is a
    /// successful no-op.
    pub fn set_watering(&self, on: bool, triggered_by: &str) -> bool {
        let event = {
            let mut inner = self.inner.lock();
            if inner.session.is_some() == on {
                debug!("watering: already {}", if on { "on" } else { "off" });
                return true;
            }
            if on {
                return self.start_locked(&mut inner, triggered_by);
            }
            self.stop_locked(&mut inner)
        };
        self.finish(event)
    }

    /// Process an external command.  Returns the transition's success flag.
    pub fn handle_command(&self, cmd: WaterCommand) -> bool {
        match cmd {
            WaterCommand::Start { triggered_by } => self.start(&triggered_by),
            WaterCommand::Stop => self.stop(),
            WaterCommand::Set { on, triggered_by } => self.set_watering(on, &triggered_by),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    pub fn session(&self) -> Option<WateringSession> {
        self.inner.lock().session.clone()
    }

    pub fn line_state(&self) -> LineState {
        line_state(&self.inner.lock())
    }

    /// Whether the relay line fell back to simulation.  `None` while no
    /// line is held.
    pub fn line_simulated(&self) -> Option<bool> {
        self.inner.lock().line.as_ref().map(RelayLine::is_simulated)
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    // ── Internal ──────────────────────────────────────────────

    fn start_locked(&self, inner: &mut Inner<D>, triggered_by: &str) -> bool {
        if let Some(active) = &inner.session {
            info!(
                "watering: already active (triggered by {})",
                active.triggered_by
            );
            return false;
        }

        if let Err(e) = self.drive(inner, PinState::High) {
            report_failure("start", e);
            return false;
        }

        inner.session = Some(WateringSession {
            started_at_ms: self.clock.now_ms(),
            triggered_by: triggered_by.to_string(),
        });
        info!("watering: started, relay ON (triggered by: {triggered_by})");
        true
    }

    fn stop_locked(&self, inner: &mut Inner<D>) -> Option<WateringEvent> {
        if inner.session.is_none() {
            info!("watering: not active, nothing to stop");
            return None;
        }

        if let Err(e) = self.drive(inner, PinState::Low) {
            report_failure("stop", e);
            return None;
        }

        let event = inner
            .session
            .take()
            .map(|session| session.complete(self.clock.now_ms()));
        info!("watering: stopped, relay OFF");
        event
    }

    /// Emit a completed session outside the lock.  The sink result never
    /// changes the outcome of the stop.
    fn finish(&self, event: Option<WateringEvent>) -> bool {
        let Some(event) = event else {
            return false;
        };
        match self.sink.record_watering_event(&event) {
            Ok(()) => info!(
                "watering: event logged, {} seconds (triggered by {})",
                event.duration_secs, event.triggered_by
            ),
            Err(e) => warn!("watering: event not persisted: {e}"),
        }
        true
    }

    fn drive(&self, inner: &mut Inner<D>, level: PinState) -> Result<(), ControlError> {
        match self.mode {
            RunMode::Build => Err(ControlError::HardwareDisabled),
            RunMode::Development => {
                debug!("watering: relay {level:?} (simulated)");
                Ok(())
            }
            RunMode::Production => {
                let line = self.ensure_line(inner);
                line.write(level)?;
                Ok(())
            }
        }
    }

    /// The held line, acquiring it on first use.  Any acquisition failure
    /// falls back to a simulated line.
    fn ensure_line<'a>(&self, inner: &'a mut Inner<D>) -> &'a mut RelayLine<D::Pin> {
        let channel = self.channel;
        let Inner { driver, line, .. } = inner;
        line.get_or_insert_with(|| match RelayLine::acquire(driver, channel) {
            Ok(line) => line,
            Err(e) => {
                warn!("relay: hardware unavailable ({e}), falling back to simulation");
                RelayLine::simulated(channel)
            }
        })
    }
}

impl<D: LineDriver> Drop for WateringController<D> {
    fn drop(&mut self) {
        cleanup(self.inner.get_mut());
    }
}

fn cleanup<D: LineDriver>(inner: &mut Inner<D>) {
    if let Some(mut line) = inner.line.take() {
        line.release();
    }
    if let Some(session) = inner.session.take() {
        warn!(
            "watering: session started at {} (triggered by {}) abandoned on shutdown",
            session.started_at_ms, session.triggered_by
        );
    }
}

fn line_state<D: LineDriver>(inner: &Inner<D>) -> LineState {
    inner
        .line
        .as_ref()
        .map_or(LineState::Unacquired, RelayLine::state)
}

fn report_failure(op: &str, e: ControlError) {
    if e == ControlError::Write(WriteError::NotAcquired) {
        error!("watering: {op} hit a released relay line (logic fault)");
    } else {
        error!("watering: failed to {op}: {e}");
    }
}
