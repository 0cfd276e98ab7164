//! Integration tests for the WateringController → RelayLine → event sink
//! pipeline.
//!
//! These run on the host and drive the controller through mock relay
//! hardware, a manual clock and a recording sink.

use std::sync::Arc;
use std::thread;

use embedded_hal::digital::PinState;

use plantwater::app::commands::WaterCommand;
use plantwater::app::events::WateringEvent;
use plantwater::config::RunMode;
use plantwater::drivers::relay::LineState;
use plantwater::error::AcquireError;

use super::mock_hw::Rig;

// ── Idempotence ───────────────────────────────────────────────

#[test]
fn second_start_is_rejected_and_writes_once() {
    let rig = Rig::new(RunMode::Production);

    assert!(rig.controller.start("manual"));
    assert!(!rig.controller.start("manual"));

    assert!(rig.controller.status());
    assert_eq!(rig.trace.count(PinState::High), 1);
    // Initial OFF on acquisition, then a single ON.
    assert_eq!(rig.trace.writes(), vec![PinState::Low, PinState::High]);
}

#[test]
fn stop_while_idle_does_nothing() {
    let rig = Rig::new(RunMode::Production);

    assert!(!rig.controller.stop());

    assert!(rig.trace.writes().is_empty());
    assert!(rig.sink.events().is_empty());
    assert_eq!(rig.controller.line_state(), LineState::Unacquired);
}

// ── Duration accounting ───────────────────────────────────────

#[test]
fn duration_is_whole_seconds_between_start_and_stop() {
    let rig = Rig::new(RunMode::Production);

    rig.clock.set(1_000);
    assert!(rig.controller.start("manual"));
    rig.clock.set(5_000);
    assert!(rig.controller.stop());

    assert_eq!(
        rig.sink.events(),
        vec![WateringEvent {
            start_ms: 1_000,
            duration_secs: 4,
            triggered_by: "manual".into(),
        }]
    );
    assert_eq!(rig.trace.last(), Some(PinState::Low));
    assert!(!rig.controller.status());
}

#[test]
fn session_exposes_start_and_trigger() {
    let rig = Rig::new(RunMode::Production);
    rig.clock.set(42_000);
    assert!(rig.controller.start("scheduled"));

    let session = rig.controller.session().expect("session while watering");
    assert_eq!(session.started_at_ms, 42_000);
    assert_eq!(session.triggered_by, "scheduled");
}

// ── Fail-safe acquisition ─────────────────────────────────────

#[test]
fn unavailable_driver_falls_back_to_simulation() {
    let rig = Rig::refusing(RunMode::Production, AcquireError::DriverUnavailable);

    assert!(rig.controller.start("manual"));
    assert!(rig.controller.status());
    assert_eq!(rig.controller.line_simulated(), Some(true));
    assert!(rig.trace.writes().is_empty());

    assert!(rig.controller.stop());
    assert_eq!(rig.sink.events().len(), 1);
}

#[test]
fn busy_channel_falls_back_to_simulation() {
    let rig = Rig::refusing(
        RunMode::Production,
        AcquireError::ChannelBusy { channel: 18 },
    );
    assert_eq!(rig.controller.initialize(), LineState::Acquired);
    assert_eq!(rig.controller.line_simulated(), Some(true));
    assert!(rig.controller.start("manual"));
}

#[test]
fn failed_initial_off_write_drops_the_handle() {
    let rig = Rig::new(RunMode::Production);
    rig.trace.fail_next(1);

    assert!(rig.controller.start("manual"));

    // The real pin was dropped and the controller runs simulated.
    assert_eq!(rig.trace.open_pins(), 0);
    assert_eq!(rig.controller.line_simulated(), Some(true));
    assert!(rig.trace.writes().is_empty());
}

#[test]
fn initialize_acquires_real_line_in_production() {
    let rig = Rig::new(RunMode::Production);
    assert_eq!(rig.controller.initialize(), LineState::Acquired);
    assert_eq!(rig.controller.line_simulated(), Some(false));
    assert_eq!(rig.trace.writes(), vec![PinState::Low]);
    assert_eq!(rig.trace.open_pins(), 1);
}

// ── Shutdown safety ───────────────────────────────────────────

#[test]
fn shutdown_while_watering_forces_off_without_event() {
    let rig = Rig::new(RunMode::Production);
    assert!(rig.controller.start("manual"));

    rig.controller.shutdown_cleanup();

    assert_eq!(rig.trace.last(), Some(PinState::Low));
    assert!(rig.sink.events().is_empty());
    assert!(!rig.controller.status());
    assert_eq!(rig.trace.open_pins(), 0);

    let writes_before = rig.trace.writes().len();
    rig.controller.shutdown_cleanup();
    assert_eq!(rig.trace.writes().len(), writes_before);
    assert!(!rig.controller.status());
}

#[test]
fn shutdown_without_line_is_safe() {
    let rig = Rig::new(RunMode::Production);
    rig.controller.shutdown_cleanup();
    rig.controller.shutdown_cleanup();
    assert!(rig.trace.writes().is_empty());
    assert_eq!(rig.controller.line_state(), LineState::Unacquired);
}

#[test]
fn shutdown_in_development_clears_session() {
    let rig = Rig::new(RunMode::Development);
    assert!(rig.controller.start("manual"));
    rig.controller.shutdown_cleanup();
    assert!(!rig.controller.status());
    assert!(rig.sink.events().is_empty());
}

#[test]
fn dropping_the_controller_releases_the_relay() {
    let rig = Rig::new(RunMode::Production);
    let trace = rig.trace.clone();
    assert!(rig.controller.start("manual"));

    drop(rig);

    assert_eq!(trace.last(), Some(PinState::Low));
    assert_eq!(trace.open_pins(), 0);
}

// ── Write failures ────────────────────────────────────────────

#[test]
fn failed_stop_keeps_watering_until_retry() {
    let rig = Rig::new(RunMode::Production);
    rig.clock.set(0);
    assert!(rig.controller.start("manual"));

    rig.trace.fail_next(1);
    rig.clock.set(3_000);
    assert!(!rig.controller.stop());
    assert!(rig.controller.status());
    assert!(rig.sink.events().is_empty());
    assert_eq!(rig.trace.last(), Some(PinState::High));

    rig.clock.set(6_000);
    assert!(rig.controller.stop());
    assert!(!rig.controller.status());
    assert_eq!(rig.sink.events()[0].duration_secs, 6);
}

#[test]
fn failed_start_stays_idle() {
    let rig = Rig::new(RunMode::Production);
    assert_eq!(rig.controller.initialize(), LineState::Acquired);

    rig.trace.fail_next(1);
    assert!(!rig.controller.start("manual"));
    assert!(!rig.controller.status());
    assert!(rig.controller.session().is_none());

    assert!(rig.controller.start("manual"));
    assert!(rig.controller.status());
}

#[test]
fn sink_failure_does_not_fail_stop() {
    let rig = Rig::new(RunMode::Production);
    rig.sink.break_storage();

    assert!(rig.controller.start("manual"));
    assert!(rig.controller.stop());
    assert!(!rig.controller.status());
    assert_eq!(rig.trace.last(), Some(PinState::Low));
}

// ── Modes ─────────────────────────────────────────────────────

#[test]
fn development_mode_end_to_end() {
    let rig = Rig::new(RunMode::Development);
    rig.clock.set(1_700_000_000_000);

    assert!(rig.controller.start("scheduled"));
    assert!(rig.controller.status());

    rig.clock.advance(10_000);
    assert!(rig.controller.stop());

    assert_eq!(
        rig.sink.events(),
        vec![WateringEvent {
            start_ms: 1_700_000_000_000,
            duration_secs: 10,
            triggered_by: "scheduled".into(),
        }]
    );
    assert!(!rig.controller.status());
    assert!(rig.trace.writes().is_empty());
    assert_eq!(rig.controller.line_state(), LineState::Unacquired);
}

#[test]
fn build_mode_never_opens_hardware() {
    let rig = Rig::new(RunMode::Build);
    assert_eq!(rig.controller.initialize(), LineState::Unacquired);
    assert!(!rig.controller.start("manual"));
    assert!(!rig.controller.status());
    assert_eq!(rig.trace.open_pins(), 0);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn set_command_follows_toggle_semantics() {
    let rig = Rig::new(RunMode::Production);

    assert!(rig.controller.handle_command(WaterCommand::set(false, None)));
    assert!(rig.trace.writes().is_empty());

    assert!(rig.controller.handle_command(WaterCommand::set(true, None)));
    assert!(rig.controller.handle_command(WaterCommand::set(true, None)));
    assert_eq!(rig.trace.count(PinState::High), 1);

    assert!(rig.controller.handle_command(WaterCommand::set(false, None)));
    let events = rig.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].triggered_by, "manual");
}

#[test]
fn start_and_stop_commands() {
    let rig = Rig::new(RunMode::Production);
    assert!(rig.controller.handle_command(WaterCommand::start("scheduled")));
    assert!(!rig.controller.handle_command(WaterCommand::start("manual")));
    assert!(rig.controller.handle_command(WaterCommand::Stop));
    assert!(!rig.controller.handle_command(WaterCommand::Stop));
    assert_eq!(rig.sink.events()[0].triggered_by, "scheduled");
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn concurrent_starts_open_one_session() {
    let rig = Arc::new(Rig::new(RunMode::Production));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let rig = Arc::clone(&rig);
            thread::spawn(move || rig.controller.start("manual"))
        })
        .collect();
    let wins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|started| *started)
        .count();

    assert_eq!(wins, 1);
    assert_eq!(rig.trace.count(PinState::High), 1);
}
