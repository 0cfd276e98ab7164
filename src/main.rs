//! Plant watering daemon — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  axum router      EventLog             SystemClock           │
//! │  (toggle/status)  (Sink + History)     (Clock)               │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          WateringController (state machine)            │  │
//! │  │          RelayLine: CdevDriver | simulated             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use plantwater::adapters::event_log::EventLog;
use plantwater::adapters::http::{self, ApiState};
use plantwater::adapters::time::SystemClock;
use plantwater::app::controller::WateringController;
use plantwater::config::SystemConfig;
use plantwater::drivers::relay::{LineDriver, LineState};

#[derive(Debug, Parser)]
#[command(name = "plantwater", version, about = "Watering relay controller")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file and PLANTWATER_BIND
    #[arg(short, long)]
    bind: Option<String>,
}

// ── Main ──────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Logging ────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("plantwater v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let mut config = SystemConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
        config.validate().context("validating --bind")?;
    }
    info!(
        "Config: mode={:?}, relay=GPIO {} on {}",
        config.mode, config.relay_channel, config.gpio_chip
    );

    // ── 3. Relay driver ───────────────────────────────────────
    #[cfg(feature = "rpi")]
    let driver = plantwater::drivers::cdev::CdevDriver::new(
        config.gpio_chip.clone(),
        config.consumer_label.clone(),
    );
    #[cfg(not(feature = "rpi"))]
    let driver = plantwater::drivers::relay::NoDriver;

    serve(config, driver).await
}

async fn serve<D>(config: SystemConfig, driver: D) -> Result<()>
where
    D: LineDriver + Send + 'static,
    D::Pin: Send + 'static,
{
    // ── 4. Event log ──────────────────────────────────────────
    let event_log = Arc::new(match &config.event_log_path {
        Some(path) => EventLog::open(path).unwrap_or_else(|e| {
            // Keep watering control alive; history is lost for this run.
            warn!(
                "Event log {} unavailable ({}), keeping events in memory",
                path.display(),
                e
            );
            EventLog::in_memory()
        }),
        None => EventLog::in_memory(),
    });

    // ── 5. Controller ─────────────────────────────────────────
    let controller = Arc::new(WateringController::from_config(
        &config,
        driver,
        event_log.clone(),
        Arc::new(SystemClock::new()),
    ));
    if controller.initialize() == LineState::Acquired && controller.line_simulated() == Some(true)
    {
        warn!("Relay running simulated: no GPIO hardware available");
    }

    // ── 6. HTTP ───────────────────────────────────────────────
    let app = http::router(ApiState {
        controller: controller.clone(),
        history: event_log,
        history_limit: config.history_limit,
    });

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Listening on {addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await;

    // ── 7. Shutdown ───────────────────────────────────────────
    // Runs even if the server failed, so the relay is never left ON.
    controller.shutdown_cleanup();
    info!("Relay cleaned up, exiting");

    served.context("HTTP server failed")
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("SIGTERM received"),
                    _ = sigint.recv() => info!("SIGINT received"),
                }
            }
            _ => {
                warn!("Signal handlers unavailable, falling back to Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
