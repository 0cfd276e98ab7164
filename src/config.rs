//! System configuration parameters
//!
//! All tunable parameters for the watering station.  Resolved once at
//! startup: defaults, then an optional JSON file, then `PLANTWATER_*`
//! environment overrides, then validation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{self, ConfigError};
use crate::pins;

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

/// Execution context of the process.
///
/// Decides whether the controller may touch the relay hardware at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// No hardware attached; relay operations only change logical state.
    Development,
    /// Packaging/CI context; hardware must never be opened.
    Build,
    /// Target device; real relay with simulated fallback.
    #[default]
    Production,
}

impl RunMode {
    /// Resolve the mode from the environment name and the building flag.
    ///
    /// A non-empty building flag wins over everything else.
    pub fn resolve(env: Option<&str>, building: Option<&str>) -> Self {
        if building.is_some_and(|b| !b.trim().is_empty()) {
            return Self::Build;
        }
        match env.map(|e| e.trim().to_ascii_lowercase()).as_deref() {
            Some("development" | "dev") => Self::Development,
            _ => Self::Production,
        }
    }

    /// Whether this mode is allowed to open the real GPIO line.
    pub fn touches_hardware(self) -> bool {
        matches!(self, Self::Production)
    }
}

// ---------------------------------------------------------------------------
// SystemConfig
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub mode: RunMode,

    // --- Relay ---
    /// GPIO character device holding the relay line
    pub gpio_chip: String,
    /// Relay line offset on the chip
    pub relay_channel: u32,
    /// Consumer label attached to the requested line
    pub consumer_label: String,

    // --- HTTP ---
    pub bind_addr: String,

    // --- Event log ---
    /// JSON-lines file for completed watering events; `None` keeps them in memory
    pub event_log_path: Option<PathBuf>,
    /// Default number of events returned by the history endpoint
    pub history_limit: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Production,

            gpio_chip: pins::GPIO_CHIP_PATH.to_string(),
            relay_channel: pins::RELAY_GPIO,
            consumer_label: pins::CONSUMER_LABEL.to_string(),

            bind_addr: "0.0.0.0:3000".to_string(),

            event_log_path: Some(PathBuf::from("plantwater-events.jsonl")),
            history_limit: 50,
        }
    }
}

impl SystemConfig {
    /// Load the configuration from an optional JSON file and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> error::Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file.  Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.kind()))?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Apply `PLANTWATER_*` overrides obtained through `lookup`.
    ///
    /// Unparsable numeric values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let env = lookup("PLANTWATER_ENV");
        let building = lookup("PLANTWATER_BUILDING");
        if env.is_some() || building.is_some() {
            self.mode = RunMode::resolve(env.as_deref(), building.as_deref());
        }

        if let Some(raw) = lookup("PLANTWATER_RELAY_CHANNEL") {
            match raw.trim().parse() {
                Ok(channel) => self.relay_channel = channel,
                Err(_) => warn!("config: ignoring PLANTWATER_RELAY_CHANNEL={raw:?}"),
            }
        }
        if let Some(chip) = lookup("PLANTWATER_GPIO_CHIP") {
            self.gpio_chip = chip;
        }
        if let Some(bind) = lookup("PLANTWATER_BIND") {
            self.bind_addr = bind;
        }
        if let Some(path) = lookup("PLANTWATER_EVENT_LOG") {
            self.event_log_path = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gpio_chip.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("gpio_chip must not be empty"));
        }
        if self.consumer_label.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("consumer_label must not be empty"));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ValidationFailed("history_limit must be at least 1"));
        }
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationFailed("bind_addr is not a socket address"));
        }
        Ok(())
    }
}
