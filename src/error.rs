//! Unified error types for the watering controller.
//!
//! Every subsystem has its own small error enum; all of them convert into
//! the crate-level [`Error`] so callers that just want to bubble a failure
//! up can use `?`.  The controller itself never propagates these to the
//! HTTP layer: hardware failures end as a `false` return plus a log line.

use core::fmt;

use embedded_hal::digital::ErrorKind;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The relay line could not be acquired.
    Acquire(AcquireError),
    /// A write to the relay line failed.
    Write(WriteError),
    /// A start/stop transition failed.
    Control(ControlError),
    /// The watering event log rejected a record or query.
    Sink(SinkError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquire(e) => write!(f, "acquire: {e}"),
            Self::Write(e) => write!(f, "write: {e}"),
            Self::Control(e) => write!(f, "control: {e}"),
            Self::Sink(e) => write!(f, "event log: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Line acquisition
// ---------------------------------------------------------------------------

/// Failure to open a relay line on real hardware.
///
/// Never escapes the controller: every variant is answered by falling back
/// to the simulated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The GPIO driver or chip device could not be opened.
    DriverUnavailable,
    /// Another consumer already holds the channel.
    ChannelBusy { channel: u32 },
    /// The chip has no line at this offset.
    InvalidChannel { channel: u32 },
    /// The line opened but the initial OFF write was rejected.
    InitFailed(ErrorKind),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriverUnavailable => write!(f, "GPIO driver unavailable"),
            Self::ChannelBusy { channel } => write!(f, "channel {channel} busy"),
            Self::InvalidChannel { channel } => write!(f, "no such channel {channel}"),
            Self::InitFailed(kind) => write!(f, "initial OFF write failed ({kind:?})"),
        }
    }
}

impl From<AcquireError> for Error {
    fn from(e: AcquireError) -> Self {
        Self::Acquire(e)
    }
}

// ---------------------------------------------------------------------------
// Line writes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// Write attempted before acquisition or after release.
    NotAcquired,
    /// The pin driver rejected the write.
    Pin(ErrorKind),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAcquired => write!(f, "line not acquired"),
            Self::Pin(kind) => write!(f, "pin write failed ({kind:?})"),
        }
    }
}

impl From<WriteError> for Error {
    fn from(e: WriteError) -> Self {
        Self::Write(e)
    }
}

// ---------------------------------------------------------------------------
// Controller transitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// The relay write during a transition failed.
    Write(WriteError),
    /// The controller runs in build mode and must not touch hardware.
    HardwareDisabled,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(e) => write!(f, "relay write failed: {e}"),
            Self::HardwareDisabled => write!(f, "hardware disabled in build mode"),
        }
    }
}

impl From<WriteError> for ControlError {
    fn from(e: WriteError) -> Self {
        Self::Write(e)
    }
}

impl From<ControlError> for Error {
    fn from(e: ControlError) -> Self {
        Self::Control(e)
    }
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The backing file could not be read or written.
    Io(std::io::ErrorKind),
    /// A record could not be serialised.
    Encode,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
            Self::Encode => write!(f, "record encoding failed"),
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    Io(std::io::ErrorKind),
    /// The config file is not valid JSON for [`SystemConfig`](crate::config::SystemConfig).
    Corrupted(String),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
            Self::Corrupted(msg) => write!(f, "config corrupted: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
