//! Unified error types for the interlock firmware.
//!
//! A single `Error` enum that every subsystem converts into. All variants
//! are `Copy` so they can be handed to the fault monitor and the event sink
//! from interrupt context without allocation.
//!
//! Only two faults are recoverable at runtime (see [`FaultKind`]); a failed
//! breath test is a normal branch of the session, never an error.

use core::fmt;

use crate::scheduler::Channel;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A breath-sensor conversion produced an implausible value.
    Sensor(SensorFault),
    /// A timer channel fired when no episode could use it.
    Timer(TimerFault),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl Error {
    /// Recoverable fault category, if this error is one of the runtime
    /// faults that are logged and ignored.
    pub const fn kind(&self) -> Option<FaultKind> {
        match self {
            Self::Sensor(_) => Some(FaultKind::Sensor),
            Self::Timer(_) => Some(FaultKind::TimerMisconfiguration),
            Self::Config(_) | Self::Init(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Conversion result above the 12-bit ADC ceiling.
    OutOfRange { raw: u16 },
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { raw } => write!(f, "reading {raw} out of range"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Timer faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFault {
    /// The channel fired while the session had no active breath episode.
    NoActiveEpisode(Channel),
}

impl fmt::Display for TimerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveEpisode(ch) => write!(f, "{ch:?} fired with no active episode"),
        }
    }
}

impl From<TimerFault> for Error {
    fn from(e: TimerFault) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Fault identity
// ---------------------------------------------------------------------------

/// Recoverable fault categories, tracked as a bitmask by
/// [`FaultMonitor`](crate::faults::FaultMonitor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultKind {
    Sensor = 0b0000_0001,
    TimerMisconfiguration = 0b0000_0010,
}

impl FaultKind {
    pub const ALL: [Self; 2] = [Self::Sensor, Self::TimerMisconfiguration];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Sensor => 0,
            Self::TimerMisconfiguration => 1,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor => write!(f, "sensor fault"),
            Self::TimerMisconfiguration => write!(f, "timer misconfiguration"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
