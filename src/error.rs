//! Unified error types for the field logger firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! main loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the scheduler and protocol engine without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The log file store failed.
    Store(StoreError),
    /// The real-time clock peripheral failed.
    Clock(ClockError),
    /// The radio transceiver failed.
    Radio(RadioError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// A configuration value was rejected.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The backing medium is absent or failed to mount.
    Unavailable,
    /// The named file does not exist.
    NotFound,
    /// Open, read or write call failed.
    Io,
    /// The medium has no room for the write.
    Full,
    /// A name did not fit the fixed-width file name buffer.
    NameTooLong,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "storage unavailable"),
            Self::NotFound => write!(f, "file not found"),
            Self::Io => write!(f, "I/O error"),
            Self::Full => write!(f, "storage full"),
            Self::NameTooLong => write!(f, "file name too long"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Clock errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The 32 kHz oscillator has not started.
    OscillatorStopped,
    /// Register contents failed a sanity check (e.g. BCD out of range).
    InvalidRegisterState,
    /// The bus transaction to the peripheral failed.
    Bus,
    /// A field value was outside its calendar range.
    OutOfRange,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OscillatorStopped => write!(f, "oscillator stopped"),
            Self::InvalidRegisterState => write!(f, "invalid register state"),
            Self::Bus => write!(f, "bus error"),
            Self::OutOfRange => write!(f, "value out of range"),
        }
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The transceiver did not respond during initialisation.
    NotResponding,
    /// A payload could not be delivered to the transceiver.
    TxFailed,
    /// The transceiver is in the wrong mode for the requested operation.
    WrongMode,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotResponding => write!(f, "transceiver not responding"),
            Self::TxFailed => write!(f, "transmit failed"),
            Self::WrongMode => write!(f, "wrong radio mode"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
