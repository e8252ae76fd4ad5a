//! Port traits — the hexagonal boundary between domain logic and the
//! peripherals.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Scheduler / SampleStore / ProtocolEngine
//! ```
//!
//! Driven adapters (RTC, file store, radio, ADC, event sinks) implement
//! these traits.  The domain consumes them via generics, so it never
//! touches hardware directly and runs unchanged against mocks on the host.
//!
//! Every operation is synchronous and bounded by a hardware timeout; none
//! of them may block indefinitely.

use crate::clock::{AlarmTime, WallClock};
use crate::config::RADIO_PAYLOAD_SIZE;
use crate::error::{ClockError, RadioError, StoreError};

// ───────────────────────────────────────────────────────────────
// Real-time clock (driven adapter: domain ↔ RTC peripheral)
// ───────────────────────────────────────────────────────────────

/// Wall-clock peripheral with a one-shot HH:MM:SS match alarm.
pub trait RtcPeripheral {
    /// Start the oscillator and verify register state.
    fn init(&mut self) -> Result<(), ClockError>;

    /// Current time.  Never fails once `init` has succeeded.
    fn now(&mut self) -> WallClock;

    /// Commit a full calendar time.
    fn set(&mut self, time: &WallClock) -> Result<(), ClockError>;

    /// Program the one-shot match alarm.  Replaces any pending alarm.
    fn set_alarm(&mut self, at: AlarmTime) -> Result<(), ClockError>;

    /// Return and clear the peripheral's alarm-matched flag.
    fn poll_alarm(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Flat file store (driven adapter: domain ↔ SD card / flash)
// ───────────────────────────────────────────────────────────────

/// Flat, name-addressed file store.  No directories.
pub trait FileStore {
    /// Whether the medium is mounted and usable right now.
    fn is_available(&self) -> bool;

    fn exists(&mut self, name: &str) -> Result<bool, StoreError>;

    /// Create a new file holding `initial`.  Fails if the file exists.
    fn create(&mut self, name: &str, initial: &[u8]) -> Result<(), StoreError>;

    /// Append `data` to an existing file in a single write.
    fn append(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Read up to `buf.len()` bytes starting at `offset`.  Returns 0 at EOF.
    fn read_at(&mut self, name: &str, offset: u64, buf: &mut [u8]) -> Result<usize, StoreError>;

    fn delete(&mut self, name: &str) -> Result<(), StoreError>;

    /// Visit every file name in the store, in no particular order.
    fn for_each_name(&mut self, visit: &mut dyn FnMut(&str)) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Radio (driven adapter: domain ↔ half-duplex transceiver)
// ───────────────────────────────────────────────────────────────

/// Half-duplex transceiver exchanging fixed-size payloads.
///
/// The transceiver is either listening or transmitting.  Sending while
/// listening, or receiving while transmitting, silently loses bytes on
/// real hardware, so callers must switch modes explicitly.
pub trait RadioPort {
    fn init(&mut self) -> Result<(), RadioError>;

    /// Enter receive mode.
    fn start_listening(&mut self);

    /// Leave receive mode so payloads can be transmitted.
    fn stop_listening(&mut self);

    fn is_listening(&self) -> bool;

    /// Copy one pending payload into `buf`.  Returns its length, or
    /// `None` when nothing has arrived.
    fn receive(&mut self, buf: &mut [u8; RADIO_PAYLOAD_SIZE]) -> Option<usize>;

    /// Transmit one payload of at most [`RADIO_PAYLOAD_SIZE`] bytes.
    fn send(&mut self, payload: &[u8]) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Sensors (driven adapter: ADC → domain)
// ───────────────────────────────────────────────────────────────

/// Analog front end.  Conversion and linearisation happen behind this
/// port; the domain only sees one reading per channel.
pub trait SensorPort {
    fn read_channel(&mut self, channel: u8) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`LoggerEvent`](super::events::LoggerEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LoggerEvent);
}
