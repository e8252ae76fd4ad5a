//! Outbound logger events.
//!
//! The scheduler and the protocol engine emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, a status LED, tests).

use crate::clock::{AlarmTime, ClockField, WallClock};
use crate::error::StoreError;
use crate::storage::LogFileName;

/// Why a sampling cycle did not persist its reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The file store is not mounted (degraded mode).
    StorageUnavailable,
    /// The per-day sample cap is reached.
    CapReached,
    /// The append itself failed; the counter did not advance.
    WriteFailed,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggerEvent {
    /// Boot finished; carries the clock reading and the first alarm.
    Started { now: WallClock, first_alarm: Option<AlarmTime> },

    /// A day file was opened (created or reopened with a recovered index).
    FileOpened { name: LogFileName, next_index: u32, created: bool },

    /// The day file could not be resolved.
    FileUnavailable(StoreError),

    /// One record was appended.
    SamplePersisted { name: LogFileName, index: u32 },

    /// The cycle's reading was discarded.
    SampleDropped(DropReason),

    /// The next alarm was programmed.
    AlarmArmed { at: AlarmTime, day_rollover: bool },

    /// Retention removed the oldest day files.
    RetentionApplied { deleted: usize },

    /// A clock field was changed through the radio protocol.
    ClockAdjusted { field: ClockField, value: u8 },

    /// The sampling interval was changed through the radio protocol.
    IntervalChanged { minutes: u8 },

    /// A request was answered.  `frames` counts every frame sent,
    /// markers included.
    RequestServed { opcode: u8, frames: u16 },

    /// An inbound payload was dropped without a response.
    FrameDiscarded { len: usize },
}
