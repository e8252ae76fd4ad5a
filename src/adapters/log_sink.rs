//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured logger events to the
//! `log` facade (UART / USB-CDC on the device, stderr on the host).

use log::{info, warn};

use crate::app::events::{DropReason, LoggerEvent};
use crate::app::ports::EventSink;

/// Adapter that logs every [`LoggerEvent`] on one line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LoggerEvent) {
        match event {
            LoggerEvent::Started { now, first_alarm } => match first_alarm {
                Some(at) => info!(
                    "START | now={} | first alarm {:02}:{:02}:{:02}",
                    now.label(),
                    at.hour,
                    at.minute,
                    at.second
                ),
                None => warn!("START | now={} | no alarm armed", now.label()),
            },
            LoggerEvent::FileOpened {
                name,
                next_index,
                created,
            } => {
                info!(
                    "FILE  | {} {} | next index {}",
                    if *created { "created" } else { "reopened" },
                    name,
                    next_index
                );
            }
            LoggerEvent::FileUnavailable(e) => {
                warn!("FILE  | unavailable: {}", e);
            }
            LoggerEvent::SamplePersisted { name, index } => {
                info!("SAMPLE| {} #{}", name, index);
            }
            LoggerEvent::SampleDropped(reason) => match reason {
                DropReason::CapReached => warn!("SAMPLE| dropped, daily cap reached"),
                DropReason::StorageUnavailable => warn!("SAMPLE| dropped, storage unavailable"),
                DropReason::WriteFailed => warn!("SAMPLE| dropped, write failed"),
            },
            LoggerEvent::AlarmArmed { at, day_rollover } => {
                info!(
                    "ALARM | next {:02}:{:02}:{:02}{}",
                    at.hour,
                    at.minute,
                    at.second,
                    if *day_rollover { " (tomorrow)" } else { "" }
                );
            }
            LoggerEvent::RetentionApplied { deleted } => {
                info!("RETAIN| deleted {} file(s)", deleted);
            }
            LoggerEvent::ClockAdjusted { field, value } => {
                info!("CLOCK | {:?} <- {}", field, value);
            }
            LoggerEvent::IntervalChanged { minutes } => {
                info!("CLOCK | interval <- {} min", minutes);
            }
            LoggerEvent::RequestServed { opcode, frames } => {
                info!("RADIO | op 0x{:02X} served, {} frame(s)", opcode, frames);
            }
            LoggerEvent::FrameDiscarded { len } => {
                warn!("RADIO | discarded {}-byte frame", len);
            }
        }
    }
}
