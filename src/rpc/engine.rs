//! Command protocol engine: half-duplex request/response over the radio.
//!
//! The radio listens by default.  One poll handles at most one request:
//!
//! 1. **Receive**: copy one payload out of the transceiver.
//! 2. **Decode**: malformed or short frames are dropped silently.
//! 3. **Prepare**: open the file / enumerate / validate before touching
//!    the radio mode, so a request that yields nothing never leaves
//!    receive mode.
//! 4. **Transmit**: a [`TxSession`] guard stops listening, sends the
//!    paced reply frames and restores listening when dropped, on every
//!    exit path.
//!
//! The engine shares the clock, store and context with the scheduler
//! but runs strictly between sampling cycles, leaving them consistent
//! before it returns.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::context::LoggerContext;
use crate::app::events::LoggerEvent;
use crate::app::ports::{EventSink, FileStore, RadioPort, RtcPeripheral};
use crate::clock::{ClockField, ClockService};
use crate::config::{INTER_FRAME_DELAY_MS, MAX_CHANNELS, RADIO_PAYLOAD_SIZE};
use crate::error::RadioError;
use crate::storage::{LogFileName, SampleStore};

use super::frames::{
    DataResponse, FileEntry, INVALID_VALUE, LIST_END, LIST_START, NACK, Opcode, Request,
};

/// MODIFY_RTC / GET_RTC_INFO key addressing the sampling interval.
pub const INTERVAL_KEY: u8 = 6;

/// Running counters, logged by the node on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub received: u32,
    pub discarded: u32,
    pub served: u32,
    pub frames_sent: u32,
    pub tx_failures: u32,
}

/// One answered request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    /// Raw command byte of the request.
    pub command: u8,
    /// Frames actually transmitted, markers included.
    pub frames: u16,
}

// ═══════════════════════════════════════════════════════════════
//  Transmit guard
// ═══════════════════════════════════════════════════════════════

/// Holds the radio in transmit mode for the lifetime of one reply.
///
/// Frames after the first are paced by [`INTER_FRAME_DELAY_MS`].  After
/// the first send failure the session refuses further frames.
pub struct TxSession<'a, P: RadioPort, D: DelayNs> {
    radio: &'a mut P,
    delay: &'a mut D,
    sent: u16,
    failed: bool,
}

impl<'a, P: RadioPort, D: DelayNs> TxSession<'a, P, D> {
    pub fn begin(radio: &'a mut P, delay: &'a mut D) -> Self {
        radio.stop_listening();
        Self {
            radio,
            delay,
            sent: 0,
            failed: false,
        }
    }

    pub fn send(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        if self.failed {
            return Err(RadioError::TxFailed);
        }
        debug_assert!(frame.len() <= RADIO_PAYLOAD_SIZE);
        if self.sent > 0 {
            self.delay.delay_ms(INTER_FRAME_DELAY_MS);
        }
        match self.radio.send(frame) {
            Ok(()) => {
                self.sent = self.sent.saturating_add(1);
                Ok(())
            }
            Err(e) => {
                warn!("RPC: transmit failed after {} frame(s): {}", self.sent, e);
                self.failed = true;
                Err(e)
            }
        }
    }

    pub fn sent(&self) -> u16 {
        self.sent
    }

    pub fn failed(&self) -> bool {
        self.failed
    }
}

impl<P: RadioPort, D: DelayNs> Drop for TxSession<'_, P, D> {
    fn drop(&mut self) {
        self.radio.start_listening();
    }
}

// ═══════════════════════════════════════════════════════════════
//  Engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct ProtocolEngine {
    stats: EngineStats,
}

impl ProtocolEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Service at most one inbound request.  Returns `None` when nothing
    /// was received or the frame was discarded.
    pub fn poll<P: RadioPort, R: RtcPeripheral, F: FileStore>(
        &mut self,
        radio: &mut P,
        delay: &mut impl DelayNs,
        clock: &mut ClockService<R>,
        store: &mut SampleStore<F>,
        ctx: &mut LoggerContext,
        sink: &mut impl EventSink,
    ) -> Option<Exchange> {
        if !radio.is_listening() {
            radio.start_listening();
        }
        let mut rx = [0u8; RADIO_PAYLOAD_SIZE];
        let len = radio.receive(&mut rx)?;
        self.stats.received = self.stats.received.wrapping_add(1);

        let req = match Request::decode(&rx[..len.min(RADIO_PAYLOAD_SIZE)]) {
            Ok(req) => req,
            Err(e) => {
                debug!("RPC: discarding frame: {}", e);
                self.stats.discarded = self.stats.discarded.wrapping_add(1);
                sink.emit(&LoggerEvent::FrameDiscarded { len });
                return None;
            }
        };

        let (frames, failed) = match req.opcode() {
            Some(Opcode::RequestData) => serve_request_data(radio, delay, store, &req),
            Some(Opcode::ListFiles) => serve_list_files(radio, delay, store),
            Some(Opcode::ModifyRtc) => {
                let ok = apply_rtc_write(clock, store, ctx, sink, req.key, req.value);
                reply(radio, delay, &DataResponse::key_value(req.command, req.key, ok as u8))
            }
            Some(Opcode::GetRtcInfo) => {
                let value = read_rtc_field(clock, ctx, req.key);
                reply(radio, delay, &DataResponse::key_value(req.command, req.key, value))
            }
            None => {
                warn!("RPC: unknown opcode 0x{:02X}", req.command);
                reply(radio, delay, &DataResponse::key_value(NACK, req.command, 0))
            }
        };

        self.stats.served = self.stats.served.wrapping_add(1);
        self.stats.frames_sent = self.stats.frames_sent.wrapping_add(frames as u32);
        if failed {
            self.stats.tx_failures = self.stats.tx_failures.wrapping_add(1);
        }
        sink.emit(&LoggerEvent::RequestServed {
            opcode: req.command,
            frames,
        });
        Some(Exchange {
            command: req.command,
            frames,
        })
    }
}

// ── Handlers ──────────────────────────────────────────────────
//
// Each returns (frames sent, transmit failed).

fn reply<P: RadioPort, D: DelayNs>(radio: &mut P, delay: &mut D, rsp: &DataResponse) -> (u16, bool) {
    let mut tx = TxSession::begin(radio, delay);
    let _ = tx.send(&rsp.encode());
    (tx.sent(), tx.failed())
}

fn serve_request_data<P: RadioPort, D: DelayNs, F: FileStore>(
    radio: &mut P,
    delay: &mut D,
    store: &mut SampleStore<F>,
    req: &Request,
) -> (u16, bool) {
    let Some(name) = LogFileName::parse(&req.filename) else {
        info!("RPC: REQUEST_DATA for non-log file {:?}", req.filename.as_str());
        return (0, false);
    };
    let records = match store.stream_records(&name, req.start_index, req.num_samples) {
        Ok(stream) => stream,
        Err(e) => {
            info!("RPC: REQUEST_DATA {}: {}", name, e);
            return (0, false);
        }
    };
    let mut records = records.peekable();
    if records.peek().is_none() {
        return (0, false);
    }

    info!(
        "RPC: streaming {} from {} (up to {})",
        name, req.start_index, req.num_samples
    );
    let mut tx = TxSession::begin(radio, delay);
    for record in records {
        let mut values = [0u16; MAX_CHANNELS];
        for (slot, v) in values.iter_mut().zip(record.values.iter()) {
            *slot = *v;
        }
        let rsp = DataResponse {
            command: req.command,
            index: record.index.min(u16::MAX as u32) as u16,
            values,
            timestamp: record.label,
            key: req.key,
            value: req.value,
        };
        if tx.send(&rsp.encode()).is_err() {
            break;
        }
    }
    (tx.sent(), tx.failed())
}

fn serve_list_files<P: RadioPort, D: DelayNs, F: FileStore>(
    radio: &mut P,
    delay: &mut D,
    store: &mut SampleStore<F>,
) -> (u16, bool) {
    let list = match store.enumerate_files() {
        Ok(list) => list,
        Err(e) => {
            warn!("RPC: LIST_FILES: {}", e);
            Default::default()
        }
    };
    let total = list.names.len().min(u8::MAX as usize) as u8;

    let mut tx = TxSession::begin(radio, delay);
    if tx.send(&[LIST_START]).is_err() {
        return (tx.sent(), true);
    }
    for (i, name) in list.names.iter().enumerate() {
        let mut filename = heapless::String::new();
        let _ = filename.push_str(name.as_str());
        let entry = FileEntry {
            file_index: i as u8,
            total_files: total,
            filename,
        };
        if tx.send(&entry.encode()).is_err() {
            return (tx.sent(), true);
        }
    }
    let _ = tx.send(&[LIST_END]);
    (tx.sent(), tx.failed())
}

fn apply_rtc_write<R: RtcPeripheral, F: FileStore>(
    clock: &mut ClockService<R>,
    store: &mut SampleStore<F>,
    ctx: &mut LoggerContext,
    sink: &mut impl EventSink,
    key: u8,
    value: u8,
) -> bool {
    if key == INTERVAL_KEY {
        return match ctx.set_interval(value) {
            Ok(()) => {
                info!("RPC: sampling interval now {} min", value);
                sink.emit(&LoggerEvent::IntervalChanged { minutes: value });
                true
            }
            Err(e) => {
                warn!("RPC: interval {} rejected: {}", value, e);
                false
            }
        };
    }

    let Some(field) = ClockField::from_key(key) else {
        warn!("RPC: MODIFY_RTC unknown key {}", key);
        return false;
    };
    if !clock.set_field(field, value) {
        return false;
    }
    sink.emit(&LoggerEvent::ClockAdjusted { field, value });
    ctx.request_rearm();
    if field.affects_file_name() {
        let now = clock.now();
        store.resolve_active_file(ctx, &now);
    }
    true
}

fn read_rtc_field<R: RtcPeripheral>(clock: &mut ClockService<R>, ctx: &LoggerContext, key: u8) -> u8 {
    if key == INTERVAL_KEY {
        return ctx.config.interval_minutes();
    }
    match ClockField::from_key(key) {
        Some(field) => clock.field(field),
        None => INVALID_VALUE,
    }
}
