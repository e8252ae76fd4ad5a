//! Fixed-size radio frames.
//!
//! All frames are packed, little-endian, with no padding.  Strings are
//! fixed-width fields, NUL-terminated, truncated by the sender.
//!
//! Request (20 B):
//! ```text
//! ┌─────┬─────────┬─────────┬───────────────┬─────┬───────┐
//! │ cmd │ start   │ count   │ filename [13] │ key │ value │
//! │ u8  │ u16 LE  │ u16 LE  │ NUL-term.     │ u8  │ u8    │
//! └─────┴─────────┴─────────┴───────────────┴─────┴───────┘
//! ```
//!
//! Data response (30 B), also used for RTC replies and NACK:
//! ```text
//! ┌─────┬────────┬──────────────────┬────────────────┬─────┬───────┐
//! │ cmd │ index  │ value0..3        │ timestamp [17] │ key │ value │
//! │ u8  │ u16 LE │ 4 × u16 LE       │ NUL-term.      │ u8  │ u8    │
//! └─────┴────────┴──────────────────┴────────────────┴─────┴───────┘
//! ```
//!
//! File-list entry (16 B): `cmd u8, file_index u8, total u8,
//! filename [13]`, bracketed by single-byte [`LIST_START`] /
//! [`LIST_END`] markers.

use core::fmt;

use crate::clock::TimestampLabel;
use crate::config::{FILE_NAME_LEN, MAX_CHANNELS};

pub const FILENAME_FIELD: usize = FILE_NAME_LEN + 1;
pub const TIMESTAMP_FIELD: usize = 17;

pub const REQUEST_LEN: usize = 1 + 2 + 2 + FILENAME_FIELD + 1 + 1;
pub const DATA_RESPONSE_LEN: usize = 1 + 2 + 2 * MAX_CHANNELS + TIMESTAMP_FIELD + 1 + 1;
pub const FILE_ENTRY_LEN: usize = 1 + 1 + 1 + FILENAME_FIELD;

/// Start of a LIST_FILES reply.
pub const LIST_START: u8 = 0xF0;
/// End of a LIST_FILES reply.
pub const LIST_END: u8 = 0xF1;
/// Command byte of a negative acknowledgement for an unknown opcode.
pub const NACK: u8 = 0xEE;
/// Value returned for an unknown GET_RTC_INFO key.
pub const INVALID_VALUE: u8 = 0xFF;

const _: () = assert!(REQUEST_LEN == 20);
const _: () = assert!(DATA_RESPONSE_LEN == 30);
const _: () = assert!(FILE_ENTRY_LEN == 16);
const _: () = assert!(DATA_RESPONSE_LEN <= crate::config::RADIO_PAYLOAD_SIZE);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    RequestData = 0x01,
    ListFiles = 0x02,
    ModifyRtc = 0x03,
    GetRtcInfo = 0x04,
}

impl Opcode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(Self::RequestData),
            0x02 => Some(Self::ListFiles),
            0x03 => Some(Self::ModifyRtc),
            0x04 => Some(Self::GetRtcInfo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than a full request.
    Short { len: usize },
    /// Filename field has no NUL terminator.
    Unterminated,
    /// Filename field holds non-ASCII bytes.
    NotAscii,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short { len } => write!(f, "short frame ({} bytes)", len),
            Self::Unterminated => write!(f, "unterminated filename"),
            Self::NotAscii => write!(f, "non-ASCII filename"),
        }
    }
}

// ── Fixed-width string fields ─────────────────────────────────

/// Copy `s` into a zeroed field, truncating so the last byte stays NUL.
fn put_str(field: &mut [u8], s: &str) {
    field.fill(0);
    let n = s.len().min(field.len().saturating_sub(1));
    field[..n].copy_from_slice(&s.as_bytes()[..n]);
}

/// Read a NUL-terminated ASCII field.
fn get_str<const N: usize>(field: &[u8]) -> Result<heapless::String<N>, FrameError> {
    let end = field
        .iter()
        .position(|&b| b == 0)
        .ok_or(FrameError::Unterminated)?;
    let bytes = &field[..end];
    if !bytes.is_ascii() {
        return Err(FrameError::NotAscii);
    }
    let mut out = heapless::String::new();
    // ASCII is valid UTF-8; length is bounded by the field.
    for &b in bytes.iter().take(N) {
        let _ = out.push(b as char);
    }
    Ok(out)
}

// ═══════════════════════════════════════════════════════════════
//  Request
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Raw command byte; may be an unknown opcode.
    pub command: u8,
    pub start_index: u16,
    pub num_samples: u16,
    pub filename: heapless::String<FILE_NAME_LEN>,
    pub key: u8,
    pub value: u8,
}

impl Request {
    pub fn new(command: u8) -> Self {
        Self {
            command,
            start_index: 0,
            num_samples: 0,
            filename: heapless::String::new(),
            key: 0,
            value: 0,
        }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.command)
    }

    /// Decode a received payload.  Trailing bytes past the request are
    /// ignored (the radio pads to its payload size).
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < REQUEST_LEN {
            return Err(FrameError::Short { len: buf.len() });
        }
        let name_at = 5;
        Ok(Self {
            command: buf[0],
            start_index: u16::from_le_bytes([buf[1], buf[2]]),
            num_samples: u16::from_le_bytes([buf[3], buf[4]]),
            filename: get_str(&buf[name_at..name_at + FILENAME_FIELD])?,
            key: buf[name_at + FILENAME_FIELD],
            value: buf[name_at + FILENAME_FIELD + 1],
        })
    }

    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let mut out = [0u8; REQUEST_LEN];
        out[0] = self.command;
        out[1..3].copy_from_slice(&self.start_index.to_le_bytes());
        out[3..5].copy_from_slice(&self.num_samples.to_le_bytes());
        put_str(&mut out[5..5 + FILENAME_FIELD], &self.filename);
        out[5 + FILENAME_FIELD] = self.key;
        out[6 + FILENAME_FIELD] = self.value;
        out
    }
}

// ═══════════════════════════════════════════════════════════════
//  Data response
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataResponse {
    pub command: u8,
    pub index: u16,
    pub values: [u16; MAX_CHANNELS],
    pub timestamp: TimestampLabel,
    pub key: u8,
    pub value: u8,
}

impl DataResponse {
    /// Reply carrying only `key`/`value` (RTC operations, NACK).
    pub fn key_value(command: u8, key: u8, value: u8) -> Self {
        Self {
            command,
            key,
            value,
            ..Self::default()
        }
    }

    pub fn encode(&self) -> [u8; DATA_RESPONSE_LEN] {
        let mut out = [0u8; DATA_RESPONSE_LEN];
        out[0] = self.command;
        out[1..3].copy_from_slice(&self.index.to_le_bytes());
        for (i, v) in self.values.iter().enumerate() {
            let at = 3 + 2 * i;
            out[at..at + 2].copy_from_slice(&v.to_le_bytes());
        }
        let ts = 3 + 2 * MAX_CHANNELS;
        put_str(&mut out[ts..ts + TIMESTAMP_FIELD], &self.timestamp);
        out[ts + TIMESTAMP_FIELD] = self.key;
        out[ts + TIMESTAMP_FIELD + 1] = self.value;
        out
    }

    /// Collector-side decode.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < DATA_RESPONSE_LEN {
            return Err(FrameError::Short { len: buf.len() });
        }
        let mut values = [0u16; MAX_CHANNELS];
        for (i, v) in values.iter_mut().enumerate() {
            let at = 3 + 2 * i;
            *v = u16::from_le_bytes([buf[at], buf[at + 1]]);
        }
        let ts = 3 + 2 * MAX_CHANNELS;
        Ok(Self {
            command: buf[0],
            index: u16::from_le_bytes([buf[1], buf[2]]),
            values,
            timestamp: get_str(&buf[ts..ts + TIMESTAMP_FIELD])?,
            key: buf[ts + TIMESTAMP_FIELD],
            value: buf[ts + TIMESTAMP_FIELD + 1],
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  File-list entry
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub file_index: u8,
    pub total_files: u8,
    pub filename: heapless::String<FILE_NAME_LEN>,
}

impl FileEntry {
    pub fn encode(&self) -> [u8; FILE_ENTRY_LEN] {
        let mut out = [0u8; FILE_ENTRY_LEN];
        out[0] = Opcode::ListFiles as u8;
        out[1] = self.file_index;
        out[2] = self.total_files;
        put_str(&mut out[3..3 + FILENAME_FIELD], &self.filename);
        out
    }

    /// Collector-side decode.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < FILE_ENTRY_LEN {
            return Err(FrameError::Short { len: buf.len() });
        }
        Ok(Self {
            file_index: buf[1],
            total_files: buf[2],
            filename: get_str(&buf[3..3 + FILENAME_FIELD])?,
        })
    }
}
