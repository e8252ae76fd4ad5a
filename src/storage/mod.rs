//! Per-day log files: naming, record line format and the sample store.
//!
//! Files are named `LOG_MMDD.CSV` from the calendar date alone.  Each
//! holds one header row followed by append-only records:
//!
//! ```text
//! index,timestamp,ch0,ch1,ch2,ch3
//! 0,2024-03-07 00:00,512,498,1020,7
//! 1,2024-03-07 00:10,515,497,1019,7
//! ```

pub mod lines;
pub mod sample_store;

pub use sample_store::{FileList, FileState, RecordStream, SampleStore};

use core::fmt::{self, Write as _};

use crate::clock::TimestampLabel;
use crate::config::{FILE_EXTENSION, FILE_NAME_LEN, FILE_PREFIX, MAX_CHANNELS};

/// Capacity of one record or header line, newline included.
pub const LINE_CAPACITY: usize = 64;

/// One text line of a log file.
pub type Line = heapless::String<LINE_CAPACITY>;

// ═══════════════════════════════════════════════════════════════
//  File names
// ═══════════════════════════════════════════════════════════════

/// Canonical log file name, `LOG_MMDD.CSV`.
///
/// Ordering is lexicographic on the name, which matches date order
/// within one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogFileName(heapless::String<FILE_NAME_LEN>);

impl LogFileName {
    /// Name for the given calendar date.  Pure in `(month, day)`.
    pub fn for_date(month: u8, day: u8) -> Self {
        let mut s = heapless::String::new();
        // Fixed-width output of exactly FILE_NAME_LEN characters for any
        // two-digit month and day.
        let _ = write!(
            s,
            "{}_{:02}{:02}.{}",
            FILE_PREFIX,
            month % 100,
            day % 100,
            FILE_EXTENSION
        );
        Self(s)
    }

    /// Accept `name` if it follows the naming pattern.  Matching is
    /// ASCII case-insensitive (FAT volumes may report either case); the
    /// result is normalised to upper case.
    pub fn parse(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() != FILE_NAME_LEN || !name.is_ascii() {
            return None;
        }
        let prefix_end = FILE_PREFIX.len();
        let digits = prefix_end + 1..prefix_end + 5;
        let dot = prefix_end + 5;

        if !name[..prefix_end].eq_ignore_ascii_case(FILE_PREFIX)
            || bytes[prefix_end] != b'_'
            || bytes[dot] != b'.'
            || !name[dot + 1..].eq_ignore_ascii_case(FILE_EXTENSION)
            || !bytes[digits.clone()].iter().all(u8::is_ascii_digit)
        {
            return None;
        }

        let month = (bytes[digits.start] - b'0') * 10 + (bytes[digits.start + 1] - b'0');
        let day = (bytes[digits.start + 2] - b'0') * 10 + (bytes[digits.start + 3] - b'0');
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(Self::for_date(month, day))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn month(&self) -> u8 {
        self.digit_pair(0)
    }

    pub fn day(&self) -> u8 {
        self.digit_pair(2)
    }

    fn digit_pair(&self, at: usize) -> u8 {
        let b = self.0.as_bytes();
        let i = FILE_PREFIX.len() + 1 + at;
        (b[i] - b'0') * 10 + (b[i + 1] - b'0')
    }
}

impl fmt::Display for LogFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Records
// ═══════════════════════════════════════════════════════════════

/// One stored sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: u32,
    pub label: TimestampLabel,
    pub values: heapless::Vec<u16, MAX_CHANNELS>,
}

impl Record {
    /// `index,label,v0[,v1...]\n`
    pub fn to_line(&self) -> Line {
        let mut line = Line::new();
        // Worst case: 10-digit index + 16-char label + 4 × 6 + separators
        // stays well below LINE_CAPACITY.
        let _ = write!(line, "{},{}", self.index, self.label);
        for v in &self.values {
            let _ = write!(line, ",{}", v);
        }
        let _ = line.push('\n');
        line
    }

    /// Parse one data line (without its newline).  Extra channels past
    /// [`MAX_CHANNELS`] are ignored.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim_end_matches(['\r', '\n']).split(',');
        let index = fields.next()?.trim().parse::<u32>().ok()?;
        let mut label = TimestampLabel::new();
        label.push_str(fields.next()?.trim()).ok()?;
        // "YYYY-MM-DD HH:MM" fills the label exactly; anything shorter is
        // a cut-off line.
        if label.len() != label.capacity() {
            return None;
        }

        let mut values = heapless::Vec::new();
        for field in fields {
            let v = field.trim().parse::<u16>().ok()?;
            if values.push(v).is_err() {
                break;
            }
        }
        if values.is_empty() {
            return None;
        }
        Some(Self {
            index,
            label,
            values,
        })
    }
}

/// Header row for a file recording `channel_count` channels.
pub fn header_line(channel_count: u8) -> Line {
    let mut line = Line::new();
    let _ = line.push_str("index,timestamp");
    for ch in 0..channel_count.min(MAX_CHANNELS as u8) {
        let _ = write!(line, ",ch{}", ch);
    }
    let _ = line.push('\n');
    line
}
