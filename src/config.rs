//! System configuration parameters
//!
//! Compile-time constants for the file store, retention and radio link,
//! plus the runtime [`SamplingConfig`].  The sampling config lives in RAM
//! only: a reset reverts to the compiled-in default.

use serde::{Deserialize, Serialize};

// --- File store ---
/// Log file name prefix (`LOG_MMDD.CSV`).
pub const FILE_PREFIX: &str = "LOG";
/// Log file name extension.
pub const FILE_EXTENSION: &str = "CSV";
/// Length of a canonical log file name (`LOG_MMDD.CSV`).
pub const FILE_NAME_LEN: usize = FILE_PREFIX.len() + 1 + 4 + 1 + FILE_EXTENSION.len();

/// Retention horizon: maximum number of dated log files kept on the card.
pub const MAX_RETAINED_FILES: usize = 360;
/// Maximum number of names returned by a single enumeration (LIST_FILES),
/// the most the `u8` total field of a file-list frame can report.  With
/// more day files on the card, only the newest this many are listed; older
/// ones stay readable through REQUEST_DATA by name.
pub const MAX_LISTED_FILES: usize = u8::MAX as usize;
/// Names deleted per retention pass before re-enumerating.
pub const RETENTION_BATCH: usize = 32;

// --- Sampling ---
/// Minutes in one sampling period (a calendar day).
pub const MINUTES_PER_PERIOD: u16 = 1440;
/// Smallest allowed sampling interval (minutes).
pub const MIN_INTERVAL_MINUTES: u8 = 1;
/// Largest allowed sampling interval (minutes).
pub const MAX_INTERVAL_MINUTES: u8 = 60;
/// Compiled-in sampling interval used at boot.
pub const DEFAULT_INTERVAL_MINUTES: u8 = 10;
/// Number of analog channels a record can carry (fixed by the data frame).
pub const MAX_CHANNELS: usize = 4;

// --- Radio ---
/// Fixed transceiver payload size in bytes.
pub const RADIO_PAYLOAD_SIZE: usize = 32;
/// Pause between consecutive response frames so the collector's receive
/// FIFO is not overrun.
pub const INTER_FRAME_DELAY_MS: u32 = 10;

/// Runtime sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Minutes between samples (1–60).
    interval_minutes: u8,
    /// Number of analog channels read per sample (1–4).
    channel_count: u8,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            channel_count: MAX_CHANNELS as u8,
        }
    }
}

impl SamplingConfig {
    /// Build a config, rejecting out-of-range values.
    pub fn new(interval_minutes: u8, channel_count: u8) -> Result<Self, crate::error::Error> {
        let mut cfg = Self::default();
        cfg.set_interval(interval_minutes)?;
        cfg.set_channel_count(channel_count)?;
        Ok(cfg)
    }

    pub fn interval_minutes(&self) -> u8 {
        self.interval_minutes
    }

    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    /// Samples that fit in one day at the current interval.
    pub fn samples_per_period(&self) -> u16 {
        samples_per_period(self.interval_minutes)
    }

    /// Change the sampling interval. Values outside 1–60 are rejected,
    /// never clamped.
    pub fn set_interval(&mut self, minutes: u8) -> Result<(), crate::error::Error> {
        if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
            return Err(crate::error::Error::Config("interval_minutes must be 1–60"));
        }
        self.interval_minutes = minutes;
        Ok(())
    }

    pub fn set_channel_count(&mut self, count: u8) -> Result<(), crate::error::Error> {
        if count == 0 || count as usize > MAX_CHANNELS {
            return Err(crate::error::Error::Config("channel_count must be 1–4"));
        }
        self.channel_count = count;
        Ok(())
    }
}

/// `1440 / interval` (integer division). Zero for an invalid interval.
pub fn samples_per_period(interval_minutes: u8) -> u16 {
    if interval_minutes == 0 {
        return 0;
    }
    MINUTES_PER_PERIOD / interval_minutes as u16
}
