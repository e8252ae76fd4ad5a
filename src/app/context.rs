//! Session context shared by the scheduler, the sample store and the
//! protocol engine.
//!
//! `LoggerContext` replaces what would otherwise be firmware globals:
//! the active day file, the next record index, the per-period sample
//! counter and the sampling configuration.  The main loop owns it and
//! lends it out by `&mut`, so only the code path currently running can
//! touch it.

use crate::config::SamplingConfig;
use crate::error::Error;
use crate::storage::LogFileName;

#[derive(Debug, Clone, Default)]
pub struct LoggerContext {
    /// Live sampling configuration (RAM only).
    pub config: SamplingConfig,
    /// Day file currently receiving appends.  `None` until resolved or
    /// after a failed resolution.
    active_file: Option<LogFileName>,
    /// Index written with the next record; recovered from the file's
    /// line count on reopen.
    next_index: u32,
    /// Samples counted against the per-period cap.
    period_count: u16,
    /// Set when the armed alarm no longer reflects the clock or interval.
    rearm_requested: bool,
}

impl LoggerContext {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn active_file(&self) -> Option<&LogFileName> {
        self.active_file.as_ref()
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn period_count(&self) -> u16 {
        self.period_count
    }

    /// Whether the per-period sample cap has been reached.
    pub fn cap_reached(&self) -> bool {
        self.period_count >= self.config.samples_per_period()
    }

    /// Change the sampling interval.  Resets the per-period counter but
    /// leaves the file index alone: records already on disk keep their
    /// numbers and new ones continue after them.
    pub fn set_interval(&mut self, minutes: u8) -> Result<(), Error> {
        self.config.set_interval(minutes)?;
        self.period_count = 0;
        self.rearm_requested = true;
        Ok(())
    }

    /// Ask the scheduler to re-arm from the current time on its next poll.
    pub fn request_rearm(&mut self) {
        self.rearm_requested = true;
    }

    /// Consume a pending re-arm request.
    pub fn take_rearm_request(&mut self) -> bool {
        core::mem::take(&mut self.rearm_requested)
    }

    // ── Sample store bookkeeping ──────────────────────────────

    pub(crate) fn file_resolved(&mut self, name: LogFileName, recovered_lines: u32) {
        self.active_file = Some(name);
        self.next_index = recovered_lines;
        self.period_count = recovered_lines.min(u16::MAX as u32) as u16;
    }

    pub(crate) fn file_lost(&mut self) {
        self.active_file = None;
        self.next_index = 0;
        self.period_count = 0;
    }

    pub(crate) fn record_appended(&mut self) {
        self.next_index = self.next_index.saturating_add(1);
        self.period_count = self.period_count.saturating_add(1);
    }
}
