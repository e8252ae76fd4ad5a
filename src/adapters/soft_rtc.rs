//! Software real-time clock.
//!
//! Implements [`RtcPeripheral`] by keeping a calendar base time and a
//! monotonic [`Instant`].  The HH:MM:SS match alarm is emulated: each
//! poll checks whether the alarm second was passed since the previous
//! poll, so a slow main loop never misses it.
//!
//! `time_scale` multiplies elapsed time, letting the simulator run a day
//! of sampling in minutes.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use log::debug;

use crate::app::ports::RtcPeripheral;
use crate::clock::calendar::SECONDS_PER_DAY;
use crate::clock::{AlarmTime, WallClock};
use crate::error::ClockError;

/// Seconds between 1970-01-01 and 2000-01-01.
const UNIX_TO_Y2K_SECS: u64 = 946_684_800;

pub struct SoftRtc {
    base_secs: u64,
    started: Instant,
    time_scale: u32,
    alarm: Option<AlarmTime>,
    last_polled: u64,
}

impl SoftRtc {
    pub fn new(start: WallClock) -> Self {
        Self::with_time_scale(start, 1)
    }

    pub fn with_time_scale(start: WallClock, time_scale: u32) -> Self {
        let base_secs = start.to_epoch_secs();
        Self {
            base_secs,
            started: Instant::now(),
            time_scale: time_scale.max(1),
            alarm: None,
            last_polled: base_secs,
        }
    }

    /// Seed from the host's system clock (UTC).
    pub fn from_system_time(time_scale: u32) -> Self {
        let unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let start = WallClock::from_epoch_secs(unix.saturating_sub(UNIX_TO_Y2K_SECS));
        Self::with_time_scale(start, time_scale)
    }

    /// Jump the clock forward without touching the alarm.
    pub fn advance(&mut self, secs: u64) {
        self.base_secs = self.base_secs.saturating_add(secs);
    }

    fn now_secs(&self) -> u64 {
        let elapsed = self.started.elapsed().as_secs();
        self.base_secs
            .saturating_add(elapsed.saturating_mul(self.time_scale as u64))
    }
}

/// Whether second-of-day `target` occurs in `(from, to]`.
fn passed_through(from: u64, to: u64, target: u32) -> bool {
    if to <= from {
        return false;
    }
    let mut hit = from - from % SECONDS_PER_DAY + target as u64;
    if hit <= from {
        hit += SECONDS_PER_DAY;
    }
    hit <= to
}

impl RtcPeripheral for SoftRtc {
    fn init(&mut self) -> Result<(), ClockError> {
        Ok(())
    }

    fn now(&mut self) -> WallClock {
        WallClock::from_epoch_secs(self.now_secs())
    }

    fn set(&mut self, time: &WallClock) -> Result<(), ClockError> {
        self.base_secs = time.to_epoch_secs();
        self.started = Instant::now();
        self.last_polled = self.base_secs;
        Ok(())
    }

    fn set_alarm(&mut self, at: AlarmTime) -> Result<(), ClockError> {
        self.alarm = Some(at);
        self.last_polled = self.now_secs();
        debug!("Clock: soft alarm armed for {:?}", at);
        Ok(())
    }

    fn poll_alarm(&mut self) -> bool {
        let now = self.now_secs();
        let from = core::mem::replace(&mut self.last_polled, now);
        match self.alarm {
            Some(at) if passed_through(from, now, at.second_of_day()) => {
                self.alarm = None;
                true
            }
            _ => false,
        }
    }
}
