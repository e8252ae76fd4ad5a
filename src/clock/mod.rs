//! Clock service: wall-clock time, validated field writes and the
//! one-shot match alarm.
//!
//! ```text
//!   RTC alarm IRQ ──▶ static AlarmSignal::raise()  (driver-owned)
//!   driver        ──▶ RtcPeripheral::poll_alarm() drains it
//!   main loop     ──▶ ClockService::take_alarm()   (sole consumer)
//! ```
//!
//! The alarm is edge-triggered: a fire sets the signal, `take_alarm`
//! clears it and reports `true` exactly once.  A second fire before the
//! first is consumed is coalesced into the same pending flag.
//!
//! The service knows nothing about log files.  A caller that changes
//! the month or day is responsible for re-resolving the active file.

pub mod calendar;

use core::fmt::Write as _;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::RtcPeripheral;
use crate::error::ClockError;
use calendar::{SECONDS_PER_DAY, days_from_civil, days_in_month};

/// Base year for the protocol's two-digit year offset.
pub const YEAR_EPOCH: u16 = 2000;
/// Largest two-digit year offset accepted by `set_field`.
pub const MAX_YEAR_OFFSET: u8 = 99;

/// `YYYY-MM-DD HH:MM`, the record timestamp label.
pub type TimestampLabel = heapless::String<16>;

// ═══════════════════════════════════════════════════════════════
//  Wall clock
// ═══════════════════════════════════════════════════════════════

/// Broken-down calendar time.  Always holds a valid date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallClock {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Default for WallClock {
    fn default() -> Self {
        Self {
            year: YEAR_EPOCH,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl WallClock {
    /// Build a wall clock, rejecting any out-of-range field.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, ClockError> {
        let t = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        if t.is_valid() {
            Ok(t)
        } else {
            Err(ClockError::OutOfRange)
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Calendar validity, including days-in-month for leap years.
    pub fn is_valid(&self) -> bool {
        (YEAR_EPOCH..=YEAR_EPOCH + MAX_YEAR_OFFSET as u16).contains(&self.year)
            && (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.month, self.year)
            && self.hour <= 23
            && self.minute <= 59
            && self.second <= 59
    }

    /// Copy of `self` with one field replaced.  Fails if the field value
    /// is out of range or the resulting date would be invalid (setting
    /// February while the day is 31, or a non-leap year on Feb 29).
    pub fn with_field(&self, field: ClockField, value: u8) -> Result<Self, ClockError> {
        let mut t = *self;
        match field {
            ClockField::Year => {
                if value > MAX_YEAR_OFFSET {
                    return Err(ClockError::OutOfRange);
                }
                t.year = YEAR_EPOCH + value as u16;
            }
            ClockField::Month => t.month = value,
            ClockField::Day => t.day = value,
            ClockField::Hour => t.hour = value,
            ClockField::Minute => t.minute = value,
            ClockField::Second => t.second = value,
        }
        if t.is_valid() {
            Ok(t)
        } else {
            Err(ClockError::OutOfRange)
        }
    }

    /// Protocol view of one field (year as a two-digit offset).
    pub fn field(&self, field: ClockField) -> u8 {
        match field {
            ClockField::Year => (self.year - YEAR_EPOCH) as u8,
            ClockField::Month => self.month,
            ClockField::Day => self.day,
            ClockField::Hour => self.hour,
            ClockField::Minute => self.minute,
            ClockField::Second => self.second,
        }
    }

    /// Record label, `YYYY-MM-DD HH:MM`.
    pub fn label(&self) -> TimestampLabel {
        let mut s = TimestampLabel::new();
        // Capacity is exactly 16 and every field is range-checked, so the
        // write cannot overflow.
        let _ = write!(
            s,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        );
        s
    }

    /// Seconds since 2000-01-01 00:00:00.
    pub fn to_epoch_secs(&self) -> u64 {
        let days = days_from_civil(self.year, self.month, self.day)
            - days_from_civil(YEAR_EPOCH, 1, 1);
        days as u64 * SECONDS_PER_DAY
            + self.hour as u64 * 3600
            + self.minute as u64 * 60
            + self.second as u64
    }

    /// Inverse of [`to_epoch_secs`](Self::to_epoch_secs).  Saturates at
    /// the last representable second of year 2099.
    pub fn from_epoch_secs(secs: u64) -> Self {
        let days = (secs / SECONDS_PER_DAY) as i64 + days_from_civil(YEAR_EPOCH, 1, 1);
        let rem = secs % SECONDS_PER_DAY;
        let (year, month, day) = calendar::civil_from_days(days);
        if year > YEAR_EPOCH + MAX_YEAR_OFFSET as u16 {
            return Self {
                year: YEAR_EPOCH + MAX_YEAR_OFFSET as u16,
                month: 12,
                day: 31,
                hour: 23,
                minute: 59,
                second: 59,
            };
        }
        Self {
            year,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
        }
    }
}

/// Individually addressable clock fields.  The discriminant is the
/// protocol key used by MODIFY_RTC / GET_RTC_INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClockField {
    Year = 0,
    Month = 1,
    Day = 2,
    Hour = 3,
    Minute = 4,
    Second = 5,
}

impl ClockField {
    pub fn from_key(key: u8) -> Option<Self> {
        match key {
            0 => Some(Self::Year),
            1 => Some(Self::Month),
            2 => Some(Self::Day),
            3 => Some(Self::Hour),
            4 => Some(Self::Minute),
            5 => Some(Self::Second),
            _ => None,
        }
    }

    /// Whether a write to this field can change the active file name.
    pub fn affects_file_name(self) -> bool {
        matches!(self, Self::Month | Self::Day)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alarm
// ═══════════════════════════════════════════════════════════════

/// Absolute time-of-day for the match alarm (date is ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl AlarmTime {
    pub fn new(hour: u8, minute: u8, second: u8) -> Result<Self, ClockError> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(ClockError::OutOfRange);
        }
        Ok(Self {
            hour,
            minute,
            second,
        })
    }

    /// Whether `t` falls on this alarm's HH:MM:SS.
    pub fn matches(&self, t: &WallClock) -> bool {
        t.hour == self.hour && t.minute == self.minute && t.second == self.second
    }

    /// Seconds since midnight.
    pub fn second_of_day(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }
}

/// Edge-triggered alarm flag.
///
/// Any number of `raise` calls between two `take` calls collapse into a
/// single pending fire.  `new` is `const`, so an interrupt-driven RTC
/// driver keeps one in a `static` for its handler to raise and drains it
/// from `poll_alarm`.
#[derive(Debug, Default)]
pub struct AlarmSignal {
    pending: AtomicBool,
}

impl AlarmSignal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark the alarm as fired.  Lock-free, safe from interrupt context.
    pub fn raise(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending fire.  Returns `true` at most once per fire.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Clock service
// ═══════════════════════════════════════════════════════════════

/// Wraps the RTC peripheral behind the operations the scheduler and the
/// protocol engine need.
pub struct ClockService<R: RtcPeripheral> {
    rtc: R,
    alarm: AlarmSignal,
    armed: Option<AlarmTime>,
}

impl<R: RtcPeripheral> ClockService<R> {
    pub fn new(rtc: R) -> Self {
        Self {
            rtc,
            alarm: AlarmSignal::new(),
            armed: None,
        }
    }

    /// Bring up the peripheral.  Errors are not masked here: the caller
    /// decides how to degrade.
    pub fn init(&mut self) -> Result<(), ClockError> {
        self.rtc.init()?;
        let now = self.rtc.now();
        if !now.is_valid() {
            return Err(ClockError::InvalidRegisterState);
        }
        info!("Clock: running, now {}", now.label());
        Ok(())
    }

    /// Current wall-clock time.
    pub fn now(&mut self) -> WallClock {
        self.rtc.now()
    }

    /// Validate and commit a single field write.  Returns `false` and
    /// leaves the clock untouched on an invalid value.
    pub fn set_field(&mut self, field: ClockField, value: u8) -> bool {
        let now = self.rtc.now();
        let Ok(updated) = now.with_field(field, value) else {
            warn!("Clock: rejected {:?}={}", field, value);
            return false;
        };
        match self.rtc.set(&updated) {
            Ok(()) => {
                info!("Clock: {:?} set to {}", field, value);
                true
            }
            Err(e) => {
                warn!("Clock: write of {:?} failed: {}", field, e);
                false
            }
        }
    }

    /// Read one field in its protocol representation.
    pub fn field(&mut self, field: ClockField) -> u8 {
        self.rtc.now().field(field)
    }

    /// Program the one-shot match alarm.
    pub fn schedule_alarm(&mut self, at: AlarmTime) -> Result<(), ClockError> {
        self.rtc.set_alarm(at)?;
        self.armed = Some(at);
        Ok(())
    }

    /// Consume the alarm flag.  `true` exactly once per fire.
    pub fn take_alarm(&mut self) -> bool {
        if self.rtc.poll_alarm() {
            self.alarm.raise();
        }
        self.alarm.take()
    }

    /// The service's own pending-fire flag, fed from
    /// [`RtcPeripheral::poll_alarm`].
    pub fn alarm_signal(&self) -> &AlarmSignal {
        &self.alarm
    }

    /// The alarm most recently programmed.
    pub fn armed_alarm(&self) -> Option<AlarmTime> {
        self.armed
    }

    pub fn rtc(&self) -> &R {
        &self.rtc
    }

    pub fn rtc_mut(&mut self) -> &mut R {
        &mut self.rtc
    }
}
