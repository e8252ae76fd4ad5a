//! Sampling scheduler.
//!
//! Wakes on the RTC match alarm, takes one reading per configured
//! channel, hands it to the sample store and programs the next alarm.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   RTC alarm ──▶ AlarmSignal ──▶ Scheduler::poll()            │
//! │                                                              │
//! │   Idle ──(alarm taken)──▶ Sampling                           │
//! │     ▲                        │                               │
//! │     │                        ├─ now(), derive day file       │
//! │     │                        ├─ resolve file if day changed  │
//! │     │                        ├─ read channels                │
//! │     │                        ├─ append (unless capped)       │
//! │     │                        ├─ next alarm = now + interval  │
//! │     │                        └─ day carry ▶ retention        │
//! │     └────────────────────────────┘                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cycle completes synchronously inside one `poll`.  The scheduler
//! never blocks and never fails: storage problems degrade to dropped
//! samples while alarms keep firing.

use log::{debug, info, warn};

use crate::app::context::LoggerContext;
use crate::app::events::{DropReason, LoggerEvent};
use crate::app::ports::{EventSink, FileStore, RtcPeripheral, SensorPort};
use crate::clock::{AlarmTime, ClockService, WallClock};
use crate::config::{MAX_CHANNELS, MAX_RETAINED_FILES};
use crate::storage::{FileState, LogFileName, SampleStore};

// ═══════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next alarm.
    Idle,
    /// Inside a sampling cycle.
    Sampling,
}

/// What happened to one cycle's reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    Persisted { index: u32 },
    Dropped(DropReason),
}

/// Summary of one completed sampling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub at: WallClock,
    pub values: heapless::Vec<u16, MAX_CHANNELS>,
    pub outcome: SampleOutcome,
    /// `None` if the RTC rejected the alarm write; retried on next poll.
    pub next_alarm: Option<AlarmTime>,
    pub day_rollover: bool,
    pub retention_deleted: usize,
}

/// Next alarm `interval_minutes` after `now`, seconds zeroed.  The flag
/// is `true` when the minute/hour carry crosses midnight.
pub fn next_alarm(now: &WallClock, interval_minutes: u8) -> (AlarmTime, bool) {
    let minute = now.minute() as u16 + interval_minutes as u16;
    let hour = now.hour() as u16 + minute / 60;
    let day_rollover = hour >= 24;
    let at = AlarmTime {
        hour: (hour % 24) as u8,
        minute: (minute % 60) as u8,
        second: 0,
    };
    (at, day_rollover)
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler {
    state: SchedulerState,
    /// Last alarm write failed; try again on the next poll.
    rearm_pending: bool,
    retention_limit: usize,
    cycles: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(MAX_RETAINED_FILES)
    }
}

impl Scheduler {
    /// `retention_limit` is the maximum number of day files kept on the
    /// medium, the current day included.
    pub fn new(retention_limit: usize) -> Self {
        Self {
            state: SchedulerState::Idle,
            rearm_pending: false,
            retention_limit: retention_limit.max(1),
            cycles: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Completed sampling cycles since boot.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn retention_limit(&self) -> usize {
        self.retention_limit
    }

    /// Boot path: open today's file and arm the first alarm.
    pub fn start<R: RtcPeripheral, F: FileStore>(
        &mut self,
        ctx: &mut LoggerContext,
        clock: &mut ClockService<R>,
        store: &mut SampleStore<F>,
        sink: &mut impl EventSink,
    ) -> Option<AlarmTime> {
        let now = clock.now();
        info!(
            "Scheduler: starting at {}, every {} min, {} channel(s)",
            now.label(),
            ctx.config.interval_minutes(),
            ctx.config.channel_count()
        );
        Self::resolve(ctx, store, &now, sink);
        let (at, _, _) = self.arm(ctx, clock, store, sink, &now);
        at
    }

    /// Main-loop entry.  Runs a cycle if the alarm fired, otherwise
    /// services pending re-arm requests.  Returns a report only when a
    /// cycle ran.
    pub fn poll<R: RtcPeripheral, F: FileStore>(
        &mut self,
        ctx: &mut LoggerContext,
        clock: &mut ClockService<R>,
        store: &mut SampleStore<F>,
        sensors: &mut impl SensorPort,
        sink: &mut impl EventSink,
    ) -> Option<CycleReport> {
        let fired = clock.take_alarm();
        let rearm = ctx.take_rearm_request() || self.rearm_pending;

        if fired {
            self.state = SchedulerState::Sampling;
            let report = self.run_cycle(ctx, clock, store, sensors, sink);
            self.state = SchedulerState::Idle;
            self.cycles = self.cycles.wrapping_add(1);
            return Some(report);
        }
        if rearm {
            let now = clock.now();
            debug!("Scheduler: re-arming from {}", now.label());
            self.arm(ctx, clock, store, sink, &now);
        }
        None
    }

    // ── Cycle ─────────────────────────────────────────────────

    fn run_cycle<R: RtcPeripheral, F: FileStore>(
        &mut self,
        ctx: &mut LoggerContext,
        clock: &mut ClockService<R>,
        store: &mut SampleStore<F>,
        sensors: &mut impl SensorPort,
        sink: &mut impl EventSink,
    ) -> CycleReport {
        let now = clock.now();

        let expected = LogFileName::for_date(now.month(), now.day());
        let mut late_deleted = 0;
        if ctx.active_file() != Some(&expected) {
            if ctx.active_file().is_some() {
                // Day switch seen here rather than at the pre-midnight
                // alarm; make room before the new file is created.
                late_deleted = self.retain(store, sink);
            }
            Self::resolve(ctx, store, &now, sink);
        }

        let mut values: heapless::Vec<u16, MAX_CHANNELS> = heapless::Vec::new();
        for ch in 0..ctx.config.channel_count() {
            let _ = values.push(sensors.read_channel(ch));
        }

        let outcome = if ctx.active_file().is_none() || !store.is_available() {
            SampleOutcome::Dropped(DropReason::StorageUnavailable)
        } else if ctx.cap_reached() {
            warn!(
                "Scheduler: daily cap of {} samples reached, not persisting",
                ctx.config.samples_per_period()
            );
            SampleOutcome::Dropped(DropReason::CapReached)
        } else if store.append(ctx, &now.label(), &values) {
            SampleOutcome::Persisted {
                index: ctx.next_index().saturating_sub(1),
            }
        } else {
            SampleOutcome::Dropped(DropReason::WriteFailed)
        };

        match outcome {
            SampleOutcome::Persisted { index } => {
                if let Some(name) = ctx.active_file() {
                    sink.emit(&LoggerEvent::SamplePersisted {
                        name: name.clone(),
                        index,
                    });
                }
            }
            SampleOutcome::Dropped(reason) => sink.emit(&LoggerEvent::SampleDropped(reason)),
        }

        let (next_alarm, day_rollover, retention_deleted) = self.arm(ctx, clock, store, sink, &now);
        CycleReport {
            at: now,
            values,
            outcome,
            next_alarm,
            day_rollover,
            retention_deleted: late_deleted + retention_deleted,
        }
    }

    fn resolve<F: FileStore>(
        ctx: &mut LoggerContext,
        store: &mut SampleStore<F>,
        now: &WallClock,
        sink: &mut impl EventSink,
    ) {
        match store.resolve_active_file(ctx, now) {
            FileState::Unavailable(e) => sink.emit(&LoggerEvent::FileUnavailable(e)),
            state => {
                if let Some(name) = ctx.active_file() {
                    sink.emit(&LoggerEvent::FileOpened {
                        name: name.clone(),
                        next_index: ctx.next_index(),
                        created: state == FileState::Created,
                    });
                }
            }
        }
    }

    /// Trim day files to one below the limit so the next day's file fits.
    fn retain<F: FileStore>(&self, store: &mut SampleStore<F>, sink: &mut impl EventSink) -> usize {
        if !store.is_available() {
            return 0;
        }
        match store.enforce_retention(self.retention_limit - 1) {
            Ok(n) => {
                if n > 0 {
                    sink.emit(&LoggerEvent::RetentionApplied { deleted: n });
                }
                n
            }
            Err(e) => {
                warn!("Scheduler: retention failed: {}", e);
                0
            }
        }
    }

    /// Program the alarm after `now`.  On a day carry, retention runs
    /// first, leaving room for the file the next day will create.
    fn arm<R: RtcPeripheral, F: FileStore>(
        &mut self,
        ctx: &LoggerContext,
        clock: &mut ClockService<R>,
        store: &mut SampleStore<F>,
        sink: &mut impl EventSink,
        now: &WallClock,
    ) -> (Option<AlarmTime>, bool, usize) {
        let (at, day_rollover) = next_alarm(now, ctx.config.interval_minutes());

        let deleted = if day_rollover { self.retain(store, sink) } else { 0 };

        match clock.schedule_alarm(at) {
            Ok(()) => {
                self.rearm_pending = false;
                sink.emit(&LoggerEvent::AlarmArmed { at, day_rollover });
                (Some(at), day_rollover, deleted)
            }
            Err(e) => {
                if !self.rearm_pending {
                    warn!("Scheduler: alarm write failed: {}, will retry", e);
                }
                self.rearm_pending = true;
                (None, day_rollover, deleted)
            }
        }
    }
}
