//! Logger node — the hexagonal core.
//!
//! [`LoggerNode`] owns the clock service, the sample store, the shared
//! [`LoggerContext`], the sampling scheduler and the protocol engine.
//! Peripherals that are only borrowed per call (radio, sensors, delay,
//! event sink) are injected at call sites, making the whole node
//! testable with mock adapters.
//!
//! ```text
//!   RadioPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                 │         LoggerNode          │
//!  SensorPort ──▶ │ Engine · Scheduler · Store  │
//!                 │        Clock · Context      │
//!                 └─────────────────────────────┘
//! ```
//!
//! The main loop calls [`LoggerNode::poll`] forever.  Each poll first
//! services the radio, then the alarm; the two never interleave.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::clock::{AlarmTime, ClockService};
use crate::config::SamplingConfig;
use crate::rpc::{EngineStats, Exchange, ProtocolEngine};
use crate::scheduler::{CycleReport, Scheduler};
use crate::storage::SampleStore;

use super::context::LoggerContext;
use super::events::LoggerEvent;
use super::ports::{EventSink, FileStore, RadioPort, RtcPeripheral, SensorPort};

/// Which subsystems came up at boot.  A `false` subsystem degrades to
/// a no-op; nothing here stops the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    pub clock_ok: bool,
    pub storage_ok: bool,
    pub radio_ok: bool,
    pub first_alarm: Option<AlarmTime>,
}

/// What one main-loop iteration did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollOutcome {
    pub exchange: Option<Exchange>,
    pub cycle: Option<CycleReport>,
}

pub struct LoggerNode<R: RtcPeripheral, F: FileStore> {
    clock: ClockService<R>,
    store: SampleStore<F>,
    ctx: LoggerContext,
    scheduler: Scheduler,
    engine: ProtocolEngine,
    radio_ready: bool,
}

impl<R: RtcPeripheral, F: FileStore> LoggerNode<R, F> {
    pub fn new(rtc: R, files: F, config: SamplingConfig) -> Self {
        Self {
            clock: ClockService::new(rtc),
            store: SampleStore::new(files),
            ctx: LoggerContext::new(config),
            scheduler: Scheduler::default(),
            engine: ProtocolEngine::new(),
            radio_ready: false,
        }
    }

    /// Override the number of day files kept on the medium.
    pub fn with_retention_limit(mut self, limit: usize) -> Self {
        self.scheduler = Scheduler::new(limit);
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up peripherals, open today's file and arm the first alarm.
    pub fn boot(&mut self, radio: &mut impl RadioPort, sink: &mut impl EventSink) -> BootReport {
        let clock_ok = match self.clock.init() {
            Ok(()) => true,
            Err(e) => {
                error!("Node: clock init failed: {}", e);
                false
            }
        };

        let storage_ok = self.store.is_available();
        if !storage_ok {
            warn!("Node: storage unavailable, samples will be dropped");
        }

        self.radio_ready = match radio.init() {
            Ok(()) => {
                radio.start_listening();
                true
            }
            Err(e) => {
                error!("Node: radio init failed: {}, protocol disabled", e);
                false
            }
        };

        let first_alarm = self
            .scheduler
            .start(&mut self.ctx, &mut self.clock, &mut self.store, sink);

        let now = self.clock.now();
        sink.emit(&LoggerEvent::Started { now, first_alarm });
        info!(
            "Node: up (clock={}, storage={}, radio={})",
            clock_ok, storage_ok, self.radio_ready
        );

        BootReport {
            clock_ok,
            storage_ok,
            radio_ok: self.radio_ready,
            first_alarm,
        }
    }

    /// One main-loop iteration: at most one radio request, then the
    /// alarm.  Never blocks beyond reply pacing.
    pub fn poll(
        &mut self,
        radio: &mut impl RadioPort,
        sensors: &mut impl SensorPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> PollOutcome {
        let exchange = if self.radio_ready {
            self.engine.poll(
                radio,
                delay,
                &mut self.clock,
                &mut self.store,
                &mut self.ctx,
                sink,
            )
        } else {
            None
        };

        let cycle = self.scheduler.poll(
            &mut self.ctx,
            &mut self.clock,
            &mut self.store,
            sensors,
            sink,
        );

        PollOutcome { exchange, cycle }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn context(&self) -> &LoggerContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut LoggerContext {
        &mut self.ctx
    }

    pub fn clock(&self) -> &ClockService<R> {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut ClockService<R> {
        &mut self.clock
    }

    pub fn store(&self) -> &SampleStore<F> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SampleStore<F> {
        &mut self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn engine_stats(&self) -> EngineStats {
        self.engine.stats()
    }

    pub fn radio_ready(&self) -> bool {
        self.radio_ready
    }
}
