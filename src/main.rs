//! Fieldlog firmware main entry point.
//!
//! Hexagonal architecture with a single cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SoftRtc        FsFileStore / MemFileStore     UdpRadio        │
//! │  (RtcPeripheral)(FileStore)                    (RadioPort)     │
//! │  AdcBank        LogEventSink                   StdDelay        │
//! │  (SensorPort)   (EventSink)                    (DelayNs)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │                LoggerNode (pure logic)                 │    │
//! │  │  ProtocolEngine · Scheduler · SampleStore · Clock      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the host the binary is a simulator:
//!
//! ```text
//! fieldlog [--data DIR] [--bind ADDR] [--peer ADDR]
//!          [--interval MIN] [--time-scale N]
//! ```
//!
//! Without `--data` the log files live in RAM.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::info;

use fieldlog::adapters::adc::AdcBank;
use fieldlog::adapters::delay::StdDelay;
use fieldlog::adapters::log_sink::LogEventSink;
use fieldlog::adapters::soft_rtc::SoftRtc;
use fieldlog::adapters::udp_radio::UdpRadio;
use fieldlog::app::ports::{FileStore, RadioPort, SensorPort};
use fieldlog::app::service::LoggerNode;
use fieldlog::config::SamplingConfig;

/// Main-loop idle period between polls.
const LOOP_PERIOD: Duration = Duration::from_millis(20);

// ── Device ────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use fieldlog::adapters::fs_store::FsFileStore;
    use fieldlog::clock::WallClock;

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Fieldlog v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Adapters ───────────────────────────────────────────
    let rtc = SoftRtc::new(WallClock::default());
    let files = FsFileStore::open("/sdcard");
    let mut radio = UdpRadio::new("0.0.0.0:4210".parse()?, None);
    let mut sensors = AdcBank::new()?;

    run(rtc, files, SamplingConfig::default(), &mut radio, &mut sensors, || {})
}

// ── Host simulator ────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
struct SimArgs {
    data: Option<std::path::PathBuf>,
    bind: std::net::SocketAddr,
    peer: Option<std::net::SocketAddr>,
    interval: u8,
    time_scale: u32,
}

#[cfg(not(target_os = "espidf"))]
fn parse_args() -> Result<SimArgs> {
    let mut args = SimArgs {
        data: None,
        bind: "127.0.0.1:4210".parse()?,
        peer: None,
        interval: fieldlog::config::DEFAULT_INTERVAL_MINUTES,
        time_scale: 1,
    };
    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        let mut value = || it.next().ok_or_else(|| anyhow::anyhow!("{} needs a value", flag));
        match flag.as_str() {
            "--data" => args.data = Some(value()?.into()),
            "--bind" => args.bind = value()?.parse()?,
            "--peer" => args.peer = Some(value()?.parse()?),
            "--interval" => args.interval = value()?.parse()?,
            "--time-scale" => args.time_scale = value()?.parse()?,
            other => anyhow::bail!("unknown argument {}", other),
        }
    }
    Ok(args)
}

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use fieldlog::adapters::adc::sim_set_channel;
    use fieldlog::adapters::fs_store::FsFileStore;
    use fieldlog::adapters::mem_store::MemFileStore;
    use fieldlog::config::MAX_CHANNELS;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let config = SamplingConfig::new(args.interval, MAX_CHANNELS as u8)?;
    let rtc = SoftRtc::from_system_time(args.time_scale);
    let mut radio = UdpRadio::new(args.bind, args.peer);
    let mut sensors = AdcBank::new()?;

    // Slow synthetic ramps, one per channel.
    let mut tick: u32 = 0;
    let synth = move || {
        tick = tick.wrapping_add(1);
        for ch in 0..MAX_CHANNELS as u8 {
            let span = 256 * (ch as u32 + 1);
            sim_set_channel(ch, (1024 + (tick / 10) % span) as u16);
        }
    };

    info!("Sim: time scale x{}, interval {} min", args.time_scale, args.interval);
    match args.data {
        Some(dir) => run(rtc, FsFileStore::open(dir), config, &mut radio, &mut sensors, synth),
        None => run(rtc, MemFileStore::new(), config, &mut radio, &mut sensors, synth),
    }
}

// ── Main loop ─────────────────────────────────────────────────

fn run<F: FileStore>(
    rtc: SoftRtc,
    files: F,
    config: SamplingConfig,
    radio: &mut impl RadioPort,
    sensors: &mut impl SensorPort,
    mut between_polls: impl FnMut(),
) -> Result<()> {
    let mut sink = LogEventSink::new();
    let mut delay = StdDelay;
    let mut node = LoggerNode::new(rtc, files, config);

    let boot = node.boot(radio, &mut sink);
    info!(
        "System ready (clock={}, storage={}, radio={}). Entering main loop.",
        boot.clock_ok, boot.storage_ok, boot.radio_ok
    );

    loop {
        between_polls();
        node.poll(radio, sensors, &mut delay, &mut sink);
        std::thread::sleep(LOOP_PERIOD);
    }
}
