//! Alarm-driven sampling through the full node.

use fieldlog::adapters::mem_store::MemFileStore;
use fieldlog::app::events::{DropReason, LoggerEvent};
use fieldlog::app::ports::FileStore;
use fieldlog::app::service::LoggerNode;
use fieldlog::clock::{AlarmTime, WallClock};
use fieldlog::config::SamplingConfig;
use fieldlog::scheduler::SampleOutcome;
use fieldlog::storage::LogFileName;

use crate::booted_node;
use crate::mock_hw::{FixedSensors, MockRadio, MockRtc, NoDelay, RecordingSink};

#[test]
fn boot_arms_first_alarm_and_listens() {
    let (node, radio, sink) = booted_node(MockRtc::at(2024, 3, 7, 8, 3));
    assert!(radio.listening);
    assert_eq!(node.clock().rtc().alarm, Some(AlarmTime::new(8, 13, 0).unwrap()));
    assert!(matches!(
        sink.events.last(),
        Some(LoggerEvent::Started { first_alarm: Some(_), .. })
    ));
    assert!(node.store().backend().has("LOG_0307.CSV"));
}

#[test]
fn alarm_produces_one_record_per_cycle() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 8, 0));
    let mut sensors = FixedSensors::new(100);
    let mut delay = NoDelay::default();

    // No alarm: nothing happens.
    let out = node.poll(&mut radio, &mut sensors, &mut delay, &mut sink);
    assert!(out.cycle.is_none());
    assert_eq!(sensors.reads, 0);

    for expected in 0..3 {
        node.clock_mut().rtc_mut().fire_on(2024, 3, 7);
        let report = node
            .poll(&mut radio, &mut sensors, &mut delay, &mut sink)
            .cycle
            .unwrap();
        assert_eq!(report.outcome, SampleOutcome::Persisted { index: expected });
        assert_eq!(&report.values[..], &[100, 101, 102, 103]);
    }
    assert_eq!(node.scheduler().cycles(), 3);
    assert_eq!(node.clock().rtc().alarm, Some(AlarmTime::new(8, 40, 0).unwrap()));

    let content = node.store().backend().contents("LOG_0307.CSV").unwrap();
    let text = std::str::from_utf8(content).unwrap();
    assert_eq!(
        text,
        "index,timestamp,ch0,ch1,ch2,ch3\n\
         0,2024-03-07 08:10,100,101,102,103\n\
         1,2024-03-07 08:20,100,101,102,103\n\
         2,2024-03-07 08:30,100,101,102,103\n"
    );
}

#[test]
fn rollover_at_2355_runs_retention_before_next_day_sample() {
    let mut files = MemFileStore::new();
    for day in 1..=10 {
        files
            .create(LogFileName::for_date(2, day).as_str(), b"index,timestamp\n")
            .unwrap();
    }
    let mut node = LoggerNode::new(MockRtc::at(2023, 3, 7, 23, 45), files, SamplingConfig::default())
        .with_retention_limit(8);
    let mut radio = MockRadio::new();
    let mut sink = RecordingSink::new();
    let mut sensors = FixedSensors::new(1);
    let mut delay = NoDelay::default();
    node.boot(&mut radio, &mut sink);
    assert_eq!(node.clock().rtc().alarm, Some(AlarmTime::new(23, 55, 0).unwrap()));

    node.clock_mut().rtc_mut().fire_on(2023, 3, 7);
    let report = node
        .poll(&mut radio, &mut sensors, &mut delay, &mut sink)
        .cycle
        .unwrap();
    assert_eq!(report.next_alarm, Some(AlarmTime::new(0, 5, 0).unwrap()));
    assert!(report.day_rollover);
    // 11 files, pruned to 7 so tomorrow's makes 8.
    assert_eq!(report.retention_deleted, 4);
    assert_eq!(node.store().backend().file_count(), 7);

    node.clock_mut().rtc_mut().fire_on(2023, 3, 8);
    let report = node
        .poll(&mut radio, &mut sensors, &mut delay, &mut sink)
        .cycle
        .unwrap();
    assert_eq!(report.outcome, SampleOutcome::Persisted { index: 0 });
    assert_eq!(node.store().backend().file_count(), 8);

    let retention_at = sink
        .events
        .iter()
        .position(|e| matches!(e, LoggerEvent::RetentionApplied { .. }))
        .unwrap();
    let first_new_day_sample = sink
        .events
        .iter()
        .position(|e| {
            matches!(e, LoggerEvent::SamplePersisted { name, .. } if name.as_str() == "LOG_0308.CSV")
        })
        .unwrap();
    assert!(retention_at < first_new_day_sample);
}

#[test]
fn alarm_handled_after_midnight_still_runs_retention() {
    let mut files = MemFileStore::new();
    for day in 1..=10 {
        files
            .create(LogFileName::for_date(2, day).as_str(), b"index,timestamp\n")
            .unwrap();
    }
    let mut node = LoggerNode::new(MockRtc::at(2023, 3, 7, 23, 40), files, SamplingConfig::default())
        .with_retention_limit(8);
    let mut radio = MockRadio::new();
    let mut sink = RecordingSink::new();
    let mut sensors = FixedSensors::new(1);
    let mut delay = NoDelay::default();
    node.boot(&mut radio, &mut sink);
    assert_eq!(node.clock().rtc().alarm, Some(AlarmTime::new(23, 50, 0).unwrap()));
    assert_eq!(node.store().backend().file_count(), 11);

    // The 23:50 alarm is only serviced once the clock has crossed midnight,
    // so no pre-midnight cycle ever saw the day carry.
    {
        let rtc = node.clock_mut().rtc_mut();
        rtc.now = WallClock::new(2023, 3, 8, 0, 0, 40).unwrap();
        rtc.fired = true;
    }
    let report = node
        .poll(&mut radio, &mut sensors, &mut delay, &mut sink)
        .cycle
        .unwrap();
    assert_eq!(report.outcome, SampleOutcome::Persisted { index: 0 });
    assert!(!report.day_rollover);
    assert_eq!(report.retention_deleted, 4);
    assert_eq!(node.store().backend().file_count(), 8);
    assert!(node.store().backend().has("LOG_0308.CSV"));
    assert!(!node.store().backend().has("LOG_0201.CSV"));

    let retention_at = sink
        .events
        .iter()
        .position(|e| matches!(e, LoggerEvent::RetentionApplied { deleted: 4 }))
        .unwrap();
    let first_new_day_sample = sink
        .events
        .iter()
        .position(|e| {
            matches!(e, LoggerEvent::SamplePersisted { name, .. } if name.as_str() == "LOG_0308.CSV")
        })
        .unwrap();
    assert!(retention_at < first_new_day_sample);
}

#[test]
fn month_and_year_rollover_switch_files() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 12, 31, 23, 40));
    let mut sensors = FixedSensors::new(0);
    let mut delay = NoDelay::default();

    node.clock_mut().rtc_mut().fire_on(2024, 12, 31);
    node.poll(&mut radio, &mut sensors, &mut delay, &mut sink);
    node.clock_mut().rtc_mut().fire_on(2025, 1, 1);
    node.poll(&mut radio, &mut sensors, &mut delay, &mut sink);

    assert_eq!(node.context().active_file().unwrap().as_str(), "LOG_0101.CSV");
    let content = node.store().backend().contents("LOG_0101.CSV").unwrap();
    assert!(std::str::from_utf8(content).unwrap().contains("0,2025-01-01 00:00,"));
}

#[test]
fn daily_cap_drops_samples_but_keeps_alarms() {
    let config = SamplingConfig::new(60, 1).unwrap();
    let mut files = MemFileStore::new();
    let mut content = String::from("index,timestamp,ch0\n");
    for i in 0..24 {
        content.push_str(&format!("{},2024-03-07 00:00,1\n", i));
    }
    files.create("LOG_0307.CSV", content.as_bytes()).unwrap();
    let (mut node, mut radio, mut sink) =
        crate::booted_node_with(MockRtc::at(2024, 3, 7, 10, 0), files, config);
    assert!(node.context().cap_reached());

    node.clock_mut().rtc_mut().fire_on(2024, 3, 7);
    let report = node
        .poll(&mut radio, &mut FixedSensors::new(0), &mut NoDelay::default(), &mut sink)
        .cycle
        .unwrap();
    assert_eq!(report.outcome, SampleOutcome::Dropped(DropReason::CapReached));
    assert_eq!(report.next_alarm, Some(AlarmTime::new(12, 0, 0).unwrap()));
}

#[test]
fn failed_writes_leave_counters_untouched() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 8, 0));
    node.store_mut().backend_mut().fail_appends(true);

    node.clock_mut().rtc_mut().fire_on(2024, 3, 7);
    let report = node
        .poll(&mut radio, &mut FixedSensors::new(0), &mut NoDelay::default(), &mut sink)
        .cycle
        .unwrap();
    assert_eq!(report.outcome, SampleOutcome::Dropped(DropReason::WriteFailed));
    assert_eq!(node.context().next_index(), 0);
    assert_eq!(node.context().period_count(), 0);
}

#[test]
fn clock_failure_degrades_without_halting() {
    let mut rtc = MockRtc::at(2024, 3, 7, 8, 0);
    rtc.fail_init = true;
    let mut radio = MockRadio::new();
    radio.fail_init = true;
    let mut node = LoggerNode::new(rtc, MemFileStore::new(), SamplingConfig::default());
    let report = node.boot(&mut radio, &mut RecordingSink::new());
    assert!(!report.clock_ok);
    assert!(!report.radio_ok);
    assert!(report.storage_ok);

    // Radio is disabled: inbound payloads are never consumed.
    radio.push(&[0x02; 20]);
    let out = node.poll(
        &mut radio,
        &mut FixedSensors::new(0),
        &mut NoDelay::default(),
        &mut RecordingSink::new(),
    );
    assert!(out.exchange.is_none());
    assert_eq!(radio.inbound.len(), 1);
}
