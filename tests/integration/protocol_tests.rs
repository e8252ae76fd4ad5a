//! Radio command protocol through the full node.

use fieldlog::adapters::mem_store::MemFileStore;
use fieldlog::app::events::LoggerEvent;
use fieldlog::app::ports::FileStore;
use fieldlog::clock::{AlarmTime, ClockField};
use fieldlog::config::{INTER_FRAME_DELAY_MS, SamplingConfig};
use fieldlog::rpc::INTERVAL_KEY;
use fieldlog::rpc::frames::{
    DataResponse, FileEntry, INVALID_VALUE, LIST_END, LIST_START, NACK, Opcode, Request,
};

use crate::mock_hw::{FixedSensors, MockRadio, MockRtc, NoDelay, RadioMode, RecordingSink};
use crate::{TestNode, booted_node, booted_node_with};

fn request(op: Opcode) -> Request {
    Request::new(op as u8)
}

fn rtc_request(op: Opcode, key: u8, value: u8) -> Request {
    let mut req = request(op);
    req.key = key;
    req.value = value;
    req
}

fn data_request(name: &str, start: u16, count: u16) -> Request {
    let mut req = request(Opcode::RequestData);
    req.filename.push_str(name).unwrap();
    req.start_index = start;
    req.num_samples = count;
    req
}

/// Deliver one request and poll once.  Returns the frames sent.
fn exchange(
    node: &mut TestNode,
    radio: &mut MockRadio,
    sink: &mut RecordingSink,
    req: &[u8],
) -> Vec<Vec<u8>> {
    radio.push(req);
    node.poll(radio, &mut FixedSensors::new(0), &mut NoDelay::default(), sink);
    radio.take_sent()
}

/// Take `n` samples at consecutive alarms on 2024-03-07.
fn sample(node: &mut TestNode, radio: &mut MockRadio, sink: &mut RecordingSink, n: usize) {
    let mut sensors = FixedSensors::new(500);
    for _ in 0..n {
        node.clock_mut().rtc_mut().fire_on(2024, 3, 7);
        node.poll(radio, &mut sensors, &mut NoDelay::default(), sink);
    }
}

// ── REQUEST_DATA ──────────────────────────────────────────────

#[test]
fn request_data_streams_paced_records() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    sample(&mut node, &mut radio, &mut sink, 5);

    radio.push(&data_request("LOG_0307.CSV", 1, 3).encode());
    let mut delay = NoDelay::default();
    let out = node.poll(&mut radio, &mut FixedSensors::new(0), &mut delay, &mut sink);
    assert_eq!(out.exchange.unwrap().frames, 3);

    let frames = radio.take_sent();
    let decoded: Vec<DataResponse> = frames.iter().map(|f| DataResponse::decode(f).unwrap()).collect();
    assert_eq!(decoded.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(decoded[0].command, Opcode::RequestData as u8);
    assert_eq!(decoded[0].values, [500, 501, 502, 503]);
    assert_eq!(decoded[0].timestamp.as_str(), "2024-03-07 06:20");
    assert_eq!(delay.total_ns, 2 * INTER_FRAME_DELAY_MS as u64 * 1_000_000);

    assert_eq!(radio.sent_while_listening, 0);
    assert!(radio.listening);
}

#[test]
fn request_data_past_end_stops_early() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    sample(&mut node, &mut radio, &mut sink, 2);
    let frames = exchange(&mut node, &mut radio, &mut sink, &data_request("LOG_0307.CSV", 1, 10).encode());
    assert_eq!(frames.len(), 1);
}

#[test]
fn request_data_for_missing_file_sends_nothing_and_keeps_listening() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    let modes_before = radio.modes.len();

    let frames = exchange(&mut node, &mut radio, &mut sink, &data_request("LOG_0101.CSV", 0, 5).encode());
    assert!(frames.is_empty());
    assert!(radio.listening);
    assert!(!radio.modes[modes_before..].contains(&RadioMode::Transmit));

    let frames = exchange(&mut node, &mut radio, &mut sink, &data_request("../secret", 0, 5).encode());
    assert!(frames.is_empty());
    assert!(radio.listening);
}

// ── LIST_FILES ────────────────────────────────────────────────

#[test]
fn list_files_brackets_sorted_entries() {
    let mut files = MemFileStore::new();
    files.create("LOG_0102.CSV", b"index,timestamp,ch0\n").unwrap();
    files.create("NOTES.TXT", b"").unwrap();
    let (mut node, mut radio, mut sink) =
        booted_node_with(MockRtc::at(2024, 3, 7, 6, 0), files, SamplingConfig::default());

    let frames = exchange(&mut node, &mut radio, &mut sink, &request(Opcode::ListFiles).encode());
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0], vec![LIST_START]);
    assert_eq!(frames[3], vec![LIST_END]);
    let first = FileEntry::decode(&frames[1]).unwrap();
    let second = FileEntry::decode(&frames[2]).unwrap();
    assert_eq!((first.file_index, first.total_files), (0, 2));
    assert_eq!((second.file_index, second.total_files), (1, 2));
    assert_eq!(first.filename.as_str(), "LOG_0102.CSV");
    assert_eq!(second.filename.as_str(), "LOG_0307.CSV");
    assert_eq!(frames[1][0], Opcode::ListFiles as u8);
    assert!(radio.listening);
}

#[test]
fn list_files_on_unavailable_storage_sends_only_markers() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    node.store_mut().backend_mut().set_available(false);

    let frames = exchange(&mut node, &mut radio, &mut sink, &request(Opcode::ListFiles).encode());
    assert_eq!(frames, vec![vec![LIST_START], vec![LIST_END]]);
    assert!(radio.listening);
}

#[test]
fn list_files_with_no_day_files_sends_only_markers() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    let backend = node.store_mut().backend_mut();
    backend.delete("LOG_0307.CSV").unwrap();
    backend.create("NOTES.TXT", b"").unwrap();
    assert!(backend.is_available());

    let frames = exchange(&mut node, &mut radio, &mut sink, &request(Opcode::ListFiles).encode());
    assert_eq!(frames, vec![vec![LIST_START], vec![LIST_END]]);
    assert!(radio.listening);
}

// ── MODIFY_RTC / GET_RTC_INFO ─────────────────────────────────

#[test]
fn modify_rtc_rejects_february_30() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2023, 2, 10, 6, 0));
    let before = node.clock_mut().now();

    let frames = exchange(
        &mut node,
        &mut radio,
        &mut sink,
        &rtc_request(Opcode::ModifyRtc, ClockField::Day as u8, 30).encode(),
    );
    let rsp = DataResponse::decode(&frames[0]).unwrap();
    assert_eq!(rsp.command, Opcode::ModifyRtc as u8);
    assert_eq!(rsp.key, ClockField::Day as u8);
    assert_eq!(rsp.value, 0);
    assert_eq!(node.clock_mut().now(), before);
    assert!(node.clock().rtc().writes.is_empty());
}

#[test]
fn modify_rtc_day_reresolves_active_file_and_rearms() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    let frames = exchange(
        &mut node,
        &mut radio,
        &mut sink,
        &rtc_request(Opcode::ModifyRtc, ClockField::Day as u8, 9).encode(),
    );
    assert_eq!(DataResponse::decode(&frames[0]).unwrap().value, 1);
    assert_eq!(node.context().active_file().unwrap().as_str(), "LOG_0309.CSV");
    assert!(node.store().backend().has("LOG_0309.CSV"));
    assert!(sink.events.contains(&LoggerEvent::ClockAdjusted {
        field: ClockField::Day,
        value: 9
    }));

    let frames = exchange(
        &mut node,
        &mut radio,
        &mut sink,
        &rtc_request(Opcode::ModifyRtc, ClockField::Hour as u8, 14).encode(),
    );
    assert_eq!(DataResponse::decode(&frames[0]).unwrap().value, 1);
    // The same poll re-armed from the new time.
    assert_eq!(node.clock().rtc().alarm, Some(AlarmTime::new(14, 10, 0).unwrap()));
}

#[test]
fn interval_key_sets_interval_and_resets_counter() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    sample(&mut node, &mut radio, &mut sink, 3);
    assert_eq!(node.context().period_count(), 3);

    let frames = exchange(
        &mut node,
        &mut radio,
        &mut sink,
        &rtc_request(Opcode::ModifyRtc, INTERVAL_KEY, 30).encode(),
    );
    assert_eq!(DataResponse::decode(&frames[0]).unwrap().value, 1);
    assert_eq!(node.context().config.interval_minutes(), 30);
    assert_eq!(node.context().period_count(), 0);
    assert_eq!(node.context().next_index(), 3);
    assert_eq!(node.clock().rtc().alarm, Some(AlarmTime::new(7, 0, 0).unwrap()));

    let frames = exchange(
        &mut node,
        &mut radio,
        &mut sink,
        &rtc_request(Opcode::ModifyRtc, INTERVAL_KEY, 61).encode(),
    );
    assert_eq!(DataResponse::decode(&frames[0]).unwrap().value, 0);
    assert_eq!(node.context().config.interval_minutes(), 30);

    let frames = exchange(
        &mut node,
        &mut radio,
        &mut sink,
        &rtc_request(Opcode::GetRtcInfo, INTERVAL_KEY, 0).encode(),
    );
    assert_eq!(DataResponse::decode(&frames[0]).unwrap().value, 30);
}

#[test]
fn get_rtc_info_reads_fields_and_flags_unknown_keys() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2031, 11, 4, 17, 42));
    let read = |node: &mut TestNode, radio: &mut MockRadio, sink: &mut RecordingSink, key: u8| {
        let frames = exchange(node, radio, sink, &rtc_request(Opcode::GetRtcInfo, key, 0).encode());
        let rsp = DataResponse::decode(&frames[0]).unwrap();
        assert_eq!(rsp.command, Opcode::GetRtcInfo as u8);
        assert_eq!(rsp.key, key);
        rsp.value
    };
    assert_eq!(read(&mut node, &mut radio, &mut sink, ClockField::Year as u8), 31);
    assert_eq!(read(&mut node, &mut radio, &mut sink, ClockField::Month as u8), 11);
    assert_eq!(read(&mut node, &mut radio, &mut sink, ClockField::Minute as u8), 42);
    assert_eq!(read(&mut node, &mut radio, &mut sink, 42), INVALID_VALUE);
    assert!(radio.listening);
}

// ── Malformed traffic ─────────────────────────────────────────

#[test]
fn unknown_opcode_is_nacked() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    let frames = exchange(&mut node, &mut radio, &mut sink, &Request::new(0x7A).encode());
    assert_eq!(frames.len(), 1);
    let rsp = DataResponse::decode(&frames[0]).unwrap();
    assert_eq!(rsp.command, NACK);
    assert_eq!(rsp.key, 0x7A);
    assert_eq!(rsp.value, 0);
    assert!(radio.listening);
}

#[test]
fn short_or_unterminated_frames_get_no_response() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    let modes_before = radio.modes.len();

    assert!(exchange(&mut node, &mut radio, &mut sink, &[Opcode::ListFiles as u8]).is_empty());
    let mut unterminated = data_request("LOG_0307.CSV", 0, 1).encode();
    unterminated[5 + 12] = b'X';
    assert!(exchange(&mut node, &mut radio, &mut sink, &unterminated).is_empty());

    assert!(radio.listening);
    assert!(!radio.modes[modes_before..].contains(&RadioMode::Transmit));
    assert_eq!(node.engine_stats().discarded, 2);
    assert_eq!(
        sink.count(|e| matches!(e, LoggerEvent::FrameDiscarded { .. })),
        2
    );
}

#[test]
fn protocol_never_disturbs_sampling_state() {
    let (mut node, mut radio, mut sink) = booted_node(MockRtc::at(2024, 3, 7, 6, 0));
    sample(&mut node, &mut radio, &mut sink, 2);
    let index = node.context().next_index();

    exchange(&mut node, &mut radio, &mut sink, &data_request("LOG_0307.CSV", 0, 2).encode());
    exchange(&mut node, &mut radio, &mut sink, &request(Opcode::ListFiles).encode());

    assert_eq!(node.context().next_index(), index);
    sample(&mut node, &mut radio, &mut sink, 1);
    assert_eq!(node.context().next_index(), index + 1);
}
