//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

mod protocol_tests;
mod scheduler_tests;
mod store_tests;

use fieldlog::adapters::mem_store::MemFileStore;
use fieldlog::app::service::LoggerNode;
use fieldlog::config::SamplingConfig;

use mock_hw::{MockRadio, MockRtc, RecordingSink};

pub type TestNode = LoggerNode<MockRtc, MemFileStore>;

/// Booted node on an empty RAM store with default config.
pub fn booted_node(rtc: MockRtc) -> (TestNode, MockRadio, RecordingSink) {
    booted_node_with(rtc, MemFileStore::new(), SamplingConfig::default())
}

pub fn booted_node_with(
    rtc: MockRtc,
    files: MemFileStore,
    config: SamplingConfig,
) -> (TestNode, MockRadio, RecordingSink) {
    let mut node = LoggerNode::new(rtc, files, config);
    let mut radio = MockRadio::new();
    let mut sink = RecordingSink::new();
    node.boot(&mut radio, &mut sink);
    (node, radio, sink)
}
