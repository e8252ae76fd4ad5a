//! Fuzz target: `Record::parse_line`
//!
//! Day files live on removable media and may be edited or corrupted
//! off-device.  Any line the parser accepts must format back to a line
//! that parses to the same record.
//!
//! cargo fuzz run fuzz_record_line

#![no_main]

use fieldlog::storage::Record;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Some(record) = Record::parse_line(text) {
        let line = record.to_line();
        assert_eq!(Record::parse_line(&line), Some(record));
    }
});
