//! Fuzz target: `Request::decode`
//!
//! Feeds arbitrary radio payloads to the request decoder and asserts it
//! never panics, and that any accepted frame survives a re-encode.
//!
//! cargo fuzz run fuzz_request_frame

#![no_main]

use fieldlog::rpc::frames::{REQUEST_LEN, Request};
use fieldlog::storage::LogFileName;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(req) = Request::decode(data) else {
        return;
    };
    assert!(data.len() >= REQUEST_LEN, "decoded a short frame");
    assert!(req.filename.len() < 13, "filename field lost its NUL");
    assert_eq!(Request::decode(&req.encode()), Ok(req.clone()));

    // The engine hands the filename straight to the name parser.
    let _ = LogFileName::parse(&req.filename);
});
