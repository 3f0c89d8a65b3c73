//! Fuzz target for the batched RPC envelope decoder.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_envelope_decode -- -max_total_time=600

#![no_main]

use cobrador_accounting::decode_batch;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        let _ = decode_batch::<Value>(body, 0);
        let _ = decode_batch::<Vec<String>>(body, 1);
    }
});
