//! Fuzz target for PIX code scraping over arbitrary HTML.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_pix_page -- -max_total_time=600

#![no_main]

use cobrador_core::BR_CODE_PREFIX;
use cobrador_extract::find_pix_code;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(html) = std::str::from_utf8(data) {
        if let Some(code) = find_pix_code(html) {
            assert!(code.as_str().starts_with(BR_CODE_PREFIX));
        }
    }
});
