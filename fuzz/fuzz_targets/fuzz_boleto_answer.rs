//! Fuzz target for parsing model answers into boletos.
//!
//! Accepted boletos must always carry an empty or 48-digit code.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_boleto_answer -- -max_total_time=600

#![no_main]

use cobrador_core::normalize_payment_code;
use cobrador_extract::parse_answer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(answer) = std::str::from_utf8(data) {
        let normalized = normalize_payment_code(answer);
        assert!(!normalized.contains(|c: char| c.is_whitespace() || c == '-'));

        if let Ok(boleto) = parse_answer(answer) {
            let len = boleto.payment_code.len();
            assert!(len == 0 || len == 48);
            assert!(boleto.payment_code.chars().all(|c| c.is_ascii_digit()));
        }
    }
});
