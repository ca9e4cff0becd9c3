//! Fuzz target for Parquet redaction.
//!
//! Tests that corrupt Parquet input is rejected without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use obf_redact::{Format, RedactionEngine};

fuzz_target!(|data: &[u8]| {
    let _ = RedactionEngine::new().redact_fields(Format::Columnar, data, &["name"]);
});
