//! Fuzz target for CSV redaction.
//!
//! Arbitrary bytes go through encoding resolution and the tabular engine.
//! Any outcome but a panic is acceptable.

#![no_main]

use libfuzzer_sys::fuzz_target;
use obf_redact::{Format, RedactionEngine};

fuzz_target!(|data: &[u8]| {
    let _ = RedactionEngine::new().redact_fields(Format::Tabular, data, &["name", "email"]);
});
