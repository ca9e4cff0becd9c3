//! Fuzz target for JSON redaction.
//!
//! Redacted output is fed back through the engine; neither pass may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use obf_redact::{Format, RedactionEngine};

fuzz_target!(|data: &[u8]| {
    let engine = RedactionEngine::new();
    if let Ok(first) = engine.redact_fields(Format::Record, data, &["name"]) {
        let _ = engine.redact_fields(Format::Record, &first.output, &["name"]);
    }
});
