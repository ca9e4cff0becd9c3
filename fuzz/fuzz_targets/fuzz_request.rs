//! Fuzz target for request validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use obf_common::RedactionRequest;

fuzz_target!(|data: &str| {
    if let Ok(request) = RedactionRequest::from_json(data) {
        assert!(!request.fields.is_empty());
    }
});
