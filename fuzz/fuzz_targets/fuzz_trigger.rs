//! Fuzz target for object-created notification parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use obf_core::TriggerEvent;

fuzz_target!(|data: &str| {
    if let Ok(event) = TriggerEvent::from_json(data) {
        assert!(!event.records.is_empty());
        let _ = event.requests(&["name".to_string()]);
    }
});
