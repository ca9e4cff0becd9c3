//! Fuzz target for settings.json parsing.
//!
//! Tests that settings file parsing handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use obf_config::SettingsFile;

fuzz_target!(|data: &[u8]| {
    let _ = serde_json::from_slice::<SettingsFile>(data);
});
