//! Fuzz target for configuration parsing.
//!
//! Tests that JSON and YAML configuration parsing, validation and building
//! handle arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scrub_config::ScrubConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for parsed in [ScrubConfig::parse_json(text), ScrubConfig::parse_yaml(text)] {
        if let Ok(config) = parsed {
            if config.validate().is_ok() {
                let _ = config.build_session();
            }
        }
    }
});
