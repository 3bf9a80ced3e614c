//! Fuzz target for text redaction.
//!
//! Tests that discovery and redaction handle arbitrary text without
//! panicking, in both single-pass and two-pass modes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scrub_pseudo::{
    DiscoveryMode, DiscoveryProtocol, ExtractionRule, PatternType, PseudonymizationMode,
    Pseudonymizer, RedactionSession,
};

fn session(mode: DiscoveryMode) -> Option<RedactionSession> {
    let rule = ExtractionRule::regex("home", PatternType::Username, r"/home/([^/\s]+)", 1).ok()?;
    let pseudonymizer = Pseudonymizer::builder()
        .mode(PseudonymizationMode::Realistic)
        .build()
        .ok()?;
    RedactionSession::new(pseudonymizer, DiscoveryProtocol::new(mode, vec![rule]))
        .with_static_patterns([("email", r"[^\s@]+@[^\s@]+")])
        .ok()
}

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let lines: Vec<String> = text.lines().map(str::to_string).collect();

    for mode in [DiscoveryMode::Fast, DiscoveryMode::TwoPass] {
        if let Some(mut s) = session(mode) {
            let _ = s.run(|| lines.clone());
        }
    }
});
