//! Fuzz target for generator pattern compilation and sampling.
//!
//! Tests that arbitrary patterns either fail construction with an error or
//! generate values that the pattern itself matches, deterministically.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scrub_pseudo::PatternBasedGenerator;

#[derive(Arbitrary, Debug)]
struct Input {
    pattern: String,
    originals: Vec<String>,
    seed: u64,
}

fuzz_target!(|input: Input| {
    if input.pattern.len() > 256 {
        return;
    }

    let Ok(mut generator) = PatternBasedGenerator::new([("f", input.pattern.as_str())], input.seed)
    else {
        return;
    };
    for original in input.originals.iter().take(16) {
        let Some(first) = generator.generate("f", original) else {
            panic!("registered pattern returned None");
        };
        assert!(generator.matches("f", &first), "nonconforming {:?}", first);
        assert_eq!(Some(first), generator.generate("f", original));
    }
    if let Some(random) = generator.generate_random("f") {
        assert!(generator.matches("f", &random), "nonconforming {:?}", random);
    }
});
