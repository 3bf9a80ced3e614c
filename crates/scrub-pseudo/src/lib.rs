//! Consistent pseudonymization for profiling recordings and logs.
//!
//! This crate decides what to put in place of a sensitive value so that the
//! same original always maps to the same replacement within a run, whether
//! the source is read once or twice.
//!
//! # Key Features
//!
//! - **Pseudonymizer**: hash (optionally HMAC-keyed), sequential counter or
//!   realistic replacements, with fixed overrides and per-category scope.
//! - **Pattern synthesis**: generates fresh strings that match a named
//!   regular expression, deterministically per original.
//! - **Realistic data**: plausible usernames, emails and home paths.
//! - **Discovery**: finds values such as usernames in one streaming pass or
//!   two full passes, and redacts them everywhere they occur.
//! - **Fail-closed**: a realistic replacement that would equal the original
//!   is replaced by a digest instead.
//!
//! # Example
//!
//! ```
//! use scrub_pseudo::{PseudonymizationMode, Pseudonymizer};
//!
//! let mut p = Pseudonymizer::builder()
//!     .mode(PseudonymizationMode::Counter)
//!     .build()
//!     .unwrap();
//! assert_eq!(p.pseudonymize(Some("alice"), "***"), "<redacted:1>");
//! assert_eq!(p.pseudonymize(Some("bob"), "***"), "<redacted:2>");
//! assert_eq!(p.pseudonymize(Some("alice"), "***"), "<redacted:1>");
//! ```

pub mod discovery;
pub mod error;
pub mod hash;
pub mod pattern;
pub mod pseudonymizer;
pub mod realistic;
pub mod scope;
pub mod session;

mod seeded;

pub use discovery::{
    DiscoveredPatterns, DiscoveredValue, DiscoveryMode, DiscoveryPhase, DiscoveryProtocol,
    DiscoveryShard, ExtractionRule, Extractor, PatternType,
};
pub use error::{RedactionError, Result};
pub use hash::{HashAlgorithm, HashKey, DEFAULT_HASH_LENGTH};
pub use pattern::{PatternBasedGenerator, Placeholder};
pub use pseudonymizer::{
    PseudonymizationMode, Pseudonymizer, PseudonymizerBuilder, ReplacementFormat,
};
pub use realistic::RealisticDataGenerator;
pub use scope::{FieldCategory, PseudonymizationScope};
pub use session::{RedactionSession, DEFAULT_FALLBACK};
