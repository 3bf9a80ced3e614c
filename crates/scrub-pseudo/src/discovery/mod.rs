//! Discovery of sensitive values that no static pattern describes.
//!
//! Extraction rules pull candidates (usernames from home paths, hostnames
//! from properties, ...) out of the input; [`DiscoveredPatterns`] counts
//! them; [`DiscoveryProtocol`] decides when they start being redacted.

pub mod patterns;
pub mod protocol;
pub mod rules;

pub use patterns::{DiscoveredPatterns, DiscoveredValue, PatternType};
pub use protocol::{DiscoveryMode, DiscoveryPhase, DiscoveryProtocol, DiscoveryShard};
pub use rules::{ExtractionRule, Extractor};
