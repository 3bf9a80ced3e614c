//! Configuration loading and validation for scrub.
//!
//! This crate provides:
//! - Typed structs for the pseudonymization, discovery and static-pattern
//!   sections, loaded from JSON or YAML
//! - Semantic validation with stable error codes
//! - Builders turning a validated config into a ready [`scrub_pseudo::RedactionSession`]
//! - Logging setup shared by binaries embedding the library

pub mod config;
pub mod logging;
pub mod validate;

pub use config::{DiscoveryConfig, PseudonymizationConfig, RuleConfig, RuleKind, ScrubConfig};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
