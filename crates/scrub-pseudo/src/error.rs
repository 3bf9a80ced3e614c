//! Error types for pseudonymization and discovery.

use thiserror::Error;

/// Result type for pseudonymization operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while building or driving the pseudonymizer.
///
/// Everything here is raised at construction time or on protocol misuse.
/// Per-value operations never fail.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A registered pattern could not be parsed or compiled.
    #[error("pattern '{name}' is invalid: {message}")]
    Pattern { name: String, message: String },

    /// Failed to load or generate the hashing key.
    #[error("key error: {0}")]
    Key(String),

    /// A discovery protocol method was called in the wrong phase.
    #[error("discovery protocol is in phase {actual}, expected {expected}")]
    InvalidPhase {
        expected: &'static str,
        actual: &'static str,
    },
}

impl RedactionError {
    pub(crate) fn pattern(name: &str, message: impl Into<String>) -> Self {
        RedactionError::Pattern {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
