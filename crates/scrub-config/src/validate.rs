//! Configuration validation errors and semantic validation.

use crate::config::{RuleConfig, RuleKind, ScrubConfig};
use regex::Regex;
use scrub_pseudo::{HashKey, RedactionError};
use std::collections::BTreeSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Failed to build: {0}")]
    Build(#[from] RedactionError),
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
            ValidationError::Build(_) => 67,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate a whole configuration semantically.
pub fn validate_config(config: &ScrubConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_pseudonymization(config)?;

    for (name, pattern) in &config.static_patterns {
        if let Err(e) = Regex::new(pattern) {
            return Err(invalid(format!("static_patterns.{}", name), e.to_string()));
        }
    }

    let mut seen = BTreeSet::new();
    for (i, rule) in config.discovery.rules.iter().enumerate() {
        if !seen.insert(rule.name.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "Duplicate discovery rule name '{}'",
                rule.name
            )));
        }
        validate_rule(&format!("discovery.rules[{}]", i), rule)?;
    }

    Ok(())
}

fn validate_pseudonymization(config: &ScrubConfig) -> ValidationResult<()> {
    let p = &config.pseudonymization;

    let max = p.hash_algorithm.hex_len();
    if p.hash_length == 0 || p.hash_length > max {
        return Err(invalid(
            "pseudonymization.hash_length",
            format!("Must be in [1, {}] for {}, got {}", max, p.hash_algorithm, p.hash_length),
        ));
    }

    if let Some(encoded) = &p.hash_key_base64 {
        HashKey::from_base64(encoded)
            .map_err(|e| invalid("pseudonymization.hash_key_base64", e.to_string()))?;
    }

    for (name, pattern) in &p.patterns {
        // The generator supports a subset of regex syntax; compile to check.
        scrub_pseudo::PatternBasedGenerator::new([(name.as_str(), pattern.as_str())], 0)
            .map_err(|e| invalid(format!("pseudonymization.patterns.{}", name), e.to_string()))?;
    }

    Ok(())
}

fn validate_rule(field: &str, rule: &RuleConfig) -> ValidationResult<()> {
    if rule.name.trim().is_empty() {
        return Err(invalid(format!("{}.name", field), "Must not be empty"));
    }

    if rule.kind == RuleKind::Custom && rule.custom_name.as_deref().map_or(true, str::is_empty) {
        return Err(invalid(
            format!("{}.custom_name", field),
            "Required when kind is custom",
        ));
    }

    if rule.min_occurrences == 0 {
        return Err(invalid(format!("{}.min_occurrences", field), "Must be at least 1"));
    }

    match (&rule.pattern, &rule.property_key) {
        (Some(pattern), None) => {
            let regex = Regex::new(pattern).map_err(|e| invalid(format!("{}.pattern", field), e.to_string()))?;
            let group = rule.effective_group(&regex);
            if group >= regex.captures_len() {
                return Err(invalid(
                    format!("{}.capture_group", field),
                    format!("Pattern has no group {}", group),
                ));
            }
        }
        (None, Some(key)) if !key.is_empty() => {}
        (None, Some(_)) => {
            return Err(invalid(format!("{}.property_key", field), "Must not be empty"));
        }
        _ => {
            return Err(ValidationError::SemanticError(format!(
                "{} must set exactly one of pattern or property_key",
                field
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> RuleConfig {
        RuleConfig {
            name: "home".to_string(),
            pattern: Some(r"/home/([a-z]+)".to_string()),
            ..RuleConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        validate_config(&ScrubConfig::default()).unwrap();
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            ValidationError::IoError(String::new()).code(),
            ValidationError::ParseError(String::new()).code(),
            ValidationError::SemanticError(String::new()).code(),
            invalid("f", "m").code(),
            ValidationError::VersionMismatch {
                expected: String::new(),
                actual: String::new(),
            }
            .code(),
            ValidationError::Build(RedactionError::Key(String::new())).code(),
        ];
        let unique: BTreeSet<u32> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_version_mismatch() {
        let config = ScrubConfig {
            schema_version: "0.9.0".to_string(),
            ..ScrubConfig::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_hash_length_bounds() {
        let mut config = ScrubConfig::default();
        config.pseudonymization.hash_length = 0;
        assert_eq!(validate_config(&config).unwrap_err().code(), 65);
        config.pseudonymization.hash_length = 65;
        assert!(validate_config(&config).is_err());
        config.pseudonymization.hash_length = 64;
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_bad_hash_key() {
        let mut config = ScrubConfig::default();
        config.pseudonymization.hash_key_base64 = Some("not base64!".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("hash_key_base64"));
    }

    #[test]
    fn test_bad_generator_pattern() {
        let mut config = ScrubConfig::default();
        config
            .pseudonymization
            .patterns
            .insert("ip".to_string(), "[0-9".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("pseudonymization.patterns.ip"));
    }

    #[test]
    fn test_bad_static_pattern() {
        let mut config = ScrubConfig::default();
        config
            .static_patterns
            .insert("broken".to_string(), "(".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rule_needs_exactly_one_source() {
        let mut config = ScrubConfig::default();
        config.discovery.rules.push(RuleConfig {
            property_key: Some("user.name".to_string()),
            ..rule()
        });
        assert_eq!(validate_config(&config).unwrap_err().code(), 63);

        config.discovery.rules[0] = RuleConfig {
            name: "none".to_string(),
            ..RuleConfig::default()
        };
        assert_eq!(validate_config(&config).unwrap_err().code(), 63);
    }

    #[test]
    fn test_rule_capture_group_must_exist() {
        let mut config = ScrubConfig::default();
        config.discovery.rules.push(RuleConfig {
            capture_group: Some(2),
            ..rule()
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("capture_group"));
    }

    #[test]
    fn test_custom_rule_needs_name() {
        let mut config = ScrubConfig::default();
        config.discovery.rules.push(RuleConfig {
            kind: RuleKind::Custom,
            ..rule()
        });
        assert!(validate_config(&config).is_err());
        config.discovery.rules[0].custom_name = Some("tenant".to_string());
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_duplicate_rule_names() {
        let mut config = ScrubConfig::default();
        config.discovery.rules.push(rule());
        config.discovery.rules.push(rule());
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn test_zero_min_occurrences() {
        let mut config = ScrubConfig::default();
        config.discovery.rules.push(RuleConfig {
            min_occurrences: 0,
            ..rule()
        });
        assert!(validate_config(&config).is_err());
    }
}
