//! Typed configuration for a redaction run.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the keys it
//! changes. Files are JSON or YAML, chosen by extension.

use crate::validate::{validate_config, ValidationError, ValidationResult};
use regex::Regex;
use scrub_pseudo::{
    DiscoveryMode, DiscoveryProtocol, ExtractionRule, HashAlgorithm, HashKey, PatternType,
    PseudonymizationMode, PseudonymizationScope, Pseudonymizer, RedactionSession,
    ReplacementFormat, DEFAULT_HASH_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    pub schema_version: String,
    pub pseudonymization: PseudonymizationConfig,
    pub discovery: DiscoveryConfig,
    /// Name to regex; every match is redacted in free text.
    pub static_patterns: BTreeMap<String, String>,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            pseudonymization: PseudonymizationConfig::default(),
            discovery: DiscoveryConfig::default(),
            static_patterns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PseudonymizationConfig {
    pub enabled: bool,
    pub mode: PseudonymizationMode,
    pub format: ReplacementFormat,
    pub custom_prefix: String,
    pub custom_suffix: String,
    pub hash_length: usize,
    pub hash_algorithm: HashAlgorithm,
    /// 32-byte HMAC key, base64 encoded. Plain digests when absent.
    pub hash_key_base64: Option<String>,
    pub seed: u64,
    pub scope: PseudonymizationScope,
    /// Fixed replacements, applied before any mode.
    pub replacements: BTreeMap<String, String>,
    /// Named generator patterns for realistic mode.
    pub patterns: BTreeMap<String, String>,
}

impl Default for PseudonymizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: PseudonymizationMode::default(),
            format: ReplacementFormat::default(),
            custom_prefix: String::new(),
            custom_suffix: String::new(),
            hash_length: DEFAULT_HASH_LENGTH,
            hash_algorithm: HashAlgorithm::default(),
            hash_key_base64: None,
            seed: 0,
            scope: PseudonymizationScope::default(),
            replacements: BTreeMap::new(),
            patterns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub mode: DiscoveryMode,
    pub rules: Vec<RuleConfig>,
}

/// Kind of value a rule discovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    #[default]
    Username,
    Hostname,
    EmailLocalPart,
    Custom,
}

/// One extraction rule. Exactly one of `pattern` and `property_key` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub name: String,
    pub kind: RuleKind,
    pub custom_name: Option<String>,
    pub pattern: Option<String>,
    /// Defaults to 1 when the pattern has a group, 0 otherwise.
    pub capture_group: Option<usize>,
    pub property_key: Option<String>,
    pub min_occurrences: u64,
    pub case_sensitive: bool,
    pub allowlist: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: RuleKind::default(),
            custom_name: None,
            pattern: None,
            capture_group: None,
            property_key: None,
            min_occurrences: 1,
            case_sensitive: false,
            allowlist: Vec::new(),
        }
    }
}

impl RuleConfig {
    pub(crate) fn effective_group(&self, regex: &Regex) -> usize {
        self.capture_group
            .unwrap_or(if regex.captures_len() > 1 { 1 } else { 0 })
    }

    fn pattern_type(&self) -> PatternType {
        match self.kind {
            RuleKind::Username => PatternType::Username,
            RuleKind::Hostname => PatternType::Hostname,
            RuleKind::EmailLocalPart => PatternType::EmailLocalPart,
            RuleKind::Custom => PatternType::Custom(self.custom_name.clone().unwrap_or_default()),
        }
    }

    /// Build the extraction rule this entry describes.
    pub fn build(&self) -> ValidationResult<ExtractionRule> {
        let rule = match (&self.pattern, &self.property_key) {
            (Some(pattern), None) => {
                let regex = Regex::new(pattern).map_err(|e| ValidationError::InvalidValue {
                    field: format!("rule {}.pattern", self.name),
                    message: e.to_string(),
                })?;
                ExtractionRule::regex(&self.name, self.pattern_type(), pattern, self.effective_group(&regex))?
            }
            (None, Some(key)) => ExtractionRule::property(&self.name, self.pattern_type(), key),
            _ => {
                return Err(ValidationError::SemanticError(format!(
                    "rule {} must set exactly one of pattern or property_key",
                    self.name
                )))
            }
        };
        Ok(rule
            .with_min_occurrences(self.min_occurrences)
            .with_case_sensitive(self.case_sensitive)
            .with_allowlist(self.allowlist.iter().cloned()))
    }
}

impl ScrubConfig {
    /// Load from a file; `.yaml`/`.yml` is parsed as YAML, anything else as JSON.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            Self::parse_yaml(&content)
        } else {
            Self::parse_json(&content)
        }
    }

    pub fn parse_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    pub fn parse_yaml(yaml: &str) -> ValidationResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ValidationError::ParseError(format!("Invalid YAML: {}", e)))
    }

    pub fn to_json(&self) -> ValidationResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("Failed to serialize: {}", e)))
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    pub fn build_pseudonymizer(&self) -> ValidationResult<Pseudonymizer> {
        let p = &self.pseudonymization;
        let mut builder = Pseudonymizer::builder()
            .enabled(p.enabled)
            .mode(p.mode)
            .format(p.format)
            .custom_prefix(p.custom_prefix.clone())
            .custom_suffix(p.custom_suffix.clone())
            .hash_length(p.hash_length)
            .hash_algorithm(p.hash_algorithm)
            .scope(p.scope)
            .custom_replacements(p.replacements.clone().into_iter().collect())
            .pattern_generators(p.patterns.clone())
            .seed(p.seed);
        if let Some(encoded) = &p.hash_key_base64 {
            builder = builder.hash_key(HashKey::from_base64(encoded)?);
        }
        Ok(builder.build()?)
    }

    pub fn build_discovery(&self) -> ValidationResult<DiscoveryProtocol> {
        let rules = self
            .discovery
            .rules
            .iter()
            .map(RuleConfig::build)
            .collect::<ValidationResult<Vec<_>>>()?;
        Ok(DiscoveryProtocol::new(self.discovery.mode, rules))
    }

    /// Validate, then build a complete session.
    pub fn build_session(&self) -> ValidationResult<RedactionSession> {
        self.validate()?;
        let session = RedactionSession::new(self.build_pseudonymizer()?, self.build_discovery()?)
            .with_static_patterns(&self.static_patterns)?;
        debug!(
            mode = %self.pseudonymization.mode,
            discovery = %self.discovery.mode,
            static_patterns = self.static_patterns.len(),
            "session built from config"
        );
        Ok(session)
    }
}
