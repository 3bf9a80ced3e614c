//! Extraction rules: how candidate values are pulled out of the input.

use super::patterns::{DiscoveredPatterns, PatternType};
use crate::error::{RedactionError, Result};
use regex::Regex;

/// Where a rule looks for values.
#[derive(Debug, Clone)]
pub enum Extractor {
    /// Capture group `group` of every match of `regex` in free text.
    Regex { regex: Regex, group: usize },
    /// The value of every property whose key equals `key`.
    Property { key: String },
}

/// A named rule producing discovered values of one kind.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub name: String,
    pub kind: PatternType,
    pub extractor: Extractor,
    /// Occurrences needed before a value is redacted.
    pub min_occurrences: u64,
    pub case_sensitive: bool,
    pub allowlist: Vec<String>,
}

impl ExtractionRule {
    /// Rule over free text. `group` 0 takes the whole match.
    pub fn regex(name: impl Into<String>, kind: PatternType, pattern: &str, group: usize) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| RedactionError::pattern(&name, e.to_string()))?;
        if group >= regex.captures_len() {
            return Err(RedactionError::pattern(
                &name,
                format!("capture group {} does not exist", group),
            ));
        }
        Ok(Self::with_extractor(name, kind, Extractor::Regex { regex, group }))
    }

    /// Rule over key/value properties.
    pub fn property(name: impl Into<String>, kind: PatternType, key: impl Into<String>) -> Self {
        Self::with_extractor(name.into(), kind, Extractor::Property { key: key.into() })
    }

    fn with_extractor(name: String, kind: PatternType, extractor: Extractor) -> Self {
        Self {
            name,
            kind,
            extractor,
            min_occurrences: 1,
            case_sensitive: false,
            allowlist: Vec::new(),
        }
    }

    /// Values below this count stay unredacted; 0 is treated as 1.
    pub fn with_min_occurrences(mut self, min: u64) -> Self {
        self.min_occurrences = min.max(1);
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_allowlist<I, S>(mut self, allowlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowlist = allowlist.into_iter().map(Into::into).collect();
        self
    }

    /// Empty accumulator configured for this rule.
    pub fn new_patterns(&self) -> DiscoveredPatterns {
        DiscoveredPatterns::new(self.case_sensitive, &self.allowlist)
    }

    /// Candidates found in `text`; always empty for property rules.
    pub fn extract_text<'t>(&self, text: &'t str) -> Vec<&'t str> {
        match &self.extractor {
            Extractor::Regex { regex, group } => regex
                .captures_iter(text)
                .filter_map(|caps| caps.get(*group))
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .collect(),
            Extractor::Property { .. } => Vec::new(),
        }
    }

    /// Candidate from one property; `None` for text rules or other keys.
    pub fn extract_property<'v>(&self, key: &str, value: &'v str) -> Option<&'v str> {
        match &self.extractor {
            Extractor::Property { key: wanted } if wanted == key && !value.is_empty() => Some(value),
            _ => None,
        }
    }
}
