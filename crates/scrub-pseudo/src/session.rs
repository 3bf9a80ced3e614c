//! In-memory redaction of text lines and properties.
//!
//! A [`RedactionSession`] combines fixed patterns, discovered values and a
//! [`Pseudonymizer`]. Reading and writing the recording is the caller's
//! job; [`RedactionSession::run`] only needs a way to read the lines again.

use crate::discovery::{DiscoveryMode, DiscoveryPhase, DiscoveryProtocol};
use crate::error::{RedactionError, Result};
use crate::pseudonymizer::Pseudonymizer;
use crate::scope::FieldCategory;
use regex::Regex;
use std::ops::Range;
use tracing::debug;

/// Marker used where pseudonymization does not apply.
pub const DEFAULT_FALLBACK: &str = "***";

#[derive(Debug)]
pub struct RedactionSession {
    static_patterns: Vec<(String, Regex)>,
    discovery: DiscoveryProtocol,
    pseudonymizer: Pseudonymizer,
    fallback: String,
}

impl RedactionSession {
    pub fn new(pseudonymizer: Pseudonymizer, discovery: DiscoveryProtocol) -> Self {
        Self {
            static_patterns: Vec::new(),
            discovery,
            pseudonymizer,
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }

    /// Register a pattern whose every match is redacted.
    pub fn add_static_pattern(&mut self, name: &str, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|e| RedactionError::pattern(name, e.to_string()))?;
        debug!(pattern = %name, "registered static pattern");
        self.static_patterns.push((name.to_string(), regex));
        Ok(())
    }

    pub fn with_static_patterns<I, K, V>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, pattern) in patterns {
            self.add_static_pattern(name.as_ref(), pattern.as_ref())?;
        }
        Ok(self)
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn static_pattern_names(&self) -> Vec<&str> {
        self.static_patterns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn discovery(&self) -> &DiscoveryProtocol {
        &self.discovery
    }

    pub fn discovery_mut(&mut self) -> &mut DiscoveryProtocol {
        &mut self.discovery
    }

    pub fn pseudonymizer(&self) -> &Pseudonymizer {
        &self.pseudonymizer
    }

    pub fn pseudonymizer_mut(&mut self) -> &mut Pseudonymizer {
        &mut self.pseudonymizer
    }

    /// First-pass input from free text.
    pub fn discover_text(&mut self, text: &str) {
        self.discovery.observe_text(text);
    }

    /// First-pass input from a property.
    pub fn discover_property(&mut self, key: &str, value: &str) {
        self.discovery.observe_property(key, value);
    }

    pub fn finish_discovery(&mut self) -> Result<()> {
        self.discovery.finish_discovery_pass()
    }

    /// Redact one unit of free text.
    pub fn redact_text(&mut self, text: &str) -> String {
        if self.discovery.mode() == DiscoveryMode::Fast {
            self.discovery.observe_text(text);
        }
        self.redact(text, FieldCategory::String)
    }

    /// Redact the value of one property.
    pub fn redact_property(&mut self, key: &str, value: &str) -> String {
        if self.discovery.mode() == DiscoveryMode::Fast {
            self.discovery.observe_property(key, value);
        }
        self.redact(value, FieldCategory::Property)
    }

    fn redact(&mut self, text: &str, category: FieldCategory) -> String {
        let ranges = self.sensitive_ranges(text);
        if ranges.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for (range, discovered) in ranges {
            out.push_str(&text[cursor..range.start]);
            let matched = &text[range.clone()];
            // Case variants of one discovered value share its replacement.
            let original = if discovered {
                self.discovery.canonical_value(matched).unwrap_or(matched).to_string()
            } else {
                matched.to_string()
            };
            let replacement = self.replacement(&original, category);
            out.push_str(&replacement);
            cursor = range.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Non-overlapping ranges to replace, flagged when they come from
    /// discovery; earlier start wins, then length.
    fn sensitive_ranges(&mut self, text: &str) -> Vec<(Range<usize>, bool)> {
        let mut all: Vec<(Range<usize>, bool)> = self
            .static_patterns
            .iter()
            .flat_map(|(_, regex)| regex.find_iter(text).map(|m| (m.range(), false)))
            .filter(|(r, _)| !r.is_empty())
            .collect();
        all.extend(self.discovery.find_active(text).into_iter().map(|r| (r, true)));
        all.sort_by(|(a, _), (b, _)| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut chosen: Vec<(Range<usize>, bool)> = Vec::with_capacity(all.len());
        for entry in all {
            let overlaps = chosen.last().is_some_and(|(last, _)| entry.0.start < last.end);
            if !overlaps {
                chosen.push(entry);
            }
        }
        chosen
    }

    fn replacement(&mut self, original: &str, category: FieldCategory) -> String {
        if self.pseudonymizer.scope().applies_to(category) {
            self.pseudonymizer.pseudonymize(Some(original), &self.fallback)
        } else {
            self.fallback.clone()
        }
    }

    /// Redact every line of a re-readable source.
    ///
    /// `source` is called twice in two-pass mode (once to discover, once to
    /// redact) and once otherwise.
    pub fn run<F, I>(&mut self, source: F) -> Result<Vec<String>>
    where
        F: Fn() -> I,
        I: IntoIterator<Item = String>,
    {
        if self.discovery.mode() == DiscoveryMode::TwoPass
            && self.discovery.phase() == DiscoveryPhase::Discovering
        {
            let mut lines = 0usize;
            for line in source() {
                self.discover_text(&line);
                lines += 1;
            }
            debug!(lines, "discovery pass read source");
            self.finish_discovery()?;
        }
        Ok(source()
            .into_iter()
            .map(|line| self.redact_text(&line))
            .collect())
    }
}
