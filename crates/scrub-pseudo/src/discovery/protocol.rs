//! Discovery state machine.
//!
//! The protocol decides when a discovered value starts being redacted:
//!
//! - [`DiscoveryMode::None`]: never; only static patterns apply.
//! - [`DiscoveryMode::Fast`]: as soon as the value reaches its rule's
//!   `min_occurrences`, within the same single pass.
//! - [`DiscoveryMode::TwoPass`]: after [`DiscoveryProtocol::finish_discovery_pass`],
//!   for every occurrence in the second pass.

use super::patterns::{DiscoveredPatterns, DiscoveredValue};
use super::rules::ExtractionRule;
use crate::error::{RedactionError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

/// Compiled size limit for the combined matcher.
const MATCHER_SIZE_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    None,
    Fast,
    #[default]
    TwoPass,
}

impl DiscoveryMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Some(Self::None),
            "fast" => Some(Self::Fast),
            "two_pass" | "twopass" => Some(Self::TwoPass),
            _ => None,
        }
    }

    /// Number of times the source has to be read.
    pub fn passes_required(&self) -> usize {
        match self {
            Self::None | Self::Fast => 1,
            Self::TwoPass => 2,
        }
    }
}

impl std::fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Fast => "fast",
            Self::TwoPass => "two_pass",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    /// First pass of two-pass discovery; nothing is redacted yet.
    Discovering,
    Redacting,
}

impl DiscoveryPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovering => "discovering",
            Self::Redacting => "redacting",
        }
    }
}

/// Per-rule accumulators sharing one rule set.
#[derive(Debug, Clone)]
struct Collector {
    rules: Arc<[ExtractionRule]>,
    found: Vec<DiscoveredPatterns>,
}

impl Collector {
    fn new(rules: Arc<[ExtractionRule]>) -> Self {
        let found = rules.iter().map(ExtractionRule::new_patterns).collect();
        Self { rules, found }
    }

    /// Returns true if some value just reached its threshold.
    fn observe_text(&mut self, text: &str) -> bool {
        let mut activated = false;
        for (rule, found) in self.rules.iter().zip(self.found.iter_mut()) {
            for value in rule.extract_text(text) {
                activated |= record(rule, found, value);
            }
        }
        activated
    }

    fn observe_property(&mut self, key: &str, value: &str) -> bool {
        let mut activated = false;
        for (rule, found) in self.rules.iter().zip(self.found.iter_mut()) {
            if let Some(value) = rule.extract_property(key, value) {
                activated |= record(rule, found, value);
            }
        }
        activated
    }

    fn merge(&mut self, other: Collector) {
        for (mine, theirs) in self.found.iter_mut().zip(other.found) {
            mine.merge(theirs);
        }
    }

    fn active(&self) -> impl Iterator<Item = (&ExtractionRule, &DiscoveredValue)> {
        self.rules.iter().zip(&self.found).flat_map(|(rule, found)| {
            found
                .get_values(rule.min_occurrences)
                .into_iter()
                .map(move |v| (rule, v))
        })
    }
}

fn record(rule: &ExtractionRule, found: &mut DiscoveredPatterns, value: &str) -> bool {
    found.add_value(value, rule.kind.clone());
    found
        .get(value)
        .is_some_and(|v| v.occurrences == rule.min_occurrences)
}

/// Discovery state for one worker, merged back with
/// [`DiscoveryProtocol::absorb`] once the worker is done.
#[derive(Debug, Clone)]
pub struct DiscoveryShard {
    collector: Collector,
}

impl DiscoveryShard {
    pub fn observe_text(&mut self, text: &str) {
        self.collector.observe_text(text);
    }

    pub fn observe_property(&mut self, key: &str, value: &str) {
        self.collector.observe_property(key, value);
    }

    /// Accumulators in rule order.
    pub fn patterns(&self) -> &[DiscoveredPatterns] {
        &self.collector.found
    }
}

/// Finds active values in text.
#[derive(Debug)]
enum Matcher {
    Nothing,
    Combined(Regex),
    /// Used when the combined expression is too large to compile.
    Separate(Vec<Regex>),
}

impl Matcher {
    fn build(mut terms: Vec<(String, bool)>) -> Self {
        if terms.is_empty() {
            return Matcher::Nothing;
        }
        // Longest first so the alternation prefers the longest value.
        terms.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.cmp(b)));
        terms.dedup();

        let alternatives: Vec<String> = terms.iter().map(|(v, cs)| term_regex(v, *cs)).collect();
        match RegexBuilder::new(&alternatives.join("|"))
            .size_limit(MATCHER_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => Matcher::Combined(regex),
            Err(e) => {
                warn!(values = terms.len(), error = %e, "combined matcher too large; matching values one by one");
                Matcher::Separate(
                    alternatives
                        .iter()
                        .filter_map(|alt| Regex::new(alt).ok())
                        .collect(),
                )
            }
        }
    }

    fn find(&self, text: &str) -> Vec<Range<usize>> {
        match self {
            Matcher::Nothing => Vec::new(),
            Matcher::Combined(regex) => regex.find_iter(text).map(|m| m.range()).collect(),
            Matcher::Separate(regexes) => {
                let mut all: Vec<Range<usize>> = regexes
                    .iter()
                    .flat_map(|r| r.find_iter(text).map(|m| m.range()))
                    .collect();
                all.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
                let mut out: Vec<Range<usize>> = Vec::new();
                for range in all {
                    let overlaps = out.last().is_some_and(|last| range.start < last.end);
                    if !overlaps {
                        out.push(range);
                    }
                }
                out
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Literal regex for one value, bounded where the value starts or ends
/// with a word character.
fn term_regex(value: &str, case_sensitive: bool) -> String {
    let mut out = String::new();
    if !case_sensitive {
        out.push_str("(?i:");
    }
    if value.chars().next().is_some_and(is_word_char) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(value));
    if value.chars().last().is_some_and(is_word_char) {
        out.push_str(r"\b");
    }
    if !case_sensitive {
        out.push(')');
    }
    out
}

/// Drives discovery for one source and answers "is this value redacted?".
#[derive(Debug)]
pub struct DiscoveryProtocol {
    mode: DiscoveryMode,
    phase: DiscoveryPhase,
    collector: Collector,
    /// Rebuilt lazily whenever the active set changes.
    matcher: Option<Matcher>,
}

impl DiscoveryProtocol {
    pub fn new(mode: DiscoveryMode, rules: Vec<ExtractionRule>) -> Self {
        let phase = match mode {
            DiscoveryMode::TwoPass => DiscoveryPhase::Discovering,
            DiscoveryMode::None | DiscoveryMode::Fast => DiscoveryPhase::Redacting,
        };
        debug!(mode = %mode, rules = rules.len(), "discovery protocol created");
        Self {
            mode,
            phase,
            collector: Collector::new(rules.into()),
            matcher: None,
        }
    }

    /// Protocol that discovers nothing.
    pub fn disabled() -> Self {
        Self::new(DiscoveryMode::None, Vec::new())
    }

    pub fn mode(&self) -> DiscoveryMode {
        self.mode
    }

    pub fn phase(&self) -> DiscoveryPhase {
        self.phase
    }

    pub fn passes_required(&self) -> usize {
        self.mode.passes_required()
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.collector.rules
    }

    /// Accumulator of the rule called `rule`.
    pub fn patterns(&self, rule: &str) -> Option<&DiscoveredPatterns> {
        self.collector
            .rules
            .iter()
            .position(|r| r.name == rule)
            .map(|i| &self.collector.found[i])
    }

    fn collecting(&self) -> bool {
        match self.mode {
            DiscoveryMode::None => false,
            DiscoveryMode::Fast => true,
            DiscoveryMode::TwoPass => self.phase == DiscoveryPhase::Discovering,
        }
    }

    fn redacting(&self) -> bool {
        match self.mode {
            DiscoveryMode::None => false,
            DiscoveryMode::Fast => true,
            DiscoveryMode::TwoPass => self.phase == DiscoveryPhase::Redacting,
        }
    }

    /// Feed free text to the text rules. Ignored once values are frozen.
    pub fn observe_text(&mut self, text: &str) {
        if self.collecting() && self.collector.observe_text(text) && self.redacting() {
            self.matcher = None;
        }
    }

    /// Feed one property to the property rules.
    pub fn observe_property(&mut self, key: &str, value: &str) {
        if self.collecting() && self.collector.observe_property(key, value) && self.redacting() {
            self.matcher = None;
        }
    }

    /// End the first pass of two-pass discovery and freeze the active set.
    pub fn finish_discovery_pass(&mut self) -> Result<()> {
        if self.mode != DiscoveryMode::TwoPass || self.phase != DiscoveryPhase::Discovering {
            return Err(RedactionError::InvalidPhase {
                expected: DiscoveryPhase::Discovering.as_str(),
                actual: self.phase.as_str(),
            });
        }
        self.phase = DiscoveryPhase::Redacting;
        self.matcher = None;
        debug!(
            discovered = self.collector.found.iter().map(|f| f.total_count()).sum::<usize>(),
            active = self.collector.active().count(),
            "discovery pass finished"
        );
        Ok(())
    }

    /// Whether occurrences of `value` are currently redacted.
    pub fn is_active(&self, value: &str) -> bool {
        if !self.redacting() {
            return false;
        }
        self.collector
            .rules
            .iter()
            .zip(&self.collector.found)
            .any(|(rule, found)| {
                found
                    .get(value)
                    .is_some_and(|v| v.occurrences >= rule.min_occurrences)
            })
    }

    /// First-seen spelling of the active value `matched` stands for.
    ///
    /// Case variants of a case-insensitive value all resolve to the same
    /// string; the first rule in rule order that holds it decides.
    pub fn canonical_value(&self, matched: &str) -> Option<&str> {
        if !self.redacting() {
            return None;
        }
        self.collector
            .rules
            .iter()
            .zip(&self.collector.found)
            .find_map(|(rule, found)| {
                found
                    .get(matched)
                    .filter(|v| v.occurrences >= rule.min_occurrences)
                    .map(|v| v.value.as_str())
            })
    }

    /// Values currently redacted, per rule in rule order.
    pub fn active_values(&self) -> Vec<&DiscoveredValue> {
        if !self.redacting() {
            return Vec::new();
        }
        self.collector.active().map(|(_, v)| v).collect()
    }

    /// Byte ranges of active values in `text`, non-overlapping and in order.
    ///
    /// At any position the longest active value wins.
    pub fn find_active(&mut self, text: &str) -> Vec<Range<usize>> {
        if !self.redacting() {
            return Vec::new();
        }
        if self.matcher.is_none() {
            let terms = self
                .collector
                .active()
                .map(|(rule, v)| (v.value.clone(), rule.case_sensitive))
                .collect();
            self.matcher = Some(Matcher::build(terms));
        }
        self.matcher.as_ref().map_or_else(Vec::new, |m| m.find(text))
    }

    /// Fresh shard for a parallel worker.
    pub fn new_shard(&self) -> DiscoveryShard {
        DiscoveryShard {
            collector: Collector::new(Arc::clone(&self.collector.rules)),
        }
    }

    /// Merge a finished worker's shard.
    pub fn absorb(&mut self, shard: DiscoveryShard) -> Result<()> {
        if !self.collecting() {
            return Err(RedactionError::InvalidPhase {
                expected: DiscoveryPhase::Discovering.as_str(),
                actual: self.phase.as_str(),
            });
        }
        self.collector.merge(shard.collector);
        self.matcher = None;
        Ok(())
    }
}
