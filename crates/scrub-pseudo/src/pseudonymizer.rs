//! Consistent pseudonyms for sensitive values.
//!
//! A [`Pseudonymizer`] maps every original value to one replacement for the
//! lifetime of the instance (or until [`Pseudonymizer::clear_cache`]). The
//! replacement is a keyed or plain digest, a sequential counter, or a
//! realistic stand-in, depending on the [`PseudonymizationMode`].

use crate::hash::{HashAlgorithm, HashKey, DEFAULT_HASH_LENGTH};
use crate::pattern::PatternBasedGenerator;
use crate::realistic::RealisticDataGenerator;
use crate::scope::PseudonymizationScope;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// First counter value handed out in counter mode.
pub const FIRST_COUNTER: u64 = 1;

/// First pseudonymous port.
pub const FIRST_PORT: u32 = 1000;

/// How a replacement body is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PseudonymizationMode {
    /// Truncated hex digest of the value.
    #[default]
    Hash,
    /// Sequential integer per first-seen value.
    Counter,
    /// Plausible data shaped like the original.
    Realistic,
}

impl PseudonymizationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hash" => Some(Self::Hash),
            "counter" => Some(Self::Counter),
            "realistic" => Some(Self::Realistic),
            _ => None,
        }
    }
}

impl std::fmt::Display for PseudonymizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Hash => "hash",
            Self::Counter => "counter",
            Self::Realistic => "realistic",
        };
        write!(f, "{}", s)
    }
}

/// How a hash or counter body is wrapped in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementFormat {
    /// `<redacted:BODY>`
    #[default]
    Redacted,
    /// `<hash:BODY>`
    Hash,
    /// `prefix + BODY + suffix`
    Custom,
}

impl ReplacementFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "redacted" => Some(Self::Redacted),
            "hash" => Some(Self::Hash),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Stateful value-to-pseudonym mapper.
///
/// Counters and caches are owned by the instance. Run one instance per
/// recording; nothing is shared between instances.
pub struct Pseudonymizer {
    enabled: bool,
    mode: PseudonymizationMode,
    format: ReplacementFormat,
    custom_prefix: String,
    custom_suffix: String,
    hash_length: usize,
    hash_algorithm: HashAlgorithm,
    hash_key: Option<HashKey>,
    scope: PseudonymizationScope,
    custom_replacements: HashMap<String, String>,
    patterns: PatternBasedGenerator,
    realistic: RealisticDataGenerator,
    cache: HashMap<String, String>,
    port_cache: HashMap<u32, u32>,
    next_counter: u64,
    next_port: u32,
}

impl Pseudonymizer {
    pub fn builder() -> PseudonymizerBuilder {
        PseudonymizerBuilder::default()
    }

    /// Hash mode, `<redacted:…>` format, every category in scope.
    pub fn with_defaults() -> Self {
        Self::from_parts(PseudonymizerBuilder::default(), PatternBasedGenerator::empty(0))
    }

    /// An instance that always returns the fallback.
    pub fn disabled() -> Self {
        Self::from_parts(
            PseudonymizerBuilder::default().enabled(false),
            PatternBasedGenerator::empty(0),
        )
    }

    fn from_parts(b: PseudonymizerBuilder, patterns: PatternBasedGenerator) -> Self {
        Self {
            enabled: b.enabled,
            mode: b.mode,
            format: b.format,
            custom_prefix: b.custom_prefix,
            custom_suffix: b.custom_suffix,
            hash_length: b.hash_length,
            hash_algorithm: b.hash_algorithm,
            hash_key: b.hash_key,
            scope: b.scope,
            custom_replacements: b.custom_replacements,
            patterns,
            realistic: RealisticDataGenerator::new(b.seed),
            cache: HashMap::new(),
            port_cache: HashMap::new(),
            next_counter: FIRST_COUNTER,
            next_port: FIRST_PORT,
        }
    }

    /// Replacement for `value`, or `fallback` when disabled or absent.
    pub fn pseudonymize(&mut self, value: Option<&str>, fallback: &str) -> String {
        let value = match value {
            Some(v) if self.enabled => v,
            _ => return fallback.to_string(),
        };
        if value.is_empty() {
            return String::new();
        }
        if let Some(hit) = self.cache.get(value) {
            return hit.clone();
        }

        let replacement = match self.custom_replacements.get(value) {
            Some(mapped) => mapped.clone(),
            None => self.replace_by_mode(value),
        };

        trace!(mode = %self.mode, len = value.len(), "new pseudonym");
        self.cache.insert(value.to_string(), replacement.clone());
        replacement
    }

    fn replace_by_mode(&mut self, value: &str) -> String {
        match self.mode {
            PseudonymizationMode::Hash => {
                let body = self.hash_body(value);
                self.wrap(&body)
            }
            PseudonymizationMode::Counter => {
                let body = self.next_counter.to_string();
                self.next_counter += 1;
                self.wrap(&body)
            }
            PseudonymizationMode::Realistic => {
                let generated = match self.patterns.find_matching_pattern(value) {
                    Some(name) => {
                        let name = name.to_string();
                        self.patterns.generate(&name, value)
                    }
                    None => None,
                };
                let generated =
                    generated.unwrap_or_else(|| self.realistic.generate_replacement(value));
                if generated == value {
                    // Never let the original through unchanged.
                    let body = self.hash_body(value);
                    self.wrap(&body)
                } else {
                    generated
                }
            }
        }
    }

    fn hash_body(&self, value: &str) -> String {
        self.hash_algorithm
            .truncated_digest(self.hash_key.as_ref(), value, self.hash_length)
    }

    fn wrap(&self, body: &str) -> String {
        match self.format {
            ReplacementFormat::Redacted => format!("<redacted:{}>", body),
            ReplacementFormat::Hash => format!("<hash:{}>", body),
            ReplacementFormat::Custom => {
                format!("{}{}{}", self.custom_prefix, body, self.custom_suffix)
            }
        }
    }

    /// Counter-style pseudonym for a port, from 1000 upwards.
    ///
    /// Independent of the mode and of the value cache.
    pub fn pseudonymize_port(&mut self, port: u32) -> u32 {
        if !self.enabled || !self.scope.ports {
            return port;
        }
        if let Some(hit) = self.port_cache.get(&port) {
            return *hit;
        }
        let assigned = self.next_port;
        self.next_port = self.next_port.saturating_add(1);
        self.port_cache.insert(port, assigned);
        assigned
    }

    /// Number of cached values; ports are not counted.
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Forget every assignment and restart both counters.
    pub fn clear_cache(&mut self) {
        debug!(values = self.cache.len(), ports = self.port_cache.len(), "clearing pseudonym caches");
        self.cache.clear();
        self.port_cache.clear();
        self.next_counter = FIRST_COUNTER;
        self.next_port = FIRST_PORT;
        self.realistic.clear_cache();
        self.patterns.clear_all_caches();
    }

    pub fn stats(&self) -> String {
        format!(
            "Pseudonymizer[enabled={}, mode={}, cached={}]",
            self.enabled,
            self.mode,
            self.cache.len()
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> PseudonymizationMode {
        self.mode
    }

    pub fn format(&self) -> ReplacementFormat {
        self.format
    }

    pub fn scope(&self) -> &PseudonymizationScope {
        &self.scope
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn pattern_generator(&self) -> &PatternBasedGenerator {
        &self.patterns
    }
}

impl std::fmt::Display for Pseudonymizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.stats())
    }
}

impl std::fmt::Debug for Pseudonymizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pseudonymizer")
            .field("enabled", &self.enabled)
            .field("mode", &self.mode)
            .field("format", &self.format)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("keyed", &self.hash_key.is_some())
            .field("scope", &self.scope)
            .field("patterns", &self.patterns)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Builder for [`Pseudonymizer`].
#[derive(Debug)]
pub struct PseudonymizerBuilder {
    mode: PseudonymizationMode,
    format: ReplacementFormat,
    custom_prefix: String,
    custom_suffix: String,
    hash_length: usize,
    hash_algorithm: HashAlgorithm,
    hash_key: Option<HashKey>,
    scope: PseudonymizationScope,
    custom_replacements: HashMap<String, String>,
    patterns: Vec<(String, String)>,
    seed: u64,
    enabled: bool,
}

impl Default for PseudonymizerBuilder {
    fn default() -> Self {
        Self {
            mode: PseudonymizationMode::default(),
            format: ReplacementFormat::default(),
            custom_prefix: String::new(),
            custom_suffix: String::new(),
            hash_length: DEFAULT_HASH_LENGTH,
            hash_algorithm: HashAlgorithm::default(),
            hash_key: None,
            scope: PseudonymizationScope::default(),
            custom_replacements: HashMap::new(),
            patterns: Vec::new(),
            seed: 0,
            enabled: true,
        }
    }
}

impl PseudonymizerBuilder {
    pub fn mode(mut self, mode: PseudonymizationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn format(mut self, format: ReplacementFormat) -> Self {
        self.format = format;
        self
    }

    pub fn custom_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom_prefix = prefix.into();
        self
    }

    pub fn custom_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.custom_suffix = suffix.into();
        self
    }

    /// Number of hex characters kept from the digest.
    pub fn hash_length(mut self, length: usize) -> Self {
        self.hash_length = length;
        self
    }

    pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Key the digest with HMAC.
    pub fn hash_key(mut self, key: HashKey) -> Self {
        self.hash_key = Some(key);
        self
    }

    pub fn scope(mut self, scope: PseudonymizationScope) -> Self {
        self.scope = scope;
        self
    }

    /// Fixed replacements that win over every mode.
    pub fn custom_replacements(mut self, replacements: HashMap<String, String>) -> Self {
        self.custom_replacements = replacements;
        self
    }

    pub fn add_replacement(mut self, original: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.custom_replacements
            .insert(original.into(), replacement.into());
        self
    }

    /// Named patterns consulted first in realistic mode.
    pub fn pattern_generators<I, K, V>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.patterns = patterns
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn add_pattern(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.push((name.into(), pattern.into()));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Compile the pattern generators and build the instance.
    pub fn build(mut self) -> Result<Pseudonymizer> {
        let patterns = PatternBasedGenerator::new(std::mem::take(&mut self.patterns), self.seed)?;
        debug!(
            mode = %self.mode,
            patterns = patterns.pattern_names().len(),
            overrides = self.custom_replacements.len(),
            "pseudonymizer built"
        );
        Ok(Pseudonymizer::from_parts(self, patterns))
    }
}
