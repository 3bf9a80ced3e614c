//! Accumulator for values found during discovery.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What kind of sensitive value was discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Username,
    Hostname,
    EmailLocalPart,
    /// A rule-defined kind, named by the rule.
    Custom(String),
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::Username => write!(f, "username"),
            PatternType::Hostname => write!(f, "hostname"),
            PatternType::EmailLocalPart => write!(f, "email_local_part"),
            PatternType::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// One discovered value with its first-seen spelling and count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredValue {
    pub value: String,
    pub kind: PatternType,
    pub occurrences: u64,
}

impl DiscoveredValue {
    /// Name of the custom kind, if this is one.
    pub fn custom_type_name(&self) -> Option<&str> {
        match &self.kind {
            PatternType::Custom(name) => Some(name),
            _ => None,
        }
    }
}

/// Values found in one pass or shard, keyed by normalized form.
///
/// Case-insensitive instances fold keys to lowercase but keep the casing
/// of the first occurrence for display. Iteration order is the key order,
/// so output does not depend on insertion order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredPatterns {
    case_sensitive: bool,
    allowlist: BTreeSet<String>,
    values: BTreeMap<String, DiscoveredValue>,
}

impl DiscoveredPatterns {
    pub fn new<I, S>(case_sensitive: bool, allowlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Self {
            case_sensitive,
            allowlist: BTreeSet::new(),
            values: BTreeMap::new(),
        };
        patterns.allowlist = allowlist
            .into_iter()
            .map(|s| patterns.normalize(s.as_ref()))
            .collect();
        patterns
    }

    fn normalize(&self, value: &str) -> String {
        if self.case_sensitive {
            value.to_string()
        } else {
            value.to_lowercase()
        }
    }

    /// Record one occurrence. Empty and allowlisted values are ignored.
    pub fn add_value(&mut self, value: &str, kind: PatternType) {
        if value.is_empty() {
            return;
        }
        let key = self.normalize(value);
        if self.allowlist.contains(&key) {
            return;
        }
        self.values
            .entry(key)
            .and_modify(|v| v.occurrences += 1)
            .or_insert_with(|| DiscoveredValue {
                value: value.to_string(),
                kind,
                occurrences: 1,
            });
    }

    pub fn get(&self, value: &str) -> Option<&DiscoveredValue> {
        self.values.get(&self.normalize(value))
    }

    pub fn contains(&self, value: &str) -> bool {
        self.get(value).is_some()
    }

    /// Values seen at least `min_occurrences` times.
    pub fn get_values(&self, min_occurrences: u64) -> Vec<&DiscoveredValue> {
        self.values
            .values()
            .filter(|v| v.occurrences >= min_occurrences)
            .collect()
    }

    /// Number of distinct normalized values.
    pub fn total_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fold another instance into this one.
    ///
    /// Counts are summed per normalized key (normalized under this
    /// instance's case rule); an existing entry keeps its casing and kind.
    pub fn merge(&mut self, other: DiscoveredPatterns) {
        for (_, incoming) in other.values {
            let key = self.normalize(&incoming.value);
            if self.allowlist.contains(&key) {
                continue;
            }
            match self.values.get_mut(&key) {
                Some(existing) => existing.occurrences += incoming.occurrences,
                None => {
                    self.values.insert(key, incoming);
                }
            }
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredValue> {
        self.values.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insensitive() -> DiscoveredPatterns {
        DiscoveredPatterns::new(false, Vec::<String>::new())
    }

    #[test]
    fn test_case_insensitive_counts_together() {
        let mut p = insensitive();
        p.add_value("Bob", PatternType::Username);
        p.add_value("bob", PatternType::Username);
        assert_eq!(p.total_count(), 1);
        let v = p.get("BOB").unwrap();
        assert_eq!(v.occurrences, 2);
        assert_eq!(v.value, "Bob");
    }

    #[test]
    fn test_case_sensitive_keeps_apart() {
        let mut p = DiscoveredPatterns::new(true, Vec::<String>::new());
        p.add_value("Bob", PatternType::Username);
        p.add_value("bob", PatternType::Username);
        assert_eq!(p.total_count(), 2);
        assert!(p.is_case_sensitive());
        assert!(!p.contains("BOB"));
    }

    #[test]
    fn test_empty_and_allowlisted_ignored() {
        let mut p = DiscoveredPatterns::new(false, ["Root"]);
        p.add_value("", PatternType::Username);
        p.add_value("root", PatternType::Username);
        p.add_value("ROOT", PatternType::Username);
        assert!(p.is_empty());
    }

    #[test]
    fn test_get_values_threshold() {
        let mut p = insensitive();
        p.add_value("once", PatternType::Hostname);
        p.add_value("twice", PatternType::Hostname);
        p.add_value("twice", PatternType::Hostname);
        assert_eq!(p.get_values(1).len(), 2);
        let frequent = p.get_values(2);
        assert_eq!(frequent.len(), 1);
        assert_eq!(frequent[0].value, "twice");
        assert!(p.get_values(3).is_empty());
    }

    #[test]
    fn test_merge_sums_and_keeps_receiver_casing() {
        let mut a = insensitive();
        a.add_value("Alice", PatternType::Username);
        let mut b = insensitive();
        b.add_value("ALICE", PatternType::Username);
        b.add_value("alice", PatternType::Username);
        b.add_value("carol", PatternType::Username);

        a.merge(b);
        assert_eq!(a.total_count(), 2);
        let alice = a.get("alice").unwrap();
        assert_eq!(alice.occurrences, 3);
        assert_eq!(alice.value, "Alice");
        assert_eq!(a.get("carol").unwrap().occurrences, 1);
    }

    #[test]
    fn test_custom_type_name() {
        let mut p = insensitive();
        p.add_value("acme-01", PatternType::Custom("tenant".into()));
        p.add_value("bob", PatternType::Username);
        assert_eq!(p.get("acme-01").unwrap().custom_type_name(), Some("tenant"));
        assert_eq!(p.get("bob").unwrap().custom_type_name(), None);
    }
}
