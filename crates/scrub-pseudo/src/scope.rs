//! Which kinds of fields are pseudonymized.

use serde::{Deserialize, Serialize};

/// Category of a field handed to the pseudonymizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// Key/value properties such as system properties or environment entries.
    Property,
    /// Free-form strings and log text.
    String,
    /// Hostnames and network addresses.
    Network,
    /// File-system paths.
    Path,
    /// Network ports.
    Port,
}

impl std::fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldCategory::Property => "property",
            FieldCategory::String => "string",
            FieldCategory::Network => "network",
            FieldCategory::Path => "path",
            FieldCategory::Port => "port",
        };
        write!(f, "{}", s)
    }
}

/// Field categories the pseudonymizer applies to.
///
/// Categories that are switched off fall back to plain redaction; nothing
/// here is inferred from the values themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PseudonymizationScope {
    pub properties: bool,
    pub strings: bool,
    pub network: bool,
    pub paths: bool,
    pub ports: bool,
}

impl Default for PseudonymizationScope {
    fn default() -> Self {
        Self::all()
    }
}

impl PseudonymizationScope {
    /// Every category enabled.
    pub fn all() -> Self {
        Self {
            properties: true,
            strings: true,
            network: true,
            paths: true,
            ports: true,
        }
    }

    /// Every category disabled.
    pub fn none() -> Self {
        Self {
            properties: false,
            strings: false,
            network: false,
            paths: false,
            ports: false,
        }
    }

    pub fn applies_to(&self, category: FieldCategory) -> bool {
        match category {
            FieldCategory::Property => self.properties,
            FieldCategory::String => self.strings,
            FieldCategory::Network => self.network,
            FieldCategory::Path => self.paths,
            FieldCategory::Port => self.ports,
        }
    }
}
