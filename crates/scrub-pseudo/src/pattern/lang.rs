//! Enumerable languages compiled from a parsed pattern.
//!
//! A [`Lang`] knows how many indices it spans (its cardinality) and how to
//! decode any index below that into a matching string. Both deterministic
//! and random generation reduce to choosing an index.
//!
//! Cardinality counts derivations, not distinct strings: overlapping
//! alternation branches or ambiguous repetitions can decode two indices to
//! the same string. Arithmetic saturates at `u128::MAX`, so every index
//! below the cardinality still decodes to a valid match.

use super::placeholder::Placeholder;
use super::syntax::Node;

/// Compiled, enumerable form of a pattern.
#[derive(Debug, Clone)]
pub struct Lang {
    kind: Kind,
    cardinality: u128,
}

#[derive(Debug, Clone)]
enum Kind {
    Text(String),
    Chars(Vec<char>),
    Words(&'static [&'static str]),
    Concat(Vec<Lang>),
    Alternation(Vec<Lang>),
    Repeat {
        inner: Box<Lang>,
        min: u32,
        /// Number of indices for each length `min..=max`.
        counts: Vec<u128>,
    },
}

impl Lang {
    /// Compile a parsed pattern.
    pub fn compile(node: &Node) -> Lang {
        match node {
            Node::Empty => Lang::text(String::new()),
            Node::Literal(c) => Lang::text(c.to_string()),
            Node::Class(set) => Lang {
                cardinality: set.len() as u128,
                kind: Kind::Chars(set.clone()),
            },
            Node::Placeholder(placeholder) => Lang::words(*placeholder),
            Node::Concat(items) => Lang::concat(items.iter().map(Lang::compile).collect()),
            Node::Alternation(branches) => {
                let branches: Vec<Lang> = branches.iter().map(Lang::compile).collect();
                let cardinality = branches
                    .iter()
                    .fold(0u128, |acc, b| acc.saturating_add(b.cardinality));
                Lang {
                    kind: Kind::Alternation(branches),
                    cardinality,
                }
            }
            Node::Repeat { node, min, max, .. } => {
                let inner = Lang::compile(node);
                if inner.cardinality == 1 && *min == *max {
                    // Fixed text repeated a fixed number of times.
                    let mut out = String::new();
                    inner.decode_into(0, &mut out);
                    return Lang::text(out.repeat(*min as usize));
                }
                let counts: Vec<u128> = (*min..=*max)
                    .map(|len| inner.cardinality.saturating_pow(len))
                    .collect();
                let cardinality = counts.iter().fold(0u128, |acc, c| acc.saturating_add(*c));
                Lang {
                    kind: Kind::Repeat {
                        inner: Box::new(inner),
                        min: *min,
                        counts,
                    },
                    cardinality,
                }
            }
        }
    }

    fn text(s: String) -> Lang {
        Lang {
            kind: Kind::Text(s),
            cardinality: 1,
        }
    }

    fn words(placeholder: Placeholder) -> Lang {
        let values = placeholder.values();
        Lang {
            kind: Kind::Words(values),
            cardinality: values.len() as u128,
        }
    }

    /// Concatenation with adjacent fixed parts merged.
    fn concat(parts: Vec<Lang>) -> Lang {
        let mut merged: Vec<Lang> = Vec::with_capacity(parts.len());
        for part in parts {
            if let (Kind::Text(next), Some(Lang { kind: Kind::Text(prev), .. })) =
                (&part.kind, merged.last_mut())
            {
                prev.push_str(next);
                continue;
            }
            merged.push(part);
        }
        if merged.len() == 1 {
            return merged.remove(0);
        }
        let cardinality = merged
            .iter()
            .fold(1u128, |acc, p| acc.saturating_mul(p.cardinality));
        Lang {
            kind: Kind::Concat(merged),
            cardinality,
        }
    }

    /// Number of decodable indices (saturating).
    pub fn cardinality(&self) -> u128 {
        self.cardinality
    }

    /// Decode `index` (reduced modulo the cardinality) into a string.
    pub fn decode(&self, index: u128) -> String {
        let mut out = String::new();
        self.decode_into(index % self.cardinality, &mut out);
        out
    }

    fn decode_into(&self, index: u128, out: &mut String) {
        match &self.kind {
            Kind::Text(s) => out.push_str(s),
            Kind::Chars(set) => out.push(set[(index % set.len() as u128) as usize]),
            Kind::Words(values) => out.push_str(values[(index % values.len() as u128) as usize]),
            Kind::Concat(parts) => {
                // Mixed radix, first part varies fastest.
                let mut rest = index;
                for part in parts {
                    part.decode_into(rest % part.cardinality, out);
                    rest /= part.cardinality;
                }
            }
            Kind::Alternation(branches) => {
                let mut rest = index;
                for branch in branches {
                    if rest < branch.cardinality {
                        branch.decode_into(rest, out);
                        return;
                    }
                    rest -= branch.cardinality;
                }
                if let Some(last) = branches.last() {
                    last.decode_into(rest % last.cardinality, out);
                }
            }
            Kind::Repeat { inner, min, counts } => {
                let mut rest = index;
                for (offset, count) in counts.iter().enumerate() {
                    if rest < *count {
                        inner.decode_repeated(rest, *min + offset as u32, out);
                        return;
                    }
                    rest -= count;
                }
                let longest = *min + counts.len().saturating_sub(1) as u32;
                inner.decode_repeated(rest, longest, out);
            }
        }
    }

    fn decode_repeated(&self, index: u128, times: u32, out: &mut String) {
        let mut rest = index;
        for _ in 0..times {
            self.decode_into(rest % self.cardinality, out);
            rest /= self.cardinality;
        }
    }
}
