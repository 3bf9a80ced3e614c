//! Generation of strings that match a regular expression.
//!
//! A pattern is parsed once ([`syntax`]), compiled into an enumerable
//! language ([`lang`]) and then sampled by index. [`PatternBasedGenerator`]
//! layers naming, caching and uniqueness on top.

pub mod generator;
pub mod lang;
pub mod placeholder;
pub mod syntax;

pub use generator::{PatternBasedGenerator, LOW_CARDINALITY_THRESHOLD};
pub use lang::Lang;
pub use placeholder::Placeholder;
