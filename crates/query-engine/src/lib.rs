//! Embeddable boolean query builder and evaluator.
//!
//! This crate provides:
//! - An expression tree of predicate leaves and AND/OR groups with negation
//! - A stack-machine builder that assembles the tree from a token stream,
//!   honoring explicit group > NOT > AND > OR precedence
//! - A short-circuiting evaluator that dispatches leaves to caller callbacks
//! - A registry of predicates, synonyms and remappable operator tokens
//!
//! The engine knows nothing about what a predicate means; parse and
//! evaluation callbacks supplied by the host carry all of that.

pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod predicates;
pub mod range;
pub mod registry;
pub mod tokens;

// Re-export main types
pub use config::EngineConfig;
pub use element::{Element, ElementKind, Leaf, Value};
pub use engine::{ElementDisplay, Evaluation, QueryEngine};
pub use error::{QueryError, Result};
pub use range::NumericRange;
pub use registry::{Operator, OperatorTokens, PredicateRegistry};
pub use tokens::{split_query, TokenCursor};
