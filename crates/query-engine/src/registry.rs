//! Predicate registry: operator tokens, synonyms, and the parse/evaluation
//! callbacks that give predicates their meaning.

use std::sync::Arc;

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::element::Leaf;
use crate::error::Result;
use crate::tokens::TokenCursor;

/// Parse callback: consumes a predicate's own arguments from the cursor
/// and records them on the freshly created leaf.
pub type ParseCallback<D> =
    Arc<dyn Fn(&mut Leaf, &mut TokenCursor<'_>, &D) -> Result<()> + Send + Sync>;

/// Evaluation callback: tests one leaf against a subject.
pub type EvaluationCallback<S, D> = Arc<dyn Fn(&Leaf, &S, &D) -> Result<bool> + Send + Sync>;

pub const DEFAULT_AND_TOKEN: &str = "-and";
pub const DEFAULT_OR_TOKEN: &str = "-or";
pub const DEFAULT_NOT_TOKEN: &str = "-not";
pub const DEFAULT_GROUP_START_TOKEN: &str = "(";
pub const DEFAULT_GROUP_END_TOKEN: &str = ")";

/// The five structural tokens of the query grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorTokens {
    pub and: String,
    pub or: String,
    pub not: String,
    pub group_start: String,
    pub group_end: String,
}

impl Default for OperatorTokens {
    fn default() -> Self {
        Self {
            and: DEFAULT_AND_TOKEN.to_string(),
            or: DEFAULT_OR_TOKEN.to_string(),
            not: DEFAULT_NOT_TOKEN.to_string(),
            group_start: DEFAULT_GROUP_START_TOKEN.to_string(),
            group_end: DEFAULT_GROUP_END_TOKEN.to_string(),
        }
    }
}

/// Structural role of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
    GroupStart,
    GroupEnd,
}

impl OperatorTokens {
    pub fn classify(&self, token: &str) -> Option<Operator> {
        if token == self.and {
            Some(Operator::And)
        } else if token == self.or {
            Some(Operator::Or)
        } else if token == self.not {
            Some(Operator::Not)
        } else if token == self.group_start {
            Some(Operator::GroupStart)
        } else if token == self.group_end {
            Some(Operator::GroupEnd)
        } else {
            None
        }
    }
}

pub struct PredicateRegistry<S, D> {
    operators: OperatorTokens,
    synonyms: FnvHashMap<String, String>,
    parse_callbacks: FnvHashMap<String, ParseCallback<D>>,
    evaluation_callbacks: FnvHashMap<String, EvaluationCallback<S, D>>,
}

impl<S, D> Default for PredicateRegistry<S, D> {
    fn default() -> Self {
        Self::with_operators(OperatorTokens::default())
    }
}

impl<S, D> PredicateRegistry<S, D> {
    pub fn with_operators(operators: OperatorTokens) -> Self {
        Self {
            operators,
            synonyms: FnvHashMap::default(),
            parse_callbacks: FnvHashMap::default(),
            evaluation_callbacks: FnvHashMap::default(),
        }
    }

    pub fn operators(&self) -> &OperatorTokens {
        &self.operators
    }

    pub fn set_operators(&mut self, operators: OperatorTokens) {
        self.operators = operators;
    }

    /// Maps `token` to `canonical`, or removes the mapping when `canonical`
    /// is `None`.
    pub fn set_synonym(&mut self, token: &str, canonical: Option<&str>) {
        match canonical {
            Some(canonical) => {
                self.synonyms.insert(token.to_string(), canonical.to_string());
            }
            None => {
                self.synonyms.remove(token);
            }
        }
    }

    /// Resolves a raw token through the synonym table.
    pub fn resolve<'a>(&'a self, token: &'a str) -> &'a str {
        self.synonyms.get(token).map(String::as_str).unwrap_or(token)
    }

    pub fn set_parse_callback<F>(&mut self, predicate: &str, callback: F)
    where
        F: Fn(&mut Leaf, &mut TokenCursor<'_>, &D) -> Result<()> + Send + Sync + 'static,
    {
        if self
            .parse_callbacks
            .insert(predicate.to_string(), Arc::new(callback))
            .is_some()
        {
            log::warn!("replaced parse callback for predicate {predicate}");
        }
    }

    pub fn set_evaluation_callback<F>(&mut self, predicate: &str, callback: F)
    where
        F: Fn(&Leaf, &S, &D) -> Result<bool> + Send + Sync + 'static,
    {
        if self
            .evaluation_callbacks
            .insert(predicate.to_string(), Arc::new(callback))
            .is_some()
        {
            log::warn!("replaced evaluation callback for predicate {predicate}");
        }
    }

    pub fn parse_callback(&self, predicate: &str) -> Option<ParseCallback<D>> {
        self.parse_callbacks.get(predicate).cloned()
    }

    pub fn evaluation_callback(&self, predicate: &str) -> Option<&EvaluationCallback<S, D>> {
        self.evaluation_callbacks.get(predicate)
    }

    /// Drops every synonym and callback; operator tokens survive.
    pub fn clear(&mut self) {
        self.synonyms.clear();
        self.parse_callbacks.clear();
        self.evaluation_callbacks.clear();
    }
}
