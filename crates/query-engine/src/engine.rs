//! The query engine: owns the expression tree, the builder state and the
//! predicate registry.
//!
//! A query is built incrementally, either from tokens (see
//! [`QueryEngine::append_element_from_tokens`]) or through the lower-level
//! builder operations, and evaluated any number of times once
//! [`QueryEngine::is_complete`] reports true.


mod builder;
mod display;
mod evaluate;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::element::{Element, Leaf};
use crate::error::{QueryError, Result};
use crate::registry::{OperatorTokens, PredicateRegistry};
use crate::tokens::TokenCursor;

pub use display::ElementDisplay;
pub use evaluate::Evaluation;

/// How an open group on the builder stack was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Root,
    /// AND group pushed by promotion; closed by OR or by the enclosing `)`.
    Implicit,
    /// OR group opened by a group-start token.
    Explicit,
}

/// Boolean query builder and evaluator over subjects of type `S`, with
/// caller data of type `D` handed to every callback.
pub struct QueryEngine<S, D = ()> {
    root: Element,
    /// Open groups, root first. Every open group is the last child of the
    /// group below it, so the stack only records kinds.
    group_stack: Vec<GroupKind>,
    nesting_level: usize,
    pending_operator: bool,
    short_circuit: bool,
    build_error: Option<QueryError>,
    evaluation_error: Mutex<Option<QueryError>>,
    registry: PredicateRegistry<S, D>,
    user_data: D,
}

impl<S, D> QueryEngine<S, D> {
    pub fn new(user_data: D) -> Self {
        Self::with_config(EngineConfig::default(), user_data)
    }

    pub fn with_config(config: EngineConfig, user_data: D) -> Self {
        Self {
            root: Element::or_group(false),
            group_stack: vec![GroupKind::Root],
            nesting_level: 0,
            pending_operator: false,
            short_circuit: config.short_circuit,
            build_error: None,
            evaluation_error: Mutex::new(None),
            registry: PredicateRegistry::with_operators(config.operators),
            user_data,
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    pub fn set_operator_tokens(&mut self, operators: OperatorTokens) {
        self.registry.set_operators(operators);
    }

    pub fn operator_tokens(&self) -> &OperatorTokens {
        self.registry.operators()
    }

    /// Maps `token` to a canonical predicate (or operator) token; `None`
    /// removes the mapping.
    pub fn set_synonym(&mut self, token: &str, canonical: Option<&str>) {
        self.registry.set_synonym(token, canonical);
    }

    pub fn set_parse_callback<F>(&mut self, predicate: &str, callback: F)
    where
        F: Fn(&mut Leaf, &mut TokenCursor<'_>, &D) -> Result<()> + Send + Sync + 'static,
    {
        self.registry.set_parse_callback(predicate, callback);
    }

    pub fn set_evaluation_callback<F>(&mut self, predicate: &str, callback: F)
    where
        F: Fn(&Leaf, &S, &D) -> Result<bool> + Send + Sync + 'static,
    {
        self.registry.set_evaluation_callback(predicate, callback);
    }

    /// Forgets every synonym and callback without touching the tree or the
    /// operator tokens, so the engine can be reused for another grammar.
    pub fn empty_parse_dictionaries(&mut self) {
        self.registry.clear();
    }

    pub fn registry(&self) -> &PredicateRegistry<S, D> {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// True when every explicit group is closed, no operator is dangling,
    /// and no error is latched.
    pub fn is_complete(&self) -> bool {
        self.is_well_formed() && self.evaluation_error.lock().is_none()
    }

    /// Tree shape is final and no builder error is latched.
    fn is_well_formed(&self) -> bool {
        self.nesting_level == 0 && !self.pending_operator && self.build_error.is_none()
    }

    /// The latched builder error, or else the latched evaluation error.
    pub fn last_error(&self) -> Option<QueryError> {
        self.build_error
            .clone()
            .or_else(|| self.evaluation_error.lock().clone())
    }

    /// Clears any latched error, re-enabling [`Self::evaluate`]. A tree left
    /// half-built by a failed builder operation stays as it was.
    pub fn clear_error(&mut self) {
        self.build_error = None;
        *self.evaluation_error.get_mut() = None;
    }

    pub fn short_circuits(&self) -> bool {
        self.short_circuit
    }

    pub fn set_short_circuits(&mut self, short_circuit: bool) {
        self.short_circuit = short_circuit;
    }

    /// The root OR group.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Number of explicit groups still open.
    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    pub fn has_pending_operator(&self) -> bool {
        self.pending_operator
    }

    pub fn user_data(&self) -> &D {
        &self.user_data
    }

    pub fn user_data_mut(&mut self) -> &mut D {
        &mut self.user_data
    }

    // -----------------------------------------------------------------------
    // Group stack navigation
    // -----------------------------------------------------------------------

    fn current_kind(&self) -> GroupKind {
        self.group_stack.last().copied().unwrap_or(GroupKind::Root)
    }

    fn current_is_or(&self) -> bool {
        matches!(self.current_kind(), GroupKind::Root | GroupKind::Explicit)
    }

    fn current_group(&self) -> Result<&Element> {
        let mut node = &self.root;
        for _ in 1..self.group_stack.len() {
            node = node.children().last().ok_or(QueryError::GroupNesting)?;
        }
        Ok(node)
    }

    fn current_group_mut(&mut self) -> Result<&mut Element> {
        let mut node = &mut self.root;
        for _ in 1..self.group_stack.len() {
            node = node
                .children_mut()
                .and_then(|children| children.last_mut())
                .ok_or(QueryError::GroupNesting)?;
        }
        Ok(node)
    }

    fn current_children(&self) -> Result<&[Element]> {
        self.current_group().map(Element::children)
    }

    fn current_children_mut(&mut self) -> Result<&mut Vec<Element>> {
        self.current_group_mut()?
            .children_mut()
            .ok_or(QueryError::GroupNesting)
    }
}

impl<S, D: Default> Default for QueryEngine<S, D> {
    fn default() -> Self {
        Self::new(D::default())
    }
}
