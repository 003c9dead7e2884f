//! Expression tree nodes.
//!
//! An [`Element`] is either a predicate invocation ([`Leaf`]) or a boolean
//! group. AND groups only ever come from the builder's implicit promotion,
//! while non-root OR groups only come from explicit parentheses, so the
//! group kind doubles as the implicit/explicit marker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::range::NumericRange;

/// An opaque argument or metadata value attached to a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Range(NumericRange),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&NumericRange> {
        match self {
            Self::Range(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<NumericRange> for Value {
    fn from(value: NumericRange) -> Self {
        Self::Range(value)
    }
}

/// A predicate invocation: the canonical predicate name, its arguments,
/// and whatever side-channel metadata its parse callback attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    predicate: String,
    arguments: Vec<Value>,
    metadata: BTreeMap<String, Value>,
}

impl Leaf {
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            arguments: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn predicate(&self) -> &str {
        self.predicate.as_str()
    }

    /// Renames the predicate, e.g. to route several keywords to one
    /// evaluation callback.
    pub fn set_predicate(&mut self, predicate: impl Into<String>) {
        self.predicate = predicate.into();
    }

    pub fn arguments(&self) -> &[Value] {
        self.arguments.as_slice()
    }

    pub fn argument(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index)
    }

    pub fn push_argument(&mut self, value: impl Into<Value>) {
        self.arguments.push(value.into());
    }

    /// Replaces all arguments at once.
    pub fn set_arguments<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.arguments = values.into_iter().map(Into::into).collect();
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<Value> {
        self.metadata.remove(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Leaf(Leaf),
    And(Vec<Element>),
    Or(Vec<Element>),
}

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    kind: ElementKind,
    negated: bool,
}

impl Element {
    pub fn leaf(predicate: impl Into<String>) -> Self {
        Self::from_leaf(Leaf::new(predicate))
    }

    pub fn leaf_with_arguments<I, V>(predicate: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut leaf = Leaf::new(predicate);
        leaf.set_arguments(arguments);
        Self::from_leaf(leaf)
    }

    pub fn from_leaf(leaf: Leaf) -> Self {
        Self {
            kind: ElementKind::Leaf(leaf),
            negated: false,
        }
    }

    pub(crate) fn and_group(children: Vec<Element>) -> Self {
        Self {
            kind: ElementKind::And(children),
            negated: false,
        }
    }

    pub(crate) fn or_group(negated: bool) -> Self {
        Self {
            kind: ElementKind::Or(Vec::new()),
            negated,
        }
    }

    /// Returns this element with its negation flag inverted.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn set_negated(&mut self, negated: bool) {
        self.negated = negated;
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            ElementKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.kind {
            ElementKind::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        !matches!(self.kind, ElementKind::Leaf(_))
    }

    /// Children of a group; empty for leaves.
    pub fn children(&self) -> &[Element] {
        match &self.kind {
            ElementKind::Leaf(_) => &[],
            ElementKind::And(children) | ElementKind::Or(children) => children.as_slice(),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Element>> {
        match &mut self.kind {
            ElementKind::Leaf(_) => None,
            ElementKind::And(children) | ElementKind::Or(children) => Some(children),
        }
    }

    /// Unwraps a single-child group into its child, composing negation.
    pub(crate) fn into_sole_child(self) -> Result<Element, Element> {
        let negated = self.negated;
        match self.kind {
            ElementKind::And(mut children) | ElementKind::Or(mut children)
                if children.len() == 1 =>
            {
                let mut child = children.remove(0);
                child.negated ^= negated;
                Ok(child)
            }
            kind => Err(Element { kind, negated }),
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Element::node_count).sum::<usize>()
    }

    /// Depth of this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Element::depth).max().unwrap_or(0)
    }
}
