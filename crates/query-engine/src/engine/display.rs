//! Textual reconstruction of a query tree, for debugging and golden tests.
//!
//! Implicit AND groups print as `{ ... }`, explicit OR groups as
//! `( ... )`, and negation as a NOT-token prefix. The output is
//! approximate: it is not guaranteed to re-parse to the same tree.

use std::fmt;
use std::io::{self, Write};

use crate::element::{Element, ElementKind, Leaf, Value};
use crate::registry::OperatorTokens;

use super::QueryEngine;

/// Displays an element using a given set of operator tokens.
pub struct ElementDisplay<'a> {
    element: &'a Element,
    operators: &'a OperatorTokens,
}

impl<'a> ElementDisplay<'a> {
    pub fn new(element: &'a Element, operators: &'a OperatorTokens) -> Self {
        Self { element, operators }
    }
}

impl fmt::Display for ElementDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, self.element, self.operators)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, self, &OperatorTokens::default())
    }
}

impl<S, D> fmt::Display for QueryEngine<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operators = self.registry.operators();
        write_children(f, self.root.children(), &operators.or, operators)
    }
}

impl<S, D> QueryEngine<S, D> {
    /// Prints the query to stdout.
    pub fn print(&self) {
        println!("{self}");
    }

    pub fn print_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{self}")
    }

    pub fn display_element<'a>(&'a self, element: &'a Element) -> ElementDisplay<'a> {
        ElementDisplay::new(element, self.registry.operators())
    }
}

fn write_element(
    f: &mut fmt::Formatter<'_>,
    element: &Element,
    operators: &OperatorTokens,
) -> fmt::Result {
    if element.is_negated() {
        write!(f, "{} ", operators.not)?;
    }
    match element.kind() {
        ElementKind::Leaf(leaf) => write_leaf(f, leaf),
        ElementKind::And(children) => {
            f.write_str("{ ")?;
            write_children(f, children, &operators.and, operators)?;
            f.write_str(" }")
        }
        ElementKind::Or(children) => {
            write!(f, "{} ", operators.group_start)?;
            write_children(f, children, &operators.or, operators)?;
            write!(f, " {}", operators.group_end)
        }
    }
}

fn write_children(
    f: &mut fmt::Formatter<'_>,
    children: &[Element],
    separator: &str,
    operators: &OperatorTokens,
) -> fmt::Result {
    for (index, child) in children.iter().enumerate() {
        if index > 0 {
            write!(f, " {separator} ")?;
        }
        write_element(f, child, operators)?;
    }
    Ok(())
}

fn write_leaf(f: &mut fmt::Formatter<'_>, leaf: &Leaf) -> fmt::Result {
    f.write_str(leaf.predicate())?;
    for argument in leaf.arguments() {
        f.write_str(" ")?;
        write_value(f, argument)?;
    }
    Ok(())
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(text) if needs_quotes(text) => write!(f, "{text:?}"),
        Value::String(text) => f.write_str(text),
        Value::Integer(number) => write!(f, "{number}"),
        Value::Boolean(flag) => write!(f, "{flag}"),
        Value::Bytes(bytes) => {
            f.write_str("<")?;
            for byte in bytes {
                write!(f, "{byte:02x}")?;
            }
            f.write_str(">")
        }
        Value::Range(range) => write!(f, "{range}"),
    }
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty() || text.chars().any(|ch| ch.is_whitespace() || ch == '"')
}
