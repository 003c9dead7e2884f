//! Stack-machine query builder.
//!
//! Precedence (explicit group > NOT > AND > OR) is realized entirely by
//! stack manipulation: an AND operator met at OR level promotes the
//! preceding element into a new implicit AND group, and an OR operator
//! closes the implicit AND group again.

use crate::element::{Element, Leaf};
use crate::error::{QueryError, Result};
use crate::registry::Operator;
use crate::tokens::{split_query, TokenCursor};

use super::{GroupKind, QueryEngine};

impl<S, D> QueryEngine<S, D> {
    // -----------------------------------------------------------------------
    // Public builder operations
    // -----------------------------------------------------------------------

    /// Appends an element to the current group. Adjacent elements without
    /// an operator between them are joined with AND.
    pub fn append_element(&mut self, element: Element) -> Result<()> {
        self.ensure_buildable()?;
        let result = self.push_element(element);
        self.latch(result)
    }

    pub fn append_and_operator(&mut self) -> Result<()> {
        self.ensure_buildable()?;
        let result = self.push_and_operator();
        self.latch(result)
    }

    pub fn append_or_operator(&mut self) -> Result<()> {
        self.ensure_buildable()?;
        let result = self.push_or_operator();
        self.latch(result)
    }

    /// Opens an explicit group, negated if requested.
    pub fn start_group(&mut self, negated: bool) -> Result<()> {
        self.ensure_buildable()?;
        let result = self.open_group(negated);
        self.latch(result)
    }

    pub fn end_group(&mut self) -> Result<()> {
        self.ensure_buildable()?;
        let result = self.close_group();
        self.latch(result)
    }

    /// Consumes one element's worth of tokens: an operator, a group
    /// delimiter, or a predicate keyword together with the arguments its
    /// parse callback takes. Returns the number of tokens consumed, which is
    /// zero once the tokens are exhausted.
    pub fn append_element_from_tokens<T: AsRef<str>>(&mut self, tokens: &[T]) -> Result<usize> {
        let mut cursor = TokenCursor::new(tokens);
        self.append_from_cursor(&mut cursor)?;
        Ok(cursor.position())
    }

    /// Cursor form of [`Self::append_element_from_tokens`]. Returns false
    /// when the cursor was already exhausted.
    pub fn append_from_cursor(&mut self, cursor: &mut TokenCursor<'_>) -> Result<bool> {
        self.ensure_buildable()?;
        let result = self.consume_element(cursor);
        self.latch(result)
    }

    /// Feeds every token, returning how many were consumed.
    pub fn append_tokens<T: AsRef<str>>(&mut self, tokens: &[T]) -> Result<usize> {
        let mut cursor = TokenCursor::new(tokens);
        while self.append_from_cursor(&mut cursor)? {}
        Ok(cursor.position())
    }

    /// Splits `input` into tokens and feeds them all.
    pub fn append_query_str(&mut self, input: &str) -> Result<usize> {
        self.ensure_buildable()?;
        let tokens = split_query(input);
        let tokens = self.latch(tokens)?;
        self.append_tokens(&tokens)
    }

    // -----------------------------------------------------------------------
    // Error latching
    // -----------------------------------------------------------------------

    fn ensure_buildable(&self) -> Result<()> {
        match &self.build_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn latch<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            log::debug!("query build failed: {error}");
            self.build_error = Some(error.clone());
        }
        result
    }

    // -----------------------------------------------------------------------
    // Stack machine
    // -----------------------------------------------------------------------

    fn push_element(&mut self, element: Element) -> Result<()> {
        if !self.pending_operator && !self.current_children()?.is_empty() {
            self.push_and_operator()?;
        }
        push_child(self.current_children_mut()?, element)?;
        self.pending_operator = false;
        Ok(())
    }

    fn push_and_operator(&mut self) -> Result<()> {
        self.check_operator_position()?;
        if self.current_is_or() {
            self.promote(true)?;
        }
        self.pending_operator = true;
        Ok(())
    }

    fn push_or_operator(&mut self) -> Result<()> {
        self.check_operator_position()?;
        if self.current_kind() == GroupKind::Implicit {
            self.group_stack.pop();
        }
        self.pending_operator = true;
        Ok(())
    }

    fn check_operator_position(&self) -> Result<()> {
        if self.pending_operator {
            return Err(QueryError::Syntax("two logical operators in a row".to_string()));
        }
        if self.current_children()?.is_empty() {
            return Err(QueryError::Syntax(
                "logical operator without a preceding element".to_string(),
            ));
        }
        Ok(())
    }

    /// Pushes a new implicit AND group as the last child of the current
    /// group, moving the current group's last child into it when `yank` is
    /// set.
    fn promote(&mut self, yank: bool) -> Result<()> {
        let children = self.current_children_mut()?;
        let mut grouped = Vec::new();
        if yank {
            if let Some(last) = children.pop() {
                grouped.push(last);
            }
        }
        push_child(children, Element::and_group(grouped))?;
        self.group_stack.push(GroupKind::Implicit);
        Ok(())
    }

    fn open_group(&mut self, negated: bool) -> Result<()> {
        if !self.pending_operator && self.current_is_or() {
            let yank = !self.current_children()?.is_empty();
            self.promote(yank)?;
        }
        push_child(self.current_children_mut()?, Element::or_group(negated))?;
        self.group_stack.push(GroupKind::Explicit);
        self.nesting_level += 1;
        self.pending_operator = false;
        Ok(())
    }

    fn close_group(&mut self) -> Result<()> {
        if self.nesting_level == 0 {
            return Err(QueryError::GroupNesting);
        }
        if self.pending_operator {
            return Err(QueryError::Syntax("group ends with a logical operator".to_string()));
        }
        if self.current_children()?.is_empty() {
            return Err(QueryError::EmptyGroup);
        }

        if self.current_kind() == GroupKind::Implicit {
            self.group_stack.pop();
        }
        if self.current_kind() != GroupKind::Explicit {
            return Err(QueryError::GroupNesting);
        }
        self.group_stack.pop();
        self.nesting_level -= 1;
        self.coalesce_last_child()?;

        if self.current_kind() == GroupKind::Implicit && self.current_children()?.len() == 1 {
            self.group_stack.pop();
            self.coalesce_last_child()?;
        }
        Ok(())
    }

    /// Replaces the just-closed group (the current group's last child) by
    /// its sole child, if it has exactly one.
    fn coalesce_last_child(&mut self) -> Result<()> {
        let children = self.current_children_mut()?;
        let group = children.pop().ok_or(QueryError::GroupNesting)?;
        let element = group.into_sole_child().unwrap_or_else(|group| group);
        children.push(element);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Token dispatch
    // -----------------------------------------------------------------------

    fn consume_element(&mut self, cursor: &mut TokenCursor<'_>) -> Result<bool> {
        let start = TokenCursor::position(cursor);
        let mut negated = false;

        loop {
            let Some(raw) = cursor.next() else {
                if negated {
                    return Err(QueryError::Syntax(format!(
                        "{} must be followed by an element",
                        self.registry.operators().not
                    )));
                }
                return Ok(false);
            };

            let token = self.registry.resolve(raw).to_string();
            match self.registry.operators().classify(&token) {
                Some(Operator::Not) => {
                    negated = !negated;
                }
                Some(Operator::GroupStart) => {
                    self.open_group(negated)?;
                    return Ok(true);
                }
                Some(_) if negated => {
                    return Err(QueryError::Syntax(format!(
                        "{} must be followed by an element, found {raw}",
                        self.registry.operators().not
                    )));
                }
                Some(Operator::And) => {
                    self.push_and_operator()?;
                    return Ok(true);
                }
                Some(Operator::Or) => {
                    self.push_or_operator()?;
                    return Ok(true);
                }
                Some(Operator::GroupEnd) => {
                    self.close_group()?;
                    return Ok(true);
                }
                None => {
                    let Some(callback) = self.registry.parse_callback(&token) else {
                        cursor.rewind(start);
                        return Err(QueryError::NoParseCallback(raw.to_string()));
                    };

                    cursor.mark_keyword();
                    log::debug!("parsing predicate {token} from token {raw}");
                    let mut leaf = Leaf::new(token);
                    callback(&mut leaf, cursor, &self.user_data)?;

                    let element = Element::from_leaf(leaf);
                    let element = if negated { element.negate() } else { element };
                    self.push_element(element)?;
                    return Ok(true);
                }
            }
        }
    }
}

fn push_child(children: &mut Vec<Element>, element: Element) -> Result<()> {
    children.try_reserve(1).map_err(|_| QueryError::NoMemory)?;
    children.push(element);
    Ok(())
}
