//! Tree evaluation against a subject.

use crate::element::{Element, ElementKind, Leaf};
use crate::error::QueryError;

use super::QueryEngine;

/// Outcome of one evaluation: the boolean result and the first error any
/// evaluation callback reported. A present error always forces `matched`
/// to false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub matched: bool,
    pub error: Option<QueryError>,
}

impl<S, D> QueryEngine<S, D> {
    /// Evaluates the query against `subject`.
    ///
    /// Returns false without walking the tree while the query is
    /// incomplete or any error is latched. An evaluation error is latched
    /// on the engine and keeps every later call false until
    /// [`Self::clear_error`].
    pub fn evaluate(&self, subject: &S) -> bool {
        if !self.is_complete() {
            return false;
        }
        let evaluation = self.walk(subject);
        if let Some(error) = evaluation.error {
            self.evaluation_error.lock().get_or_insert(error);
        }
        evaluation.matched
    }

    /// Evaluates the query without reading or recording the engine's
    /// evaluation error, so concurrent callers never observe each other's
    /// failures.
    pub fn evaluate_detailed(&self, subject: &S) -> Evaluation {
        if !self.is_well_formed() {
            return Evaluation {
                matched: false,
                error: self.build_error.clone(),
            };
        }
        self.walk(subject)
    }

    fn walk(&self, subject: &S) -> Evaluation {
        let mut error = None;
        let matched = self.evaluate_element(&self.root, subject, &mut error);
        Evaluation { matched, error }
    }

    fn evaluate_element(
        &self,
        element: &Element,
        subject: &S,
        error: &mut Option<QueryError>,
    ) -> bool {
        let result = match element.kind() {
            ElementKind::And(children) => self.evaluate_all(children, subject, error),
            ElementKind::Or(children) => self.evaluate_any(children, subject, error),
            ElementKind::Leaf(leaf) => self.evaluate_leaf(leaf, subject, error),
        };
        let result = result != element.is_negated();
        result && error.is_none()
    }

    fn evaluate_all(
        &self,
        children: &[Element],
        subject: &S,
        error: &mut Option<QueryError>,
    ) -> bool {
        let mut result = true;
        for child in children {
            if !self.evaluate_element(child, subject, error) {
                result = false;
                if self.short_circuit {
                    break;
                }
            }
        }
        result
    }

    fn evaluate_any(
        &self,
        children: &[Element],
        subject: &S,
        error: &mut Option<QueryError>,
    ) -> bool {
        if children.is_empty() {
            return true;
        }
        let mut result = false;
        for child in children {
            if self.evaluate_element(child, subject, error) {
                result = true;
                if self.short_circuit {
                    break;
                }
            } else if self.short_circuit && error.is_some() {
                break;
            }
        }
        result
    }

    fn evaluate_leaf(&self, leaf: &Leaf, subject: &S, error: &mut Option<QueryError>) -> bool {
        let Some(callback) = self.registry.evaluation_callback(leaf.predicate()) else {
            log::debug!("no evaluation callback for predicate {}", leaf.predicate());
            error.get_or_insert_with(|| {
                QueryError::NoEvaluationCallback(leaf.predicate().to_string())
            });
            return false;
        };

        log::trace!("evaluating predicate {}", leaf.predicate());
        match callback(leaf, subject, &self.user_data) {
            Ok(matched) => matched,
            Err(failure) => {
                log::debug!("evaluation of {} failed: {failure}", leaf.predicate());
                error.get_or_insert(failure);
                false
            }
        }
    }
}
