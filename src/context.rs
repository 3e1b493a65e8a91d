//! Parsing context
//!
//! A `ParsingContext` is created fresh for every top-level parse. Child
//! contexts share the parent's error list, extend its key path and carry
//! their own expected type and visible `let` bindings.

use std::cell::RefCell;

use crate::error::ParsingError;
use crate::types::Type;

#[derive(Debug)]
pub struct ParsingContext<'a> {
    key: String,
    expected_type: Option<Type>,
    scope: Vec<(String, Type)>,
    errors: &'a RefCell<Vec<ParsingError>>,
}
impl<'a> ParsingContext<'a> {
    pub fn new(errors: &'a RefCell<Vec<ParsingError>>, expected_type: Option<Type>) -> Self {
        Self {
            key: String::new(),
            expected_type,
            scope: Vec::new(),
            errors,
        }
    }

    /// A context for the argument at `index`.
    pub fn concat(&self, index: usize, expected_type: Option<Type>) -> ParsingContext<'a> {
        self.concat_with_bindings(index, expected_type, Vec::new())
    }

    /// A context for the argument at `index` that also sees `bindings`.
    pub fn concat_with_bindings(
        &self,
        index: usize,
        expected_type: Option<Type>,
        bindings: Vec<(String, Type)>,
    ) -> ParsingContext<'a> {
        let mut scope = self.scope.clone();
        scope.extend(bindings);
        ParsingContext {
            key: format!("{}[{}]", self.key, index),
            expected_type,
            scope,
            errors: self.errors,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expected_type(&self) -> Option<&Type> {
        self.expected_type.as_ref()
    }

    /// The expected type as a starting point for inferring a branching
    /// form's output type. `value` constrains nothing, so it yields `None`
    /// and the outputs decide.
    pub fn output_type_hint(&self) -> Option<Type> {
        self.expected_type
            .as_ref()
            .filter(|t| **t != Type::Value)
            .cloned()
    }

    /// The type of the innermost binding of `name`.
    pub fn binding(&self, name: &str) -> Option<&Type> {
        self.scope
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, t)| t)
    }

    /// Record an error at this context's key. Always returns `None`, so
    /// parsers can `return context.error(...)`.
    pub fn error<T, M: Into<String>>(&self, message: M) -> Option<T> {
        self.errors
            .borrow_mut()
            .push(ParsingError::new(self.key.clone(), message));
        None
    }

    /// Record an error at the argument `index` of this context's node.
    pub fn error_at<T, M: Into<String>>(&self, index: usize, message: M) -> Option<T> {
        self.errors.borrow_mut().push(ParsingError::new(
            format!("{}[{}]", self.key, index),
            message,
        ));
        None
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.borrow().is_empty()
    }
}

#[cfg(test)]
mod test_context {
    use super::*;

    #[test]
    fn test_keys_and_shared_errors() {
        let errors = RefCell::new(Vec::new());
        let root = ParsingContext::new(&errors, Some(Type::Number));
        let child = root.concat(2, None);
        let grandchild = child.concat(1, Some(Type::String));
        assert_eq!(grandchild.key(), "[2][1]");
        assert_eq!(grandchild.expected_type(), Some(&Type::String));

        let _: Option<()> = grandchild.error("bad");
        let _: Option<()> = root.error_at(0, "worse");
        assert!(root.has_errors());
        assert_eq!(
            errors.into_inner(),
            vec![ParsingError::new("[2][1]", "bad"), ParsingError::new("[0]", "worse")]
        );
    }

    #[test]
    fn test_bindings_shadow() {
        let errors = RefCell::new(Vec::new());
        let root = ParsingContext::new(&errors, None);
        let outer = root.concat_with_bindings(1, None, vec![("a".into(), Type::Number)]);
        let inner = outer.concat_with_bindings(1, None, vec![("a".into(), Type::String)]);
        assert_eq!(outer.binding("a"), Some(&Type::Number));
        assert_eq!(inner.binding("a"), Some(&Type::String));
        assert_eq!(root.binding("a"), None);
    }
}
