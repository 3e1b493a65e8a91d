//! The compiler
//!
//! Drives a parse of a raw expression against an expected type and lowers
//! the typed tree into a single closure.

use std::cell::RefCell;
use std::fmt;

use crate::context::ParsingContext;
use crate::error::{Error, ParsingError, ParsingErrors, RuntimeError};
use crate::expression::{parse_expression, Expression};
use crate::feature::{Feature, Globals};
use crate::runtime::{Compiled, EvaluationContext};
use crate::types::Type;
use crate::value::Value;

/// A successfully compiled expression.
///
/// Immutable once built; `evaluate` may be called any number of times, from
/// any number of threads.
pub struct CompiledExpression {
    function: Compiled,
    is_feature_constant: bool,
    is_zoom_constant: bool,
    expression: Expression,
}

impl CompiledExpression {
    /// Evaluate for one feature at one zoom. Runtime failures are returned
    /// to the caller, who decides how to treat them.
    pub fn evaluate(&self, globals: &Globals, feature: &Feature) -> Result<Value, RuntimeError> {
        (self.function)(&EvaluationContext::new(globals, feature))
    }

    pub fn evaluate_in(&self, ctx: &EvaluationContext<'_>) -> Result<Value, RuntimeError> {
        (self.function)(ctx)
    }

    /// True iff the result never depends on the feature.
    pub fn is_feature_constant(&self) -> bool {
        self.is_feature_constant
    }

    /// True iff the result never depends on the zoom level.
    pub fn is_zoom_constant(&self) -> bool {
        self.is_zoom_constant
    }

    /// The typed tree this was compiled from.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn get_type(&self) -> &Type {
        self.expression.get_type()
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("expression", &self.expression)
            .field("is_feature_constant", &self.is_feature_constant)
            .field("is_zoom_constant", &self.is_zoom_constant)
            .field("function", &"<compiled fn>")
            .finish()
    }
}

/// Parse `expr`, check it against `expected`, and compile it.
///
/// Every parse error found is returned, not just the first.
///
/// ```rust
/// use serde_json::json;
/// use style_expr::{compile_expression, Feature, Globals, Type, Value};
///
/// let compiled = compile_expression(&json!(["+", 1, ["zoom"]]), Some(&Type::Number)).unwrap();
/// assert!(compiled.is_feature_constant());
/// assert!(!compiled.is_zoom_constant());
/// assert_eq!(
///     compiled.evaluate(&Globals::zoom(2.0), &Feature::default()),
///     Ok(Value::Number(3.0))
/// );
///
/// let err = compile_expression(&json!(["+", 1, "a"]), None).unwrap_err();
/// assert_eq!(err.to_string(), "[2]: Expected number but found string instead.");
/// ```
pub fn compile_expression(
    expr: &serde_json::Value,
    expected: Option<&Type>,
) -> Result<CompiledExpression, Error> {
    let errors = RefCell::new(Vec::new());
    let parsed = {
        let context = ParsingContext::new(&errors, expected.cloned());
        parse_expression(expr, &context)
    };
    let errors = errors.into_inner();

    let expression = match parsed {
        Some(expression) if errors.is_empty() => expression,
        _ => {
            let errors = if errors.is_empty() {
                vec![ParsingError::new("", "Could not parse expression.")]
            } else {
                errors
            };
            tracing::debug!(count = errors.len(), "expression failed to compile");
            return Err(Error::Parse(ParsingErrors(errors)));
        }
    };

    Ok(CompiledExpression {
        function: expression.compile(),
        is_feature_constant: expression.is_feature_constant(),
        is_zoom_constant: expression.is_zoom_constant(),
        expression,
    })
}
