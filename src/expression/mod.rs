//! The expression AST
//!
//! Raw JSON expressions are parsed into a closed tree of `Expression` nodes.
//! Every node carries the key path it was parsed at and its resolved type.
//! Nodes can be compiled into closures and serialized back to JSON.

use serde_json::json;

use crate::context::ParsingContext;
use crate::op::{Dependency, OPERATOR_MAP};
use crate::runtime::Compiled;
use crate::types::{check_subtype, Type};

mod array;
mod binding;
mod branch;
mod coalesce;
mod compound;
mod curve;
mod literal;

pub use self::array::ArrayAssertion;
pub use self::binding::{Let, Var};
pub use self::branch::{Case, Match, MatchLabel};
pub use self::coalesce::Coalesce;
pub use self::compound::CompoundExpression;
pub use self::curve::Curve;
pub use self::literal::Literal;

/// The largest integer that a double represents exactly.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Var(Var),
    Let(Let),
    Coalesce(Coalesce),
    Case(Case),
    Match(Match),
    Curve(Curve),
    Array(ArrayAssertion),
    Compound(CompoundExpression),
}

impl Expression {
    /// The key path this node was parsed at, e.g. `[1][2]`.
    pub fn key(&self) -> &str {
        match self {
            Self::Literal(e) => e.key(),
            Self::Var(e) => e.key(),
            Self::Let(e) => e.key(),
            Self::Coalesce(e) => e.key(),
            Self::Case(e) => e.key(),
            Self::Match(e) => e.key(),
            Self::Curve(e) => e.key(),
            Self::Array(e) => e.key(),
            Self::Compound(e) => e.key(),
        }
    }

    pub fn get_type(&self) -> &Type {
        match self {
            Self::Literal(e) => e.get_type(),
            Self::Var(e) => e.get_type(),
            Self::Let(e) => e.get_type(),
            Self::Coalesce(e) => e.get_type(),
            Self::Case(e) => e.get_type(),
            Self::Match(e) => e.get_type(),
            Self::Curve(e) => e.get_type(),
            Self::Array(e) => e.get_type(),
            Self::Compound(e) => e.get_type(),
        }
    }

    /// Lower this node and its children into one closure.
    pub fn compile(&self) -> Compiled {
        match self {
            Self::Literal(e) => e.compile(),
            Self::Var(e) => e.compile(),
            Self::Let(e) => e.compile(),
            Self::Coalesce(e) => e.compile(),
            Self::Case(e) => e.compile(),
            Self::Match(e) => e.compile(),
            Self::Curve(e) => e.compile(),
            Self::Array(e) => e.compile(),
            Self::Compound(e) => e.compile(),
        }
    }

    /// Render the node back to its JSON form. Parsing the result yields an
    /// equivalent tree.
    pub fn serialize(&self) -> serde_json::Value {
        match self {
            Self::Literal(e) => e.serialize(),
            Self::Var(e) => e.serialize(),
            Self::Let(e) => e.serialize(),
            Self::Coalesce(e) => e.serialize(),
            Self::Case(e) => e.serialize(),
            Self::Match(e) => e.serialize(),
            Self::Curve(e) => e.serialize(),
            Self::Array(e) => e.serialize(),
            Self::Compound(e) => e.serialize(),
        }
    }

    /// Direct children, in argument order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Self::Literal(_) | Self::Var(_) => Vec::new(),
            Self::Let(e) => e.children(),
            Self::Coalesce(e) => e.args().iter().collect(),
            Self::Case(e) => e.children(),
            Self::Match(e) => e.children(),
            Self::Curve(e) => e.children(),
            Self::Array(e) => vec![e.input()],
            Self::Compound(e) => e.args().iter().collect(),
        }
    }

    /// Visit this node and then every descendant, depth first.
    pub fn accept<F: FnMut(&Expression)>(&self, visitor: &mut F) {
        visitor(self);
        for child in self.children() {
            child.accept(visitor);
        }
    }

    fn depends_on(&self, dependency: Dependency) -> bool {
        let mut found = false;
        self.accept(&mut |e| {
            if let Self::Compound(c) = e {
                found |= c.definition().dependency == dependency;
            }
        });
        found
    }

    /// True iff no part of the tree reads the feature.
    pub fn is_feature_constant(&self) -> bool {
        !self.depends_on(Dependency::Feature)
    }

    /// True iff no part of the tree reads the zoom level.
    pub fn is_zoom_constant(&self) -> bool {
        !self.depends_on(Dependency::Zoom)
    }
}

/// Parse a raw JSON expression.
///
/// Returns `None` if parsing failed, in which case at least one error was
/// recorded in `context`.
pub fn parse_expression(expr: &serde_json::Value, context: &ParsingContext<'_>) -> Option<Expression> {
    let sugar;
    let args = match expr {
        serde_json::Value::Array(args) => args,
        serde_json::Value::Object(_) => {
            return context.error(r#"Bare objects invalid. Use ["literal", {...}] instead."#)
        }
        primitive => {
            sugar = vec![json!("literal"), primitive.clone()];
            &sugar
        }
    };

    let op = match args.first() {
        None => {
            return context.error(
                r#"Expected an array with at least one element. If you wanted a literal array, use ["literal", []]."#,
            )
        }
        Some(serde_json::Value::String(op)) => op.as_str(),
        Some(other) => {
            return context.error_at(
                0,
                format!(
                    r#"Expression name must be a string, but found {} instead. If you wanted a literal array, use ["literal", [...]]."#,
                    json_kind(other)
                ),
            )
        }
    };

    let parsed = match op {
        "literal" => Literal::parse(args, context).map(Expression::Literal),
        "var" => Var::parse(args, context).map(Expression::Var),
        "let" => Let::parse(args, context).map(Expression::Let),
        "coalesce" => Coalesce::parse(args, context).map(Expression::Coalesce),
        "case" => Case::parse(args, context).map(Expression::Case),
        "match" => Match::parse(args, context).map(Expression::Match),
        "curve" => Curve::parse(args, context).map(Expression::Curve),
        "array" => ArrayAssertion::parse(args, context).map(Expression::Array),
        _ => match OPERATOR_MAP.get(op) {
            Some(definition) => {
                CompoundExpression::parse(definition, args, context).map(Expression::Compound)
            }
            None => {
                return context.error_at(
                    0,
                    format!(
                        r#"Unknown expression "{}". If you wanted a literal array, use ["literal", [...]]."#,
                        op
                    ),
                )
            }
        },
    }?;

    if let Some(expected) = context.expected_type() {
        if let Some(message) = check_subtype(expected, parsed.get_type()) {
            return context.error(message);
        }
    }
    Some(parsed)
}

/// The JavaScript `typeof` name of a raw JSON value.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        _ => "object",
    }
}

/// Track the type shared by sibling outputs (`case`, `match`, `coalesce`,
/// `curve`): the expected type if there is one, else the first output that
/// can produce a value.
pub(crate) fn unify_output(output_type: &mut Option<Type>, parsed: &Expression) {
    if output_type.is_none() && *parsed.get_type() != Type::Error {
        *output_type = Some(parsed.get_type().clone());
    }
}

#[cfg(test)]
mod test_expression {
    use super::*;
    use crate::error::ParsingError;
    use crate::types::array;
    use std::cell::RefCell;

    fn parse(expr: serde_json::Value, expected: Option<Type>) -> Result<Expression, Vec<ParsingError>> {
        let errors = RefCell::new(Vec::new());
        let parsed = {
            let context = ParsingContext::new(&errors, expected);
            parse_expression(&expr, &context)
        };
        parsed.ok_or_else(|| errors.into_inner())
    }

    fn first_error(expr: serde_json::Value) -> ParsingError {
        parse(expr, None).unwrap_err().remove(0)
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(
            first_error(json!([])).message,
            r#"Expected an array with at least one element. If you wanted a literal array, use ["literal", []]."#
        );
        let err = first_error(json!([1, 2]));
        assert_eq!(err.key, "[0]");
        assert!(err.message.starts_with("Expression name must be a string, but found number"));
        let err = first_error(json!(["nope"]));
        assert_eq!(err.key, "[0]");
        assert!(err.message.starts_with(r#"Unknown expression "nope""#));
        assert_eq!(
            first_error(json!({"a": 1})).message,
            r#"Bare objects invalid. Use ["literal", {...}] instead."#
        );
    }

    #[test]
    fn test_primitives_are_literal_sugar() {
        for raw in vec![json!(null), json!("a"), json!(true), json!(1.5)] {
            let parsed = parse(raw.clone(), None).unwrap();
            assert!(matches!(parsed, Expression::Literal(_)));
            assert_eq!(parsed.serialize(), raw);
        }
    }

    #[test]
    fn test_expected_type_is_enforced() {
        let expected = array(Type::Number, Some(3));
        assert!(parse(json!(["literal", [1, 2, 3]]), Some(expected.clone())).is_ok());
        let errors = parse(json!(["literal", [1, 2, 3, 4]]), Some(expected.clone())).unwrap_err();
        assert_eq!(
            errors[0].message,
            "Expected Array<number, 3> but found Array<number, 4> instead."
        );
        assert!(parse(json!(["literal", ["a", "b", "c"]]), Some(expected)).is_err());
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = parse(json!(["+", ["nope"], ["zilch"]]), None).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].key, "[1][0]");
        assert_eq!(errors[1].key, "[2][0]");
    }

    #[test]
    fn test_constant_flags() {
        let parsed = parse(json!(["+", ["zoom"], 1]), None).unwrap();
        assert!(parsed.is_feature_constant());
        assert!(!parsed.is_zoom_constant());

        let parsed = parse(json!(["let", "a", ["get", "x"], ["var", "a"]]), None).unwrap();
        assert!(!parsed.is_feature_constant());
        assert!(parsed.is_zoom_constant());

        let parsed = parse(json!(["at", 0, ["literal", [1, 2]]]), None).unwrap();
        assert!(parsed.is_feature_constant());
        let parsed = parse(json!(["at", 0, ["array", ["get", "xs"]]]), None).unwrap();
        assert!(!parsed.is_feature_constant());
    }

    #[test]
    fn test_accept_visits_every_node() {
        let parsed = parse(json!(["+", 1, ["*", 2, 3]]), None).unwrap();
        let mut keys = Vec::new();
        parsed.accept(&mut |e| keys.push(e.key().to_string()));
        assert_eq!(keys, vec!["", "[1]", "[2]", "[2][1]", "[2][2]"]);
    }
}
