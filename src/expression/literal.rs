use serde_json::json;

use crate::context::ParsingContext;
use crate::expression::MAX_SAFE_INTEGER;
use crate::runtime::Compiled;
use crate::types::Type;
use crate::value::{type_of, Value};

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    key: String,
    ty: Type,
    value: Value,
}

impl Literal {
    pub fn new<K: Into<String>>(key: K, value: Value) -> Self {
        Self {
            key: key.into(),
            ty: type_of(&value),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        if args.len() != 2 {
            return context.error(format!(
                "'literal' expression requires exactly one argument, but found {} instead.",
                args.len() - 1
            ));
        }
        if !check_numbers(&args[1], context) {
            return None;
        }

        let mut literal = Self::new(context.key(), Value::from(&args[1]));

        // `[]` carries no item type of its own, so take the expected one.
        if let (Some((_, Some(0))), Some(expected)) =
            (literal.ty.as_array(), context.expected_type())
        {
            if let Some((_, len)) = expected.as_array() {
                if len.map_or(true, |n| n == 0) {
                    literal.ty = expected.clone();
                }
            }
        }
        Some(literal)
    }

    pub(crate) fn compile(&self) -> Compiled {
        let value = self.value.clone();
        Box::new(move |_| Ok(value.clone()))
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        match &self.value {
            Value::Array(_) | Value::Object(_) => json!(["literal", self.value.to_json()]),
            other => other.to_json(),
        }
    }
}

/// Reject numbers too large to be represented exactly, looking inside
/// arrays and objects.
fn check_numbers(value: &serde_json::Value, context: &ParsingContext<'_>) -> bool {
    match value {
        serde_json::Value::Number(n) => {
            let ok = n.as_f64().map_or(false, |n| n.abs() <= MAX_SAFE_INTEGER);
            if !ok {
                let _: Option<()> =
                    context.error("Numeric values must be no larger than 9007199254740991.");
            }
            ok
        }
        serde_json::Value::Array(items) => items.iter().all(|item| check_numbers(item, context)),
        serde_json::Value::Object(map) => map.values().all(|item| check_numbers(item, context)),
        _ => true,
    }
}

#[cfg(test)]
mod test_literal {
    use super::*;
    use crate::error::ParsingError;
    use crate::types::array;
    use std::cell::RefCell;

    fn parse(raw: serde_json::Value, expected: Option<Type>) -> Result<Literal, Vec<ParsingError>> {
        let errors = RefCell::new(Vec::new());
        let parsed = {
            let context = ParsingContext::new(&errors, expected);
            let args = raw.as_array().cloned().unwrap_or_default();
            Literal::parse(&args, &context)
        };
        parsed.ok_or_else(|| errors.into_inner())
    }

    #[test]
    fn test_arity() {
        let errors = parse(json!(["literal"]), None).unwrap_err();
        assert_eq!(
            errors[0].message,
            "'literal' expression requires exactly one argument, but found 0 instead."
        );
        assert!(parse(json!(["literal", 1, 2]), None).is_err());
    }

    #[test]
    fn test_safe_integer_limit() {
        assert!(parse(json!(["literal", 9007199254740991u64]), None).is_ok());
        let errors = parse(json!(["literal", {"a": [9007199254740992u64]}]), None).unwrap_err();
        assert_eq!(
            errors[0].message,
            "Numeric values must be no larger than 9007199254740991."
        );
    }

    #[test]
    fn test_empty_array_takes_expected_type() {
        let expected = array(Type::String, None);
        let literal = parse(json!(["literal", []]), Some(expected.clone())).unwrap();
        assert_eq!(literal.get_type(), &expected);

        let literal = parse(json!(["literal", []]), Some(Type::Value)).unwrap();
        assert_eq!(literal.get_type(), &array(Type::Value, Some(0)));
    }

    #[test]
    fn test_serialize() {
        let literal = parse(json!(["literal", [1, 2]]), None).unwrap();
        assert_eq!(literal.serialize(), json!(["literal", [1, 2]]));
        let literal = parse(json!(["literal", "a"]), None).unwrap();
        assert_eq!(literal.serialize(), json!("a"));
    }
}
