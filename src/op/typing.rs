//! Type Assertions and Coercions

use crate::coerce;
use crate::error::RuntimeError;
use crate::runtime::{self, type_name, EvaluationContext};
use crate::types::{check_subtype, Type};
use crate::value::{type_of, Value};

type OpResult = Result<Value, RuntimeError>;

pub fn type_of_value(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::from(args.get(0).map_or("Null", type_name)))
}

/// Return the first argument of the `expected` kind, or fail naming the
/// last argument's kind.
fn assert_kind(args: &[Value], expected: &Type) -> OpResult {
    let (last, rest) = match args.split_last() {
        Some(split) => split,
        None => return Err(RuntimeError::new("Expected at least one argument.")),
    };
    match rest
        .iter()
        .find(|value| check_subtype(expected, &type_of(value)).is_none())
    {
        Some(value) => Ok(value.clone()),
        None => runtime::assert_type(last.clone(), expected, None),
    }
}

pub fn assert_string(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    assert_kind(args, &Type::String)
}

pub fn assert_number(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    assert_kind(args, &Type::Number)
}

pub fn assert_boolean(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    assert_kind(args, &Type::Boolean)
}

pub fn assert_object(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    assert_kind(args, &Type::Object)
}

pub fn to_string(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    runtime::to_string(args.get(0).unwrap_or(&Value::Null)).map(Value::String)
}

/// The first argument that converts to a number.
pub fn to_number(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    if let Some(n) = args.iter().find_map(coerce::to_number) {
        return Ok(Value::Number(n));
    }
    runtime::to_number(args.last().unwrap_or(&Value::Null)).map(Value::Number)
}

pub fn to_boolean(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::Boolean(args.get(0).map_or(false, coerce::truthy)))
}

#[cfg(test)]
mod test_typing {
    use super::*;
    use crate::feature::{Feature, Globals};

    #[test]
    fn test_assertions_take_first_match() {
        let globals = Globals::default();
        let feature = Feature::default();
        let ctx = EvaluationContext::new(&globals, &feature);
        let args = [Value::Number(1.0), Value::from("a"), Value::from("b")];
        assert_eq!(assert_string(&ctx, &args), Ok(Value::from("a")));
        assert_eq!(
            assert_boolean(&ctx, &args).unwrap_err().message,
            "Expected value to be of type boolean, but found string instead."
        );
    }

    #[test]
    fn test_coercions() {
        let globals = Globals::default();
        let feature = Feature::default();
        let ctx = EvaluationContext::new(&globals, &feature);
        assert_eq!(
            to_number(&ctx, &[Value::from("x"), Value::from(" 4 ")]),
            Ok(Value::Number(4.0))
        );
        assert!(to_number(&ctx, &[Value::Null]).is_err());
        assert_eq!(to_string(&ctx, &[Value::Null]), Ok(Value::from("null")));
        assert_eq!(to_boolean(&ctx, &[Value::from("")]), Ok(Value::Boolean(false)));
        assert_eq!(type_of_value(&ctx, &[Value::Null]), Ok(Value::from("Null")));
    }
}
