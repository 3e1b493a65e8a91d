//! String Operations

use crate::error::RuntimeError;
use crate::op::str_arg;
use crate::runtime::EvaluationContext;
use crate::value::Value;

pub fn upcase(_: &EvaluationContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(str_arg(args, 0)?.to_uppercase()))
}

pub fn downcase(_: &EvaluationContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(str_arg(args, 0)?.to_lowercase()))
}

/// Concatenate strings.
///
/// Arguments are type-checked as strings when parsed, so no implicit
/// conversion happens here.
pub fn concat(_: &EvaluationContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut rv = String::new();
    for i in 0..args.len() {
        rv.push_str(str_arg(args, i)?);
    }
    Ok(Value::String(rv))
}

#[cfg(test)]
mod test_string {
    use super::*;
    use crate::feature::{Feature, Globals};

    #[test]
    fn test_case_and_concat() {
        let globals = Globals::default();
        let feature = Feature::default();
        let ctx = EvaluationContext::new(&globals, &feature);
        assert_eq!(upcase(&ctx, &[Value::from("aBc")]), Ok(Value::from("ABC")));
        assert_eq!(downcase(&ctx, &[Value::from("aBc")]), Ok(Value::from("abc")));
        assert_eq!(
            concat(&ctx, &[Value::from("a"), Value::from("-"), Value::from("b")]),
            Ok(Value::from("a-b"))
        );
        assert!(concat(&ctx, &[Value::Number(1.0)]).is_err());
    }
}
