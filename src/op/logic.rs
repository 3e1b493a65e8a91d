//! Comparison and Boolean Logic Operations

use std::cmp::Ordering;

use crate::error::RuntimeError;
use crate::op::{bool_value, str_arg};
use crate::runtime::{type_name, Compiled, EvaluationContext};
use crate::value::Value;

type OpResult = Result<Value, RuntimeError>;

pub fn eq(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::Boolean(args.get(0) == args.get(1)))
}

pub fn ne(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::Boolean(args.get(0) != args.get(1)))
}

/// Order two numbers or two strings. Anything else is incomparable.
fn compare(args: &[Value]) -> Result<Option<Ordering>, RuntimeError> {
    match (args.get(0), args.get(1)) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => Ok(a.partial_cmp(b)),
        (Some(Value::String(a)), Some(Value::String(b))) => Ok(Some(a.cmp(b))),
        (a, b) => Err(RuntimeError::new(format!(
            "Cannot compare {} and {}.",
            a.map_or("nothing", type_name),
            b.map_or("nothing", type_name)
        ))),
    }
}

fn ordered<F: Fn(Ordering) -> bool>(args: &[Value], test: F) -> OpResult {
    Ok(Value::Boolean(compare(args)?.map_or(false, test)))
}

pub fn lt(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    ordered(args, |o| o == Ordering::Less)
}

pub fn gt(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    ordered(args, |o| o == Ordering::Greater)
}

pub fn lte(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    ordered(args, |o| o != Ordering::Greater)
}

pub fn gte(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    ordered(args, |o| o != Ordering::Less)
}

pub fn not(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    let value = args.get(0).cloned().unwrap_or(Value::Null);
    Ok(Value::Boolean(!bool_value(value)?))
}

/// Perform short-circuiting and evaluation
pub fn and(ctx: &EvaluationContext<'_>, args: &[Compiled]) -> OpResult {
    for arg in args {
        if !bool_value(arg(ctx)?)? {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// Perform short-circuiting or evaluation
pub fn or(ctx: &EvaluationContext<'_>, args: &[Compiled]) -> OpResult {
    for arg in args {
        if bool_value(arg(ctx)?)? {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

/// Fail with the given message.
pub fn error(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Err(RuntimeError::new(str_arg(args, 0)?))
}
