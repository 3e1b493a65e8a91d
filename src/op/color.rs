//! Color Operations

use crate::error::RuntimeError;
use crate::op::number_arg;
use crate::runtime::{self, type_name, EvaluationContext};
use crate::value::Value;

type OpResult = Result<Value, RuntimeError>;

pub fn rgb(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    runtime::rgba(
        number_arg(args, 0)?,
        number_arg(args, 1)?,
        number_arg(args, 2)?,
        None,
    )
    .map(Value::Color)
}

pub fn rgba(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    runtime::rgba(
        number_arg(args, 0)?,
        number_arg(args, 1)?,
        number_arg(args, 2)?,
        Some(number_arg(args, 3)?),
    )
    .map(Value::Color)
}

/// The `[r, g, b, a]` components of a color, with `r`, `g` and `b` in
/// `0..=255`.
pub fn to_rgba(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    match args.get(0) {
        Some(Value::Color(color)) => Ok(Value::Array(
            color.to_rgba().iter().map(|c| Value::Number(*c)).collect(),
        )),
        other => Err(RuntimeError::new(format!(
            "Expected color but found {} instead.",
            other.map_or("nothing", type_name)
        ))),
    }
}

/// The first argument that is a color, or a string naming one.
pub fn to_color(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    let mut last_error = RuntimeError::new("Expected at least one argument.");
    for arg in args {
        match arg {
            Value::Color(color) => return Ok(Value::Color(*color)),
            Value::String(s) => match runtime::parse_color(s) {
                Ok(color) => return Ok(Value::Color(color)),
                Err(err) => last_error = err,
            },
            other => {
                last_error = RuntimeError::new(format!(
                    "Could not parse color from value '{}'",
                    other
                ))
            }
        }
    }
    Err(last_error)
}
