//! Numeric Operations

use std::f64::consts;

use crate::error::RuntimeError;
use crate::op::number_arg;
use crate::runtime::EvaluationContext;
use crate::value::Value;

type OpResult = Result<Value, RuntimeError>;

pub fn e(_: &EvaluationContext<'_>, _: &[Value]) -> OpResult {
    Ok(Value::Number(consts::E))
}

pub fn pi(_: &EvaluationContext<'_>, _: &[Value]) -> OpResult {
    Ok(Value::Number(consts::PI))
}

pub fn ln2(_: &EvaluationContext<'_>, _: &[Value]) -> OpResult {
    Ok(Value::Number(consts::LN_2))
}

fn numbers(args: &[Value]) -> Result<Vec<f64>, RuntimeError> {
    (0..args.len()).map(|i| number_arg(args, i)).collect()
}

fn unary<F: Fn(f64) -> f64>(args: &[Value], func: F) -> OpResult {
    Ok(Value::Number(func(number_arg(args, 0)?)))
}

fn binary<F: Fn(f64, f64) -> f64>(args: &[Value], func: F) -> OpResult {
    Ok(Value::Number(func(number_arg(args, 0)?, number_arg(args, 1)?)))
}

pub fn plus(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::Number(numbers(args)?.into_iter().sum()))
}

pub fn times(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::Number(numbers(args)?.into_iter().product()))
}

/// Perform subtraction or convert a number to a negative
pub fn minus(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    if args.len() == 1 {
        unary(args, |n| -n)
    } else {
        binary(args, |a, b| a - b)
    }
}

pub fn divide(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    binary(args, |a, b| a / b)
}

/// Remainder with the sign of the dividend.
pub fn rem(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    binary(args, |a, b| a % b)
}

pub fn pow(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    binary(args, f64::powf)
}

pub fn log10(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::log10)
}

pub fn ln(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::ln)
}

pub fn log2(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::log2)
}

pub fn sin(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::sin)
}

pub fn cos(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::cos)
}

pub fn tan(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::tan)
}

pub fn asin(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::asin)
}

pub fn acos(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::acos)
}

pub fn atan(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::atan)
}

pub fn ceil(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::ceil)
}

pub fn floor(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::floor)
}

/// Round half up, so `-2.5` rounds to `-2`.
pub fn round(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, |n| (n + 0.5).floor())
}

pub fn abs(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    unary(args, f64::abs)
}

pub fn min(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::Number(
        numbers(args)?.into_iter().fold(f64::INFINITY, f64::min),
    ))
}

pub fn max(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    Ok(Value::Number(
        numbers(args)?.into_iter().fold(f64::NEG_INFINITY, f64::max),
    ))
}
