//! Evaluation runtime
//!
//! The primitives that compiled expressions call while evaluating one
//! feature. Each primitive checks its preconditions and reports a violation
//! as a `RuntimeError` rather than producing a bogus value.

use crate::coerce;
use crate::color::parse_css_color;
use crate::error::RuntimeError;
use crate::feature::{Feature, GeometryType, Globals};
use crate::interpolate::{self, find_stop_less_than_or_equal_to, Interpolation};
use crate::types::{check_subtype, Type};
use crate::value::{type_of, Color, Properties, Value};

/// An expression lowered to an executable closure.
pub type Compiled = Box<dyn Fn(&EvaluationContext<'_>) -> Result<Value, RuntimeError> + Send + Sync>;

/// The `let` bindings visible at some point of an evaluation.
#[derive(Debug)]
pub struct Scope<'a> {
    bindings: Vec<(&'a str, Value)>,
    parent: Option<&'a Scope<'a>>,
}
impl<'a> Scope<'a> {
    pub fn new(bindings: Vec<(&'a str, Value)>, parent: Option<&'a Scope<'a>>) -> Self {
        Self { bindings, parent }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value)
            .or_else(|| self.parent.and_then(|parent| parent.lookup(name)))
    }
}

/// Everything a compiled expression can read while evaluating.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    globals: &'a Globals,
    properties: &'a Properties,
    id: Option<&'a Value>,
    geometry_type: GeometryType,
    scope: Option<&'a Scope<'a>>,
}
impl<'a> EvaluationContext<'a> {
    pub fn new(globals: &'a Globals, feature: &'a Feature) -> Self {
        Self::from_parts(
            globals,
            &feature.properties,
            feature.id.as_ref(),
            feature.geometry_type,
        )
    }

    pub fn from_parts(
        globals: &'a Globals,
        properties: &'a Properties,
        id: Option<&'a Value>,
        geometry_type: GeometryType,
    ) -> Self {
        Self {
            globals,
            properties,
            id,
            geometry_type,
            scope: None,
        }
    }

    /// A context that sees `scope` in addition to the current bindings.
    pub fn with_scope<'b>(&self, scope: &'b Scope<'b>) -> EvaluationContext<'b>
    where
        'a: 'b,
    {
        EvaluationContext {
            globals: self.globals,
            properties: self.properties,
            id: self.id,
            geometry_type: self.geometry_type,
            scope: Some(scope),
        }
    }

    pub fn scope(&self) -> Option<&'a Scope<'a>> {
        self.scope
    }

    pub fn zoom(&self) -> Result<f64, RuntimeError> {
        self.globals.zoom.ok_or_else(|| {
            RuntimeError::new("The 'zoom' expression is unavailable in the current evaluation context.")
        })
    }

    pub fn properties(&self) -> &'a Properties {
        self.properties
    }

    pub fn id(&self) -> Value {
        self.id.cloned().unwrap_or(Value::Null)
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        self.scope
            .and_then(|scope| scope.lookup(name))
            .cloned()
            .ok_or_else(|| RuntimeError::new(format!("Unknown variable \"{}\".", name)))
    }
}

pub fn ensure<F: FnOnce() -> String>(condition: bool, message: F) -> Result<(), RuntimeError> {
    if condition {
        Ok(())
    } else {
        Err(RuntimeError::new(message()))
    }
}

pub fn type_name(value: &Value) -> &'static str {
    type_of(value).kind_name()
}

pub fn at(index: f64, array: &[Value]) -> Result<Value, RuntimeError> {
    ensure(index >= 0.0 && index < array.len() as f64, || {
        format!(
            "Array index out of bounds: {} > {}.",
            coerce::number_to_string(index),
            array.len()
        )
    })?;
    ensure(index == index.floor(), || {
        format!(
            "Array index must be an integer, but found {} instead.",
            coerce::number_to_string(index)
        )
    })?;
    Ok(array[index as usize].clone())
}

/// Whether `obj` has `key`. Fails unless `obj` is an object.
pub fn has(obj: &Value, key: &str, name: Option<&str>) -> Result<bool, RuntimeError> {
    match obj {
        Value::Object(map) => Ok(map.contains_key(key)),
        Value::Null => Err(RuntimeError::new(format!(
            "Cannot get property {} from null object{}.",
            key,
            name.map(|n| format!(" {}", n)).unwrap_or_default()
        ))),
        other => Err(RuntimeError::new(format!(
            "Expected {} to be of type Object, but found {} instead.",
            name.unwrap_or("value"),
            type_name(other)
        ))),
    }
}

/// Read `key` from `obj`. Fails unless `obj` is an object containing `key`.
pub fn get(obj: &Value, key: &str, name: Option<&str>) -> Result<Value, RuntimeError> {
    let found = has(obj, key, name)?;
    match obj {
        Value::Object(map) if found => Ok(map[key].clone()),
        _ => Err(not_found(key, name)),
    }
}

/// Read a feature property. Fails when the property is absent.
pub fn get_property(properties: &Properties, key: &str) -> Result<Value, RuntimeError> {
    properties
        .get(key)
        .cloned()
        .ok_or_else(|| not_found(key, Some("feature properties")))
}

fn not_found(key: &str, name: Option<&str>) -> RuntimeError {
    RuntimeError::new(format!(
        "Property '{}' not found in {}",
        key,
        name.unwrap_or("object")
    ))
}

/// Membership by kind and value. Only primitive needles are supported.
pub fn contains(array: &[Value], value: &Value) -> Result<bool, RuntimeError> {
    let kind = type_name(value);
    ensure(
        !matches!(value, Value::Object(_) | Value::Array(_) | Value::Color(_)),
        || format!("\"contains\" does not support values of type {}", kind),
    )?;
    Ok(array.iter().any(|item| item == value))
}

/// Assert at runtime that `value` is of `expected` type.
pub fn assert_type(value: Value, expected: &Type, name: Option<&str>) -> Result<Value, RuntimeError> {
    let actual = type_of(&value);
    match check_subtype(expected, &actual) {
        None => Ok(value),
        Some(_) => Err(RuntimeError::new(format!(
            "Expected {} to be of type {}, but found {} instead.",
            name.unwrap_or("value"),
            expected,
            actual
        ))),
    }
}

/// Evaluate `thunks` in order and return the first non-null result.
///
/// A failing thunk is skipped unless it is the last one, in which case its
/// error is returned. If every thunk yields null (or fails before the
/// last), the result is null.
pub fn coalesce(thunks: &[Compiled], ctx: &EvaluationContext<'_>) -> Result<Value, RuntimeError> {
    let last = thunks.len().saturating_sub(1);
    for (i, thunk) in thunks.iter().enumerate() {
        match thunk(ctx) {
            Ok(Value::Null) => continue,
            Ok(value) => return Ok(value),
            Err(err) if i == last => return Err(err),
            Err(_) => continue,
        }
    }
    Ok(Value::Null)
}

pub fn rgba(r: f64, g: f64, b: f64, a: Option<f64>) -> Result<Color, RuntimeError> {
    let channels = || {
        [r, g, b, a.unwrap_or(1.0)]
            .iter()
            .map(|c| coerce::number_to_string(*c))
            .collect::<Vec<String>>()
            .join(", ")
    };
    let in_range = |c: f64| (0.0..=255.0).contains(&c);
    ensure(in_range(r) && in_range(g) && in_range(b), || {
        format!(
            "Invalid rgba value [{}]: 'r', 'g', and 'b' must be between 0 and 255.",
            channels()
        )
    })?;
    ensure(a.map_or(true, |a| (0.0..=1.0).contains(&a)), || {
        format!(
            "Invalid rgba value [{}]: 'a' must be between 0 and 1.",
            channels()
        )
    })?;
    Ok(Color::new(r / 255.0, g / 255.0, b / 255.0, a.unwrap_or(1.0)))
}

pub fn parse_color(input: &str) -> Result<Color, RuntimeError> {
    parse_css_color(input)
        .ok_or_else(|| RuntimeError::new(format!("Could not parse color from value '{}'", input)))
}

pub fn to_number(value: &Value) -> Result<f64, RuntimeError> {
    coerce::to_number(value)
        .ok_or_else(|| RuntimeError::new(format!("Could not convert {} to number.", value)))
}

pub fn to_string(value: &Value) -> Result<String, RuntimeError> {
    match value {
        Value::Null | Value::String(_) | Value::Number(_) | Value::Boolean(_) => {
            Ok(coerce::to_string(value))
        }
        other => Err(RuntimeError::new(format!(
            "Expected a primitive value in [\"to-string\", ...], but found {} instead.",
            type_name(other)
        ))),
    }
}

/// How the outputs of two bracketing stops are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveOutput {
    Number,
    Color,
    Array,
    /// Not interpolatable; only valid for step curves.
    Discrete,
}

/// Evaluate a curve at `input`.
///
/// Outputs are only evaluated when selected: at most the two stops that
/// bracket the input are forced.
pub fn evaluate_curve(
    ctx: &EvaluationContext<'_>,
    input: Value,
    stop_inputs: &[f64],
    stop_outputs: &[Compiled],
    interpolation: &Interpolation,
    output: CurveOutput,
) -> Result<Value, RuntimeError> {
    let input = match assert_type(input, &Type::Number, Some("curve input"))? {
        Value::Number(n) => n,
        _ => return Err(RuntimeError::new("Curve input must be a number.")),
    };

    let stop_count = stop_inputs.len();
    ensure(stop_count > 0 && stop_count == stop_outputs.len(), || {
        String::from("Curve stops are malformed.")
    })?;
    if stop_count == 1 || input <= stop_inputs[0] {
        return stop_outputs[0](ctx);
    }
    if input >= stop_inputs[stop_count - 1] {
        return stop_outputs[stop_count - 1](ctx);
    }

    let index = find_stop_less_than_or_equal_to(stop_inputs, input);
    if let Interpolation::Step = interpolation {
        return stop_outputs[index](ctx);
    }

    let lower = stop_inputs[index];
    let upper = stop_inputs[index + 1];
    let t = interpolation.factor(input, lower, upper);

    let output_lower = stop_outputs[index](ctx)?;
    let output_upper = stop_outputs[index + 1](ctx)?;

    match (output, output_lower, output_upper) {
        (CurveOutput::Number, Value::Number(a), Value::Number(b)) => {
            Ok(Value::Number(interpolate::number(a, b, t)))
        }
        (CurveOutput::Color, Value::Color(a), Value::Color(b)) => {
            Ok(Value::Color(interpolate::color(&a, &b, t)))
        }
        (CurveOutput::Array, Value::Array(a), Value::Array(b)) => {
            interpolate::array(&a, &b, t).map(Value::Array)
        }
        (_, a, b) => Err(RuntimeError::new(format!(
            "Cannot interpolate between {} and {}.",
            a, b
        ))),
    }
}

#[cfg(test)]
mod test_runtime {
    use super::*;
    use serde_json::json;

    fn constant(value: f64) -> Compiled {
        Box::new(move |_| Ok(Value::Number(value)))
    }

    fn failing(message: &'static str) -> Compiled {
        Box::new(move |_| Err(RuntimeError::new(message)))
    }

    #[test]
    fn test_at() {
        let arr = vec![Value::from("a"), Value::from("b")];
        assert_eq!(at(1.0, &arr), Ok(Value::from("b")));
        assert!(at(2.0, &arr).is_err());
        assert!(at(-1.0, &arr).is_err());
        assert_eq!(
            at(0.5, &arr).unwrap_err().message,
            "Array index must be an integer, but found 0.5 instead."
        );
    }

    #[test]
    fn test_get_and_has() {
        let obj = Value::from(json!({"a": 1}));
        assert_eq!(has(&obj, "a", None), Ok(true));
        assert_eq!(has(&obj, "b", None), Ok(false));
        assert_eq!(get(&obj, "a", None), Ok(Value::Number(1.0)));
        assert_eq!(
            get(&obj, "b", None).unwrap_err().message,
            "Property 'b' not found in object"
        );
        assert_eq!(
            has(&Value::Number(1.0), "a", None).unwrap_err().message,
            "Expected value to be of type Object, but found Number instead."
        );
        assert!(get(&Value::Null, "a", None).is_err());
    }

    #[test]
    fn test_contains() {
        let arr = vec![Value::from("a"), Value::Number(1.0)];
        assert_eq!(contains(&arr, &Value::from("a")), Ok(true));
        assert_eq!(contains(&arr, &Value::from("1")), Ok(false));
        assert_eq!(contains(&arr, &Value::Number(1.0)), Ok(true));
        assert!(contains(&arr, &Value::Array(vec![])).is_err());
        assert!(contains(&arr, &Value::Color(Color::BLACK)).is_err());
    }

    #[test]
    fn test_assert_type() {
        assert!(assert_type(Value::from("a"), &Type::String, None).is_ok());
        assert_eq!(
            assert_type(Value::from("a"), &Type::Number, Some("curve input"))
                .unwrap_err()
                .message,
            "Expected curve input to be of type number, but found string instead."
        );
    }

    #[test]
    fn test_coalesce() {
        let globals = Globals::default();
        let feature = Feature::default();
        let ctx = EvaluationContext::new(&globals, &feature);

        let null: Compiled = Box::new(|_| Ok(Value::Null));
        let thunks = vec![failing("first"), null, constant(3.0), failing("never")];
        assert_eq!(coalesce(&thunks, &ctx), Ok(Value::Number(3.0)));

        let thunks = vec![constant(1.0), failing("last")];
        assert_eq!(coalesce(&thunks, &ctx), Ok(Value::Number(1.0)));

        let thunks = vec![failing("first"), failing("last")];
        assert_eq!(coalesce(&thunks, &ctx).unwrap_err().message, "last");

        let null: Compiled = Box::new(|_| Ok(Value::Null));
        assert_eq!(coalesce(&[null], &ctx), Ok(Value::Null));
        assert_eq!(coalesce(&[], &ctx), Ok(Value::Null));
    }

    #[test]
    fn test_rgba() {
        assert_eq!(rgba(255.0, 0.0, 0.0, None), Ok(Color::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(
            rgba(256.0, 0.0, 0.0, None).unwrap_err().message,
            "Invalid rgba value [256, 0, 0, 1]: 'r', 'g', and 'b' must be between 0 and 255."
        );
        assert!(rgba(0.0, 0.0, 0.0, Some(1.5)).is_err());
    }

    #[test]
    fn test_coercions() {
        assert_eq!(to_number(&Value::from("3")), Ok(3.0));
        assert!(to_number(&Value::Null).is_err());
        assert!(to_number(&Value::from("x")).is_err());
        assert_eq!(to_string(&Value::Number(3.0)), Ok("3".into()));
        assert!(to_string(&Value::Array(vec![])).is_err());
        assert!(parse_color("#zzz").is_err());
    }

    #[test]
    fn test_evaluate_curve_forces_only_bracketing_stops() {
        let globals = Globals::default();
        let feature = Feature::default();
        let ctx = EvaluationContext::new(&globals, &feature);
        let stops = [0.0, 10.0, 20.0];
        let outputs = vec![constant(0.0), constant(10.0), failing("not forced")];

        let at = |input: f64| {
            evaluate_curve(
                &ctx,
                Value::Number(input),
                &stops,
                &outputs,
                &Interpolation::Linear,
                CurveOutput::Number,
            )
        };
        assert_eq!(at(5.0), Ok(Value::Number(5.0)));
        assert_eq!(at(-5.0), Ok(Value::Number(0.0)));
        assert!(at(25.0).is_err());

        let step = evaluate_curve(
            &ctx,
            Value::Number(7.0),
            &stops,
            &outputs,
            &Interpolation::Step,
            CurveOutput::Discrete,
        );
        assert_eq!(step, Ok(Value::Number(0.0)));

        let bad_input = evaluate_curve(
            &ctx,
            Value::from("a"),
            &stops,
            &outputs,
            &Interpolation::Step,
            CurveOutput::Discrete,
        );
        assert!(bad_input.is_err());
    }
}
