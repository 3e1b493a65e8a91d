//! Value coercions
//!
//! Conversions used by the `to-number`, `to-string` and `to-boolean`
//! operators. They follow JavaScript's `Number()`, `String()` and
//! `Boolean()` closely, since style data is authored against those rules.

use std::f64;
use std::str::FromStr;

use crate::value::Value;

/// Render a number the way JavaScript's `String(number)` does for the
/// common cases.
pub fn number_to_string(num: f64) -> String {
    if num.is_nan() {
        String::from("NaN")
    } else if num.is_infinite() {
        if num > 0.0 {
            String::from("Infinity")
        } else {
            String::from("-Infinity")
        }
    } else if num == 0.0 {
        // covers -0
        String::from("0")
    } else {
        num.to_string()
    }
}

/// Convert a primitive to a string.
///
/// Non-primitive values are rendered as JSON; callers that need to reject
/// them check the kind first.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Boolean(val) => val.to_string(),
        Value::Number(val) => number_to_string(*val),
        Value::String(val) => val.clone(),
        _ => value.to_json().to_string(),
    }
}

/// Parse a string the way `Number(string)` does: surrounding whitespace is
/// ignored and the empty string is zero.
pub fn str_to_number<S: AsRef<str>>(string: S) -> Option<f64> {
    let s = string.as_ref().trim();
    if s == "" {
        return Some(0.0);
    }
    match s {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        // Rust accepts these, JS does not
        _ if s.eq_ignore_ascii_case("inf")
            || s.eq_ignore_ascii_case("infinity")
            || s.eq_ignore_ascii_case("nan") =>
        {
            None
        }
        _ => f64::from_str(s).ok().filter(|n| !n.is_nan()),
    }
}

/// Do our best to convert something into a number.
///
/// Should be pretty much equivalent to calling Number(value) in JS,
/// returning None where that would return NaN. Unlike JS, `null` is not
/// treated as zero.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Boolean(val) => Some(if *val { 1.0 } else { 0.0 }),
        Value::Number(val) => Some(*val).filter(|n| !n.is_nan()),
        Value::String(val) => str_to_number(val),
        Value::Color(_) | Value::Object(_) | Value::Array(_) => None,
    }
}

/// Return whether a value is "truthy" by JavaScript's `Boolean()` rules.
///
/// ```rust
/// use style_expr::coerce::truthy;
/// use style_expr::value::Value;
///
/// assert!(truthy(&Value::from("foo")));
/// assert!(truthy(&Value::Array(vec![])));
/// assert!(!truthy(&Value::from("")));
/// assert!(!truthy(&Value::Number(0.0)));
/// assert!(!truthy(&Value::Null));
/// ```
pub fn truthy(val: &Value) -> bool {
    match val {
        Value::Null => false,
        Value::Boolean(v) => *v,
        Value::Number(v) => !(*v == 0.0 || v.is_nan()),
        Value::String(v) => v != "",
        Value::Color(_) | Value::Object(_) | Value::Array(_) => true,
    }
}

/// Return whether a raw JSON value is "truthy".
///
/// Used to decide whether a raw filter is present at all: `null`, `false`,
/// `0`, `""` and the empty array all count as "no filter".
pub fn json_truthy(val: &serde_json::Value) -> bool {
    match val {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(v) => *v,
        serde_json::Value::Number(v) => v.as_f64().map(|n| n != 0.0).unwrap_or(false),
        serde_json::Value::String(v) => v != "",
        serde_json::Value::Array(v) => !v.is_empty(),
        serde_json::Value::Object(_) => true,
    }
}
