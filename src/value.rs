//! Runtime values
//!
//! Raw expressions and feature data arrive as `serde_json::Value`s. They are
//! converted once into the tagged `Value` union used by compiled code, which
//! adds a distinct `Color` kind.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Number;

use crate::types::{array, Type};

/// Feature properties, and the contents of an `Object` value.
pub type Properties = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Color(Color),
    Object(Properties),
    Array(Vec<Value>),
}

/// An RGBA color with every channel in `0..=1`. Channels are not
/// premultiplied by alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}
impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(channels: [f64; 4]) -> Self {
        Self::new(channels[0], channels[1], channels[2], channels[3])
    }

    /// Channels scaled back to the `rgba` operator's argument ranges.
    pub fn to_rgba(&self) -> [f64; 4] {
        [self.r * 255.0, self.g * 255.0, self.b * 255.0, self.a]
    }
}

/// Classify a runtime value.
///
/// Arrays whose items all share one type get that item type, otherwise
/// `value`; their length is always fixed.
///
/// ```rust
/// use style_expr::types::Type;
/// use style_expr::value::{type_of, Value};
///
/// let nums = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
/// assert_eq!(type_of(&nums).to_string(), "Array<number, 2>");
///
/// let mixed = Value::Array(vec![Value::Number(1.0), Value::from("a")]);
/// assert_eq!(type_of(&mixed).to_string(), "Array<value, 2>");
/// assert_eq!(type_of(&Value::Null), Type::Null);
/// ```
pub fn type_of(value: &Value) -> Type {
    match value {
        Value::Null => Type::Null,
        Value::Boolean(_) => Type::Boolean,
        Value::Number(_) => Type::Number,
        Value::String(_) => Type::String,
        Value::Color(_) => Type::Color,
        Value::Object(_) => Type::Object,
        Value::Array(items) => {
            let mut item_type: Option<Type> = None;
            for item in items {
                let t = type_of(item);
                match item_type {
                    None => item_type = Some(t),
                    Some(ref seen) if *seen == t => continue,
                    Some(_) => {
                        item_type = Some(Type::Value);
                        break;
                    }
                }
            }
            array(item_type.unwrap_or(Type::Value), Some(items.len()))
        }
    }
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&Color> {
        match self {
            Self::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render the value as JSON. Colors become `["rgba", r, g, b, a]`, and
    /// non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Color(c) => {
                let mut rv = vec![serde_json::Value::String("rgba".into())];
                rv.extend(c.to_rgba().iter().map(|ch| number_to_json(*ch)));
                serde_json::Value::Array(rv)
            }
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

/// Render a number as JSON, preferring an integer representation when the
/// value is integral, so `1.0` serializes as `1`.
pub(crate) fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect(),
            ),
        }
    }
}
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from(&value)
    }
}
impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Convert a JSON object into feature properties.
pub fn properties_from_json(map: &serde_json::Map<String, serde_json::Value>) -> Properties {
    map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()
}

#[cfg(test)]
mod test_value {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let val = Value::from(json!({"a": [1, "b", null], "c": true}));
        let mut expected = Properties::new();
        expected.insert(
            "a".into(),
            Value::Array(vec![Value::Number(1.0), Value::from("b"), Value::Null]),
        );
        expected.insert("c".into(), Value::Boolean(true));
        assert_eq!(val, Value::Object(expected));
    }

    #[test]
    fn test_to_json_roundtrips_plain_data() {
        let raw = json!({"a": [1, 2.5, "x"], "b": null, "c": false});
        assert_eq!(Value::from(&raw).to_json(), raw);
    }

    #[test]
    fn test_color_to_json() {
        let c = Value::Color(Color::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(c.to_json(), json!(["rgba", 255, 0, 0, 0.5]));
    }

    #[test]
    fn test_type_of_nested_arrays() {
        let val = Value::from(json!([[1, 2], [3, 4]]));
        assert_eq!(type_of(&val).to_string(), "Array<Array<number, 2>, 2>");
        let ragged = Value::from(json!([[1, 2], [3]]));
        assert_eq!(type_of(&ragged).to_string(), "Array<value, 2>");
        assert_eq!(type_of(&Value::Array(vec![])).to_string(), "Array<value, 0>");
    }
}
