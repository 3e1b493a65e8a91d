//! Style functions
//!
//! A style function is the compiled accessor for one style property. It is
//! built from a constant, an `{"expression": [...]}` wrapper, or a legacy
//! stop-based function definition, and never fails once built: evaluation
//! failures are logged once per distinct message and yield `None`.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::compile::{compile_expression, CompiledExpression};
use crate::error::Error;
use crate::expression::{Curve, Expression};
use crate::feature::{GeometryType, Globals};
use crate::runtime::EvaluationContext;
use crate::types::{array, Type};
use crate::value::{Properties, Value};

mod convert;

pub use convert::{convert_function, convert_value};

/// The declared kind of a style property.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Color,
    String,
    Number,
    Enum,
    Boolean,
    Array,
}

/// The declaration of a style property: its kind and default.
///
/// ```rust
/// use serde_json::json;
/// use style_expr::{PropertySpec, Type};
/// use style_expr::types::array;
///
/// let spec = PropertySpec::from_json(&json!({"type": "array", "value": "number", "length": 2})).unwrap();
/// assert_eq!(spec.expected_type(), array(Type::Number, Some(2)));
/// assert!(PropertySpec::from_json(&json!({"type": "texture"})).is_err());
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PropertySpec {
    #[serde(rename = "type")]
    pub kind: PropertyType,
    #[serde(default)]
    pub default: Option<JsonValue>,
    /// Item kind of an `array` property.
    #[serde(default)]
    pub value: Option<String>,
    /// Fixed length of an `array` property.
    #[serde(default)]
    pub length: Option<usize>,
    /// Allowed values of an `enum` property.
    #[serde(default)]
    pub values: Option<serde_json::Map<String, JsonValue>>,
}

impl PropertySpec {
    pub fn new(kind: PropertyType) -> Self {
        Self {
            kind,
            default: None,
            value: None,
            length: None,
            values: None,
        }
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn from_json(spec: &JsonValue) -> Result<Self, Error> {
        serde_json::from_value(spec.clone()).map_err(Error::InvalidPropertySpec)
    }

    /// The type every value of this property must have.
    pub fn expected_type(&self) -> Type {
        match self.kind {
            PropertyType::Color => Type::Color,
            PropertyType::String | PropertyType::Enum => Type::String,
            PropertyType::Number => Type::Number,
            PropertyType::Boolean => Type::Boolean,
            PropertyType::Array => {
                let item = match self.value.as_deref() {
                    Some("color") => Type::Color,
                    Some("string") => Type::String,
                    Some("number") => Type::Number,
                    Some("boolean") => Type::Boolean,
                    _ => Type::Value,
                };
                array(item, self.length)
            }
        }
    }

    /// Whether values of this property can be blended between stops.
    pub fn is_interpolatable(&self) -> bool {
        match self.kind {
            PropertyType::Number | PropertyType::Color => true,
            PropertyType::Array => self.value.as_deref() == Some("number"),
            _ => false,
        }
    }
}

/// Whether `value` is a function definition rather than a constant: an
/// object with an `expression`, with `stops`, or of type `identity`.
pub fn is_function_definition(value: &JsonValue) -> bool {
    let present = |key: &str| value.get(key).map_or(false, |v| !v.is_null() && v != &json!(false));
    value.is_object()
        && (present("expression")
            || present("stops")
            || value.get("type").and_then(JsonValue::as_str) == Some("identity"))
}

/// A compiled style property accessor.
#[derive(Debug)]
pub struct StyleFunction {
    compiled: CompiledExpression,
    zoom_curve: Option<Curve>,
    warnings: Mutex<HashSet<String>>,
}

impl StyleFunction {
    /// The property value at `zoom` for a feature with `properties`.
    ///
    /// `None` when the result is null or evaluation failed.
    pub fn evaluate(&self, zoom: Option<f64>, properties: Option<&Properties>) -> Option<Value> {
        let globals = Globals { zoom };
        let empty = Properties::new();
        let ctx = EvaluationContext::from_parts(
            &globals,
            properties.unwrap_or(&empty),
            None,
            GeometryType::Unknown,
        );
        match self.compiled.evaluate_in(&ctx) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(err) => {
                let mut seen = match self.warnings.lock() {
                    Ok(seen) => seen,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if seen.insert(err.message.clone()) {
                    tracing::warn!("{}", err.message);
                }
                None
            }
        }
    }

    pub fn is_feature_constant(&self) -> bool {
        self.compiled.is_feature_constant()
    }

    pub fn is_zoom_constant(&self) -> bool {
        self.compiled.is_zoom_constant()
    }

    /// The top-level zoom curve of a zoom-dependent function.
    pub fn zoom_curve(&self) -> Option<&Curve> {
        self.zoom_curve.as_ref()
    }

    pub fn expression(&self) -> &CompiledExpression {
        &self.compiled
    }
}

/// Build the style function for a property declared by `spec` from
/// `parameters`.
///
/// ```rust
/// use serde_json::json;
/// use style_expr::{create_function, PropertySpec, Value};
///
/// let spec = PropertySpec::from_json(&json!({"type": "number", "default": 1})).unwrap();
/// let width = create_function(
///     &json!({"stops": [[0, 2], [10, 12]]}),
///     &spec,
/// ).unwrap();
/// assert!(!width.is_zoom_constant());
/// assert_eq!(width.evaluate(Some(5.0), None), Some(Value::Number(7.0)));
/// assert_eq!(width.zoom_curve().map(|c| c.stop_inputs()), Some(vec![0.0, 10.0]));
/// ```
pub fn create_function(parameters: &JsonValue, spec: &PropertySpec) -> Result<StyleFunction, Error> {
    let expr = if !is_function_definition(parameters) {
        match convert_value(parameters, spec) {
            JsonValue::Null => convert::default_value(spec),
            expr => expr,
        }
    } else if let Some(expression) = parameters.get("expression") {
        json!(["coalesce", expression, convert::default_value(spec)])
    } else {
        convert_function(parameters, spec)?
    };

    let compiled = match compile_expression(&expr, Some(&spec.expected_type())) {
        Ok(compiled) => compiled,
        Err(err) => {
            tracing::debug!(expression = %expr, error = %err, "invalid style function");
            return Err(err);
        }
    };

    let zoom_curve = if compiled.is_zoom_constant() {
        None
    } else {
        match find_zoom_curve(compiled.expression())? {
            Some(curve) => Some(curve.clone()),
            None => {
                return Err(Error::InvalidZoomExpression {
                    key: compiled.expression().key().to_string(),
                    message: "Invalid zoom expression".to_string(),
                })
            }
        }
    };

    Ok(StyleFunction {
        compiled,
        zoom_curve,
        warnings: Mutex::new(HashSet::new()),
    })
}

/// Find the curve over `["zoom"]` at the top of `expression`, looking
/// through `let` results and `coalesce` arguments. More than one such curve
/// is an error.
pub fn find_zoom_curve(expression: &Expression) -> Result<Option<&Curve>, Error> {
    match expression {
        Expression::Curve(curve) if curve.is_zoom_curve() => Ok(Some(curve)),
        Expression::Let(binding) => find_zoom_curve(binding.result()),
        Expression::Coalesce(coalesce) => {
            let mut found = None;
            for arg in coalesce.args() {
                match find_zoom_curve(arg)? {
                    None => continue,
                    Some(curve) if found.is_none() => found = Some(curve),
                    Some(curve) => {
                        return Err(Error::InvalidZoomExpression {
                            key: curve.key().to_string(),
                            message: "Only one zoom-based curve may be used in a style function."
                                .to_string(),
                        })
                    }
                }
            }
            Ok(found)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod test_function {
    use super::*;
    use crate::value::Color;
    use pretty_assertions::assert_eq;

    fn spec(raw: JsonValue) -> PropertySpec {
        PropertySpec::from_json(&raw).unwrap()
    }

    fn props(raw: JsonValue) -> Properties {
        match Value::from(&raw) {
            Value::Object(map) => map,
            _ => Properties::new(),
        }
    }

    #[test]
    fn test_expected_type() {
        assert_eq!(spec(json!({"type": "color"})).expected_type(), Type::Color);
        assert_eq!(
            spec(json!({"type": "enum", "values": {"a": {}, "b": {}}})).expected_type(),
            Type::String
        );
        assert_eq!(
            spec(json!({"type": "array", "value": "string"})).expected_type(),
            array(Type::String, None)
        );
        assert_eq!(
            spec(json!({"type": "array"})).expected_type(),
            array(Type::Value, None)
        );
    }

    #[test]
    fn test_is_function_definition() {
        assert!(is_function_definition(&json!({"expression": ["zoom"]})));
        assert!(is_function_definition(&json!({"stops": [[0, 1]]})));
        assert!(is_function_definition(&json!({"type": "identity", "property": "a"})));
        assert!(!is_function_definition(&json!({"type": "exponential"})));
        assert!(!is_function_definition(&json!(3)));
        assert!(!is_function_definition(&json!([1, 2])));
    }

    #[test]
    fn test_constant_values() {
        let color = spec(json!({"type": "color", "default": "#000"}));
        let f = create_function(&json!("red"), &color).unwrap();
        assert!(f.is_zoom_constant());
        assert!(f.is_feature_constant());
        assert!(f.zoom_curve().is_none());
        assert_eq!(
            f.evaluate(None, None),
            Some(Value::Color(Color::new(1.0, 0.0, 0.0, 1.0)))
        );

        let f = create_function(&json!(null), &color).unwrap();
        assert_eq!(
            f.evaluate(None, None),
            Some(Value::Color(Color::new(0.0, 0.0, 0.0, 1.0)))
        );

        let offset = spec(json!({"type": "array", "value": "number", "length": 2}));
        let f = create_function(&json!([1, 2]), &offset).unwrap();
        assert_eq!(
            f.evaluate(None, None),
            Some(Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]))
        );
    }

    #[test]
    fn test_expression_falls_back_to_default() {
        let number = spec(json!({"type": "number", "default": 4}));
        let f = create_function(&json!({"expression": ["number", ["get", "w"]]}), &number).unwrap();
        assert!(!f.is_feature_constant());
        assert_eq!(f.evaluate(None, Some(&props(json!({"w": 2})))), Some(Value::Number(2.0)));
        assert_eq!(f.evaluate(None, None), Some(Value::Number(4.0)));
    }

    #[test]
    fn test_failures_yield_none() {
        let number = spec(json!({"type": "number"}));
        let f = create_function(&json!({"expression": ["number", ["get", "w"]]}), &number).unwrap();
        assert_eq!(f.evaluate(None, Some(&props(json!({"w": 2})))), Some(Value::Number(2.0)));
        assert!(f.warnings.lock().unwrap().is_empty());

        // Without a default every failure ends in the same error.
        assert_eq!(f.evaluate(None, None), None);
        assert_eq!(f.evaluate(None, Some(&props(json!({"w": "x"})))), None);
        let seen = f.warnings.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen.contains("No default property value available"));
    }

    #[test]
    fn test_compile_errors() {
        let number = spec(json!({"type": "number"}));
        let err = create_function(&json!({"expression": ["concat", "a", "b"]}), &number).unwrap_err();
        assert_eq!(err.to_string(), "[1]: Expected number but found string instead.");
    }

    #[test]
    fn test_two_zoom_curves_rejected() {
        let number = spec(json!({"type": "number", "default": 0}));
        let err = create_function(
            &json!({"expression": [
                "coalesce",
                ["curve", ["linear"], ["zoom"], 0, 1, 10, 2],
                ["curve", ["linear"], ["zoom"], 0, 3, 10, 4]
            ]}),
            &number,
        )
        .unwrap_err();
        match err {
            Error::InvalidZoomExpression { key, message } => {
                assert_eq!(key, "[1][2]");
                assert_eq!(message, "Only one zoom-based curve may be used in a style function.");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_zoom_must_be_curve_input() {
        let number = spec(json!({"type": "number", "default": 0}));
        let err = create_function(&json!({"expression": ["*", 2, ["zoom"]]}), &number).unwrap_err();
        match err {
            Error::InvalidZoomExpression { message, .. } => assert_eq!(message, "Invalid zoom expression"),
            other => panic!("unexpected error {:?}", other),
        }

        let f = create_function(
            &json!({"expression": ["let", "w", 2, ["curve", ["linear"], ["zoom"], 0, ["var", "w"], 10, 4]]}),
            &number,
        )
        .unwrap();
        let curve = f.zoom_curve().unwrap();
        assert_eq!(curve.stop_inputs(), vec![0.0, 10.0]);
        assert_eq!(f.evaluate(Some(5.0), None), Some(Value::Number(3.0)));
    }
}
