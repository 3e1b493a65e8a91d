//! Lowering of constants and legacy stop functions into expressions.

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::Error;
use crate::function::{PropertySpec, PropertyType};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum FunctionType {
    Identity,
    Exponential,
    Interval,
    Categorical,
}

/// A legacy function definition.
#[derive(Debug, Clone, Deserialize)]
struct FunctionParameters {
    #[serde(rename = "type", default)]
    kind: Option<FunctionType>,
    #[serde(default)]
    property: Option<String>,
    #[serde(default)]
    stops: Option<Vec<(JsonValue, JsonValue)>>,
    #[serde(default)]
    base: Option<f64>,
    #[serde(default)]
    default: Option<JsonValue>,
}

fn invalid<T, S: Into<String>>(reason: S) -> Result<T, Error> {
    Err(Error::InvalidFunction {
        reason: reason.into(),
    })
}

/// The expression for a constant property value. Null stays null.
///
/// ```rust
/// use serde_json::json;
/// use style_expr::{convert_value, PropertySpec, PropertyType};
///
/// let color = PropertySpec::new(PropertyType::Color);
/// assert_eq!(convert_value(&json!("red"), &color), json!(["to-color", "red"]));
/// let number = PropertySpec::new(PropertyType::Number);
/// assert_eq!(convert_value(&json!(2), &number), json!(2));
/// ```
pub fn convert_value(value: &JsonValue, spec: &PropertySpec) -> JsonValue {
    match value {
        JsonValue::Null => JsonValue::Null,
        _ if spec.kind == PropertyType::Color => json!(["to-color", value]),
        JsonValue::Array(_) | JsonValue::Object(_) => json!(["literal", value]),
        _ => value.clone(),
    }
}

/// The property's declared default, or an expression that fails if there
/// is none.
pub(crate) fn default_value(spec: &PropertySpec) -> JsonValue {
    match &spec.default {
        Some(default) => convert_value(default, spec),
        None => json!(["error", "No default property value available"]),
    }
}

/// Lower a legacy function definition into an expression.
///
/// ```rust
/// use serde_json::json;
/// use style_expr::{convert_function, PropertySpec, PropertyType};
///
/// let spec = PropertySpec::new(PropertyType::String);
/// assert_eq!(
///     convert_function(&json!({"type": "identity", "property": "name"}), &spec).unwrap(),
///     json!([
///         "coalesce",
///         ["string", ["get", "name"]],
///         ["error", "No default property value available"]
///     ])
/// );
/// ```
pub fn convert_function(parameters: &JsonValue, spec: &PropertySpec) -> Result<JsonValue, Error> {
    let parameters: FunctionParameters =
        serde_json::from_value(parameters.clone()).map_err(|e| Error::InvalidFunction {
            reason: e.to_string(),
        })?;

    let kind = parameters.kind.unwrap_or(if spec.is_interpolatable() {
        FunctionType::Exponential
    } else {
        FunctionType::Interval
    });

    let expr = if kind == FunctionType::Identity {
        match &parameters.property {
            Some(property) => identity(property, spec),
            None => return invalid("identity functions require a property"),
        }
    } else {
        let stops = match parameters.stops.as_deref() {
            Some(stops) if !stops.is_empty() => stops,
            _ => return invalid("function has no stops"),
        };
        let base = parameters.base;
        match (&parameters.property, stops[0].0.is_object()) {
            (Some(property), true) => composite(property, kind, base, stops, spec)?,
            (None, true) => return invalid("zoom-and-property functions require a property"),
            (Some(property), false) => {
                property_function(property, kind, base, stops, spec, parameters.default.as_ref())?
            }
            (None, false) => {
                let stops = convert_stops(stops, spec);
                curve(curve_interpolation(kind, base, spec), json!(["zoom"]), stops)
            }
        }
    };

    let mut rv = vec![json!("coalesce"), expr];
    if let Some(default) = &parameters.default {
        rv.push(convert_value(default, spec));
    }
    rv.push(default_value(spec));
    Ok(JsonValue::Array(rv))
}

fn identity(property: &str, spec: &PropertySpec) -> JsonValue {
    let get = json!(["get", property]);
    match spec.kind {
        PropertyType::Color => json!(["to-color", ["string", get]]),
        PropertyType::String | PropertyType::Enum => json!(["string", get]),
        PropertyType::Number => json!(["number", get]),
        PropertyType::Boolean => json!(["boolean", get]),
        PropertyType::Array => match spec.value.as_deref() {
            Some(item @ "string") | Some(item @ "number") | Some(item @ "boolean") => {
                match spec.length {
                    Some(len) => json!(["array", item, len, get]),
                    None => json!(["array", item, get]),
                }
            }
            _ => json!(["array", get]),
        },
    }
}

fn curve_interpolation(kind: FunctionType, base: Option<f64>, spec: &PropertySpec) -> JsonValue {
    match (kind, base) {
        (FunctionType::Exponential, _) if !spec.is_interpolatable() => json!(["step"]),
        (FunctionType::Exponential, None) => json!(["linear"]),
        (FunctionType::Exponential, Some(base)) if base == 1.0 => json!(["linear"]),
        (FunctionType::Exponential, Some(base)) => json!(["exponential", base]),
        _ => json!(["step"]),
    }
}

fn curve(interpolation: JsonValue, input: JsonValue, stops: Vec<(JsonValue, JsonValue)>) -> JsonValue {
    let mut rv = vec![json!("curve"), interpolation, input];
    for (input, output) in stops {
        rv.push(input);
        rv.push(output);
    }
    JsonValue::Array(rv)
}

fn convert_stops(stops: &[(JsonValue, JsonValue)], spec: &PropertySpec) -> Vec<(JsonValue, JsonValue)> {
    stops
        .iter()
        .map(|(input, output)| (input.clone(), convert_value(output, spec)))
        .collect()
}

fn property_function(
    property: &str,
    kind: FunctionType,
    base: Option<f64>,
    stops: &[(JsonValue, JsonValue)],
    spec: &PropertySpec,
    default: Option<&JsonValue>,
) -> Result<JsonValue, Error> {
    let stops = convert_stops(stops, spec);
    if kind != FunctionType::Categorical {
        return Ok(curve(
            curve_interpolation(kind, base, spec),
            json!(["number", ["get", property]]),
            stops,
        ));
    }

    let fallback = match default {
        Some(default) => convert_value(default, spec),
        None => default_value(spec),
    };
    let key_kind = match stops[0].0 {
        JsonValue::String(_) => "string",
        JsonValue::Number(_) => "number",
        JsonValue::Bool(_) => "boolean",
        _ => return invalid("categorical stop inputs must be strings, numbers or booleans"),
    };
    if stops
        .iter()
        .any(|(input, _)| crate::expression::json_kind(input) != key_kind)
    {
        return invalid("categorical stop inputs must all be of one kind");
    }

    let input = json!([key_kind, ["get", property]]);
    let mut rv;
    if key_kind == "boolean" {
        rv = vec![json!("case")];
        for (label, output) in stops {
            rv.push(json!(["==", input, label]));
            rv.push(output);
        }
    } else {
        rv = vec![json!("match"), input];
        for (label, output) in stops {
            rv.push(label);
            rv.push(output);
        }
    }
    rv.push(fallback);
    Ok(JsonValue::Array(rv))
}

/// A zoom curve whose outputs are property functions, one per zoom level.
fn composite(
    property: &str,
    kind: FunctionType,
    base: Option<f64>,
    stops: &[(JsonValue, JsonValue)],
    spec: &PropertySpec,
) -> Result<JsonValue, Error> {
    let mut levels: Vec<(f64, Vec<(JsonValue, JsonValue)>)> = Vec::new();
    for (input, output) in stops {
        let zoom = match input.get("zoom").and_then(JsonValue::as_f64) {
            Some(zoom) => zoom,
            None => return invalid("zoom-and-property stop inputs require a numeric zoom"),
        };
        let value = match input.get("value") {
            Some(value) => value.clone(),
            None => return invalid("zoom-and-property stop inputs require a value"),
        };
        match levels.last_mut() {
            Some((last, level)) if *last == zoom => level.push((value, output.clone())),
            _ => levels.push((zoom, vec![(value, output.clone())])),
        }
    }

    let outer = match kind {
        FunctionType::Categorical => json!(["step"]),
        kind => curve_interpolation(kind, base, spec),
    };
    let mut zoom_stops = Vec::with_capacity(levels.len());
    for (zoom, level) in levels {
        let inner = property_function(property, kind, base, &level, spec, None)?;
        zoom_stops.push((json!(zoom), inner));
    }
    Ok(curve(outer, json!(["zoom"]), zoom_stops))
}
