//! Feature filters
//!
//! Filters decide whether a feature is drawn at all. They are written either
//! as expressions (`{"expression": [...]}`) or in the older nested-array
//! filter grammar, which is lowered into an expression here.

use serde_json::{json, Value as JsonValue};

use crate::coerce::json_truthy;
use crate::compile::{compile_expression, CompiledExpression};
use crate::error::Error;
use crate::feature::{Feature, Globals};
use crate::types::Type;
use crate::value::Value;

/// A compiled filter predicate.
#[derive(Debug)]
pub struct Filter {
    /// `None` for the empty filter, which matches everything.
    compiled: Option<CompiledExpression>,
}

impl Filter {
    /// Whether `feature` passes the filter. Evaluation failures and
    /// non-boolean results count as "no match"; this never fails.
    pub fn matches(&self, feature: &Feature) -> bool {
        let compiled = match &self.compiled {
            Some(compiled) => compiled,
            None => return true,
        };
        match compiled.evaluate(&Globals::default(), feature) {
            Ok(Value::Boolean(passes)) => passes,
            _ => false,
        }
    }

    pub fn expression(&self) -> Option<&CompiledExpression> {
        self.compiled.as_ref()
    }
}

/// Build a filter from either grammar.
///
/// A falsy filter (`null`, `false`, `[]`, ...) matches every feature.
/// Anything that fails to compile is an error listing every problem found.
///
/// ```rust
/// use serde_json::json;
/// use style_expr::{create_filter, Feature};
///
/// let filter = create_filter(&json!(["==", "class", "park"])).unwrap();
/// assert!(filter.matches(&Feature::from_json(&json!({"class": "park"}))));
/// assert!(!filter.matches(&Feature::from_json(&json!({"class": "lake"}))));
/// assert!(!filter.matches(&Feature::default()));
/// ```
pub fn create_filter(filter: &JsonValue) -> Result<Filter, Error> {
    if !json_truthy(filter) {
        return Ok(Filter { compiled: None });
    }

    let mut expression = match filter {
        JsonValue::Array(_) => convert_filter(filter),
        other => other.get("expression").cloned().unwrap_or(JsonValue::Null),
    };
    let is_coalesce = expression
        .get(0)
        .map_or(false, |op| op == &json!("coalesce"));
    if expression.is_array() && !is_coalesce {
        expression = json!(["coalesce", expression, false]);
    }

    match compile_expression(&expression, Some(&Type::Boolean)) {
        Ok(compiled) => Ok(Filter {
            compiled: Some(compiled),
        }),
        Err(err) => {
            tracing::debug!(error = %err, "invalid filter");
            Err(err)
        }
    }
}

/// Lower a legacy filter into an equivalent expression.
///
/// ```rust
/// use serde_json::json;
/// use style_expr::convert_filter;
///
/// assert_eq!(
///     convert_filter(&json!(["has", "name"])),
///     json!(["coalesce", ["has", "name"], false])
/// );
/// assert_eq!(convert_filter(&json!(["any"])), json!(false));
/// ```
pub fn convert_filter(filter: &JsonValue) -> JsonValue {
    let items = match filter {
        JsonValue::Array(items) => items,
        _ => return JsonValue::Bool(true),
    };
    let op = items.get(0).and_then(JsonValue::as_str).unwrap_or("");
    if items.len() <= 1 {
        return JsonValue::Bool(op != "any");
    }

    let property = &items[1];
    let rest = &items[2..];
    let value = items.get(2).unwrap_or(&JsonValue::Null);
    match op {
        "==" | "!=" | "<" | ">" | "<=" | ">=" => convert_comparison(op, property, value),
        "any" => convert_logical("||", &items[1..]),
        "all" => convert_logical("&&", &items[1..]),
        "none" => negate(convert_logical("||", &items[1..])),
        "in" => convert_in(property, rest),
        "!in" => negate(convert_in(property, rest)),
        "has" => convert_has(property),
        "!has" => negate(convert_has(property)),
        _ => JsonValue::Bool(true),
    }
}

/// A reference to a property, or to the `$type` and `$id` pseudo-properties,
/// optionally asserted to be of the kind `kind`.
fn property_reference(property: &JsonValue, kind: Option<&str>) -> JsonValue {
    let reference = match property.as_str() {
        Some("$type") => return json!(["geometry-type"]),
        Some("$id") => json!(["id"]),
        _ => json!(["get", property]),
    };
    match kind {
        Some(kind) => json!([kind, reference]),
        None => reference,
    }
}

/// The assertion operator for the kind of a raw filter value.
fn kind_of(value: &JsonValue) -> Option<&'static str> {
    match value {
        JsonValue::String(_) => Some("string"),
        JsonValue::Number(_) => Some("number"),
        JsonValue::Bool(_) => Some("boolean"),
        JsonValue::Array(_) | JsonValue::Object(_) => Some("object"),
        JsonValue::Null => None,
    }
}

fn convert_comparison(op: &str, property: &JsonValue, value: &JsonValue) -> JsonValue {
    let fallback = op == "!=";
    if value.is_null() {
        return json!([
            "coalesce",
            [op, ["typeof", property_reference(property, None)], "Null"],
            fallback
        ]);
    }
    let reference = property_reference(property, kind_of(value));
    json!(["coalesce", [op, reference, value], fallback])
}

fn convert_logical(op: &str, filters: &[JsonValue]) -> JsonValue {
    let mut rv = vec![json!(op)];
    rv.extend(filters.iter().map(convert_filter));
    JsonValue::Array(rv)
}

fn convert_in(property: &JsonValue, values: &[JsonValue]) -> JsonValue {
    if values.is_empty() {
        return JsonValue::Bool(false);
    }

    // One membership list per kind, in a fixed order.
    let mut groups: Vec<(&'static str, Vec<JsonValue>)> = vec![
        ("string", Vec::new()),
        ("number", Vec::new()),
        ("boolean", Vec::new()),
    ];
    let mut null_test = false;
    for value in values {
        match value {
            JsonValue::Null => null_test = true,
            JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_) => {
                if let Some((_, members)) = groups
                    .iter_mut()
                    .find(|(kind, _)| Some(*kind) == kind_of(value))
                {
                    members.push(value.clone());
                }
            }
            _ => continue,
        }
    }
    groups.retain(|(_, members)| !members.is_empty());

    let combined = match (groups.as_slice(), null_test) {
        ([], false) => return JsonValue::Bool(false),
        ([], true) => json!(["==", ["typeof", property_reference(property, None)], "Null"]),
        ([(kind, members)], false) => json!([
            "contains",
            ["literal", members],
            property_reference(property, Some(kind))
        ]),
        (groups, null_test) => {
            let mut tests = Vec::with_capacity(groups.len() + 1);
            if null_test {
                tests.push(json!(["==", ["typeof", ["var", "input"]], "Null"]));
            }
            for (_, members) in groups {
                tests.push(json!(["contains", ["literal", members], ["var", "input"]]));
            }
            let mut any = vec![json!("||")];
            any.extend(tests);
            json!(["let", "input", property_reference(property, None), any])
        }
    };
    json!(["coalesce", combined, false])
}

fn convert_has(property: &JsonValue) -> JsonValue {
    let has = match property.as_str() {
        Some("$id") => json!(["!=", ["typeof", ["id"]], "Null"]),
        _ => json!(["has", property]),
    };
    json!(["coalesce", has, false])
}

fn negate(filter: JsonValue) -> JsonValue {
    json!(["!", filter])
}
