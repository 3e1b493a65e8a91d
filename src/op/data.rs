//! Feature and Data Access Operations

use crate::error::RuntimeError;
use crate::op::{number_arg, str_arg};
use crate::runtime::{self, type_name, EvaluationContext};
use crate::value::Value;

type OpResult = Result<Value, RuntimeError>;

/// Read a feature property, or a key of the object given as second argument.
pub fn get(ctx: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    let key = str_arg(args, 0)?;
    match args.get(1) {
        Some(obj) => runtime::get(obj, key, None),
        None => runtime::get_property(ctx.properties(), key),
    }
}

pub fn has(ctx: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    let key = str_arg(args, 0)?;
    let found = match args.get(1) {
        Some(obj) => runtime::has(obj, key, None)?,
        None => ctx.properties().contains_key(key),
    };
    Ok(Value::Boolean(found))
}

pub fn at(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    let index = number_arg(args, 0)?;
    match args.get(1) {
        Some(Value::Array(items)) => runtime::at(index, items),
        other => Err(not_an_array(other)),
    }
}

pub fn length(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    match args.get(0) {
        Some(Value::String(s)) => Ok(Value::Number(s.chars().count() as f64)),
        Some(Value::Array(items)) => Ok(Value::Number(items.len() as f64)),
        other => Err(RuntimeError::new(format!(
            "Expected argument of type string or array, but found {} instead.",
            other.map_or("nothing", type_name)
        ))),
    }
}

pub fn contains(_: &EvaluationContext<'_>, args: &[Value]) -> OpResult {
    match (args.get(0), args.get(1)) {
        (Some(Value::Array(items)), Some(value)) => {
            runtime::contains(items, value).map(Value::Boolean)
        }
        (other, _) => Err(not_an_array(other)),
    }
}

fn not_an_array(found: Option<&Value>) -> RuntimeError {
    RuntimeError::new(format!(
        "Expected array but found {} instead.",
        found.map_or("nothing", type_name)
    ))
}

pub fn properties(ctx: &EvaluationContext<'_>, _: &[Value]) -> OpResult {
    Ok(Value::Object(ctx.properties().clone()))
}

pub fn geometry_type(ctx: &EvaluationContext<'_>, _: &[Value]) -> OpResult {
    Ok(Value::from(ctx.geometry_type().as_str()))
}

pub fn id(ctx: &EvaluationContext<'_>, _: &[Value]) -> OpResult {
    Ok(ctx.id())
}

pub fn zoom(ctx: &EvaluationContext<'_>, _: &[Value]) -> OpResult {
    ctx.zoom().map(Value::Number)
}

#[cfg(test)]
mod test_data {
    use super::*;
    use crate::feature::{Feature, GeometryType, Globals};
    use serde_json::json;

    #[test]
    fn test_feature_lookups() {
        let globals = Globals::zoom(3.0);
        let feature = Feature::from_json(&json!({"name": "x"}))
            .with_id(7.0)
            .with_geometry_type(GeometryType::Point);
        let ctx = EvaluationContext::new(&globals, &feature);

        assert_eq!(get(&ctx, &[Value::from("name")]), Ok(Value::from("x")));
        assert!(get(&ctx, &[Value::from("missing")]).is_err());
        assert_eq!(has(&ctx, &[Value::from("name")]), Ok(Value::Boolean(true)));
        assert_eq!(has(&ctx, &[Value::from("missing")]), Ok(Value::Boolean(false)));
        assert_eq!(id(&ctx, &[]), Ok(Value::Number(7.0)));
        assert_eq!(geometry_type(&ctx, &[]), Ok(Value::from("Point")));
        assert_eq!(zoom(&ctx, &[]), Ok(Value::Number(3.0)));
    }

    #[test]
    fn test_zoom_requires_globals() {
        let globals = Globals::default();
        let feature = Feature::default();
        let ctx = EvaluationContext::new(&globals, &feature);
        assert!(zoom(&ctx, &[]).is_err());
        assert_eq!(id(&ctx, &[]), Ok(Value::Null));
    }

    #[test]
    fn test_object_lookups() {
        let globals = Globals::default();
        let feature = Feature::default();
        let ctx = EvaluationContext::new(&globals, &feature);
        let obj = Value::from(json!({"a": [1, 2]}));

        let inner = get(&ctx, &[Value::from("a"), obj.clone()]).unwrap();
        assert_eq!(at(&ctx, &[Value::Number(1.0), inner.clone()]), Ok(Value::Number(2.0)));
        assert_eq!(length(&ctx, &[inner.clone()]), Ok(Value::Number(2.0)));
        assert_eq!(
            contains(&ctx, &[inner, Value::Number(2.0)]),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            has(&ctx, &[Value::from("b"), obj]),
            Ok(Value::Boolean(false))
        );
        assert_eq!(length(&ctx, &[Value::from("abc")]), Ok(Value::Number(3.0)));
    }
}
