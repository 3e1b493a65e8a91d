use pretty_assertions::assert_eq;
use serde_json::json;

use style_expr::{
    create_function, Color, Error, Interpolation, Properties, PropertySpec, Value,
};

fn spec(raw: serde_json::Value) -> PropertySpec {
    PropertySpec::from_json(&raw).unwrap()
}

fn props(raw: serde_json::Value) -> Properties {
    match Value::from(raw) {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

#[test]
fn test_zoom_function() {
    let f = create_function(
        &json!({"base": 2, "stops": [[0, 0], [2, 30]]}),
        &spec(json!({"type": "number", "default": 0})),
    )
    .unwrap();
    assert!(f.is_feature_constant());
    assert!(!f.is_zoom_constant());
    assert_eq!(f.evaluate(Some(1.0), None), Some(Value::Number(10.0)));
    assert_eq!(f.evaluate(Some(-1.0), None), Some(Value::Number(0.0)));
    assert_eq!(f.evaluate(Some(3.0), None), Some(Value::Number(30.0)));

    let curve = f.zoom_curve().unwrap();
    assert_eq!(curve.stop_inputs(), vec![0.0, 2.0]);
    assert_eq!(curve.interpolation(), &Interpolation::Exponential { base: 2.0 });
    assert_eq!(curve.interpolation_factor(1.0, 0.0, 2.0), 1.0 / 3.0);
}

#[test]
fn test_interval_zoom_function() {
    let f = create_function(
        &json!({"stops": [[0, "a"], [5, "b"]]}),
        &spec(json!({"type": "string", "default": "z"})),
    )
    .unwrap();
    assert_eq!(f.evaluate(Some(4.9), None), Some(Value::from("a")));
    assert_eq!(f.evaluate(Some(5.0), None), Some(Value::from("b")));
    assert_eq!(f.zoom_curve().map(|c| c.interpolation()), Some(&Interpolation::Step));
}

#[test]
fn test_identity_function() {
    let f = create_function(
        &json!({"type": "identity", "property": "color"}),
        &spec(json!({"type": "color", "default": "black"})),
    )
    .unwrap();
    assert!(!f.is_feature_constant());
    assert!(f.is_zoom_constant());
    assert!(f.zoom_curve().is_none());
    assert_eq!(
        f.evaluate(None, Some(&props(json!({"color": "#ff0000"})))),
        Some(Value::Color(Color::new(1.0, 0.0, 0.0, 1.0)))
    );
    assert_eq!(
        f.evaluate(None, Some(&props(json!({"color": "not a color"})))),
        Some(Value::Color(Color::new(0.0, 0.0, 0.0, 1.0)))
    );
    assert_eq!(
        f.evaluate(None, None),
        Some(Value::Color(Color::new(0.0, 0.0, 0.0, 1.0)))
    );
}

#[test]
fn test_categorical_property_function() {
    let f = create_function(
        &json!({
            "type": "categorical",
            "property": "kind",
            "stops": [["road", 2], ["path", 1]],
            "default": 0.5
        }),
        &spec(json!({"type": "number", "default": 1})),
    )
    .unwrap();
    let width = |kind: &str| f.evaluate(None, Some(&props(json!({ "kind": kind }))));
    assert_eq!(width("road"), Some(Value::Number(2.0)));
    assert_eq!(width("path"), Some(Value::Number(1.0)));
    assert_eq!(width("river"), Some(Value::Number(0.5)));
    assert_eq!(f.evaluate(None, None), Some(Value::Number(0.5)));
}

#[test]
fn test_exponential_property_function() {
    let f = create_function(
        &json!({"property": "pop", "stops": [[0, 0], [100, 10]]}),
        &spec(json!({"type": "number", "default": 3})),
    )
    .unwrap();
    assert!(f.is_zoom_constant());
    assert_eq!(
        f.evaluate(None, Some(&props(json!({"pop": 50})))),
        Some(Value::Number(5.0))
    );
    assert_eq!(f.evaluate(None, None), Some(Value::Number(3.0)));
}

#[test]
fn test_composite_function() {
    let f = create_function(
        &json!({
            "property": "rank",
            "stops": [
                [{"zoom": 0, "value": 0}, 0],
                [{"zoom": 0, "value": 10}, 10],
                [{"zoom": 10, "value": 0}, 20],
                [{"zoom": 10, "value": 10}, 40]
            ]
        }),
        &spec(json!({"type": "number", "default": 1})),
    )
    .unwrap();
    assert!(!f.is_feature_constant());
    assert!(!f.is_zoom_constant());
    assert_eq!(f.zoom_curve().map(|c| c.stop_inputs()), Some(vec![0.0, 10.0]));

    let rank = props(json!({"rank": 5}));
    assert_eq!(f.evaluate(Some(0.0), Some(&rank)), Some(Value::Number(5.0)));
    assert_eq!(f.evaluate(Some(10.0), Some(&rank)), Some(Value::Number(30.0)));
    assert_eq!(f.evaluate(Some(5.0), Some(&rank)), Some(Value::Number(17.5)));
}

#[test]
fn test_array_property() {
    let offset = spec(json!({"type": "array", "value": "number", "length": 2, "default": [0, 0]}));
    let f = create_function(&json!({"stops": [[0, [0, 0]], [10, [10, 20]]]}), &offset).unwrap();
    assert_eq!(
        f.evaluate(Some(5.0), None),
        Some(Value::Array(vec![Value::Number(5.0), Value::Number(10.0)]))
    );

    let err = create_function(&json!([1, 2, 3]), &offset).unwrap_err();
    assert_eq!(
        err.parsing_errors().unwrap()[0].message,
        "Expected Array<number, 2> but found Array<number, 3> instead."
    );
}

#[test]
fn test_expression_falls_back_to_default() {
    let f = create_function(
        &json!({"expression": ["get", "maybe"]}),
        &spec(json!({"type": "string"})),
    );
    // `get` is untyped, so it cannot satisfy a string property.
    assert!(f.is_err());

    let f = create_function(
        &json!({"expression": ["coalesce", ["string", ["get", "name"]], ["string", ["get", "alt"]]]}),
        &spec(json!({"type": "string", "default": "?"})),
    )
    .unwrap();
    assert_eq!(f.evaluate(None, Some(&props(json!({"alt": "b"})))), Some(Value::from("b")));
    assert_eq!(f.evaluate(None, None), Some(Value::from("?")));
}

#[test]
fn test_zoom_curve_errors() {
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
        Error::InvalidZoomExpression { message, .. } => {
            assert!(message.contains("Only one zoom-based curve"))
        }
        other => panic!("unexpected error {:?}", other),
    }

    let err = create_function(
        &json!({"expression": ["curve", ["linear"], ["*", 2, ["zoom"]], 0, 1, 10, 2]}),
        &number,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidZoomExpression { .. }));
}

#[test]
fn test_invalid_specs() {
    assert!(matches!(
        PropertySpec::from_json(&json!({"default": 1})),
        Err(Error::InvalidPropertySpec(_))
    ));
    let err = create_function(
        &json!({"type": "identity"}),
        &spec(json!({"type": "number"})),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidFunction { .. }));
}
