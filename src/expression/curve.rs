use serde_json::json;

use crate::context::ParsingContext;
use crate::expression::{parse_expression, unify_output, Expression};
use crate::interpolate::{Interpolation, UnitBezier};
use crate::runtime::{evaluate_curve, Compiled, CurveOutput};
use crate::types::Type;
use crate::value::number_to_json;

/// A stepped or interpolated function of a numeric input.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    key: String,
    ty: Type,
    interpolation: Interpolation,
    input: Box<Expression>,
    stops: Vec<(f64, Expression)>,
}

impl Curve {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn interpolation(&self) -> &Interpolation {
        &self.interpolation
    }

    pub fn input(&self) -> &Expression {
        &self.input
    }

    pub fn stop_inputs(&self) -> Vec<f64> {
        self.stops.iter().map(|(input, _)| *input).collect()
    }

    pub fn stop_outputs(&self) -> impl Iterator<Item = &Expression> {
        self.stops.iter().map(|(_, output)| output)
    }

    /// The factor used to blend the outputs of the stops at `lower` and
    /// `upper` for `input`. Callers interpolating across zoom levels
    /// themselves use this to match the curve's own easing.
    pub fn interpolation_factor(&self, input: f64, lower: f64, upper: f64) -> f64 {
        self.interpolation.factor(input, lower, upper)
    }

    /// Whether the input is the `zoom` operator itself.
    pub fn is_zoom_curve(&self) -> bool {
        match self.input.as_ref() {
            Expression::Compound(c) => c.name() == "zoom",
            _ => false,
        }
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut rv = vec![self.input.as_ref()];
        rv.extend(self.stop_outputs());
        rv
    }

    fn output_kind(&self) -> CurveOutput {
        output_kind(&self.ty)
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        if args.len() < 5 {
            return context.error(format!(
                "Expected at least 4 arguments, but found only {}.",
                args.len() - 1
            ));
        }
        if (args.len() - 3) % 2 != 0 {
            return context.error("Expected an even number of arguments.");
        }

        let interpolation = parse_interpolation(&args[1], context);
        let input = parse_expression(&args[2], &context.concat(2, Some(Type::Number)));

        let mut output_type = context.output_type_hint();
        let mut stops: Vec<(f64, Expression)> = Vec::new();
        let mut ok = true;
        for i in (3..args.len()).step_by(2) {
            let label = match args[i].as_f64() {
                Some(label) => label,
                None => {
                    let _: Option<()> = context.error_at(
                        i,
                        r#"Input/output pairs for "curve" expressions must be defined using literal numeric values (not computed expressions) for the input values."#,
                    );
                    ok = false;
                    continue;
                }
            };
            if stops.last().map_or(false, |(previous, _)| label <= *previous) {
                let _: Option<()> = context.error_at(
                    i,
                    r#"Input/output pairs for "curve" expressions must be arranged with input values in strictly ascending order."#,
                );
                ok = false;
                continue;
            }
            match parse_expression(&args[i + 1], &context.concat(i + 1, output_type.clone())) {
                Some(output) => {
                    unify_output(&mut output_type, &output);
                    stops.push((label, output));
                }
                None => ok = false,
            }
        }

        let (interpolation, input) = (interpolation?, input?);
        if !ok {
            return None;
        }

        let ty = output_type.unwrap_or(Type::Error);
        if interpolation != Interpolation::Step && output_kind(&ty) == CurveOutput::Discrete {
            return context.error(format!(
                "Type {} is not interpolatable, and thus cannot be used as a {} curve's output type.",
                ty,
                interpolation.name()
            ));
        }

        Some(Self {
            key: context.key().to_string(),
            ty,
            interpolation,
            input: Box::new(input),
            stops,
        })
    }

    pub(crate) fn compile(&self) -> Compiled {
        let input = self.input.compile();
        let stop_inputs = self.stop_inputs();
        let stop_outputs: Vec<Compiled> = self.stop_outputs().map(Expression::compile).collect();
        let interpolation = self.interpolation.clone();
        let output = self.output_kind();
        Box::new(move |ctx| {
            evaluate_curve(
                ctx,
                input(ctx)?,
                &stop_inputs,
                &stop_outputs,
                &interpolation,
                output,
            )
        })
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        let mut rv = vec![
            json!("curve"),
            self.interpolation.to_json(),
            self.input.serialize(),
        ];
        for (input, output) in &self.stops {
            rv.push(number_to_json(*input));
            rv.push(output.serialize());
        }
        serde_json::Value::Array(rv)
    }
}

fn output_kind(ty: &Type) -> CurveOutput {
    match ty {
        Type::Number => CurveOutput::Number,
        Type::Color => CurveOutput::Color,
        Type::Array { item, .. } if **item == Type::Number => CurveOutput::Array,
        _ => CurveOutput::Discrete,
    }
}

/// Parse the interpolation argument. Errors are reported at index 1 of the
/// curve.
fn parse_interpolation(raw: &serde_json::Value, context: &ParsingContext<'_>) -> Option<Interpolation> {
    let items = match raw.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => return context.error_at(1, "Expected an interpolation type expression."),
    };
    match items[0].as_str() {
        Some("step") => Some(Interpolation::Step),
        Some("linear") => Some(Interpolation::Linear),
        Some("exponential") => match items.get(1).and_then(serde_json::Value::as_f64) {
            Some(base) if items.len() == 2 => Some(Interpolation::Exponential { base }),
            _ => context.error_at(1, "Exponential interpolation requires a numeric base."),
        },
        Some("cubic-bezier") => {
            let controls: Vec<f64> = items[1..]
                .iter()
                .filter_map(serde_json::Value::as_f64)
                .collect();
            match controls.as_slice() {
                [x1, y1, x2, y2]
                    if items.len() == 5
                        && (0.0..=1.0).contains(x1)
                        && (0.0..=1.0).contains(x2) =>
                {
                    Some(Interpolation::CubicBezier(UnitBezier::new(*x1, *y1, *x2, *y2)))
                }
                _ => context.error_at(
                    1,
                    "Cubic bezier interpolation requires four numeric arguments with values between 0 and 1.",
                ),
            }
        }
        _ => context.error_at(1, format!("Unknown interpolation type {}", items[0])),
    }
}

#[cfg(test)]
mod test_curve {
    use super::*;
    use crate::error::ParsingError;
    use crate::feature::{Feature, Globals};
    use crate::runtime::EvaluationContext;
    use crate::types::array;
    use crate::value::{Color, Value};
    use std::cell::RefCell;

    fn parse(raw: &serde_json::Value) -> Result<Expression, Vec<ParsingError>> {
        let errors = RefCell::new(Vec::new());
        let parsed = {
            let context = ParsingContext::new(&errors, None);
            parse_expression(raw, &context)
        };
        parsed.ok_or_else(|| errors.into_inner())
    }

    fn eval_at(raw: &serde_json::Value, zoom: f64) -> Value {
        let globals = Globals::zoom(zoom);
        let feature = Feature::default();
        let compiled = parse(raw).unwrap().compile();
        compiled(&EvaluationContext::new(&globals, &feature)).unwrap()
    }

    #[test]
    fn test_linear_number_curve() {
        let raw = json!(["curve", ["linear"], ["zoom"], 0, 0, 10, 10]);
        assert_eq!(eval_at(&raw, 5.0), Value::Number(5.0));
        assert_eq!(eval_at(&raw, -5.0), Value::Number(0.0));
        assert_eq!(eval_at(&raw, 15.0), Value::Number(10.0));
    }

    #[test]
    fn test_single_stop() {
        let raw = json!(["curve", ["linear"], ["zoom"], 0, 42]);
        assert_eq!(eval_at(&raw, -100.0), Value::Number(42.0));
        assert_eq!(eval_at(&raw, 100.0), Value::Number(42.0));
    }

    #[test]
    fn test_step_curve_of_strings() {
        let raw = json!(["curve", ["step"], ["zoom"], 0, "a", 10, "b"]);
        assert_eq!(eval_at(&raw, 9.9), Value::from("a"));
        assert_eq!(eval_at(&raw, 10.0), Value::from("b"));
    }

    #[test]
    fn test_color_and_array_outputs() {
        let raw = json!([
            "curve", ["linear"], ["zoom"],
            0, ["rgba", 0, 0, 0, 1],
            10, ["rgba", 255, 255, 255, 1]
        ]);
        assert_eq!(
            eval_at(&raw, 5.0),
            Value::Color(Color::new(0.5, 0.5, 0.5, 1.0))
        );

        let raw = json!([
            "curve", ["linear"], ["zoom"],
            0, ["literal", [0, 10]],
            10, ["literal", [10, 20]]
        ]);
        let parsed = parse(&raw).unwrap();
        assert_eq!(parsed.get_type(), &array(Type::Number, Some(2)));
        assert_eq!(
            eval_at(&raw, 5.0),
            Value::Array(vec![Value::Number(5.0), Value::Number(15.0)])
        );
    }

    #[test]
    fn test_interpolated_curve_under_value_expectation() {
        let raw = json!(["curve", ["linear"], ["zoom"], 0, 0, 10, 10]);
        let errors = RefCell::new(Vec::new());
        let context = ParsingContext::new(&errors, Some(Type::Value));
        let parsed = parse_expression(&raw, &context).unwrap();
        assert_eq!(parsed.get_type(), &Type::Number);

        assert_eq!(eval_at(&json!(["number", raw.clone()]), 5.0), Value::Number(5.0));
        assert_eq!(eval_at(&json!(["to-string", raw.clone()]), 5.0), Value::from("5"));
        assert_eq!(
            eval_at(&json!(["typeof", ["let", "a", 1, raw]]), 5.0),
            Value::from("Number")
        );
    }

    #[test]
    fn test_stop_validation() {
        let errors = parse(&json!(["curve", ["linear"], ["zoom"], 0, 1, 0, 2])).unwrap_err();
        assert_eq!(errors[0].key, "[5]");
        assert!(errors[0].message.contains("strictly ascending order"));

        let errors = parse(&json!(["curve", ["linear"], ["zoom"], ["zoom"], 1])).unwrap_err();
        assert_eq!(errors[0].key, "[3]");

        assert!(parse(&json!(["curve", ["linear"], ["zoom"], 0])).is_err());
        assert!(parse(&json!(["curve", ["linear"], ["zoom"], 0, 1, 2])).is_err());
    }

    #[test]
    fn test_interpolation_validation() {
        let errors = parse(&json!(["curve", ["linear"], ["zoom"], 0, "a", 1, "b"])).unwrap_err();
        assert_eq!(
            errors[0].message,
            "Type string is not interpolatable, and thus cannot be used as a linear curve's output type."
        );
        assert!(parse(&json!(["curve", ["exponential"], ["zoom"], 0, 1])).is_err());
        assert!(parse(&json!(["curve", ["cubic-bezier", 2, 0, 1, 1], ["zoom"], 0, 1])).is_err());
        let errors = parse(&json!(["curve", ["smooth"], ["zoom"], 0, 1])).unwrap_err();
        assert_eq!(errors[0].key, "[1]");
        assert!(parse(&json!(["curve", ["linear"], "zoom", 0, 1])).is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        for raw in vec![
            json!(["curve", ["exponential", 1.5], ["zoom"], 0, 1, 10, 2]),
            json!(["curve", ["cubic-bezier", 0.42, 0, 0.58, 1], ["number", ["get", "x"]], 0, 1]),
            json!(["curve", ["step"], ["zoom"], 0, "a", 10, "b"]),
        ] {
            assert_eq!(parse(&raw).unwrap().serialize(), raw);
        }
    }

    #[test]
    fn test_zoom_curve_detection() {
        let raw = json!(["curve", ["linear"], ["zoom"], 0, 1]);
        match parse(&raw).unwrap() {
            Expression::Curve(c) => {
                assert!(c.is_zoom_curve());
                assert_eq!(c.stop_inputs(), vec![0.0]);
                assert_eq!(c.interpolation_factor(5.0, 0.0, 10.0), 0.5);
            }
            other => panic!("expected a curve, got {:?}", other),
        }
    }
}
