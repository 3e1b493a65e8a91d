use serde_json::json;

use crate::context::ParsingContext;
use crate::expression::{json_kind, parse_expression, unify_output, Expression, MAX_SAFE_INTEGER};
use crate::op::bool_value;
use crate::runtime::Compiled;
use crate::types::Type;
use crate::value::{number_to_json, Value};

/// The first output whose condition holds, else the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    key: String,
    ty: Type,
    branches: Vec<(Expression, Expression)>,
    otherwise: Box<Expression>,
}

impl Case {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut rv = Vec::with_capacity(self.branches.len() * 2 + 1);
        for (test, output) in &self.branches {
            rv.push(test);
            rv.push(output);
        }
        rv.push(&self.otherwise);
        rv
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        if args.len() < 4 {
            return context.error(format!(
                "Expected at least 3 arguments, but found only {}.",
                args.len() - 1
            ));
        }
        if args.len() % 2 != 0 {
            return context.error("Expected an odd number of arguments.");
        }

        let last = args.len() - 1;
        let mut output_type = context.output_type_hint();
        let mut branches = Vec::new();
        let mut ok = true;
        for i in (1..last).step_by(2) {
            let test = parse_expression(&args[i], &context.concat(i, Some(Type::Boolean)));
            let output = parse_expression(&args[i + 1], &context.concat(i + 1, output_type.clone()));
            match (test, output) {
                (Some(test), Some(output)) => {
                    unify_output(&mut output_type, &output);
                    branches.push((test, output));
                }
                _ => ok = false,
            }
        }
        let otherwise = parse_expression(&args[last], &context.concat(last, output_type.clone()));
        if !ok {
            return None;
        }
        let otherwise = otherwise?;
        unify_output(&mut output_type, &otherwise);

        Some(Self {
            key: context.key().to_string(),
            ty: output_type.unwrap_or(Type::Error),
            branches,
            otherwise: Box::new(otherwise),
        })
    }

    pub(crate) fn compile(&self) -> Compiled {
        let branches: Vec<(Compiled, Compiled)> = self
            .branches
            .iter()
            .map(|(test, output)| (test.compile(), output.compile()))
            .collect();
        let otherwise = self.otherwise.compile();
        Box::new(move |ctx| {
            for (test, output) in &branches {
                if bool_value(test(ctx)?)? {
                    return output(ctx);
                }
            }
            otherwise(ctx)
        })
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        let mut rv = vec![json!("case")];
        for (test, output) in &self.branches {
            rv.push(test.serialize());
            rv.push(output.serialize());
        }
        rv.push(self.otherwise.serialize());
        serde_json::Value::Array(rv)
    }
}

/// A `match` branch label.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchLabel {
    Number(f64),
    String(String),
}

impl MatchLabel {
    fn get_type(&self) -> Type {
        match self {
            Self::Number(_) => Type::Number,
            Self::String(_) => Type::String,
        }
    }

    fn matches(&self, input: &Value) -> bool {
        match (self, input) {
            (Self::Number(label), Value::Number(n)) => label == n,
            (Self::String(label), Value::String(s)) => label == s,
            _ => false,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) => number_to_json(*n),
            Self::String(s) => json!(s),
        }
    }
}

/// The output whose label equals the input, else the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    key: String,
    ty: Type,
    input: Box<Expression>,
    branches: Vec<(Vec<MatchLabel>, Expression)>,
    otherwise: Box<Expression>,
}

impl Match {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn input(&self) -> &Expression {
        &self.input
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut rv = vec![self.input.as_ref()];
        rv.extend(self.branches.iter().map(|(_, output)| output));
        rv.push(&self.otherwise);
        rv
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        if args.len() < 5 {
            return context.error(format!(
                "Expected at least 4 arguments, but found only {}.",
                args.len() - 1
            ));
        }
        if args.len() % 2 != 1 {
            return context.error("Expected an even number of arguments.");
        }

        let last = args.len() - 1;
        let mut input_type: Option<Type> = None;
        let mut output_type = context.output_type_hint();
        let mut seen: Vec<MatchLabel> = Vec::new();
        let mut branches = Vec::new();
        let mut ok = true;

        for i in (2..last).step_by(2) {
            let labels = parse_labels(&args[i], i, &mut input_type, &mut seen, context);
            let output = parse_expression(&args[i + 1], &context.concat(i + 1, output_type.clone()));
            match (labels, output) {
                (Some(labels), Some(output)) => {
                    unify_output(&mut output_type, &output);
                    branches.push((labels, output));
                }
                _ => ok = false,
            }
        }

        let input = parse_expression(&args[1], &context.concat(1, input_type));
        let otherwise = parse_expression(&args[last], &context.concat(last, output_type.clone()));
        if !ok {
            return None;
        }
        let (input, otherwise) = (input?, otherwise?);
        unify_output(&mut output_type, &otherwise);

        Some(Self {
            key: context.key().to_string(),
            ty: output_type.unwrap_or(Type::Error),
            input: Box::new(input),
            branches,
            otherwise: Box::new(otherwise),
        })
    }

    pub(crate) fn compile(&self) -> Compiled {
        let input = self.input.compile();
        let branches: Vec<(Vec<MatchLabel>, Compiled)> = self
            .branches
            .iter()
            .map(|(labels, output)| (labels.clone(), output.compile()))
            .collect();
        let otherwise = self.otherwise.compile();
        Box::new(move |ctx| {
            let value = input(ctx)?;
            for (labels, output) in &branches {
                if labels.iter().any(|label| label.matches(&value)) {
                    return output(ctx);
                }
            }
            otherwise(ctx)
        })
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        let mut rv = vec![json!("match"), self.input.serialize()];
        for (labels, output) in &self.branches {
            rv.push(match labels.as_slice() {
                [single] => single.to_json(),
                many => serde_json::Value::Array(many.iter().map(MatchLabel::to_json).collect()),
            });
            rv.push(output.serialize());
        }
        rv.push(self.otherwise.serialize());
        serde_json::Value::Array(rv)
    }
}

/// Parse the label (or label list) at argument `index`. All labels of one
/// `match` share a kind, and no label may repeat.
fn parse_labels(
    raw: &serde_json::Value,
    index: usize,
    input_type: &mut Option<Type>,
    seen: &mut Vec<MatchLabel>,
    context: &ParsingContext<'_>,
) -> Option<Vec<MatchLabel>> {
    let raw_labels = match raw {
        serde_json::Value::Array(items) if items.is_empty() => {
            return context.error_at(index, "Expected at least one branch label.")
        }
        serde_json::Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };

    let mut labels = Vec::with_capacity(raw_labels.len());
    for raw_label in raw_labels {
        let label = match raw_label {
            serde_json::Value::String(s) => MatchLabel::String(s.clone()),
            serde_json::Value::Number(n) => {
                let n = n.as_f64().unwrap_or(f64::NAN);
                if !(n.abs() <= MAX_SAFE_INTEGER) {
                    return context.error_at(
                        index,
                        "Branch labels must be integers no larger than 9007199254740991.",
                    );
                }
                if n.fract() != 0.0 {
                    return context.error_at(index, "Numeric branch labels must be integer values.");
                }
                MatchLabel::Number(n)
            }
            other => {
                return context.error_at(
                    index,
                    format!(
                        "Branch labels must be numbers or strings, but found {} instead.",
                        json_kind(other)
                    ),
                )
            }
        };

        let label_type = label.get_type();
        match input_type {
            Some(t) if *t != label_type => {
                return context.error_at(
                    index,
                    format!("Expected {} but found {} instead.", t, label_type),
                )
            }
            Some(_) => (),
            None => *input_type = Some(label_type),
        }
        if seen.contains(&label) {
            return context.error_at(index, "Branch labels must be unique.");
        }
        seen.push(label.clone());
        labels.push(label);
    }
    Some(labels)
}
