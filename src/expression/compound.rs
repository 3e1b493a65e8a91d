use serde_json::json;

use crate::context::ParsingContext;
use crate::expression::{parse_expression, Expression};
use crate::op::{Definition, Evaluate, Params};
use crate::runtime::Compiled;
use crate::types::Type;
use crate::value::Value;

/// An application of one of the built-in operators in `OPERATOR_MAP`.
#[derive(Debug, Clone)]
pub struct CompoundExpression {
    key: String,
    ty: Type,
    definition: &'static Definition,
    args: Vec<Expression>,
}

impl PartialEq for CompoundExpression {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.ty == other.ty
            && self.name() == other.name()
            && self.args == other.args
    }
}

impl CompoundExpression {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn name(&self) -> &'static str {
        self.definition.symbol
    }

    pub fn definition(&self) -> &'static Definition {
        self.definition
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub(crate) fn parse(
        definition: &'static Definition,
        args: &[serde_json::Value],
        context: &ParsingContext<'_>,
    ) -> Option<Self> {
        let arity = args.len() - 1;
        if let [Params::Exactly(params)] = definition.overloads {
            if params.len() != arity {
                return context.error(format!(
                    "Expected {} argument{}, but found {} instead.",
                    params.len(),
                    if params.len() == 1 { "" } else { "s" },
                    arity
                ));
            }
        }

        let parsed: Vec<Option<Expression>> = args[1..]
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                parse_expression(arg, &context.concat(i + 1, definition.expected_arg_type(i)))
            })
            .collect();
        let parsed: Vec<Expression> = parsed.into_iter().collect::<Option<_>>()?;

        let types: Vec<Type> = parsed.iter().map(|e| e.get_type().clone()).collect();
        match definition.resolve(&types) {
            Some(ty) => Some(Self {
                key: context.key().to_string(),
                ty,
                definition,
                args: parsed,
            }),
            None => context.error(format!(
                "Expected arguments of type {}, but found ({}) instead.",
                definition.signatures(),
                types
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            )),
        }
    }

    pub(crate) fn compile(&self) -> Compiled {
        let args: Vec<Compiled> = self.args.iter().map(Expression::compile).collect();
        match self.definition.evaluate {
            Evaluate::Eager(func) => Box::new(move |ctx| {
                let values = args
                    .iter()
                    .map(|arg| arg(ctx))
                    .collect::<Result<Vec<Value>, _>>()?;
                func(ctx, &values)
            }),
            Evaluate::Lazy(func) => Box::new(move |ctx| func(ctx, &args)),
        }
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        let mut rv = vec![json!(self.name())];
        rv.extend(self.args.iter().map(Expression::serialize));
        serde_json::Value::Array(rv)
    }
}
