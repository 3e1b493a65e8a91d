use serde_json::json;

use crate::context::ParsingContext;
use crate::expression::{parse_expression, unify_output, Expression};
use crate::runtime::{self, Compiled};
use crate::types::Type;

/// The first argument that evaluates to a non-null value.
#[derive(Debug, Clone, PartialEq)]
pub struct Coalesce {
    key: String,
    ty: Type,
    args: Vec<Expression>,
}

impl Coalesce {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        if args.len() < 2 {
            return context.error("Expected at least one argument.");
        }

        let mut output_type = context.output_type_hint();
        let mut parsed = Vec::with_capacity(args.len() - 1);
        let mut ok = true;
        for (i, arg) in args.iter().enumerate().skip(1) {
            match parse_expression(arg, &context.concat(i, output_type.clone())) {
                Some(e) => {
                    unify_output(&mut output_type, &e);
                    parsed.push(e);
                }
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }

        Some(Self {
            key: context.key().to_string(),
            ty: output_type.unwrap_or(Type::Error),
            args: parsed,
        })
    }

    pub(crate) fn compile(&self) -> Compiled {
        let args: Vec<Compiled> = self.args.iter().map(Expression::compile).collect();
        Box::new(move |ctx| runtime::coalesce(&args, ctx))
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        let mut rv = vec![json!("coalesce")];
        rv.extend(self.args.iter().map(Expression::serialize));
        serde_json::Value::Array(rv)
    }
}
