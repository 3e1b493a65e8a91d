use serde_json::json;

use crate::context::ParsingContext;
use crate::expression::{json_kind, parse_expression, Expression};
use crate::runtime::{Compiled, Scope};
use crate::types::Type;

/// A reference to a `let` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    key: String,
    ty: Type,
    name: String,
}

impl Var {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        let name = match args {
            [_, serde_json::Value::String(name)] => name,
            _ => return context.error("'var' expression requires exactly one string literal argument."),
        };
        match context.binding(name) {
            Some(ty) => Some(Self {
                key: context.key().to_string(),
                ty: ty.clone(),
                name: name.clone(),
            }),
            None => context.error_at(
                1,
                format!(
                    r#"Unknown variable "{}". Make sure "{}" has been bound in an enclosing "let" expression before using it."#,
                    name, name
                ),
            ),
        }
    }

    pub(crate) fn compile(&self) -> Compiled {
        let name = self.name.clone();
        Box::new(move |ctx| ctx.lookup(&name))
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        json!(["var", self.name])
    }
}

/// Named values visible in a result expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    key: String,
    bindings: Vec<(String, Expression)>,
    result: Box<Expression>,
}

impl Let {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        self.result.get_type()
    }

    pub fn result(&self) -> &Expression {
        &self.result
    }

    pub fn bindings(&self) -> &[(String, Expression)] {
        &self.bindings
    }

    pub(crate) fn children(&self) -> Vec<&Expression> {
        let mut rv: Vec<&Expression> = self.bindings.iter().map(|(_, e)| e).collect();
        rv.push(&self.result);
        rv
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        if args.len() < 4 {
            return context.error(format!(
                "Expected at least 3 arguments, but found {} instead.",
                args.len() - 1
            ));
        }
        if args.len() % 2 != 0 {
            return context.error("Expected an odd number of arguments.");
        }

        let last = args.len() - 1;
        let mut bindings = Vec::new();
        let mut ok = true;
        for i in (1..last).step_by(2) {
            let name = match &args[i] {
                serde_json::Value::String(name) => name,
                other => {
                    let _: Option<()> = context.error_at(
                        i,
                        format!("Expected string, but found {} instead.", json_kind(other)),
                    );
                    ok = false;
                    continue;
                }
            };
            if !is_valid_name(name) {
                let _: Option<()> = context.error_at(
                    i,
                    "Variable names must contain only alphanumeric characters or '_', and must not start with a digit.",
                );
                ok = false;
                continue;
            }
            match parse_expression(&args[i + 1], &context.concat(i + 1, None)) {
                Some(value) => bindings.push((name.clone(), value)),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }

        let scope = bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.get_type().clone()))
            .collect();
        let result = parse_expression(
            &args[last],
            &context.concat_with_bindings(last, context.expected_type().cloned(), scope),
        )?;

        Some(Self {
            key: context.key().to_string(),
            bindings,
            result: Box::new(result),
        })
    }

    pub(crate) fn compile(&self) -> Compiled {
        let names: Vec<String> = self.bindings.iter().map(|(n, _)| n.clone()).collect();
        let values: Vec<Compiled> = self.bindings.iter().map(|(_, e)| e.compile()).collect();
        let result = self.result.compile();
        Box::new(move |ctx| {
            let mut bound = Vec::with_capacity(values.len());
            for (name, value) in names.iter().zip(values.iter()) {
                bound.push((name.as_str(), value(ctx)?));
            }
            let scope = Scope::new(bound, ctx.scope());
            result(&ctx.with_scope(&scope))
        })
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        let mut rv = vec![json!("let")];
        for (name, value) in &self.bindings {
            rv.push(json!(name));
            rv.push(value.serialize());
        }
        rv.push(self.result.serialize());
        serde_json::Value::Array(rv)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
