use serde_json::json;

use crate::context::ParsingContext;
use crate::expression::{parse_expression, Expression};
use crate::runtime::{assert_type, Compiled};
use crate::types::{array, Type};

/// Asserts at evaluation time that a value is an array of the given item
/// type and, optionally, length.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAssertion {
    key: String,
    ty: Type,
    input: Box<Expression>,
}

impl ArrayAssertion {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get_type(&self) -> &Type {
        &self.ty
    }

    pub fn input(&self) -> &Expression {
        &self.input
    }

    pub(crate) fn parse(args: &[serde_json::Value], context: &ParsingContext<'_>) -> Option<Self> {
        if args.len() < 2 || args.len() > 4 {
            return context.error(format!(
                "Expected 1, 2, or 3 arguments, but found {} instead.",
                args.len() - 1
            ));
        }

        let item = if args.len() > 2 {
            match args[1].as_str() {
                Some("string") => Type::String,
                Some("number") => Type::Number,
                Some("boolean") => Type::Boolean,
                _ => {
                    return context.error_at(
                        1,
                        r#"The item type argument of "array" must be one of string, number, boolean"#,
                    )
                }
            }
        } else {
            Type::Value
        };

        let len = if args.len() > 3 {
            match args[2].as_u64() {
                Some(n) => Some(n as usize),
                None => {
                    return context.error_at(
                        2,
                        r#"The length argument to "array" must be a positive integer literal"#,
                    )
                }
            }
        } else {
            None
        };

        let last = args.len() - 1;
        let input = parse_expression(&args[last], &context.concat(last, Some(Type::Value)))?;
        Some(Self {
            key: context.key().to_string(),
            ty: array(item, len),
            input: Box::new(input),
        })
    }

    pub(crate) fn compile(&self) -> Compiled {
        let input = self.input.compile();
        let ty = self.ty.clone();
        Box::new(move |ctx| assert_type(input(ctx)?, &ty, None))
    }

    pub(crate) fn serialize(&self) -> serde_json::Value {
        let mut rv = vec![json!("array")];
        if let Some((item, len)) = self.ty.as_array() {
            if *item != Type::Value || len.is_some() {
                rv.push(json!(item.to_string()));
            }
            if let Some(len) = len {
                rv.push(json!(len));
            }
        }
        rv.push(self.input.serialize());
        serde_json::Value::Array(rv)
    }
}
