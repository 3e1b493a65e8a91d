//! Operators
//!
//! This module contains the global operator map, which defines the built-in
//! compound expressions: their signatures, result types and evaluation
//! functions. Note that the special forms (`literal`, `let`, `curve`, ...)
//! are not included here, because they have their own parsers in
//! `crate::expression`.

use phf::phf_map;
use std::fmt;

use crate::error::RuntimeError;
use crate::runtime::{type_name, Compiled, EvaluationContext};
use crate::types::{self, check_subtype, Type};
use crate::value::Value;

mod color;
mod data;
mod logic;
mod numeric;
mod string;
mod typing;

/// A type in an operator signature. Unlike `Type`, it may mention type
/// variables, which are bound while matching argument types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeSpec {
    Null,
    Number,
    String,
    Boolean,
    Color,
    Object,
    Value,
    Error,
    Typename(&'static str),
    Array(&'static TypeSpec, Option<usize>),
}

pub type Bindings = Vec<(&'static str, Type)>;

impl TypeSpec {
    /// The concrete type, if this spec mentions no type variables.
    pub fn concrete(&self) -> Option<Type> {
        Some(match self {
            Self::Null => Type::Null,
            Self::Number => Type::Number,
            Self::String => Type::String,
            Self::Boolean => Type::Boolean,
            Self::Color => Type::Color,
            Self::Object => Type::Object,
            Self::Value => Type::Value,
            Self::Error => Type::Error,
            Self::Typename(_) => return None,
            Self::Array(item, len) => types::array(item.concrete()?, *len),
        })
    }

    /// Substitute bound variables. Unbound variables resolve to `value`.
    pub fn resolve(&self, bindings: &Bindings) -> Type {
        match self {
            Self::Typename(name) => bound(bindings, name).cloned().unwrap_or(Type::Value),
            Self::Array(item, len) => types::array(item.resolve(bindings), *len),
            other => other.concrete().unwrap_or(Type::Value),
        }
    }

    /// Match `actual` against this spec, binding any unbound variables.
    pub fn match_type(&self, actual: &Type, bindings: &mut Bindings) -> bool {
        match self {
            Self::Typename(name) => match bound(bindings, name) {
                Some(expected) => check_subtype(expected, actual).is_none(),
                None => {
                    bindings.push((*name, actual.clone()));
                    true
                }
            },
            Self::Array(item, len) => match actual {
                Type::Array {
                    item: actual_item,
                    len: actual_len,
                } => {
                    len.map_or(true, |n| *actual_len == Some(n))
                        && item.match_type(actual_item, bindings)
                }
                Type::Error => true,
                _ => false,
            },
            other => other
                .concrete()
                .map_or(false, |expected| check_subtype(&expected, actual).is_none()),
        }
    }
}

fn bound<'b>(bindings: &'b Bindings, name: &str) -> Option<&'b Type> {
    bindings.iter().find(|(n, _)| *n == name).map(|(_, t)| t)
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typename(name) => f.write_str(name),
            Self::Array(item, len) => match (item, len) {
                (item, Some(len)) => write!(f, "Array<{}, {}>", item, len),
                (Self::Value, None) => f.write_str("Array"),
                (item, None) => write!(f, "Array<{}>", item),
            },
            other => match other.concrete() {
                Some(t) => write!(f, "{}", t),
                None => Ok(()),
            },
        }
    }
}

/// The parameter list of one overload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Params {
    Exactly(&'static [TypeSpec]),
    /// One or more arguments of the same type.
    Variadic(TypeSpec),
}
impl Params {
    pub fn is_valid_len(&self, len: usize) -> bool {
        match self {
            Self::Exactly(params) => params.len() == len,
            Self::Variadic(_) => len >= 1,
        }
    }

    pub fn param(&self, index: usize) -> Option<&TypeSpec> {
        match self {
            Self::Exactly(params) => params.get(index),
            Self::Variadic(param) => Some(param),
        }
    }
}
impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(params) => write!(
                f,
                "({})",
                params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            Self::Variadic(param) => write!(f, "({}, ...)", param),
        }
    }
}

/// What an operator's result depends on, beyond its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    None,
    Feature,
    Zoom,
}

pub type OperatorFn = fn(&EvaluationContext<'_>, &[Value]) -> Result<Value, RuntimeError>;
pub type LazyOperatorFn = fn(&EvaluationContext<'_>, &[Compiled]) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
pub enum Evaluate {
    /// Receives its arguments already evaluated, left to right.
    Eager(OperatorFn),
    /// Receives its arguments as thunks and decides what to force.
    Lazy(LazyOperatorFn),
}

pub struct Definition {
    pub symbol: &'static str,
    pub result: TypeSpec,
    pub overloads: &'static [Params],
    pub dependency: Dependency,
    pub evaluate: Evaluate,
}
impl Definition {
    /// The type each argument is parsed against. Only operators with a
    /// single overload push expectations down to their arguments.
    pub fn expected_arg_type(&self, index: usize) -> Option<Type> {
        match self.overloads {
            [only] => only.param(index).and_then(TypeSpec::concrete),
            _ => None,
        }
    }

    /// Resolve the result type for the given argument types, trying each
    /// overload in order.
    pub fn resolve(&self, args: &[Type]) -> Option<Type> {
        self.overloads
            .iter()
            .filter(|overload| overload.is_valid_len(args.len()))
            .find_map(|overload| {
                let mut bindings = Bindings::new();
                let all_match = args.iter().enumerate().all(|(i, arg)| {
                    overload
                        .param(i)
                        .map_or(false, |param| param.match_type(arg, &mut bindings))
                });
                if all_match {
                    Some(self.result.resolve(&bindings))
                } else {
                    None
                }
            })
    }

    pub fn signatures(&self) -> String {
        self.overloads
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<String>>()
            .join(" | ")
    }
}
impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("symbol", &self.symbol)
            .field("result", &self.result)
            .field("overloads", &self.overloads)
            .field("evaluate", &"<operator fn>")
            .finish()
    }
}

const NUMBER: TypeSpec = TypeSpec::Number;
const STRING: TypeSpec = TypeSpec::String;
const BOOLEAN: TypeSpec = TypeSpec::Boolean;
const VALUE: TypeSpec = TypeSpec::Value;
const ITEM: TypeSpec = TypeSpec::Typename("T");

const NONE: &[Params] = &[Params::Exactly(&[])];
const UNARY_NUMBER: &[Params] = &[Params::Exactly(&[NUMBER])];
const BINARY_NUMBER: &[Params] = &[Params::Exactly(&[NUMBER, NUMBER])];
const NUMBERS: &[Params] = &[Params::Variadic(NUMBER)];
const UNARY_STRING: &[Params] = &[Params::Exactly(&[STRING])];
const UNARY_VALUE: &[Params] = &[Params::Exactly(&[VALUE])];
const VALUES: &[Params] = &[Params::Variadic(VALUE)];
const BOOLEANS: &[Params] = &[Params::Variadic(BOOLEAN)];
const LOOKUP: &[Params] = &[
    Params::Exactly(&[STRING]),
    Params::Exactly(&[STRING, TypeSpec::Object]),
];
const EQUALITY: &[Params] = &[
    Params::Exactly(&[NUMBER, NUMBER]),
    Params::Exactly(&[STRING, STRING]),
    Params::Exactly(&[BOOLEAN, BOOLEAN]),
    Params::Exactly(&[TypeSpec::Null, TypeSpec::Null]),
];
const ORDERING: &[Params] = &[
    Params::Exactly(&[NUMBER, NUMBER]),
    Params::Exactly(&[STRING, STRING]),
];

macro_rules! math {
    ($symbol:expr, $overloads:expr, $func:path) => {
        Definition {
            symbol: $symbol,
            result: NUMBER,
            overloads: $overloads,
            dependency: Dependency::None,
            evaluate: Evaluate::Eager($func),
        }
    };
}

pub static OPERATOR_MAP: phf::Map<&'static str, Definition> = phf_map! {
    "e" => math!("e", NONE, numeric::e),
    "pi" => math!("pi", NONE, numeric::pi),
    "ln2" => math!("ln2", NONE, numeric::ln2),
    "typeof" => Definition {
        symbol: "typeof",
        result: STRING,
        overloads: UNARY_VALUE,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::type_of_value),
    },
    "string" => Definition {
        symbol: "string",
        result: STRING,
        overloads: VALUES,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::assert_string),
    },
    "number" => Definition {
        symbol: "number",
        result: NUMBER,
        overloads: VALUES,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::assert_number),
    },
    "boolean" => Definition {
        symbol: "boolean",
        result: BOOLEAN,
        overloads: VALUES,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::assert_boolean),
    },
    "object" => Definition {
        symbol: "object",
        result: TypeSpec::Object,
        overloads: VALUES,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::assert_object),
    },
    "to-string" => Definition {
        symbol: "to-string",
        result: STRING,
        overloads: UNARY_VALUE,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::to_string),
    },
    "to-number" => Definition {
        symbol: "to-number",
        result: NUMBER,
        overloads: VALUES,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::to_number),
    },
    "to-boolean" => Definition {
        symbol: "to-boolean",
        result: BOOLEAN,
        overloads: UNARY_VALUE,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(typing::to_boolean),
    },
    "to-rgba" => Definition {
        symbol: "to-rgba",
        result: TypeSpec::Array(&NUMBER, Some(4)),
        overloads: &[Params::Exactly(&[TypeSpec::Color])],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(color::to_rgba),
    },
    "to-color" => Definition {
        symbol: "to-color",
        result: TypeSpec::Color,
        overloads: VALUES,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(color::to_color),
    },
    "rgb" => Definition {
        symbol: "rgb",
        result: TypeSpec::Color,
        overloads: &[Params::Exactly(&[NUMBER, NUMBER, NUMBER])],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(color::rgb),
    },
    "rgba" => Definition {
        symbol: "rgba",
        result: TypeSpec::Color,
        overloads: &[Params::Exactly(&[NUMBER, NUMBER, NUMBER, NUMBER])],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(color::rgba),
    },
    "get" => Definition {
        symbol: "get",
        result: VALUE,
        overloads: LOOKUP,
        dependency: Dependency::Feature,
        evaluate: Evaluate::Eager(data::get),
    },
    "has" => Definition {
        symbol: "has",
        result: BOOLEAN,
        overloads: LOOKUP,
        dependency: Dependency::Feature,
        evaluate: Evaluate::Eager(data::has),
    },
    "at" => Definition {
        symbol: "at",
        result: ITEM,
        overloads: &[Params::Exactly(&[NUMBER, TypeSpec::Array(&ITEM, None)])],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(data::at),
    },
    "length" => Definition {
        symbol: "length",
        result: NUMBER,
        overloads: &[
            Params::Exactly(&[STRING]),
            Params::Exactly(&[TypeSpec::Array(&VALUE, None)]),
        ],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(data::length),
    },
    "contains" => Definition {
        symbol: "contains",
        result: BOOLEAN,
        overloads: &[Params::Exactly(&[TypeSpec::Array(&VALUE, None), VALUE])],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(data::contains),
    },
    "properties" => Definition {
        symbol: "properties",
        result: TypeSpec::Object,
        overloads: NONE,
        dependency: Dependency::Feature,
        evaluate: Evaluate::Eager(data::properties),
    },
    "geometry-type" => Definition {
        symbol: "geometry-type",
        result: STRING,
        overloads: NONE,
        dependency: Dependency::Feature,
        evaluate: Evaluate::Eager(data::geometry_type),
    },
    "id" => Definition {
        symbol: "id",
        result: VALUE,
        overloads: NONE,
        dependency: Dependency::Feature,
        evaluate: Evaluate::Eager(data::id),
    },
    "zoom" => Definition {
        symbol: "zoom",
        result: NUMBER,
        overloads: NONE,
        dependency: Dependency::Zoom,
        evaluate: Evaluate::Eager(data::zoom),
    },
    "+" => math!("+", NUMBERS, numeric::plus),
    "*" => math!("*", NUMBERS, numeric::times),
    "-" => math!(
        "-",
        &[Params::Exactly(&[NUMBER, NUMBER]), Params::Exactly(&[NUMBER])],
        numeric::minus
    ),
    "/" => math!("/", BINARY_NUMBER, numeric::divide),
    "%" => math!("%", BINARY_NUMBER, numeric::rem),
    "^" => math!("^", BINARY_NUMBER, numeric::pow),
    "log10" => math!("log10", UNARY_NUMBER, numeric::log10),
    "ln" => math!("ln", UNARY_NUMBER, numeric::ln),
    "log2" => math!("log2", UNARY_NUMBER, numeric::log2),
    "sin" => math!("sin", UNARY_NUMBER, numeric::sin),
    "cos" => math!("cos", UNARY_NUMBER, numeric::cos),
    "tan" => math!("tan", UNARY_NUMBER, numeric::tan),
    "asin" => math!("asin", UNARY_NUMBER, numeric::asin),
    "acos" => math!("acos", UNARY_NUMBER, numeric::acos),
    "atan" => math!("atan", UNARY_NUMBER, numeric::atan),
    "ceil" => math!("ceil", UNARY_NUMBER, numeric::ceil),
    "floor" => math!("floor", UNARY_NUMBER, numeric::floor),
    "round" => math!("round", UNARY_NUMBER, numeric::round),
    "abs" => math!("abs", UNARY_NUMBER, numeric::abs),
    "min" => math!("min", NUMBERS, numeric::min),
    "max" => math!("max", NUMBERS, numeric::max),
    "==" => Definition {
        symbol: "==",
        result: BOOLEAN,
        overloads: EQUALITY,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::eq),
    },
    "!=" => Definition {
        symbol: "!=",
        result: BOOLEAN,
        overloads: EQUALITY,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::ne),
    },
    "<" => Definition {
        symbol: "<",
        result: BOOLEAN,
        overloads: ORDERING,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::lt),
    },
    ">" => Definition {
        symbol: ">",
        result: BOOLEAN,
        overloads: ORDERING,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::gt),
    },
    "<=" => Definition {
        symbol: "<=",
        result: BOOLEAN,
        overloads: ORDERING,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::lte),
    },
    ">=" => Definition {
        symbol: ">=",
        result: BOOLEAN,
        overloads: ORDERING,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::gte),
    },
    "!" => Definition {
        symbol: "!",
        result: BOOLEAN,
        overloads: &[Params::Exactly(&[BOOLEAN])],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::not),
    },
    "&&" => Definition {
        symbol: "&&",
        result: BOOLEAN,
        overloads: BOOLEANS,
        dependency: Dependency::None,
        evaluate: Evaluate::Lazy(logic::and),
    },
    "||" => Definition {
        symbol: "||",
        result: BOOLEAN,
        overloads: BOOLEANS,
        dependency: Dependency::None,
        evaluate: Evaluate::Lazy(logic::or),
    },
    "upcase" => Definition {
        symbol: "upcase",
        result: STRING,
        overloads: UNARY_STRING,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(string::upcase),
    },
    "downcase" => Definition {
        symbol: "downcase",
        result: STRING,
        overloads: UNARY_STRING,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(string::downcase),
    },
    "concat" => Definition {
        symbol: "concat",
        result: STRING,
        overloads: &[Params::Variadic(STRING)],
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(string::concat),
    },
    "error" => Definition {
        symbol: "error",
        result: TypeSpec::Error,
        overloads: UNARY_STRING,
        dependency: Dependency::None,
        evaluate: Evaluate::Eager(logic::error),
    },
};

// Argument accessors. Parsing has already type-checked every argument, so a
// mismatch here means a malformed tree was built by hand.

fn mismatch(expected: &str, found: Option<&Value>) -> RuntimeError {
    RuntimeError::new(format!(
        "Expected {} but found {} instead.",
        expected,
        found.map_or("nothing", type_name)
    ))
}

pub(crate) fn number_arg(args: &[Value], index: usize) -> Result<f64, RuntimeError> {
    match args.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        other => Err(mismatch("number", other)),
    }
}

pub(crate) fn str_arg(args: &[Value], index: usize) -> Result<&str, RuntimeError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        other => Err(mismatch("string", other)),
    }
}

pub(crate) fn bool_value(value: Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Boolean(b) => Ok(b),
        other => Err(mismatch("boolean", Some(&other))),
    }
}

#[cfg(test)]
mod test_operators {
    use super::*;
    use crate::types::array;

    #[test]
    fn test_operator_map_symbols() {
        OPERATOR_MAP
            .into_iter()
            .for_each(|(k, op)| assert_eq!(*k, op.symbol))
    }

    #[test]
    fn test_overload_resolution() {
        let eq = &OPERATOR_MAP["=="];
        assert_eq!(eq.resolve(&[Type::Number, Type::Number]), Some(Type::Boolean));
        assert_eq!(eq.resolve(&[Type::Null, Type::Null]), Some(Type::Boolean));
        assert_eq!(eq.resolve(&[Type::Number, Type::String]), None);
        assert_eq!(eq.resolve(&[Type::Value, Type::Number]), None);

        let minus = &OPERATOR_MAP["-"];
        assert_eq!(minus.resolve(&[Type::Number]), Some(Type::Number));
        assert_eq!(minus.resolve(&[]), None);
    }

    #[test]
    fn test_type_variables_bind() {
        let at = &OPERATOR_MAP["at"];
        assert_eq!(
            at.resolve(&[Type::Number, array(Type::String, Some(2))]),
            Some(Type::String)
        );
        assert_eq!(at.resolve(&[Type::Number, Type::String]), None);
        assert_eq!(at.expected_arg_type(0), Some(Type::Number));
        assert_eq!(at.expected_arg_type(1), None);
    }

    #[test]
    fn test_signatures_render() {
        assert_eq!(
            OPERATOR_MAP["at"].signatures(),
            "(number, Array<T>)"
        );
        assert_eq!(
            OPERATOR_MAP["get"].signatures(),
            "(string) | (string, object)"
        );
        assert_eq!(OPERATOR_MAP["+"].signatures(), "(number, ...)");
    }
}
