//! A statically typed expression language for styling map features.
//!
//! Expressions are JSON arrays whose first element names an operator:
//!
//! ```rust
//! use serde_json::json;
//! use style_expr::{compile_expression, Feature, Globals, Type, Value};
//!
//! let expr = json!(["curve", ["linear"], ["zoom"], 0, 1, 10, ["number", ["get", "width"]]]);
//! let compiled = compile_expression(&expr, Some(&Type::Number)).unwrap();
//!
//! let feature = Feature::from_json(&json!({"width": 5}));
//! assert_eq!(
//!     compiled.evaluate(&Globals::zoom(5.0), &feature),
//!     Ok(Value::Number(3.0))
//! );
//! ```
//!
//! Every expression is parsed and type checked before anything is
//! evaluated, so a malformed expression is reported once, with every error
//! found, rather than failing per feature. On top of the compiler sit
//! [`create_filter`] (feature predicates, including the legacy filter
//! grammar) and [`create_function`] (style property accessors, including
//! legacy stop functions).

pub mod coerce;
pub mod color;
pub mod compile;
pub mod context;
pub mod error;
pub mod expression;
pub mod feature;
pub mod filter;
pub mod function;
pub mod interpolate;
pub mod op;
pub mod runtime;
pub mod types;
pub mod value;

pub use compile::{compile_expression, CompiledExpression};
pub use error::{Error, ParsingError, ParsingErrors, RuntimeError};
pub use expression::{Curve, Expression};
pub use feature::{Feature, GeometryType, Globals};
pub use filter::{convert_filter, create_filter, Filter};
pub use function::{
    convert_function,
    convert_value,
    create_function,
    find_zoom_curve,
    is_function_definition,
    PropertySpec,
    PropertyType,
    StyleFunction,
};
pub use interpolate::Interpolation;
pub use types::Type;
pub use value::{Color, Properties, Value};
