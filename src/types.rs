//! The expression type system
//!
//! Every parsed expression carries exactly one resolved `Type`. Types form
//! a small lattice: `Value` is the top, `Error` the bottom, and array types
//! are covariant in their item type. A fixed-length array is a subtype of
//! the same array without a length.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Null,
    Number,
    String,
    Boolean,
    Color,
    Object,
    Value,
    Array { item: Box<Type>, len: Option<usize> },
    /// The type of an expression that never produces a value.
    Error,
}
impl Type {
    /// The name of the type's kind, as reported by the `typeof` operator.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Number => "Number",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Color => "Color",
            Self::Object => "Object",
            Self::Value => "Value",
            Self::Array { .. } => "Array",
            Self::Error => "Error",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    /// The item type and length of an array type.
    pub fn as_array(&self) -> Option<(&Type, Option<usize>)> {
        match self {
            Self::Array { item, len } => Some((item, *len)),
            _ => None,
        }
    }
}

/// Build an array type, optionally of a fixed length.
///
/// ```rust
/// use style_expr::types::{array, Type};
///
/// assert_eq!(array(Type::Number, Some(3)).to_string(), "Array<number, 3>");
/// assert_eq!(array(Type::String, None).to_string(), "Array<string>");
/// assert_eq!(array(Type::Value, None).to_string(), "Array");
/// ```
pub fn array(item: Type, len: Option<usize>) -> Type {
    Type::Array {
        item: Box::new(item),
        len,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::Boolean => f.write_str("boolean"),
            Self::Color => f.write_str("color"),
            Self::Object => f.write_str("object"),
            Self::Value => f.write_str("value"),
            Self::Error => f.write_str("error"),
            Self::Array { item, len } => match (item.as_ref(), len) {
                (item, Some(len)) => write!(f, "Array<{}, {}>", item, len),
                (Self::Value, None) => f.write_str("Array"),
                (item, None) => write!(f, "Array<{}>", item),
            },
        }
    }
}

/// Check whether `actual` is a subtype of `expected`.
///
/// Returns `None` when it is, or a message describing the mismatch.
///
/// ```rust
/// use style_expr::types::{array, check_subtype, Type};
///
/// let expected = array(Type::Number, Some(3));
/// assert!(check_subtype(&expected, &array(Type::Number, Some(3))).is_none());
/// assert!(check_subtype(&expected, &array(Type::Number, Some(4))).is_some());
/// assert!(check_subtype(&expected, &array(Type::String, Some(3))).is_some());
/// assert!(check_subtype(&Type::Value, &Type::Color).is_none());
/// ```
pub fn check_subtype(expected: &Type, actual: &Type) -> Option<String> {
    if is_subtype(expected, actual) {
        None
    } else {
        Some(format!("Expected {} but found {} instead.", expected, actual))
    }
}

fn is_subtype(expected: &Type, actual: &Type) -> bool {
    match (expected, actual) {
        (_, Type::Error) => true,
        (Type::Value, _) => true,
        (
            Type::Array {
                item: expected_item,
                len: expected_len,
            },
            Type::Array {
                item: actual_item,
                len: actual_len,
            },
        ) => {
            let len_ok = match expected_len {
                None => true,
                Some(len) => *actual_len == Some(*len),
            };
            len_ok && is_subtype(expected_item, actual_item)
        }
        (expected, actual) => expected == actual,
    }
}
