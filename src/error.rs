//! Error handling
//!
use std::fmt;

use thiserror;

/// A static error found while parsing or type checking an expression.
///
/// The key is the path of the offending node within the raw expression,
/// e.g. `[2][1]`. The root expression has an empty key.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{key}: {message}")]
pub struct ParsingError {
    pub key: String,
    pub message: String,
}
impl ParsingError {
    pub fn new<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Every error collected during a single parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsingErrors(pub Vec<ParsingError>);
impl ParsingErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParsingError> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl fmt::Display for ParsingErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ParsingError::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        f.write_str(&joined)
    }
}

/// A failure raised while evaluating a compiled expression for one
/// particular feature and zoom.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
}
impl RuntimeError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public error enumeration
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Parse(ParsingErrors),

    #[error("Expression evaluation failed: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("{key}: {message}")]
    InvalidZoomExpression { key: String, message: String },

    #[error("Invalid function definition - reason: {reason}")]
    InvalidFunction { reason: String },

    #[error("Invalid property specification: {0}")]
    InvalidPropertySpec(#[source] serde_json::Error),
}
impl Error {
    /// The individual parse errors, if this is a parse failure.
    pub fn parsing_errors(&self) -> Option<&[ParsingError]> {
        match self {
            Self::Parse(errors) => Some(&errors.0),
            _ => None,
        }
    }
}
impl From<ParsingErrors> for Error {
    fn from(errors: ParsingErrors) -> Self {
        Self::Parse(errors)
    }
}

#[cfg(test)]
mod test_error {
    use super::*;

    #[test]
    fn test_parse_errors_are_joined() {
        let err = Error::Parse(ParsingErrors(vec![
            ParsingError::new("[1]", "first"),
            ParsingError::new("[2][0]", "second"),
        ]));
        assert_eq!(err.to_string(), "[1]: first, [2][0]: second");
        assert_eq!(err.parsing_errors().map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_runtime_error_message() {
        let err: Error = RuntimeError::new("boom").into();
        assert_eq!(err.to_string(), "Expression evaluation failed: boom");
        assert!(err.parsing_errors().is_none());
    }
}
