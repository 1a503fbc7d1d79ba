use std::result;

use itertools::Itertools;
use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::span::{Position, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub position: Option<Position>,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{}: {}", position, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// The input program is not well-typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCheckError {
    pub message: String,
    pub position: Option<Position>,
    pub span: Option<Span>,
}

impl TypeCheckError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        if !span.is_null() {
            self.span = Some(span);
        }
        self
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }
}

impl std::fmt::Display for TypeCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{}: {}", position, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TypeCheckError {}

/// A function unit could not be rewritten consistently.
#[derive(Debug, Clone)]
pub struct TransformationError {
    /// Name of the function, empty for function literals.
    pub unit: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Display for TransformationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "transformation of function {:?} failed:\n{}",
            self.unit,
            self.diagnostics.iter().map(|d| d.message.as_str()).join("\n")
        )
    }
}

impl std::error::Error for TransformationError {}

#[derive(Error, Debug)]
pub enum Error {
    #[error("syntax error: {1}")]
    Syntax(Span, SyntaxError),
    #[error("{0}")]
    TypeCheck(TypeCheckError),
    #[error("{0}")]
    Transformation(TransformationError),
    #[error("{0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

impl From<TypeCheckError> for Error {
    fn from(err: TypeCheckError) -> Self {
        Error::TypeCheck(err)
    }
}

impl From<TransformationError> for Error {
    fn from(err: TransformationError) -> Self {
        Error::Transformation(err)
    }
}

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn transformation_error_lists_diagnostics() {
        let err = TransformationError {
            unit: "load".to_string(),
            diagnostics: vec![
                Diagnostic::error("first".to_string()),
                Diagnostic::error("second".to_string()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "transformation of function \"load\" failed:\nfirst\nsecond"
        );
    }

    #[test]
    fn type_check_error_prefixes_position() {
        let err = TypeCheckError::new("undefined: x").with_position(Some(Position {
            file: PathBuf::from("main.go"),
            line: 4,
            column: 2,
        }));
        assert_eq!(err.to_string(), "main.go:4:2: undefined: x");
    }
}
