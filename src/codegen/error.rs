//! Code generation error types.
//!
//! Most invalid programs are rejected before code generation, but a few
//! constructs pass the type checker and still have no lowering. Those are
//! reported here rather than silently emitting broken assembly.

use crate::lexer::Location;
use std::fmt;

/// An error that occurred during code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeGenError {
    /// The kind of error.
    pub kind: CodeGenErrorKind,
    /// Source location where the error occurred.
    pub location: Option<Location>,
}

impl CodeGenError {
    /// Creates a new code generation error.
    pub fn new(kind: CodeGenErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Adds a source location to the error.
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Creates an "unsupported construct" error.
    pub fn unsupported(construct: impl Into<String>) -> Self {
        Self::new(CodeGenErrorKind::Unsupported(construct.into()))
    }

    /// Creates an internal error, indicating a compiler bug.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CodeGenErrorKind::Internal(message.into()))
    }
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for CodeGenError {}

/// The specific kind of code generation error.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeGenErrorKind {
    /// A construct the backend cannot lower.
    Unsupported(String),
    /// Internal inconsistency (indicates a bug, not a user error).
    Internal(String),
}

impl fmt::Display for CodeGenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenErrorKind::Unsupported(construct) => {
                write!(f, "Unsupported construct: {construct}")
            }
            CodeGenErrorKind::Internal(message) => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = CodeGenError::unsupported("string concatenation");
        assert_eq!(
            err.to_string(),
            "Unsupported construct: string concatenation"
        );
    }

    #[test]
    fn test_error_location() {
        let loc = Location::new(7, 3, "test.vsp".into());
        let err = CodeGenError::internal("missing scope").at(loc.clone());
        assert_eq!(err.location, Some(loc));
    }
}
