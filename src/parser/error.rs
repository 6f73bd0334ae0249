//! Parser error types.
//!
//! Parse errors capture what went wrong and where. Parsing stops at the
//! first error; there is no recovery, so a single error describes the
//! failure completely.

use crate::lexer::{Location, TokenKind};
use thiserror::Error;

/// A parse error with location and description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The current token was not what the grammar required.
    ///
    /// The message is phrased from the grammar's point of view, e.g.
    /// `Expected ')' after condition`.
    #[error("{message}")]
    UnexpectedToken {
        /// What the grammar required here.
        message: String,
        /// The kind of token actually found.
        found: TokenKind,
        /// Location of the offending token.
        location: Location,
    },

    /// No expression could start at the current token.
    #[error("Expected expression")]
    ExpectedExpression {
        /// The kind of token actually found.
        found: TokenKind,
        /// Location of the offending token.
        location: Location,
    },

    /// The left side of `=` was not a plain name.
    #[error("Invalid assignment target")]
    InvalidAssignmentTarget {
        /// Location of the `=` token.
        location: Location,
    },

    /// A numeric literal whose text does not convert to a value.
    #[error("Invalid {kind} literal: {text}")]
    InvalidNumber {
        /// Either `integer` or `float`.
        kind: &'static str,
        /// The literal's text.
        text: String,
        /// Location of the literal.
        location: Location,
    },
}

impl ParseError {
    /// The location of this error.
    pub fn location(&self) -> &Location {
        match self {
            ParseError::UnexpectedToken { location, .. } => location,
            ParseError::ExpectedExpression { location, .. } => location,
            ParseError::InvalidAssignmentTarget { location } => location,
            ParseError::InvalidNumber { location, .. } => location,
        }
    }

    /// Creates an "unexpected token" error.
    pub fn unexpected(message: impl Into<String>, found: TokenKind, location: Location) -> Self {
        ParseError::UnexpectedToken {
            message: message.into(),
            found,
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32, column: u32) -> Location {
        Location::new(line, column, "test.vsp".into())
    }

    #[test]
    fn test_message_is_the_display() {
        let err = ParseError::unexpected("Expected ')' after condition", TokenKind::Eof, loc(2, 7));
        assert_eq!(err.to_string(), "Expected ')' after condition");
        assert_eq!(err.location().line, 2);
    }

    #[test]
    fn test_invalid_number_display() {
        let err = ParseError::InvalidNumber {
            kind: "integer",
            text: "99999999999999999999".to_string(),
            location: loc(1, 1),
        };
        assert!(err.to_string().contains("integer literal"));
    }
}
