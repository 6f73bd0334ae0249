//! Parser for Vesper.
//!
//! The parser transforms a stream of tokens into an Abstract Syntax Tree.
//! It uses recursive descent for statements and precedence climbing for
//! expressions, with a single token of lookahead and no backtracking.
//!
//! # Example
//!
//! ```
//! use vesperc::lexer::tokenize;
//! use vesperc::parser::Parser;
//!
//! let tokens = tokenize("let x: int = 1 + 2", "example.vsp");
//! let program = Parser::new(&tokens).parse().expect("parse failed");
//!
//! assert_eq!(program.statements.len(), 1);
//! ```
//!
//! # Errors
//!
//! Parsing aborts at the first error. Every grammar mismatch produces a
//! [`ParseError`] carrying the offending token's location and a message
//! phrased from the grammar's point of view.
//!
//! Semicolons are optional statement separators; the parser skips them at
//! statement boundaries and consumes the optional ones inside `for`
//! headers.

mod error;
mod expressions;
mod statements;

pub use error::ParseError;

use crate::ast::{Primitive, Program, TypeInfo};
use crate::lexer::{Token, TokenKind};

/// Parser for Vesper source code.
///
/// Consumes a token slice produced by the lexer (terminated by `Eof`) and
/// produces a [`Program`].
pub struct Parser<'a> {
    /// The tokens to parse.
    tokens: &'a [Token],
    /// Current position in the token stream.
    current: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given tokens.
    ///
    /// The slice must be terminated by an `Eof` token, which is what
    /// [`tokenize`](crate::lexer::tokenize) produces for error-free input.
    pub fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof)),
            "token stream must end with Eof"
        );
        Self { tokens, current: 0 }
    }

    /// Parses the token stream into a program.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        self.skip_semicolons();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
            self.skip_semicolons();
        }
        Ok(Program::new(statements))
    }

    // ==================== Token Navigation ====================

    /// Returns the current token without consuming it.
    ///
    /// Safe to call at any position: the cursor never moves past the
    /// terminating `Eof` token.
    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    /// Returns the most recently consumed token.
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    /// Returns true once the cursor reaches the `Eof` token.
    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Checks whether the current token has the expected kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consumes the current token if it matches, returning whether it did.
    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the expected kind or fails with `message`.
    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(ParseError::unexpected(
                message,
                token.kind,
                token.location.clone(),
            ))
        }
    }

    /// Skips stray semicolons between statements.
    fn skip_semicolons(&mut self) {
        while self.check(TokenKind::Semicolon) {
            self.advance();
        }
    }

    // ==================== Type Syntax ====================

    /// Parses a type annotation.
    ///
    /// One of the primitive type keywords, or an identifier, which is
    /// treated as `any`.
    fn parse_type(&mut self) -> Result<TypeInfo, ParseError> {
        let token = self.peek();
        let primitive = match token.kind {
            TokenKind::IntType => Primitive::Int,
            TokenKind::FloatType => Primitive::Float,
            TokenKind::BoolType => Primitive::Bool,
            TokenKind::CharType => Primitive::Char,
            TokenKind::StringType => Primitive::String,
            TokenKind::VoidType => Primitive::Void,
            TokenKind::AnyType => Primitive::Any,
            TokenKind::Identifier => Primitive::Any,
            _ => {
                return Err(ParseError::unexpected(
                    "Expected type",
                    token.kind,
                    token.location.clone(),
                ));
            }
        };
        self.advance();
        Ok(TypeInfo::new(primitive))
    }
}
