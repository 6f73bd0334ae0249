//! Lexical analysis for Vesper.
//!
//! This module converts Vesper source code into a stream of [`Token`]s.
//! It handles:
//!
//! - Keyword recognition against the fixed keyword set
//! - Integer and float literals (value kept as text until parsing)
//! - String literals with escape sequences
//! - Greedy operator recognition (`==`, `=>`, `::`, `&&`, ... beat their
//!   one-character prefixes)
//! - Line comments (`//` to end of line)
//! - Line and column tracking for every token
//!
//! ## Example
//!
//! ```
//! use vesperc::lexer::{tokenize, TokenKind};
//!
//! let tokens = tokenize("let x: int = 42", "example.vsp");
//! assert_eq!(tokens[0].kind, TokenKind::Let);
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
//! ```
//!
//! ## Design Notes
//!
//! The lexer is built on the [`logos`](https://docs.rs/logos) crate, which
//! generates a fast DFA-based matcher from the token patterns. The matcher
//! enum is private; the public [`TokenKind`] additionally carries the `Eof`
//! and `Error` kinds that terminate every token stream and that logos never
//! produces itself.
//!
//! The output contract is: `tokenize` returns the complete token list,
//! terminated by either the first `Error` token or a single `Eof` token.
//! Callers must check for `Error` before handing the stream to the parser.

mod token;

pub use token::{Location, Token, TokenKind};

use logos::Logos;
use std::sync::Arc;

/// The logos matcher behind the lexer.
///
/// Only real tokens appear here; end-of-input and lexical errors are
/// handled by the [`Lexer`] wrapper.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
enum RawToken {
    // Literals. The float pattern requires digits on both sides of the
    // dot, so `1.` lexes as an integer followed by `.`.
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r#""([^"\\]|\\[\s\S])*""#)]
    Str,
    /// A string that reaches end of input without its closing quote.
    #[regex(r#""([^"\\]|\\[\s\S])*"#)]
    UnterminatedStr,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    // Keywords.
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("func")]
    Func,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Type keywords.
    #[token("int")]
    IntType,
    #[token("float")]
    FloatType,
    #[token("bool")]
    BoolType,
    #[token("char")]
    CharType,
    #[token("string")]
    StringType,
    #[token("void")]
    VoidType,
    #[token("any")]
    AnyType,

    // Operators. Two-character operators win over their prefixes because
    // logos always takes the longest match. Bare `&` and `|` have no
    // pattern on purpose; they surface as lexical errors.
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    Equals,
    #[token("!=")]
    NotEquals,
    #[token("<")]
    LessThan,
    #[token(">")]
    GreaterThan,
    #[token("<=")]
    LessEquals,
    #[token(">=")]
    GreaterEquals,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,

    // Delimiters.
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("=>")]
    FatArrow,
    #[token("::")]
    ColonColon,
    #[token("=")]
    Assign,
}

impl RawToken {
    /// Maps a matched raw token to its public kind.
    ///
    /// `UnterminatedStr` is intentionally absent; the wrapper turns it
    /// into an `Error` token before the mapping is consulted.
    fn kind(self) -> TokenKind {
        match self {
            RawToken::Integer => TokenKind::IntegerLiteral,
            RawToken::Float => TokenKind::FloatLiteral,
            RawToken::Str => TokenKind::StringLiteral,
            RawToken::UnterminatedStr => TokenKind::Error,
            RawToken::Identifier => TokenKind::Identifier,
            RawToken::Let => TokenKind::Let,
            RawToken::Const => TokenKind::Const,
            RawToken::Var => TokenKind::Var,
            RawToken::Func => TokenKind::Func,
            RawToken::Return => TokenKind::Return,
            RawToken::If => TokenKind::If,
            RawToken::Else => TokenKind::Else,
            RawToken::While => TokenKind::While,
            RawToken::For => TokenKind::For,
            RawToken::Break => TokenKind::Break,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Import => TokenKind::Import,
            RawToken::From => TokenKind::From,
            RawToken::True => TokenKind::True,
            RawToken::False => TokenKind::False,
            RawToken::IntType => TokenKind::IntType,
            RawToken::FloatType => TokenKind::FloatType,
            RawToken::BoolType => TokenKind::BoolType,
            RawToken::CharType => TokenKind::CharType,
            RawToken::StringType => TokenKind::StringType,
            RawToken::VoidType => TokenKind::VoidType,
            RawToken::AnyType => TokenKind::AnyType,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Star => TokenKind::Star,
            RawToken::Slash => TokenKind::Slash,
            RawToken::Percent => TokenKind::Percent,
            RawToken::Equals => TokenKind::Equals,
            RawToken::NotEquals => TokenKind::NotEquals,
            RawToken::LessThan => TokenKind::LessThan,
            RawToken::GreaterThan => TokenKind::GreaterThan,
            RawToken::LessEquals => TokenKind::LessEquals,
            RawToken::GreaterEquals => TokenKind::GreaterEquals,
            RawToken::AndAnd => TokenKind::AndAnd,
            RawToken::OrOr => TokenKind::OrOr,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::LeftParen => TokenKind::LeftParen,
            RawToken::RightParen => TokenKind::RightParen,
            RawToken::LeftBrace => TokenKind::LeftBrace,
            RawToken::RightBrace => TokenKind::RightBrace,
            RawToken::LeftBracket => TokenKind::LeftBracket,
            RawToken::RightBracket => TokenKind::RightBracket,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Dot => TokenKind::Dot,
            RawToken::FatArrow => TokenKind::FatArrow,
            RawToken::ColonColon => TokenKind::ColonColon,
            RawToken::Assign => TokenKind::Assign,
        }
    }
}

/// The lexer for Vesper source code.
///
/// Wraps the logos matcher and adds line/column tracking, string escape
/// cooking, and the `Eof`/`Error` terminators.
pub struct Lexer<'source> {
    /// The underlying logos matcher.
    inner: logos::Lexer<'source, RawToken>,
    /// Byte offset of the start of every line, for location lookups.
    line_starts: Vec<usize>,
    /// File name attached to every location.
    file: Arc<str>,
}

impl<'source> Lexer<'source> {
    /// Creates a new lexer for the given source code.
    pub fn new(source: &'source str, filename: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            inner: RawToken::lexer(source),
            line_starts,
            file: Arc::from(filename),
        }
    }

    /// Converts a byte offset into a 1-based line/column location.
    fn location_at(&self, offset: usize) -> Location {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = offset - self.line_starts[line] + 1;
        Location::new(line as u32 + 1, column as u32, Arc::clone(&self.file))
    }

    /// Produces the next token.
    ///
    /// Returns an `Eof` token once the input is exhausted and keeps
    /// returning it on subsequent calls.
    pub fn next_token(&mut self) -> Token {
        let raw = match self.inner.next() {
            Some(raw) => raw,
            None => {
                let location = self.location_at(self.inner.source().len());
                return Token::new(TokenKind::Eof, "", location);
            }
        };
        let location = self.location_at(self.inner.span().start);
        let slice = self.inner.slice();

        match raw {
            Ok(RawToken::Str) => {
                let cooked = unescape(&slice[1..slice.len() - 1]);
                Token::new(TokenKind::StringLiteral, cooked, location)
            }
            Ok(RawToken::UnterminatedStr) => {
                Token::new(TokenKind::Error, "Unterminated string", location)
            }
            Ok(raw) => Token::new(raw.kind(), slice, location),
            Err(()) => {
                let message = match slice.chars().next() {
                    // A quote here means the string pattern could not
                    // complete before end of input.
                    Some('"') => "Unterminated string".to_string(),
                    Some(c) => format!("Unexpected character '{c}'"),
                    None => "Unexpected end of input".to_string(),
                };
                Token::new(TokenKind::Error, message, location)
            }
        }
    }

    /// Collects the remaining tokens, stopping after the first `Error`
    /// or the `Eof` terminator.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = matches!(token.kind, TokenKind::Eof | TokenKind::Error);
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}

/// Resolves the escape sequences of a string literal body.
///
/// `\n`, `\t`, `\r`, `\\` and `\"` map to their characters; any other
/// escaped character is taken literally.
fn unescape(body: &str) -> String {
    let mut cooked = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            cooked.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => cooked.push('\n'),
            Some('t') => cooked.push('\t'),
            Some('r') => cooked.push('\r'),
            Some('\\') => cooked.push('\\'),
            Some('"') => cooked.push('"'),
            Some(other) => cooked.push(other),
            None => {}
        }
    }
    cooked
}

/// Convenience function to tokenize source code directly.
///
/// # Example
///
/// ```
/// use vesperc::lexer::{tokenize, TokenKind};
///
/// let tokens = tokenize("1 + 2", "example.vsp");
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::IntegerLiteral,
///         TokenKind::Plus,
///         TokenKind::IntegerLiteral,
///         TokenKind::Eof,
///     ]
/// );
/// ```
pub fn tokenize(source: &str, filename: &str) -> Vec<Token> {
    Lexer::new(source, filename).tokenize()
}
