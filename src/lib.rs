//! # vesperc
//!
//! An ahead-of-time compiler for Vesper, a small statically-typed
//! imperative language.
//!
//! ## Architecture
//!
//! The compiler is a strictly linear pipeline; each phase's output is the
//! next phase's sole input:
//!
//! ```text
//! Source (.vsp) → Lexer → Parser → AST → Type Checker → CodeGen → x86-64 asm
//! ```
//!
//! Each phase is implemented as a separate module:
//!
//! - [`lexer`] - tokenizes source code into a stream of tokens
//! - [`parser`] - builds an Abstract Syntax Tree from tokens
//! - [`ast`] - AST type definitions and the type model
//! - [`semantic`] - scope resolution and type checking
//! - [`codegen`] - NASM-syntax x86-64 assembly generation
//!
//! The command-line driver (in `main.rs`) reads the source file, runs the
//! pipeline, and hands the assembly text to the external assembler and
//! linker.
//!
//! ## Example
//!
//! ```
//! use vesperc::codegen::{CodeGenerator, X86Backend};
//! use vesperc::lexer::tokenize;
//! use vesperc::parser::Parser;
//! use vesperc::semantic::TypeChecker;
//!
//! let source = r#"
//!     func add(a: int, b: int) => int { return a + b }
//!     io.print(add(2, 40))
//! "#;
//!
//! let tokens = tokenize(source, "example.vsp");
//! let program = Parser::new(&tokens).parse().expect("parse error");
//! TypeChecker::new().check(&program).expect("type error");
//! let output = X86Backend::new().generate(&program).expect("codegen error");
//!
//! assert!(output.code.contains("_user_add"));
//! ```

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod semantic;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::ast::{
        BinaryOp, Expr, ExprKind, LiteralValue, Param, Primitive, Program, Statement,
        StatementKind, TypeInfo, UnaryOp,
    };
    pub use crate::codegen::{CodeGenError, CodeGenerator, GeneratedOutput, Target, X86Backend};
    pub use crate::lexer::{tokenize, Lexer, Location, Token, TokenKind};
    pub use crate::parser::{ParseError, Parser};
    pub use crate::semantic::{SemanticError, TypeChecker};
}
