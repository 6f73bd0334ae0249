//! Abstract Syntax Tree (AST) definitions for Vesper.
//!
//! The AST represents the hierarchical structure of a Vesper program after
//! parsing. Each node corresponds to a syntactic construct in the source.
//!
//! # Structure
//!
//! ```text
//! Program
//! └── Vec<Statement>
//!     ├── Let { name, ty, value: Expr, mutable }
//!     ├── If { condition: Expr, then_branch, else_branch }
//!     ├── Function { name, params, return_type, body }
//!     └── ...
//! ```
//!
//! # Design Decisions
//!
//! - **Owned nodes**: AST nodes own their children (no lifetimes, no
//!   sharing). The tree can outlive the source text and each child has
//!   exactly one parent.
//! - **Location on every node**: every node tracks its source location for
//!   error messages.
//! - **Structural equality**: all node types derive `PartialEq`, so two
//!   parses of the same input can be compared directly.

mod expr;
mod stmt;
mod types;

pub use expr::*;
pub use stmt::*;
pub use types::*;

pub use crate::lexer::Location;

/// A complete Vesper program: a sequence of top-level statements.
///
/// Function definitions and ordinary statements mix freely at the top
/// level; the code generator later separates them.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The top-level statements in source order.
    pub statements: Vec<Statement>,
}

impl Program {
    /// Creates a program from a list of statements.
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}
