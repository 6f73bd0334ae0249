//! Semantic analysis for Vesper.
//!
//! This module performs the semantic analysis phase of compilation, which
//! occurs after parsing and before code generation. It handles:
//!
//! - **Symbol resolution**: linking identifier uses to their declarations
//! - **Type checking**: enforcing the compatibility relation at every
//!   binding, assignment, argument, and return
//! - **Scope discipline**: block-scoped declarations with shadowing
//! - **Function signatures**: arity and argument type checking
//! - **Placement rules**: `return` only inside a function,
//!   `break`/`continue` only inside a loop, calls only on names and
//!   member accesses
//!
//! # Architecture
//!
//! The checker makes one pass over the statement list, preceded by a
//! declaration pre-pass that registers every top-level function signature.
//! The pre-pass is what lets a top-level function be called before its
//! textual definition.
//!
//! # Unresolved names
//!
//! An identifier in value position that does not resolve is an error.
//! Member-access objects (`io` in `io.print(x)`) are namespace names, not
//! variable references, and are exempt.
//!
//! # Usage
//!
//! ```
//! use vesperc::lexer::tokenize;
//! use vesperc::parser::Parser;
//! use vesperc::semantic::TypeChecker;
//!
//! let tokens = tokenize("let x: int = 1", "example.vsp");
//! let program = Parser::new(&tokens).parse().unwrap();
//! TypeChecker::new().check(&program).expect("type error");
//! ```

mod checker;
mod error;
mod scope;

pub use error::SemanticError;
pub use scope::{FunctionInfo, FunctionTable, ScopeStack, VariableInfo};

use crate::ast::{Program, Statement, StatementKind, TypeInfo};

/// The type checker validates a parsed program against the language's
/// type rules.
///
/// All state is transient: the scope stack and function table are
/// discarded when checking finishes. The AST is read-only throughout.
pub struct TypeChecker {
    /// Stack of lexical scopes.
    pub(crate) scopes: ScopeStack,
    /// Flat table of function signatures.
    pub(crate) functions: FunctionTable,
    /// Return type of the function currently being checked.
    pub(crate) current_return: TypeInfo,
    /// Whether the walk is inside a function body.
    pub(crate) in_function: bool,
    /// Number of loops enclosing the current statement, for validating
    /// `break`/`continue` placement. Reset inside function bodies.
    pub(crate) loop_depth: usize,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    /// Creates a new type checker with an empty outermost scope.
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            functions: FunctionTable::new(),
            current_return: TypeInfo::VOID,
            in_function: false,
            loop_depth: 0,
        }
    }

    /// Checks a whole program.
    ///
    /// Stops at the first error.
    pub fn check(&mut self, program: &Program) -> Result<(), SemanticError> {
        self.collect_signatures(&program.statements);
        for statement in &program.statements {
            self.check_statement(statement)?;
        }
        log::debug!("type checking passed");
        Ok(())
    }

    /// Declaration pre-pass: registers every top-level function signature
    /// so definition order does not matter for top-level calls.
    fn collect_signatures(&mut self, statements: &[Statement]) {
        for statement in statements {
            if let StatementKind::Function {
                name,
                params,
                return_type,
                ..
            } = &statement.kind
            {
                let param_types = params.iter().map(|p| p.ty).collect();
                self.functions.declare(name.clone(), param_types, *return_type);
            }
        }
    }
}
