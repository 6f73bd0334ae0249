//! Semantic analysis error types.
//!
//! These errors represent problems found during type checking that are not
//! syntax errors. Each carries the source location of the offending
//! construct. The first semantic error terminates the compilation; there
//! is no recovery.

use crate::ast::TypeInfo;
use crate::lexer::Location;
use thiserror::Error;

/// A semantic analysis error with location and description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// A binding's value (or similar) does not fit the declared type.
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: TypeInfo,
        found: TypeInfo,
        location: Location,
    },

    /// Reference to a variable that is not in scope.
    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String, location: Location },

    /// Assignment to a binding declared with `let` or `const`.
    #[error("Cannot assign to immutable variable: {name}")]
    AssignToImmutable { name: String, location: Location },

    /// An assigned value does not fit the variable's declared type.
    #[error("Type mismatch in assignment")]
    AssignmentTypeMismatch {
        expected: TypeInfo,
        found: TypeInfo,
        location: Location,
    },

    /// An `if`/`while`/`for` condition that is not `bool` (or `any`).
    #[error("Condition must be boolean")]
    NonBooleanCondition { found: TypeInfo, location: Location },

    /// A `&&`/`||` operand that is not `bool` (or `any`).
    #[error("Logical operator requires boolean operands")]
    NonBooleanLogicalOperand { found: TypeInfo, location: Location },

    /// A `!` operand that is not `bool` (or `any`).
    #[error("Logical not requires boolean operand")]
    NonBooleanNotOperand { found: TypeInfo, location: Location },

    /// `return` at the top level.
    #[error("Return statement outside function")]
    ReturnOutsideFunction { location: Location },

    /// `break` with no enclosing loop.
    #[error("Break statement outside loop")]
    BreakOutsideLoop { location: Location },

    /// `continue` with no enclosing loop.
    #[error("Continue statement outside loop")]
    ContinueOutsideLoop { location: Location },

    /// A returned value that does not fit the function's return type.
    #[error("Return type mismatch: expected {expected}, got {found}")]
    ReturnTypeMismatch {
        expected: TypeInfo,
        found: TypeInfo,
        location: Location,
    },

    /// A bare `return` in a function whose return type is not `void`.
    #[error("Function must return a value")]
    MissingReturnValue { location: Location },

    /// A call whose argument count differs from the callee's parameter
    /// count.
    #[error("Wrong number of arguments")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        location: Location,
    },

    /// An argument that does not fit its parameter's type.
    #[error("Argument type mismatch")]
    ArgumentTypeMismatch {
        name: String,
        position: usize,
        location: Location,
    },

    /// A call whose target is neither a plain name nor a member access.
    #[error("Invalid call target")]
    InvalidCallTarget { location: Location },
}

impl SemanticError {
    /// The location of this error.
    pub fn location(&self) -> &Location {
        match self {
            SemanticError::TypeMismatch { location, .. } => location,
            SemanticError::UndefinedVariable { location, .. } => location,
            SemanticError::AssignToImmutable { location, .. } => location,
            SemanticError::AssignmentTypeMismatch { location, .. } => location,
            SemanticError::NonBooleanCondition { location, .. } => location,
            SemanticError::NonBooleanLogicalOperand { location, .. } => location,
            SemanticError::NonBooleanNotOperand { location, .. } => location,
            SemanticError::ReturnOutsideFunction { location } => location,
            SemanticError::BreakOutsideLoop { location } => location,
            SemanticError::ContinueOutsideLoop { location } => location,
            SemanticError::ReturnTypeMismatch { location, .. } => location,
            SemanticError::MissingReturnValue { location } => location,
            SemanticError::ArgumentCountMismatch { location, .. } => location,
            SemanticError::ArgumentTypeMismatch { location, .. } => location,
            SemanticError::InvalidCallTarget { location } => location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new(4, 2, "test.vsp".into())
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = SemanticError::TypeMismatch {
            expected: TypeInfo::INT,
            found: TypeInfo::STRING,
            location: loc(),
        };
        assert_eq!(err.to_string(), "Type mismatch: expected int, got string");
    }

    #[test]
    fn test_immutable_assignment_message() {
        let err = SemanticError::AssignToImmutable {
            name: "x".to_string(),
            location: loc(),
        };
        assert_eq!(err.to_string(), "Cannot assign to immutable variable: x");
        assert_eq!(err.location().line, 4);
    }
}
