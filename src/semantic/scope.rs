//! Symbol tables for semantic analysis.
//!
//! Two tables back the type checker:
//!
//! - A stack of lexical scopes mapping variable names to their declared
//!   type and mutability. Scopes are pushed on block entry and popped on
//!   exit; lookups walk from the innermost scope outward, so inner
//!   declarations shadow outer ones.
//! - A flat table of function signatures. Functions live in a single
//!   namespace regardless of where their definition appears.
//!
//! Both tables are transient: they exist only while the checker runs.

use crate::ast::TypeInfo;
use std::collections::HashMap;

/// A declared variable: its type and whether it may be reassigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableInfo {
    /// The declared type.
    pub ty: TypeInfo,
    /// Whether the binding was declared with `var`.
    pub mutable: bool,
}

/// A function signature: parameter types and return type.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    /// Declared parameter types, in order.
    pub params: Vec<TypeInfo>,
    /// Declared return type.
    pub return_type: TypeInfo,
}

/// A stack of lexical scopes.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, VariableInfo>>,
}

impl ScopeStack {
    /// Creates a stack holding the outermost scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    /// Pushes a new innermost scope.
    pub fn enter(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the innermost scope, discarding its declarations.
    pub fn exit(&mut self) {
        self.scopes.pop();
    }

    /// Declares a variable in the innermost scope.
    ///
    /// Re-declaring a name in the same scope replaces the previous entry;
    /// declaring it in an inner scope shadows the outer one.
    pub fn declare(&mut self, name: impl Into<String>, ty: TypeInfo, mutable: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), VariableInfo { ty, mutable });
        }
    }

    /// Looks a name up, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<VariableInfo> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }
}

/// The flat function signature table.
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionInfo>,
}

impl FunctionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function signature, replacing any previous one of the
    /// same name.
    pub fn declare(&mut self, name: impl Into<String>, params: Vec<TypeInfo>, return_type: TypeInfo) {
        self.functions.insert(
            name.into(),
            FunctionInfo {
                params,
                return_type,
            },
        );
    }

    /// Looks a function up by name.
    pub fn lookup(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", TypeInfo::INT, false);
        scopes.enter();
        assert_eq!(
            scopes.lookup("x"),
            Some(VariableInfo {
                ty: TypeInfo::INT,
                mutable: false
            })
        );
    }

    #[test]
    fn test_inner_scope_shadows() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", TypeInfo::INT, false);
        scopes.enter();
        scopes.declare("x", TypeInfo::STRING, true);
        assert_eq!(scopes.lookup("x").unwrap().ty, TypeInfo::STRING);
        scopes.exit();
        assert_eq!(scopes.lookup("x").unwrap().ty, TypeInfo::INT);
    }

    #[test]
    fn test_inner_declarations_die_with_their_scope() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        scopes.declare("tmp", TypeInfo::BOOL, false);
        scopes.exit();
        assert_eq!(scopes.lookup("tmp"), None);
    }

    #[test]
    fn test_function_table_is_flat() {
        let mut functions = FunctionTable::new();
        functions.declare("f", vec![TypeInfo::INT], TypeInfo::VOID);
        let info = functions.lookup("f").unwrap();
        assert_eq!(info.params.len(), 1);
        assert_eq!(info.return_type, TypeInfo::VOID);
        assert!(functions.lookup("g").is_none());
    }
}
