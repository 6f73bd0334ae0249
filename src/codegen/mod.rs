//! Code generation module for Vesper.
//!
//! This module transforms a type-checked AST into target code. The
//! architecture uses a trait-based backend system so that alternative
//! targets can be added without touching the pipeline.
//!
//! # Architecture
//!
//! ```text
//! Program → CodeGenerator → GeneratedOutput
//!               ↑
//!          X86Backend (NASM-syntax x86-64 assembly)
//! ```
//!
//! # Current Backends
//!
//! - **x86-64** ([`X86Backend`]): textual NASM-syntax assembly for the
//!   System V AMD64 or Microsoft x64 calling convention, assembled and
//!   linked by external tools.
//!
//! # Example
//!
//! ```
//! use vesperc::codegen::{CodeGenerator, X86Backend};
//! use vesperc::lexer::tokenize;
//! use vesperc::parser::Parser;
//!
//! let tokens = tokenize("let x: int = 2 + 3 * 4", "example.vsp");
//! let program = Parser::new(&tokens).parse().unwrap();
//! let output = X86Backend::new().generate(&program).unwrap();
//! assert!(output.code.contains("global main"));
//! ```

mod error;
mod x86_64;

pub use error::{CodeGenError, CodeGenErrorKind};
pub use x86_64::{Target, X86Backend};

use crate::ast::Program;

/// Output from code generation.
///
/// Contains the generated code and the metadata needed by the driver to
/// hand it to the next tool.
#[derive(Debug)]
pub struct GeneratedOutput {
    /// The generated source text.
    pub code: String,
    /// Human-readable description of the output format.
    pub format: String,
    /// Suggested file extension for the output.
    pub extension: String,
}

impl GeneratedOutput {
    /// Creates a new generated output for NASM assembly.
    pub fn assembly(code: String) -> Self {
        Self {
            code,
            format: "NASM x86-64".to_string(),
            extension: "asm".to_string(),
        }
    }
}

/// Trait for code generation backends.
///
/// A backend translates a checked program into target text, managing its
/// own conventions (registers, label naming, runtime helpers) internally.
pub trait CodeGenerator {
    /// Generates code for a program.
    ///
    /// The program must already have passed the type checker; the backend
    /// reports anything it still cannot express as a [`CodeGenError`].
    fn generate(&self, program: &Program) -> Result<GeneratedOutput, CodeGenError>;

    /// Returns the name of this backend for diagnostics.
    fn backend_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;

    #[test]
    fn test_generated_output_assembly() {
        let output = GeneratedOutput::assembly("global main".to_string());
        assert_eq!(output.format, "NASM x86-64");
        assert_eq!(output.extension, "asm");
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(X86Backend::new().backend_name(), "x86-64");
    }

    #[test]
    fn test_empty_program_generates() {
        let program = Program::new(vec![]);
        let output = X86Backend::new().generate(&program).unwrap();
        assert!(output.code.contains("main:"));
        assert!(output.code.contains("section .data"));
    }
}
