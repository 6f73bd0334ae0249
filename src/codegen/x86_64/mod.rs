//! x86-64 assembly backend.
//!
//! Generates NASM-syntax assembly for the System V AMD64 or Microsoft x64
//! calling convention. The output is a single text unit laid out as:
//!
//! ```text
//! ; header: default rel, global main, externs
//! section .text
//!   <user functions, mangled _user_<name>>
//!   <builtin print runtime>
//! main:
//!   <top-level statements>
//!   <exit sequence>
//! section .data
//!   <printf format strings, interned string literals>
//! section .bss
//! ```
//!
//! # Value model
//!
//! Every value is a 64-bit quantity. Integer, bool, and string (pointer)
//! values travel in `rax`; float values travel in `xmm0`. Locals live at
//! negative offsets from `rbp`, 8 bytes each, assigned in declaration
//! order; stack frames are sized exactly by a pre-pass over the body (see
//! [`frame`]).
//!
//! # Module Structure
//!
//! - [`frame`] - frame-size pre-pass
//! - `stmt` - statement emission
//! - `expr` - expression emission and static type inference
//! - `runtime` - builtin print procedures and the data section

mod expr;
mod frame;
mod runtime;
mod stmt;

use std::collections::HashMap;

use crate::ast::{Program, StatementKind, TypeInfo};
use crate::codegen::{CodeGenError, CodeGenerator, GeneratedOutput};

/// The calling convention the emitted code follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// System V AMD64 (Linux, macOS).
    SysV,
    /// Microsoft x64 (Windows).
    Win64,
}

impl Target {
    /// The convention of the machine this compiler was built for.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Target::Win64
        } else {
            Target::SysV
        }
    }

    /// Integer/pointer argument registers, in order.
    pub(super) fn int_arg_registers(self) -> &'static [&'static str] {
        match self {
            Target::SysV => &["rdi", "rsi", "rdx", "rcx", "r8", "r9"],
            Target::Win64 => &["rcx", "rdx", "r8", "r9"],
        }
    }

    /// How many float argument registers participate.
    pub(super) fn float_arg_register_count(self) -> usize {
        match self {
            Target::SysV => 8,
            Target::Win64 => 4,
        }
    }

    /// First integer argument register, used by the builtin dispatch.
    pub(super) fn first_int_arg(self) -> &'static str {
        self.int_arg_registers()[0]
    }

    /// Offset from `rbp` of the first stack-passed argument.
    ///
    /// Past the saved `rbp` and return address, plus the 32-byte shadow
    /// space on Windows.
    pub(super) fn stack_arg_base(self) -> i64 {
        match self {
            Target::SysV => 16,
            Target::Win64 => 48,
        }
    }

    /// Human-readable convention name for the assembly header.
    pub(super) fn description(self) -> &'static str {
        match self {
            Target::SysV => "System V AMD64",
            Target::Win64 => "Microsoft x64",
        }
    }
}

/// Where a single argument or parameter travels across a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum PassedIn {
    /// An integer/pointer register.
    IntReg(&'static str),
    /// An `xmm<n>` register.
    XmmReg(usize),
    /// The k-th stack-passed slot, left-to-right.
    Stack(i64),
}

/// Assigns every argument position a register or stack slot.
///
/// `floats[i]` says whether position `i` travels as a float. System V
/// fills integer and float registers from independent counters; Microsoft
/// x64 assigns registers positionally. Overflow positions go to the
/// stack in order.
pub(super) fn classify_slots(target: Target, floats: &[bool]) -> Vec<PassedIn> {
    let int_regs = target.int_arg_registers();
    let float_regs = target.float_arg_register_count();
    let mut ints = 0usize;
    let mut xmms = 0usize;
    let mut stack = 0i64;
    floats
        .iter()
        .enumerate()
        .map(|(position, &is_float)| match target {
            Target::Win64 => {
                if position < int_regs.len() {
                    if is_float {
                        PassedIn::XmmReg(position)
                    } else {
                        PassedIn::IntReg(int_regs[position])
                    }
                } else {
                    let slot = stack;
                    stack += 1;
                    PassedIn::Stack(slot)
                }
            }
            Target::SysV => {
                if is_float {
                    if xmms < float_regs {
                        let reg = PassedIn::XmmReg(xmms);
                        xmms += 1;
                        reg
                    } else {
                        let slot = stack;
                        stack += 1;
                        PassedIn::Stack(slot)
                    }
                } else if ints < int_regs.len() {
                    let reg = PassedIn::IntReg(int_regs[ints]);
                    ints += 1;
                    reg
                } else {
                    let slot = stack;
                    stack += 1;
                    PassedIn::Stack(slot)
                }
            }
        })
        .collect()
}

/// A local variable's storage and semantic information.
#[derive(Debug, Clone, Copy)]
pub(super) struct Local {
    /// Positive distance below `rbp`.
    pub offset: i64,
    /// The declared type.
    pub ty: TypeInfo,
    /// Whether the binding was declared with `var`.
    pub mutable: bool,
}

/// A function's signature, for argument classification and call typing.
#[derive(Debug, Clone)]
pub(super) struct Signature {
    pub params: Vec<TypeInfo>,
    pub return_type: TypeInfo,
}

/// Labels a `break`/`continue` inside the current loop jump to.
#[derive(Debug, Clone)]
pub(super) struct LoopLabels {
    pub break_label: String,
    pub continue_label: String,
}

/// The x86-64 code generation backend.
pub struct X86Backend {
    target: Target,
}

impl Default for X86Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl X86Backend {
    /// Creates a backend for the host calling convention.
    pub fn new() -> Self {
        Self {
            target: Target::host(),
        }
    }

    /// Creates a backend for an explicit calling convention.
    pub fn with_target(target: Target) -> Self {
        Self { target }
    }
}

impl CodeGenerator for X86Backend {
    fn generate(&self, program: &Program) -> Result<GeneratedOutput, CodeGenError> {
        let mut functions = Vec::new();
        let mut main_statements = Vec::new();
        for statement in &program.statements {
            match &statement.kind {
                StatementKind::Function { .. } => functions.push(statement),
                // Imports carry no code.
                StatementKind::Import { .. } => {}
                _ => main_statements.push(statement),
            }
        }

        let mut emitter = Emitter::new(self.target);

        for function in &functions {
            if let StatementKind::Function {
                name,
                params,
                return_type,
                ..
            } = &function.kind
            {
                emitter.functions.insert(
                    name.clone(),
                    Signature {
                        params: params.iter().map(|p| p.ty).collect(),
                        return_type: *return_type,
                    },
                );
            }
        }

        for function in &functions {
            emitter.emit_function(function)?;
            emitter.blank_line();
        }

        emitter.emit_builtin_print();
        emitter.blank_line();
        emitter.emit_main(&main_statements)?;

        Ok(GeneratedOutput::assembly(emitter.finish()))
    }

    fn backend_name(&self) -> &str {
        "x86-64"
    }
}

/// Accumulates the text section and all emission state.
pub(super) struct Emitter {
    target: Target,
    /// The `.text` body.
    text: String,
    /// Scope stack mapping names to locals.
    scopes: Vec<HashMap<String, Local>>,
    /// Known function signatures.
    functions: HashMap<String, Signature>,
    /// Interned string literals in emission order: (label, content).
    interned: Vec<(String, String)>,
    /// Content to index into `interned`.
    intern_index: HashMap<String, usize>,
    /// Monotonic counter behind every control-flow label.
    label_counter: u32,
    /// Current frame offset; grows by 8 per declared local.
    frame_offset: i64,
    /// Enclosing loops, innermost last.
    loops: Vec<LoopLabels>,
    /// Return type of the function currently being emitted.
    current_return: TypeInfo,
    /// Whether any float remainder was lowered (pulls in libc `fmod`).
    needs_fmod: bool,
}

impl Emitter {
    fn new(target: Target) -> Self {
        Self {
            target,
            text: String::new(),
            scopes: Vec::new(),
            functions: HashMap::new(),
            interned: Vec::new(),
            intern_index: HashMap::new(),
            label_counter: 0,
            frame_offset: 0,
            loops: Vec::new(),
            current_return: TypeInfo::VOID,
            needs_fmod: false,
        }
    }

    // ==================== Text Emission ====================

    /// Emits one indented instruction line.
    pub(super) fn emit(&mut self, line: impl AsRef<str>) {
        self.text.push_str("    ");
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    /// Emits a label line.
    pub(super) fn emit_label(&mut self, label: &str) {
        self.text.push_str(label);
        self.text.push_str(":\n");
    }

    /// Emits an indented comment line.
    pub(super) fn emit_comment(&mut self, comment: impl AsRef<str>) {
        self.text.push_str("    ; ");
        self.text.push_str(comment.as_ref());
        self.text.push('\n');
    }

    /// Emits a blank separator line.
    pub(super) fn blank_line(&mut self) {
        self.text.push('\n');
    }

    /// Returns a fresh control-flow label with the given prefix.
    pub(super) fn new_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}_{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    /// Interns a string literal, returning its `.LC<k>` label.
    ///
    /// Identical contents share one label.
    pub(super) fn intern_string(&mut self, content: &str) -> String {
        if let Some(&index) = self.intern_index.get(content) {
            return self.interned[index].0.clone();
        }
        let label = format!(".LC{}", self.interned.len());
        self.intern_index
            .insert(content.to_string(), self.interned.len());
        self.interned.push((label.clone(), content.to_string()));
        label
    }

    // ==================== Scopes and Frame ====================

    pub(super) fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(super) fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Allocates the next 8-byte slot and binds `name` to it.
    ///
    /// Offsets grow monotonically through the whole function body; slots
    /// of dead scopes are not reused, which is what the frame pre-pass
    /// assumes.
    pub(super) fn declare_local(&mut self, name: &str, ty: TypeInfo, mutable: bool) -> i64 {
        self.frame_offset += 8;
        let offset = self.frame_offset;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.to_string(),
                Local {
                    offset,
                    ty,
                    mutable,
                },
            );
        }
        offset
    }

    /// Looks a local up, innermost scope first.
    pub(super) fn lookup_local(&self, name: &str) -> Option<Local> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub(super) fn target(&self) -> Target {
        self.target
    }

    // ==================== Program Layout ====================

    /// Emits `main`: prologue, top-level statements, exit sequence.
    fn emit_main(
        &mut self,
        statements: &[&crate::ast::Statement],
    ) -> Result<(), CodeGenError> {
        self.frame_offset = 0;
        self.current_return = TypeInfo::VOID;
        let slots: usize = statements.iter().map(|s| frame::slots_in(s)).sum();
        let frame_bytes = frame::frame_bytes(slots);
        log::debug!("main frame: {slots} locals, {frame_bytes} bytes");

        self.emit_label("main");
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        if frame_bytes > 0 {
            self.emit(format!("sub rsp, {frame_bytes}"));
        }

        self.enter_scope();
        for statement in statements {
            self.emit_statement(statement)?;
        }
        self.exit_scope();

        match self.target {
            Target::Win64 => {
                self.emit("xor ecx, ecx");
                self.emit("call ExitProcess");
            }
            Target::SysV => {
                self.emit("xor eax, eax");
                self.emit("mov rsp, rbp");
                self.emit("pop rbp");
                self.emit("ret");
            }
        }
        Ok(())
    }

    /// Assembles the final output: header, text, data, bss.
    fn finish(self) -> String {
        let mut out = String::new();
        out.push_str(&self.header());
        out.push_str("section .text\n\n");
        out.push_str(&self.text);
        out.push_str(&self.data_section());
        out.push_str("\nsection .bss\n");
        out
    }

    fn header(&self) -> String {
        let mut out = format!(
            "; vesperc - x86-64 assembly ({})\n; Generated code\n\ndefault rel\nglobal main\nextern printf\n",
            self.target.description()
        );
        if self.target == Target::Win64 {
            out.push_str("extern ExitProcess\n");
        }
        if self.needs_fmod {
            out.push_str("extern fmod\n");
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CodeGenerator;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn generate(source: &str) -> String {
        generate_for(source, Target::SysV)
    }

    fn generate_for(source: &str, target: Target) -> String {
        let tokens = tokenize(source, "test.vsp");
        let program = Parser::new(&tokens).parse().expect("parse failed");
        X86Backend::with_target(target)
            .generate(&program)
            .expect("codegen failed")
            .code
    }

    fn generate_err(source: &str) -> CodeGenError {
        let tokens = tokenize(source, "test.vsp");
        let program = Parser::new(&tokens).parse().expect("parse failed");
        X86Backend::with_target(Target::SysV)
            .generate(&program)
            .expect_err("expected codegen failure")
    }

    #[test]
    fn test_first_local_lives_at_rbp_minus_8() {
        let asm = generate("let x: int = 2 + 3 * 4");
        assert!(asm.contains("mov [rbp-8], rax"));
        assert!(asm.contains("imul rax, rcx"));
        assert!(asm.contains("add rax, rcx"));
    }

    #[test]
    fn test_locals_are_assigned_sequentially() {
        let asm = generate("let a: int = 1 let b: int = 2 let c: int = 3");
        assert!(asm.contains("mov [rbp-8], rax"));
        assert!(asm.contains("mov [rbp-16], rax"));
        assert!(asm.contains("mov [rbp-24], rax"));
    }

    #[test]
    fn test_main_frame_is_exact_and_aligned() {
        // Three 8-byte locals round up to 32.
        let asm = generate("let a: int = 1 let b: int = 2 let c: int = 3");
        assert!(asm.contains("main:\n    push rbp\n    mov rbp, rsp\n    sub rsp, 32\n"));
    }

    #[test]
    fn test_empty_main_reserves_no_frame() {
        let asm = generate("io.print(1)");
        assert!(asm.contains("main:\n    push rbp\n    mov rbp, rsp\n    mov rax, 1"));
    }

    #[test]
    fn test_main_exit_sequence_sysv() {
        let asm = generate("");
        assert!(asm.contains("xor eax, eax\n    mov rsp, rbp\n    pop rbp\n    ret"));
    }

    #[test]
    fn test_win64_header_and_exit() {
        let asm = generate_for("", Target::Win64);
        assert!(asm.contains("extern ExitProcess"));
        assert!(asm.contains("xor ecx, ecx\n    call ExitProcess"));
        let sysv = generate("");
        assert!(!sysv.contains("ExitProcess"));
    }

    #[test]
    fn test_if_else_label_threading() {
        let asm = generate("if (1 < 2) { io.print(1) } else { io.print(0) }");
        assert!(asm.contains("jz .Lelse_0"));
        assert!(asm.contains("jmp .Lendif_1"));
        assert!(asm.contains(".Lelse_0:"));
        assert!(asm.contains(".Lendif_1:"));
    }

    #[test]
    fn test_while_label_threading() {
        let asm = generate("var i: int = 0 while (i < 3) { i = i + 1 }");
        assert!(asm.contains(".Lwhile_0:"));
        assert!(asm.contains("jz .Lendwhile_1"));
        assert!(asm.contains("jmp .Lwhile_0"));
        assert!(asm.contains(".Lendwhile_1:"));
    }

    #[test]
    fn test_for_label_threading() {
        let asm = generate("for (var i: int = 0 i < 3 i = i + 1) { io.print(i) }");
        assert!(asm.contains(".Lfor_0:"));
        assert!(asm.contains("jz .Lendfor_2"));
        assert!(asm.contains(".Lforupd_1:"));
        assert!(asm.contains("jmp .Lfor_0"));
    }

    #[test]
    fn test_break_and_continue_target_the_right_labels() {
        let asm = generate("while (true) { break }");
        assert!(asm.contains("jmp .Lendwhile_1"));
        let asm = generate("while (true) { continue }");
        assert!(asm.contains("jmp .Lwhile_0"));
        // In a for loop, continue goes to the update step.
        let asm = generate("for (var i: int = 0 i < 3 i = i + 1) { continue }");
        assert!(asm.contains("jmp .Lforupd_1"));
    }

    #[test]
    fn test_nested_loops_break_targets_inner() {
        let asm = generate("while (true) { while (false) { break } }");
        // Inner while allocates labels 2 and 3.
        assert!(asm.contains("jmp .Lendwhile_3"));
    }

    #[test]
    fn test_unchecked_break_outside_loop_is_an_internal_error() {
        // The checker rejects this earlier; the backend still refuses to
        // drop the statement silently when handed an unchecked tree.
        let err = generate_err("break");
        assert_eq!(
            err.to_string(),
            "Internal error: break outside of a loop survived checking"
        );
    }

    #[test]
    fn test_short_circuit_and_shape() {
        let asm = generate("if (1 < 2 && 3 > 0) { io.print(1) } else { io.print(0) }");
        // The surrounding if claims labels 0 and 1; the condition's
        // short-circuit labels follow. The left operand's test jumps
        // straight to the false label, skipping the right operand.
        assert!(asm.contains("jz .Land_false_2"));
        assert!(asm.contains("mov rax, 1\n    jmp .Land_end_3"));
        assert!(asm.contains(".Land_false_2:\n    xor eax, eax"));
    }

    #[test]
    fn test_short_circuit_or_shape() {
        let asm = generate("if (true || false) { }");
        assert!(asm.contains("jnz .Lor_true_2"));
        assert!(asm.contains(".Lor_true_2:\n    mov rax, 1"));
        assert!(asm.contains(".Lor_end_3:"));
    }

    #[test]
    fn test_division_and_remainder() {
        let asm = generate("let q: int = 7 / 2 let r: int = 7 % 2");
        assert!(asm.contains("cqo\n    idiv rcx"));
        assert!(asm.contains("mov rax, rdx"));
    }

    #[test]
    fn test_comparison_produces_01() {
        let asm = generate("let b: bool = 1 < 2");
        assert!(asm.contains("cmp rax, rcx\n    setl al\n    movzx rax, al"));
    }

    #[test]
    fn test_function_is_mangled_and_called() {
        let asm = generate("func add(a: int, b: int) => int { return a + b } io.print(add(2, 40))");
        assert!(asm.contains("_user_add:"));
        assert!(asm.contains("call _user_add"));
        // Parameters homed from the System V registers.
        assert!(asm.contains("mov [rbp-8], rdi"));
        assert!(asm.contains("mov [rbp-16], rsi"));
        // The printed value is an int by the callee's signature.
        assert!(asm.contains("call _print_int"));
    }

    #[test]
    fn test_function_frame_counts_params_and_locals() {
        let asm = generate(
            "func f(a: int, b: int) => int { let c: int = a + b let d: int = c return d }",
        );
        // Two params plus two locals: 32 bytes.
        assert!(asm.contains("_user_f:\n    push rbp\n    mov rbp, rsp\n    sub rsp, 32"));
    }

    #[test]
    fn test_functions_precede_main() {
        let asm = generate("func f() => int { return 1 } io.print(f())");
        let f_at = asm.find("_user_f:").unwrap();
        let main_at = asm.find("main:").unwrap();
        assert!(f_at < main_at);
    }

    #[test]
    fn test_print_dispatch_by_static_type() {
        let asm = generate("let s: string = \"hi\" io.print(s)");
        assert!(asm.contains("call _print_str"));

        let asm = generate("let f: float = 1.5 io.print(f)");
        assert!(asm.contains("call _print_float"));

        let asm = generate("let b: bool = true io.print(b)");
        assert!(asm.contains("mov edi, eax\n    call _print_bool"));

        let asm = generate("let n: int = 3 io.println(n)");
        assert!(asm.contains("call _print_int"));
    }

    #[test]
    fn test_print_dispatch_win64_registers() {
        let asm = generate_for("io.print(42)", Target::Win64);
        assert!(asm.contains("mov rcx, rax\n    call _print_int"));
    }

    #[test]
    fn test_string_literals_are_interned_and_emitted() {
        let asm = generate("let s: string = \"hi\" io.print(\"hi\")");
        // One label serves both occurrences.
        assert_eq!(asm.matches(".LC0: db").count(), 1);
        assert!(!asm.contains(".LC1"));
        assert!(asm.contains(".LC0: db 104, 105, 0"));
        assert!(asm.contains("lea rax, [.LC0]"));
    }

    #[test]
    fn test_distinct_strings_get_distinct_labels() {
        let asm = generate("io.print(\"a\") io.print(\"b\")");
        assert!(asm.contains(".LC0: db 97, 0"));
        assert!(asm.contains(".LC1: db 98, 0"));
    }

    #[test]
    fn test_empty_string_data() {
        let asm = generate("let s: string = \"\"");
        assert!(asm.contains(".LC0: db 0"));
    }

    #[test]
    fn test_float_literal_loads_bits() {
        let asm = generate("let f: float = 1.5");
        assert!(asm.contains(&format!("mov rax, {}", 1.5f64.to_bits())));
        assert!(asm.contains("movq xmm0, rax"));
        assert!(asm.contains("movsd [rbp-8], xmm0"));
    }

    #[test]
    fn test_float_arithmetic_rides_xmm() {
        let asm = generate("let a: float = 1.5 let b: float = a * 2.0 let c: float = a / b");
        assert!(asm.contains("mulsd xmm0, xmm1"));
        assert!(asm.contains("divsd xmm0, xmm1"));
        assert!(asm.contains("movsd xmm0, [rbp-8]"));
    }

    #[test]
    fn test_int_widens_to_float_at_binding() {
        let asm = generate("let f: float = 1");
        assert!(asm.contains("cvtsi2sd xmm0, rax"));
    }

    #[test]
    fn test_mixed_arithmetic_promotes_the_int_side() {
        let asm = generate("let f: float = 2.5 + 1");
        assert!(asm.contains("cvtsi2sd xmm0, rax"));
        assert!(asm.contains("addsd xmm0, xmm1"));
    }

    #[test]
    fn test_float_comparison_uses_ucomisd() {
        let asm = generate("let b: bool = 1.5 < 2.5");
        assert!(asm.contains("ucomisd xmm0, xmm1\n    setb al"));
    }

    #[test]
    fn test_float_negation_flips_sign_bit() {
        let asm = generate("let f: float = 1.5 let g: float = -f");
        assert!(asm.contains("btc rax, 63"));
    }

    #[test]
    fn test_float_remainder_pulls_in_fmod() {
        let asm = generate("let r: float = 5.5 % 2.0");
        assert!(asm.contains("extern fmod"));
        assert!(asm.contains("call fmod"));
        let asm = generate("let r: int = 5 % 2");
        assert!(!asm.contains("extern fmod"));
    }

    #[test]
    fn test_float_parameters_and_return() {
        let asm = generate("func half(x: float) => float { return x / 2.0 } io.print(half(5.0))");
        // Parameter arrives in xmm0 and is homed with movsd.
        assert!(asm.contains("movsd [rbp-8], xmm0"));
        // The call result is a float by signature, so print dispatches
        // to the float printer.
        assert!(asm.contains("call _print_float"));
    }

    #[test]
    fn test_string_concatenation_is_rejected() {
        let err = generate_err("let s: string = \"a\" + \"b\"");
        assert_eq!(err.to_string(), "Unsupported construct: string concatenation");
    }

    #[test]
    fn test_member_call_never_evaluates_the_object() {
        let asm = generate("io.print(1)");
        // `io` produces no code; the argument is evaluated directly.
        assert!(!asm.contains("xor eax, eax\n    mov rdi, rax\n    call _print_int"));
    }

    #[test]
    fn test_other_member_calls_dispatch_statically() {
        let asm = generate("sys.exit(0)");
        assert!(asm.contains("call _user_exit"));
    }

    #[test]
    fn test_bare_member_access_zeroes() {
        let asm = generate("let v: any = io.version");
        assert!(asm.contains("xor eax, eax\n    mov [rbp-8], rax"));
    }

    #[test]
    fn test_unary_operators() {
        let asm = generate("let a: int = -5 let b: bool = !true let c: int = ~0");
        assert!(asm.contains("neg rax"));
        assert!(asm.contains("setz al"));
        assert!(asm.contains("not rax"));
    }

    #[test]
    fn test_return_emits_epilogue() {
        let asm = generate("func f() => int { return 42 }");
        assert!(asm.contains("mov rax, 42\n    mov rsp, rbp\n    pop rbp\n    ret"));
    }

    #[test]
    fn test_many_arguments_overflow_to_the_stack() {
        let asm = generate(
            "func sum(a: int, b: int, c: int, d: int, e: int, f: int, g: int, h: int) => int { return a + h }\nio.print(sum(1, 2, 3, 4, 5, 6, 7, 8))",
        );
        // Two args beyond the six System V registers.
        assert!(asm.contains("push rax"));
        assert!(asm.contains("pop rdi"));
        assert!(asm.contains("pop r9"));
        // Callee loads the stack-passed params relative to rbp.
        assert!(asm.contains("mov rax, [rbp+16]"));
        assert!(asm.contains("mov rax, [rbp+24]"));
        // Caller cleans up the two pushed args.
        assert!(asm.contains("add rsp, 16"));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let source = "func add(a: int, b: int) => int { return a + b }\nvar i: int = 0\nwhile (i < 3) { i = i + 1 }\nio.print(add(2, 40))";
        let tokens = tokenize(source, "test.vsp");
        let program = Parser::new(&tokens).parse().unwrap();
        let backend = X86Backend::with_target(Target::SysV);
        let first = backend.generate(&program).unwrap().code;
        let second = backend.generate(&program).unwrap().code;
        assert_eq!(first, second);
    }

    #[test]
    fn test_program_layout_order() {
        let asm = generate("func f() => void { } io.print(1)");
        let text = asm.find("section .text").unwrap();
        let user = asm.find("_user_f:").unwrap();
        let builtin = asm.find("_print_int:").unwrap();
        let main_at = asm.find("main:").unwrap();
        let data = asm.find("section .data").unwrap();
        let bss = asm.find("section .bss").unwrap();
        assert!(text < user && user < builtin && builtin < main_at && main_at < data && data < bss);
    }

    #[test]
    fn test_classify_slots_sysv_mixed() {
        let flags = [false, true, false, true];
        let slots = classify_slots(Target::SysV, &flags);
        assert_eq!(slots[0], PassedIn::IntReg("rdi"));
        assert_eq!(slots[1], PassedIn::XmmReg(0));
        assert_eq!(slots[2], PassedIn::IntReg("rsi"));
        assert_eq!(slots[3], PassedIn::XmmReg(1));
    }

    #[test]
    fn test_classify_slots_win64_positional() {
        let flags = [false, true, false, true, false];
        let slots = classify_slots(Target::Win64, &flags);
        assert_eq!(slots[0], PassedIn::IntReg("rcx"));
        assert_eq!(slots[1], PassedIn::XmmReg(1));
        assert_eq!(slots[2], PassedIn::IntReg("r8"));
        assert_eq!(slots[3], PassedIn::XmmReg(3));
        assert_eq!(slots[4], PassedIn::Stack(0));
    }
}
