//! The builtin I/O runtime and the data/bss sections.
//!
//! Four tiny procedures are inlined into every program; each delegates to
//! the C runtime's `printf` with a fixed format string. Boolean printing
//! selects between the interned `"true"`/`"false"` strings with `cmovz`.
//!
//! The data section carries the format strings followed by every interned
//! string literal as NUL-terminated decimal byte sequences.

use super::{Emitter, Target};

impl Emitter {
    /// Emits the four builtin printers into the text section.
    pub(super) fn emit_builtin_print(&mut self) {
        self.emit_label("_print_int");
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        self.emit("sub rsp, 32");
        match self.target() {
            Target::Win64 => {
                self.emit("mov rdx, rcx");
                self.emit("lea rcx, [fmt_int]");
            }
            Target::SysV => {
                self.emit("mov rsi, rdi");
                self.emit("lea rdi, [fmt_int]");
                self.emit("xor eax, eax");
            }
        }
        self.emit("call printf");
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");
        self.blank_line();

        self.emit_label("_print_float");
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        self.emit("sub rsp, 32");
        match self.target() {
            Target::Win64 => {
                // Varargs on this convention want the float mirrored in
                // the integer register as well.
                self.emit("movsd xmm1, xmm0");
                self.emit("movq rdx, xmm1");
                self.emit("lea rcx, [fmt_float]");
            }
            Target::SysV => {
                self.emit("lea rdi, [fmt_float]");
                self.emit("mov eax, 1");
            }
        }
        self.emit("call printf");
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");
        self.blank_line();

        self.emit_label("_print_str");
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        self.emit("sub rsp, 32");
        match self.target() {
            Target::Win64 => {
                self.emit("mov rdx, rcx");
                self.emit("lea rcx, [fmt_str]");
            }
            Target::SysV => {
                self.emit("mov rsi, rdi");
                self.emit("lea rdi, [fmt_str]");
                self.emit("xor eax, eax");
            }
        }
        self.emit("call printf");
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");
        self.blank_line();

        self.emit_label("_print_bool");
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        self.emit("sub rsp, 32");
        match self.target() {
            Target::Win64 => {
                self.emit("test ecx, ecx");
                self.emit("lea rdx, [str_true]");
                self.emit("lea rax, [str_false]");
                self.emit("cmovz rdx, rax");
                self.emit("lea rcx, [fmt_str]");
            }
            Target::SysV => {
                self.emit("test edi, edi");
                self.emit("lea rsi, [str_true]");
                self.emit("lea rax, [str_false]");
                self.emit("cmovz rsi, rax");
                self.emit("lea rdi, [fmt_str]");
                self.emit("xor eax, eax");
            }
        }
        self.emit("call printf");
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");
    }

    /// Renders the `.data` section: format strings, boolean spellings,
    /// and every interned string literal as decimal bytes.
    pub(super) fn data_section(&self) -> String {
        let mut out = String::from("\nsection .data\n");
        out.push_str("    fmt_int: db \"%lld\", 10, 0\n");
        out.push_str("    fmt_float: db \"%g\", 10, 0\n");
        out.push_str("    fmt_str: db \"%s\", 10, 0\n");
        out.push_str("    str_true: db \"true\", 0\n");
        out.push_str("    str_false: db \"false\", 0\n");

        for (label, content) in &self.interned {
            let mut bytes: Vec<String> = content.bytes().map(|b| b.to_string()).collect();
            bytes.push("0".to_string());
            out.push_str(&format!("    {label}: db {}\n", bytes.join(", ")));
        }
        out
    }
}
