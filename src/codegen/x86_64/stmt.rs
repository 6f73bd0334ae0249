//! Statement emission.
//!
//! Control-flow label naming follows a fixed schema (`.Lelse_N`,
//! `.Lendif_N`, `.Lwhile_N`, `.Lendwhile_N`, `.Lfor_N`, `.Lforupd_N`,
//! `.Lendfor_N`), all drawn from one monotonic counter, so labels are
//! unique within a compilation unit. Loops push their break/continue
//! targets onto an explicit stack; `break` jumps to the loop's end label,
//! `continue` to the condition (`while`) or the update step (`for`).

use crate::ast::{Primitive, Statement, StatementKind};
use crate::codegen::CodeGenError;

use super::{classify_slots, frame, Emitter, LoopLabels, PassedIn};

impl Emitter {
    /// Emits a user function under its mangled `_user_<name>` label.
    pub(super) fn emit_function(&mut self, statement: &Statement) -> Result<(), CodeGenError> {
        let StatementKind::Function {
            name,
            params,
            return_type,
            body,
        } = &statement.kind
        else {
            return Err(CodeGenError::internal("emit_function on a non-function statement"));
        };

        self.frame_offset = 0;
        self.current_return = *return_type;
        let slots = params.len() + frame::slots_in_all(body);
        let frame_bytes = frame::frame_bytes(slots);
        log::debug!("function {name}: {slots} locals, {frame_bytes} bytes");

        self.emit_label(&format!("_user_{name}"));
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        if frame_bytes > 0 {
            self.emit(format!("sub rsp, {frame_bytes}"));
        }

        self.enter_scope();

        // Home every parameter into its own local slot.
        let float_flags: Vec<bool> = params
            .iter()
            .map(|p| p.ty.primitive == Primitive::Float)
            .collect();
        let passed = classify_slots(self.target(), &float_flags);
        let stack_base = self.target().stack_arg_base();
        for (param, passed_in) in params.iter().zip(passed) {
            let offset = self.declare_local(&param.name, param.ty, false);
            match passed_in {
                PassedIn::IntReg(reg) => self.emit(format!("mov [rbp-{offset}], {reg}")),
                PassedIn::XmmReg(n) => self.emit(format!("movsd [rbp-{offset}], xmm{n}")),
                PassedIn::Stack(slot) => {
                    self.emit(format!("mov rax, [rbp+{}]", stack_base + slot * 8));
                    self.emit(format!("mov [rbp-{offset}], rax"));
                }
            }
        }

        for s in body {
            self.emit_statement(s)?;
        }

        // Fallthrough return.
        self.emit("xor eax, eax");
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");

        self.exit_scope();
        Ok(())
    }

    /// Emits a single statement.
    pub(super) fn emit_statement(&mut self, statement: &Statement) -> Result<(), CodeGenError> {
        match &statement.kind {
            StatementKind::Let {
                name,
                ty,
                value,
                mutable,
            } => {
                self.emit_comment(format!("let {name}"));
                self.emit_value_into(ty, value)?;
                let offset = self.declare_local(name, *ty, *mutable);
                if ty.primitive == Primitive::Float {
                    self.emit(format!("movsd [rbp-{offset}], xmm0"));
                } else {
                    self.emit(format!("mov [rbp-{offset}], rax"));
                }
                Ok(())
            }

            StatementKind::Assign { target, value } => {
                self.emit_comment(format!("assign {target}"));
                let local = self.lookup_local(target).ok_or_else(|| {
                    CodeGenError::internal(format!("unresolved assignment target '{target}'"))
                        .at(statement.location.clone())
                })?;
                if !local.mutable {
                    return Err(CodeGenError::internal(format!(
                        "assignment to immutable binding '{target}' survived checking"
                    ))
                    .at(statement.location.clone()));
                }
                self.emit_value_into(&local.ty, value)?;
                if local.ty.primitive == Primitive::Float {
                    self.emit(format!("movsd [rbp-{}], xmm0", local.offset));
                } else {
                    self.emit(format!("mov [rbp-{}], rax", local.offset));
                }
                Ok(())
            }

            StatementKind::Expr(expr) => {
                self.emit_expression(expr)?;
                Ok(())
            }

            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let else_label = self.new_label(".Lelse");
                let end_label = self.new_label(".Lendif");

                self.emit_comment("if");
                self.emit_expression(condition)?;
                self.emit("test rax, rax");
                self.emit(format!("jz {else_label}"));

                self.enter_scope();
                let result = self.emit_all(then_branch);
                self.exit_scope();
                result?;
                self.emit(format!("jmp {end_label}"));

                self.emit_label(&else_label);
                if !else_branch.is_empty() {
                    self.enter_scope();
                    let result = self.emit_all(else_branch);
                    self.exit_scope();
                    result?;
                }

                self.emit_label(&end_label);
                Ok(())
            }

            StatementKind::While { condition, body } => {
                let start_label = self.new_label(".Lwhile");
                let end_label = self.new_label(".Lendwhile");

                self.emit_label(&start_label);
                self.emit_comment("while condition");
                self.emit_expression(condition)?;
                self.emit("test rax, rax");
                self.emit(format!("jz {end_label}"));

                self.loops.push(LoopLabels {
                    break_label: end_label.clone(),
                    continue_label: start_label.clone(),
                });
                self.enter_scope();
                let result = self.emit_all(body);
                self.exit_scope();
                self.loops.pop();
                result?;

                self.emit(format!("jmp {start_label}"));
                self.emit_label(&end_label);
                Ok(())
            }

            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let start_label = self.new_label(".Lfor");
                let update_label = self.new_label(".Lforupd");
                let end_label = self.new_label(".Lendfor");

                self.enter_scope();
                let result = (|| {
                    self.emit_statement(init)?;

                    self.emit_label(&start_label);
                    self.emit_comment("for condition");
                    self.emit_expression(condition)?;
                    self.emit("test rax, rax");
                    self.emit(format!("jz {end_label}"));

                    self.loops.push(LoopLabels {
                        break_label: end_label.clone(),
                        continue_label: update_label.clone(),
                    });
                    let body_result = self.emit_all(body);
                    self.loops.pop();
                    body_result?;

                    self.emit_label(&update_label);
                    self.emit_statement(update)?;
                    self.emit(format!("jmp {start_label}"));
                    self.emit_label(&end_label);
                    Ok(())
                })();
                self.exit_scope();
                result
            }

            StatementKind::Return { value } => {
                self.emit_comment("return");
                match value {
                    Some(expr) => {
                        let return_type = self.current_return;
                        self.emit_value_into(&return_type, expr)?;
                    }
                    None => self.emit("xor eax, eax"),
                }
                self.emit("mov rsp, rbp");
                self.emit("pop rbp");
                self.emit("ret");
                Ok(())
            }

            StatementKind::Break => match self.loops.last() {
                Some(labels) => {
                    let label = labels.break_label.clone();
                    self.emit(format!("jmp {label}"));
                    Ok(())
                }
                None => Err(CodeGenError::internal(
                    "break outside of a loop survived checking",
                )
                .at(statement.location.clone())),
            },

            StatementKind::Continue => match self.loops.last() {
                Some(labels) => {
                    let label = labels.continue_label.clone();
                    self.emit(format!("jmp {label}"));
                    Ok(())
                }
                None => Err(CodeGenError::internal(
                    "continue outside of a loop survived checking",
                )
                .at(statement.location.clone())),
            },

            // Only top-level functions are emitted; one nested in a body
            // has no surrounding machinery to live in.
            StatementKind::Function { .. } => Ok(()),

            StatementKind::Import { .. } => Ok(()),
        }
    }

    /// Emits a statement sequence in the current scope.
    fn emit_all(&mut self, statements: &[Statement]) -> Result<(), CodeGenError> {
        for statement in statements {
            self.emit_statement(statement)?;
        }
        Ok(())
    }
}
