//! Expression emission and static type inference.
//!
//! Every expression leaves its result in `rax` (integer, bool, pointer)
//! or `xmm0` (float). Which register is in use follows from the
//! expression's static type, inferred here with the same rules the type
//! checker applies, so the two phases always agree.
//!
//! Binary integer arithmetic uses the push/pop pattern: evaluate the left
//! operand, push it, evaluate the right operand into `rcx` via `rax`, pop
//! the left back into `rax`, apply the operation. Float arithmetic spills
//! the left operand to the stack and pairs `xmm0`/`xmm1` instead.

use crate::ast::{BinaryOp, Expr, ExprKind, LiteralValue, Primitive, TypeInfo, UnaryOp};
use crate::codegen::CodeGenError;
use crate::lexer::Location;

use super::{classify_slots, Emitter, PassedIn, Target};

impl Emitter {
    /// Infers an expression's static type.
    ///
    /// Mirrors the type checker's expression rules over the code
    /// generator's own symbol table.
    pub(super) fn static_type(&self, expr: &Expr) -> TypeInfo {
        match &expr.kind {
            ExprKind::Literal { ty, .. } => *ty,
            ExprKind::Identifier(name) => self
                .lookup_local(name)
                .map(|local| local.ty)
                .unwrap_or(TypeInfo::ANY),
            ExprKind::Binary { op, left, right } => {
                if op.is_comparison() || op.is_logical() {
                    return TypeInfo::BOOL;
                }
                let left_type = self.static_type(left);
                let right_type = self.static_type(right);
                if left_type.primitive == Primitive::Float
                    || right_type.primitive == Primitive::Float
                {
                    TypeInfo::FLOAT
                } else if left_type.primitive == Primitive::String && *op == BinaryOp::Add {
                    TypeInfo::STRING
                } else {
                    TypeInfo::INT
                }
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not => TypeInfo::BOOL,
                UnaryOp::Negate => self.static_type(operand),
                UnaryOp::BitNot => TypeInfo::INT,
            },
            ExprKind::Call { callee, .. } => {
                if let ExprKind::Identifier(name) = &callee.kind {
                    if let Some(signature) = self.functions.get(name) {
                        return signature.return_type;
                    }
                }
                TypeInfo::ANY
            }
            ExprKind::Member { .. } => TypeInfo::ANY,
        }
    }

    /// Emits an expression, leaving the value in `rax` or `xmm0`
    /// according to the returned type.
    pub(super) fn emit_expression(&mut self, expr: &Expr) -> Result<TypeInfo, CodeGenError> {
        match &expr.kind {
            ExprKind::Literal { value, ty } => {
                match value {
                    LiteralValue::Int(n) => self.emit(format!("mov rax, {n}")),
                    LiteralValue::Float(f) => {
                        // Load the IEEE-754 bits through a general
                        // register; NASM has no float immediates.
                        self.emit(format!("mov rax, {}", f.to_bits()));
                        self.emit("movq xmm0, rax");
                    }
                    LiteralValue::Bool(b) => {
                        self.emit(format!("mov rax, {}", i64::from(*b)))
                    }
                    LiteralValue::Char(c) => self.emit(format!("mov rax, {}", *c as u32)),
                    LiteralValue::Str(s) => {
                        let label = self.intern_string(s);
                        self.emit(format!("lea rax, [{label}]"));
                    }
                }
                Ok(*ty)
            }

            ExprKind::Identifier(name) => {
                let local = self.lookup_local(name).ok_or_else(|| {
                    CodeGenError::internal(format!("unresolved identifier '{name}'"))
                        .at(expr.location.clone())
                })?;
                if local.ty.primitive == Primitive::Float {
                    self.emit(format!("movsd xmm0, [rbp-{}]", local.offset));
                } else {
                    self.emit(format!("mov rax, [rbp-{}]", local.offset));
                }
                Ok(local.ty)
            }

            ExprKind::Binary { op, left, right } => {
                self.emit_binary(*op, left, right, &expr.location)
            }

            ExprKind::Unary { op, operand } => {
                let operand_type = self.emit_expression(operand)?;
                match op {
                    UnaryOp::Not => {
                        self.emit("test rax, rax");
                        self.emit("setz al");
                        self.emit("movzx rax, al");
                        Ok(TypeInfo::BOOL)
                    }
                    UnaryOp::Negate => {
                        if operand_type.primitive == Primitive::Float {
                            // Flip the sign bit.
                            self.emit("movq rax, xmm0");
                            self.emit("btc rax, 63");
                            self.emit("movq xmm0, rax");
                        } else {
                            self.emit("neg rax");
                        }
                        Ok(operand_type)
                    }
                    UnaryOp::BitNot => {
                        if operand_type.primitive == Primitive::Float {
                            self.emit("movq rax, xmm0");
                        }
                        self.emit("not rax");
                        Ok(TypeInfo::INT)
                    }
                }
            }

            ExprKind::Call { callee, args } => self.emit_call(callee, args, &expr.location),

            // Member access in value position has nothing behind it; the
            // object is a namespace name. Produce a zero of type `any`.
            ExprKind::Member { .. } => {
                self.emit("xor eax, eax");
                Ok(TypeInfo::ANY)
            }
        }
    }

    /// Emits an expression and converts the value to the class `ty`
    /// requires: `cvtsi2sd` widens integers into `xmm0` for float
    /// targets, float bits move to `rax` for everything else.
    pub(super) fn emit_value_into(
        &mut self,
        ty: &TypeInfo,
        value: &Expr,
    ) -> Result<(), CodeGenError> {
        let value_type = self.emit_expression(value)?;
        let have_float = value_type.primitive == Primitive::Float;
        let want_float = ty.primitive == Primitive::Float;
        if want_float && !have_float {
            self.emit("cvtsi2sd xmm0, rax");
        } else if have_float && !want_float {
            self.emit("movq rax, xmm0");
        }
        Ok(())
    }

    // ==================== Binary Operations ====================

    fn emit_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        location: &Location,
    ) -> Result<TypeInfo, CodeGenError> {
        // Short-circuit operators never evaluate the right operand when
        // the left already decides the result.
        if op == BinaryOp::And {
            let false_label = self.new_label(".Land_false");
            let end_label = self.new_label(".Land_end");

            self.emit_expression(left)?;
            self.emit("test rax, rax");
            self.emit(format!("jz {false_label}"));

            self.emit_expression(right)?;
            self.emit("test rax, rax");
            self.emit(format!("jz {false_label}"));

            self.emit("mov rax, 1");
            self.emit(format!("jmp {end_label}"));
            self.emit_label(&false_label);
            self.emit("xor eax, eax");
            self.emit_label(&end_label);
            return Ok(TypeInfo::BOOL);
        }

        if op == BinaryOp::Or {
            let true_label = self.new_label(".Lor_true");
            let end_label = self.new_label(".Lor_end");

            self.emit_expression(left)?;
            self.emit("test rax, rax");
            self.emit(format!("jnz {true_label}"));

            self.emit_expression(right)?;
            self.emit("test rax, rax");
            self.emit(format!("jnz {true_label}"));

            self.emit("xor eax, eax");
            self.emit(format!("jmp {end_label}"));
            self.emit_label(&true_label);
            self.emit("mov rax, 1");
            self.emit_label(&end_label);
            return Ok(TypeInfo::BOOL);
        }

        let left_type = self.static_type(left);
        let right_type = self.static_type(right);

        if op == BinaryOp::Add && left_type.primitive == Primitive::String {
            return Err(CodeGenError::unsupported("string concatenation").at(location.clone()));
        }

        if left_type.primitive == Primitive::Float || right_type.primitive == Primitive::Float {
            self.emit_float_binary(op, left, right)
        } else {
            self.emit_int_binary(op, left, right)
        }
    }

    fn emit_int_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<TypeInfo, CodeGenError> {
        self.emit_expression(left)?;
        self.emit("push rax");
        self.emit_expression(right)?;
        self.emit("mov rcx, rax");
        self.emit("pop rax");

        match op {
            BinaryOp::Add => self.emit("add rax, rcx"),
            BinaryOp::Subtract => self.emit("sub rax, rcx"),
            BinaryOp::Multiply => self.emit("imul rax, rcx"),
            BinaryOp::Divide => {
                self.emit("cqo");
                self.emit("idiv rcx");
            }
            BinaryOp::Modulo => {
                self.emit("cqo");
                self.emit("idiv rcx");
                self.emit("mov rax, rdx");
            }
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::LessThan
            | BinaryOp::GreaterThan
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual => {
                self.emit("cmp rax, rcx");
                self.emit(format!("{} al", int_setcc(op)));
                self.emit("movzx rax, al");
                return Ok(TypeInfo::BOOL);
            }
            BinaryOp::And | BinaryOp::Or => {
                return Err(CodeGenError::internal("logical operator in arithmetic path"));
            }
        }
        Ok(TypeInfo::INT)
    }

    fn emit_float_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<TypeInfo, CodeGenError> {
        let left_type = self.emit_expression(left)?;
        if left_type.primitive != Primitive::Float {
            self.emit("cvtsi2sd xmm0, rax");
        }
        self.emit("sub rsp, 8");
        self.emit("movsd [rsp], xmm0");

        let right_type = self.emit_expression(right)?;
        if right_type.primitive != Primitive::Float {
            self.emit("cvtsi2sd xmm0, rax");
        }
        self.emit("movsd xmm1, xmm0");
        self.emit("movsd xmm0, [rsp]");
        self.emit("add rsp, 8");

        match op {
            BinaryOp::Add => self.emit("addsd xmm0, xmm1"),
            BinaryOp::Subtract => self.emit("subsd xmm0, xmm1"),
            BinaryOp::Multiply => self.emit("mulsd xmm0, xmm1"),
            BinaryOp::Divide => self.emit("divsd xmm0, xmm1"),
            BinaryOp::Modulo => {
                self.needs_fmod = true;
                if self.target() == Target::Win64 {
                    self.emit("sub rsp, 32");
                    self.emit("call fmod");
                    self.emit("add rsp, 32");
                } else {
                    self.emit("call fmod");
                }
            }
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::LessThan
            | BinaryOp::GreaterThan
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual => {
                self.emit("ucomisd xmm0, xmm1");
                self.emit(format!("{} al", float_setcc(op)));
                self.emit("movzx rax, al");
                return Ok(TypeInfo::BOOL);
            }
            BinaryOp::And | BinaryOp::Or => {
                return Err(CodeGenError::internal("logical operator in arithmetic path"));
            }
        }
        Ok(TypeInfo::FLOAT)
    }

    // ==================== Calls ====================

    fn emit_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        location: &Location,
    ) -> Result<TypeInfo, CodeGenError> {
        match &callee.kind {
            // Member calls are module calls: the object names a
            // namespace and is never evaluated. `print`/`println`
            // dispatch to the builtin runtime; anything else is static
            // dispatch by property name.
            ExprKind::Member { property, .. } => {
                if property == "print" || property == "println" {
                    self.emit_print_call(args)?;
                    return Ok(TypeInfo::ANY);
                }
                let label = format!("_user_{property}");
                self.emit_user_call(&label, args, None)?;
                Ok(TypeInfo::ANY)
            }

            ExprKind::Identifier(name) => {
                let signature = self.functions.get(name).cloned();
                let label = format!("_user_{name}");
                let params = signature.as_ref().map(|s| s.params.clone());
                self.emit_user_call(&label, args, params.as_deref())?;
                Ok(signature
                    .map(|s| s.return_type)
                    .unwrap_or(TypeInfo::ANY))
            }

            _ => Err(
                CodeGenError::internal("computed call target survived checking")
                    .at(location.clone()),
            ),
        }
    }

    /// Emits the builtin print dispatch: the first argument's static
    /// type selects the runtime printer.
    fn emit_print_call(&mut self, args: &[Expr]) -> Result<(), CodeGenError> {
        if let Some(first) = args.first() {
            let ty = self.emit_expression(first)?;
            let reg = self.target().first_int_arg();
            match ty.primitive {
                Primitive::String => {
                    self.emit(format!("mov {reg}, rax"));
                    self.emit("call _print_str");
                }
                Primitive::Float => {
                    // Value already sits in xmm0.
                    self.emit("call _print_float");
                }
                Primitive::Bool => {
                    let reg32 = match self.target() {
                        Target::SysV => "edi",
                        Target::Win64 => "ecx",
                    };
                    self.emit(format!("mov {reg32}, eax"));
                    self.emit("call _print_bool");
                }
                _ => {
                    self.emit(format!("mov {reg}, rax"));
                    self.emit("call _print_int");
                }
            }
        }
        self.emit("xor eax, eax");
        Ok(())
    }

    /// Emits argument passing and the call itself.
    ///
    /// Register arguments are evaluated left-to-right and staged on the
    /// stack, then popped into their registers right-to-left, so no
    /// argument's evaluation can clobber a register that is already
    /// loaded. Excess arguments are pushed right-to-left and cleaned up
    /// after the call.
    fn emit_user_call(
        &mut self,
        label: &str,
        args: &[Expr],
        params: Option<&[TypeInfo]>,
    ) -> Result<(), CodeGenError> {
        let float_flags: Vec<bool> = args
            .iter()
            .enumerate()
            .map(|(i, arg)| match params.and_then(|p| p.get(i)) {
                Some(param) if param.primitive == Primitive::Float => true,
                Some(param) if param.primitive == Primitive::Any => {
                    self.static_type(arg).primitive == Primitive::Float
                }
                Some(_) => false,
                None => self.static_type(arg).primitive == Primitive::Float,
            })
            .collect();
        let slots = classify_slots(self.target(), &float_flags);

        let stack_count = slots
            .iter()
            .filter(|slot| matches!(slot, PassedIn::Stack(_)))
            .count();
        // Keep rsp 16-aligned at the call when an odd number of
        // arguments stays on the stack.
        let pad = stack_count % 2 == 1;
        if pad {
            self.emit("sub rsp, 8");
        }

        for index in (0..args.len()).rev() {
            if matches!(slots[index], PassedIn::Stack(_)) {
                self.emit_argument_bits(&args[index], float_flags[index])?;
                self.emit("push rax");
            }
        }
        for index in 0..args.len() {
            if !matches!(slots[index], PassedIn::Stack(_)) {
                self.emit_argument_bits(&args[index], float_flags[index])?;
                self.emit("push rax");
            }
        }
        for index in (0..args.len()).rev() {
            match &slots[index] {
                PassedIn::IntReg(reg) => self.emit(format!("pop {reg}")),
                PassedIn::XmmReg(n) => {
                    self.emit("pop rax");
                    self.emit(format!("movq xmm{n}, rax"));
                }
                PassedIn::Stack(_) => {}
            }
        }

        let shadow: i64 = match self.target() {
            Target::Win64 => 32,
            Target::SysV => 0,
        };
        if shadow > 0 {
            self.emit(format!("sub rsp, {shadow}"));
        }
        self.emit(format!("call {label}"));
        let cleanup = shadow + stack_count as i64 * 8 + if pad { 8 } else { 0 };
        if cleanup > 0 {
            self.emit(format!("add rsp, {cleanup}"));
        }
        Ok(())
    }

    /// Evaluates one argument and leaves its transfer bits in `rax`,
    /// widening integers when the parameter takes a float.
    fn emit_argument_bits(&mut self, arg: &Expr, want_float: bool) -> Result<(), CodeGenError> {
        let ty = self.emit_expression(arg)?;
        let have_float = ty.primitive == Primitive::Float;
        if want_float && !have_float {
            self.emit("cvtsi2sd xmm0, rax");
            self.emit("movq rax, xmm0");
        } else if have_float {
            self.emit("movq rax, xmm0");
        }
        Ok(())
    }
}

/// setcc mnemonic for an integer comparison.
fn int_setcc(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Equal => "sete",
        BinaryOp::NotEqual => "setne",
        BinaryOp::LessThan => "setl",
        BinaryOp::GreaterThan => "setg",
        BinaryOp::LessEqual => "setle",
        BinaryOp::GreaterEqual => "setge",
        _ => unreachable!("not a comparison"),
    }
}

/// setcc mnemonic for a float comparison; `ucomisd` sets the unsigned
/// flags.
fn float_setcc(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Equal => "sete",
        BinaryOp::NotEqual => "setne",
        BinaryOp::LessThan => "setb",
        BinaryOp::GreaterThan => "seta",
        BinaryOp::LessEqual => "setbe",
        BinaryOp::GreaterEqual => "setae",
        _ => unreachable!("not a comparison"),
    }
}
