//! Statement and expression checking rules.
//!
//! Statements are validated for their side conditions (compatibility at
//! bindings and assignments, boolean conditions, return placement);
//! expressions are assigned types bottom-up. The walk mirrors the lexical
//! structure: every block gets its own scope.

use crate::ast::{
    BinaryOp, Expr, ExprKind, Primitive, Statement, StatementKind, TypeInfo, UnaryOp,
};

use super::{SemanticError, TypeChecker};

impl TypeChecker {
    /// Checks a single statement.
    pub(crate) fn check_statement(&mut self, statement: &Statement) -> Result<(), SemanticError> {
        match &statement.kind {
            StatementKind::Let {
                name,
                ty,
                value,
                mutable,
            } => {
                let value_type = self.check_expression(value)?;
                if !value_type.is_compatible_with(ty) {
                    return Err(SemanticError::TypeMismatch {
                        expected: *ty,
                        found: value_type,
                        location: statement.location.clone(),
                    });
                }
                // The binding takes the declared type, not the value's.
                self.scopes.declare(name.clone(), *ty, *mutable);
                Ok(())
            }

            StatementKind::Assign { target, value } => {
                let Some(variable) = self.scopes.lookup(target) else {
                    return Err(SemanticError::UndefinedVariable {
                        name: target.clone(),
                        location: statement.location.clone(),
                    });
                };
                if !variable.mutable {
                    return Err(SemanticError::AssignToImmutable {
                        name: target.clone(),
                        location: statement.location.clone(),
                    });
                }
                let value_type = self.check_expression(value)?;
                if !value_type.is_compatible_with(&variable.ty) {
                    return Err(SemanticError::AssignmentTypeMismatch {
                        expected: variable.ty,
                        found: value_type,
                        location: statement.location.clone(),
                    });
                }
                Ok(())
            }

            StatementKind::Expr(expr) => {
                self.check_expression(expr)?;
                Ok(())
            }

            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_condition(condition, &statement.location)?;

                self.scopes.enter();
                let result = self.check_all(then_branch);
                self.scopes.exit();
                result?;

                if !else_branch.is_empty() {
                    self.scopes.enter();
                    let result = self.check_all(else_branch);
                    self.scopes.exit();
                    result?;
                }
                Ok(())
            }

            StatementKind::While { condition, body } => {
                self.check_condition(condition, &statement.location)?;
                self.scopes.enter();
                self.loop_depth += 1;
                let result = self.check_all(body);
                self.loop_depth -= 1;
                self.scopes.exit();
                result
            }

            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                // One scope covers the whole header and body, so loop
                // locals declared by the init are visible throughout and
                // invisible afterwards. Only the body counts as loop
                // context; init and update run outside the loop's jump
                // targets.
                self.scopes.enter();
                let result = (|| {
                    self.check_statement(init)?;
                    self.check_condition(condition, &statement.location)?;
                    self.check_statement(update)?;
                    self.loop_depth += 1;
                    let body_result = self.check_all(body);
                    self.loop_depth -= 1;
                    body_result
                })();
                self.scopes.exit();
                result
            }

            StatementKind::Function {
                name,
                params,
                return_type,
                body,
            } => {
                let param_types = params.iter().map(|p| p.ty).collect();
                self.functions.declare(name.clone(), param_types, *return_type);

                let saved_return = self.current_return;
                let saved_in_function = self.in_function;
                let saved_loop_depth = self.loop_depth;
                self.current_return = *return_type;
                self.in_function = true;
                // A surrounding loop does not reach into the body.
                self.loop_depth = 0;

                self.scopes.enter();
                for param in params {
                    self.scopes.declare(param.name.clone(), param.ty, false);
                }
                let result = self.check_all(body);
                self.scopes.exit();

                self.current_return = saved_return;
                self.in_function = saved_in_function;
                self.loop_depth = saved_loop_depth;
                result
            }

            StatementKind::Return { value } => {
                if !self.in_function {
                    return Err(SemanticError::ReturnOutsideFunction {
                        location: statement.location.clone(),
                    });
                }
                match value {
                    Some(expr) => {
                        let value_type = self.check_expression(expr)?;
                        if !value_type.is_compatible_with(&self.current_return) {
                            return Err(SemanticError::ReturnTypeMismatch {
                                expected: self.current_return,
                                found: value_type,
                                location: statement.location.clone(),
                            });
                        }
                    }
                    None => {
                        if self.current_return.primitive != Primitive::Void {
                            return Err(SemanticError::MissingReturnValue {
                                location: statement.location.clone(),
                            });
                        }
                    }
                }
                Ok(())
            }

            StatementKind::Break => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::BreakOutsideLoop {
                        location: statement.location.clone(),
                    });
                }
                Ok(())
            }

            StatementKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::ContinueOutsideLoop {
                        location: statement.location.clone(),
                    });
                }
                Ok(())
            }

            // Imports are recorded by the parser and carry no semantics.
            StatementKind::Import { .. } => Ok(()),
        }
    }

    /// Checks a sequence of statements in the current scope.
    fn check_all(&mut self, statements: &[Statement]) -> Result<(), SemanticError> {
        for statement in statements {
            self.check_statement(statement)?;
        }
        Ok(())
    }

    /// Checks a loop or branch condition, which must be `bool` or `any`.
    fn check_condition(
        &mut self,
        condition: &Expr,
        location: &crate::lexer::Location,
    ) -> Result<(), SemanticError> {
        let condition_type = self.check_expression(condition)?;
        if !condition_type.is_truth_testable() {
            return Err(SemanticError::NonBooleanCondition {
                found: condition_type,
                location: location.clone(),
            });
        }
        Ok(())
    }

    /// Infers the type of an expression, checking its side conditions.
    pub(crate) fn check_expression(&mut self, expr: &Expr) -> Result<TypeInfo, SemanticError> {
        match &expr.kind {
            ExprKind::Literal { ty, .. } => Ok(*ty),

            ExprKind::Identifier(name) => match self.scopes.lookup(name) {
                Some(variable) => Ok(variable.ty),
                None => Err(SemanticError::UndefinedVariable {
                    name: name.clone(),
                    location: expr.location.clone(),
                }),
            },

            ExprKind::Binary { op, left, right } => {
                let left_type = self.check_expression(left)?;
                let right_type = self.check_expression(right)?;

                if op.is_comparison() {
                    return Ok(TypeInfo::BOOL);
                }

                if op.is_logical() {
                    for operand_type in [left_type, right_type] {
                        if !operand_type.is_truth_testable() {
                            return Err(SemanticError::NonBooleanLogicalOperand {
                                found: operand_type,
                                location: expr.location.clone(),
                            });
                        }
                    }
                    return Ok(TypeInfo::BOOL);
                }

                // Arithmetic: floats are contagious, `string + _` stays a
                // string, everything else is an int.
                if left_type.primitive == Primitive::Float
                    || right_type.primitive == Primitive::Float
                {
                    Ok(TypeInfo::FLOAT)
                } else if left_type.primitive == Primitive::String && *op == BinaryOp::Add {
                    Ok(TypeInfo::STRING)
                } else {
                    Ok(TypeInfo::INT)
                }
            }

            ExprKind::Unary { op, operand } => {
                let operand_type = self.check_expression(operand)?;
                match op {
                    UnaryOp::Not => {
                        if !operand_type.is_truth_testable() {
                            return Err(SemanticError::NonBooleanNotOperand {
                                found: operand_type,
                                location: expr.location.clone(),
                            });
                        }
                        Ok(TypeInfo::BOOL)
                    }
                    UnaryOp::Negate => Ok(operand_type),
                    UnaryOp::BitNot => Ok(TypeInfo::INT),
                }
            }

            ExprKind::Call { callee, args } => self.check_call(callee, args, expr),

            // Member access types as `any`. The object is a namespace
            // name, not a variable reference, and is not resolved.
            ExprKind::Member { .. } => Ok(TypeInfo::ANY),
        }
    }

    /// Checks a call expression.
    ///
    /// Only plain names and member accesses may be called; anything else
    /// (a call result, a literal) has no callable behind it. A known
    /// function's signature is enforced; unknown callees (including
    /// member calls) type as `any`, with their arguments still checked
    /// for their own side conditions.
    fn check_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        call: &Expr,
    ) -> Result<TypeInfo, SemanticError> {
        if !matches!(callee.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
            return Err(SemanticError::InvalidCallTarget {
                location: callee.location.clone(),
            });
        }

        if let ExprKind::Identifier(name) = &callee.kind {
            if let Some(signature) = self.functions.lookup(name) {
                let params = signature.params.clone();
                let return_type = signature.return_type;

                if args.len() != params.len() {
                    return Err(SemanticError::ArgumentCountMismatch {
                        name: name.clone(),
                        expected: params.len(),
                        found: args.len(),
                        location: call.location.clone(),
                    });
                }
                for (position, (arg, param_type)) in args.iter().zip(&params).enumerate() {
                    let arg_type = self.check_expression(arg)?;
                    if !arg_type.is_compatible_with(param_type) {
                        return Err(SemanticError::ArgumentTypeMismatch {
                            name: name.clone(),
                            position,
                            location: call.location.clone(),
                        });
                    }
                }
                return Ok(return_type);
            }
        }

        for arg in args {
            self.check_expression(arg)?;
        }
        Ok(TypeInfo::ANY)
    }
}
