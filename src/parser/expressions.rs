//! Expression parsing using precedence climbing.
//!
//! A single recursive function parameterized by a minimum precedence
//! handles all binary operators; unary operators and primaries are parsed
//! by dedicated functions below it. All binary operators are
//! left-associative.
//!
//! # Precedence Levels (lowest to highest)
//!
//! 1. `||`
//! 2. `&&`
//! 3. `==`, `!=`
//! 4. `<`, `>`, `<=`, `>=`
//! 5. `+`, `-`
//! 6. `*`, `/`, `%`
//!
//! Unary `!`, `-`, `~` bind tighter than any binary operator. Assignment
//! is not an expression; it is handled at the statement level.

use crate::ast::{BinaryOp, Expr, LiteralValue, UnaryOp};
use crate::lexer::TokenKind;

use super::{ParseError, Parser};

/// Maps a token to its binary operator, if it is one.
fn binary_op_for(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::OrOr => Some(BinaryOp::Or),
        TokenKind::AndAnd => Some(BinaryOp::And),
        TokenKind::Equals => Some(BinaryOp::Equal),
        TokenKind::NotEquals => Some(BinaryOp::NotEqual),
        TokenKind::LessThan => Some(BinaryOp::LessThan),
        TokenKind::GreaterThan => Some(BinaryOp::GreaterThan),
        TokenKind::LessEquals => Some(BinaryOp::LessEqual),
        TokenKind::GreaterEquals => Some(BinaryOp::GreaterEqual),
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Subtract),
        TokenKind::Star => Some(BinaryOp::Multiply),
        TokenKind::Slash => Some(BinaryOp::Divide),
        TokenKind::Percent => Some(BinaryOp::Modulo),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    /// Parses an expression.
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(0)
    }

    /// Parses binary operator chains at or above `min_precedence`.
    ///
    /// Recursing with the operator's own precedence makes every level
    /// left-associative: the right subexpression only collects operators
    /// that bind strictly tighter.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = binary_op_for(self.peek().kind) {
            let precedence = op.precedence();
            if precedence <= min_precedence {
                break;
            }
            let op_location = self.peek().location.clone();
            self.advance();
            let right = self.parse_binary(precedence)?;
            left = Expr::binary(op, left, right, op_location);
        }

        Ok(left)
    }

    /// Parses a unary prefix chain.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return self.parse_primary(),
        };
        let location = self.peek().location.clone();
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::unary(op, operand, location))
    }

    /// Parses a primary expression: a literal, a parenthesized
    /// expression, or an identifier followed by a chain of member
    /// accesses and calls.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let location = self.peek().location.clone();

        match self.peek().kind {
            TokenKind::IntegerLiteral => {
                let text = self.advance().text.clone();
                let value = text.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
                    kind: "integer",
                    text: text.clone(),
                    location: location.clone(),
                })?;
                Ok(Expr::literal(LiteralValue::Int(value), location))
            }
            TokenKind::FloatLiteral => {
                let text = self.advance().text.clone();
                let value = text.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                    kind: "float",
                    text: text.clone(),
                    location: location.clone(),
                })?;
                Ok(Expr::literal(LiteralValue::Float(value), location))
            }
            TokenKind::StringLiteral => {
                let text = self.advance().text.clone();
                Ok(Expr::literal(LiteralValue::Str(text), location))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::literal(LiteralValue::Bool(true), location))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::literal(LiteralValue::Bool(false), location))
            }
            TokenKind::Identifier => {
                let name = self.advance().text.clone();
                let mut expr = Expr::identifier(name, location.clone());

                // Postfix chain: member access and calls may alternate,
                // so `io.print(x)` and `mod::helper(1)(2)` both parse.
                loop {
                    if self.match_token(TokenKind::Dot) || self.match_token(TokenKind::ColonColon) {
                        let property = self
                            .consume(TokenKind::Identifier, "Expected property name")?
                            .text
                            .clone();
                        expr = Expr::member(expr, property, location.clone());
                        if self.check(TokenKind::LeftParen) {
                            expr = self.parse_call(expr)?;
                        }
                    } else if self.check(TokenKind::LeftParen) {
                        expr = self.parse_call(expr)?;
                    } else {
                        break;
                    }
                }

                Ok(expr)
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            found => Err(ParseError::ExpectedExpression { found, location }),
        }
    }

    /// Parses a call's argument list, producing a call on `callee`.
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let location = self.peek().location.clone();
        self.consume(TokenKind::LeftParen, "Expected '(' for function call")?;

        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;

        Ok(Expr::call(callee, args, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, Program, StatementKind};
    use crate::lexer::tokenize;

    fn parse_expr(source: &str) -> Expr {
        let tokens = tokenize(source, "test.vsp");
        let program = Parser::new(&tokens).parse().expect("parse failed");
        match program.statements.into_iter().next().map(|s| s.kind) {
            Some(StatementKind::Expr(expr)) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn parse_err(source: &str) -> ParseError {
        let tokens = tokenize(source, "test.vsp");
        Parser::new(&tokens).parse().expect_err("expected failure")
    }

    /// Renders an expression tree as a parenthesized string, which makes
    /// precedence tests readable.
    fn render(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal { value, .. } => match value {
                LiteralValue::Int(n) => n.to_string(),
                LiteralValue::Float(f) => f.to_string(),
                LiteralValue::Bool(b) => b.to_string(),
                LiteralValue::Char(c) => c.to_string(),
                LiteralValue::Str(s) => format!("{s:?}"),
            },
            ExprKind::Identifier(name) => name.clone(),
            ExprKind::Binary { op, left, right } => {
                format!("({} {} {})", render(left), op, render(right))
            }
            ExprKind::Unary { op, operand } => format!("({}{})", op, render(operand)),
            ExprKind::Call { callee, args } => {
                let args: Vec<_> = args.iter().map(render).collect();
                format!("{}({})", render(callee), args.join(", "))
            }
            ExprKind::Member { object, property } => {
                format!("{}.{}", render(object), property)
            }
        }
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(render(&parse_expr("2 + 3 * 4")), "(2 + (3 * 4))");
        assert_eq!(render(&parse_expr("2 * 3 + 4")), "((2 * 3) + 4)");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(render(&parse_expr("1 - 2 - 3")), "((1 - 2) - 3)");
        assert_eq!(render(&parse_expr("8 / 4 / 2")), "((8 / 4) / 2)");
        assert_eq!(render(&parse_expr("1 + 2 - 3 + 4")), "(((1 + 2) - 3) + 4)");
    }

    #[test]
    fn test_comparison_below_arithmetic() {
        assert_eq!(render(&parse_expr("1 + 2 < 3 * 4")), "((1 + 2) < (3 * 4))");
    }

    #[test]
    fn test_logical_precedence() {
        assert_eq!(
            render(&parse_expr("a == 1 && b == 2 || c == 3")),
            "(((a == 1) && (b == 2)) || (c == 3))"
        );
        assert_eq!(
            render(&parse_expr("1 < 2 && 3 > 0")),
            "((1 < 2) && (3 > 0))"
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(render(&parse_expr("(2 + 3) * 4")), "((2 + 3) * 4)");
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        assert_eq!(render(&parse_expr("-a + b")), "((-a) + b)");
        assert_eq!(render(&parse_expr("!a && b")), "((!a) && b)");
        assert_eq!(render(&parse_expr("~a * 2")), "((~a) * 2)");
    }

    #[test]
    fn test_unary_chains() {
        assert_eq!(render(&parse_expr("!!ok")), "(!(!ok))");
        assert_eq!(render(&parse_expr("--x")), "(-(-x))");
    }

    #[test]
    fn test_modulo_shares_multiplicative_level() {
        assert_eq!(render(&parse_expr("10 % 4 * 2")), "((10 % 4) * 2)");
    }

    #[test]
    fn test_call_with_arguments() {
        assert_eq!(render(&parse_expr("add(2, 40)")), "add(2, 40)");
        assert_eq!(render(&parse_expr("f(a + 1, g(b))")), "f((a + 1), g(b))");
    }

    #[test]
    fn test_member_call_parses_as_call_on_member() {
        let expr = parse_expr("io.print(42)");
        match &expr.kind {
            ExprKind::Call { callee, args } => {
                assert!(matches!(callee.kind, ExprKind::Member { .. }));
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_double_colon_member_access() {
        assert_eq!(render(&parse_expr("math::pi")), "math.pi");
    }

    #[test]
    fn test_chained_member_access() {
        assert_eq!(render(&parse_expr("a.b.c")), "a.b.c");
    }

    #[test]
    fn test_float_literal() {
        let expr = parse_expr("3.25");
        match expr.kind {
            ExprKind::Literal {
                value: LiteralValue::Float(f),
                ..
            } => assert_eq!(f, 3.25),
            other => panic!("expected float literal, got {other:?}"),
        }
    }

    #[test]
    fn test_bool_literals() {
        assert_eq!(render(&parse_expr("true && false")), "(true && false)");
    }

    #[test]
    fn test_trailing_comma_is_rejected() {
        let err = parse_err("f(1,)");
        assert_eq!(err.to_string(), "Expected expression");
    }

    #[test]
    fn test_missing_operand() {
        let err = parse_err("1 +");
        assert_eq!(err.to_string(), "Expected expression");
    }

    #[test]
    fn test_unclosed_parenthesis() {
        let err = parse_err("(1 + 2");
        assert_eq!(err.to_string(), "Expected ')' after expression");
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        let err = parse_err("let x: int = 99999999999999999999");
        assert!(err.to_string().contains("Invalid integer literal"));
    }
}
