//! Statement parsing.
//!
//! This module contains the statement dispatcher and the parsing of every
//! statement form: bindings, control flow, function definitions, imports,
//! and the expression/assignment statement.

use crate::ast::{ExprKind, Param, Statement, StatementKind};
use crate::lexer::TokenKind;

use super::{ParseError, Parser};

impl<'a> Parser<'a> {
    /// Parses a single statement, dispatching on the leading token.
    pub(super) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek().kind {
            TokenKind::Import => self.parse_import_statement(),
            TokenKind::Let | TokenKind::Const | TokenKind::Var => self.parse_let_statement(),
            TokenKind::Func => self.parse_function_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                let location = self.peek().location.clone();
                self.advance();
                Ok(Statement::new(StatementKind::Break, location))
            }
            TokenKind::Continue => {
                let location = self.peek().location.clone();
                self.advance();
                Ok(Statement::new(StatementKind::Continue, location))
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// `import IDENT from IDENT (:: IDENT)*`
    fn parse_import_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        self.consume(TokenKind::Import, "Expected 'import'")?;

        let name = self
            .consume(TokenKind::Identifier, "Expected identifier after 'import'")?
            .text
            .clone();
        self.consume(TokenKind::From, "Expected 'from' after identifier")?;

        let mut module = self
            .consume(TokenKind::Identifier, "Expected module name")?
            .text
            .clone();
        while self.match_token(TokenKind::ColonColon) {
            module.push_str("::");
            module.push_str(
                &self
                    .consume(TokenKind::Identifier, "Expected identifier after '::'")?
                    .text,
            );
        }

        Ok(Statement::new(StatementKind::Import { name, module }, location))
    }

    /// `("let" | "const" | "var") IDENT : type = expr`
    ///
    /// Only `var` declares a mutable binding.
    fn parse_let_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        let mutable = self.peek().kind == TokenKind::Var;
        self.advance();

        let name = self
            .consume(TokenKind::Identifier, "Expected variable name")?
            .text
            .clone();
        self.consume(TokenKind::Colon, "Expected ':' after variable name")?;
        let ty = self.parse_type()?;
        self.consume(TokenKind::Assign, "Expected '=' after type")?;
        let value = self.parse_expression()?;

        Ok(Statement::new(
            StatementKind::Let {
                name,
                ty,
                value,
                mutable,
            },
            location,
        ))
    }

    /// `func IDENT ( params ) => type { body }`
    fn parse_function_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        self.consume(TokenKind::Func, "Expected 'func'")?;

        let name = self
            .consume(TokenKind::Identifier, "Expected function name")?
            .text
            .clone();
        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param_name = self
                    .consume(TokenKind::Identifier, "Expected parameter name")?
                    .text
                    .clone();
                self.consume(TokenKind::Colon, "Expected ':' after parameter name")?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name: param_name,
                    ty,
                });
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;
        self.consume(TokenKind::FatArrow, "Expected '=>' after parameters")?;
        let return_type = self.parse_type()?;

        self.consume(TokenKind::LeftBrace, "Expected '{' before function body")?;
        let body = self.parse_block_body()?;
        self.consume(TokenKind::RightBrace, "Expected '}' after function body")?;

        Ok(Statement::new(
            StatementKind::Function {
                name,
                params,
                return_type,
                body,
            },
            location,
        ))
    }

    /// `if ( expr ) { body } [ else (if-stmt | { body }) ]`
    ///
    /// `else if` chains by recursion: the else branch holds a single
    /// nested `If` statement.
    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        self.consume(TokenKind::If, "Expected 'if'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;

        self.consume(TokenKind::LeftBrace, "Expected '{' after condition")?;
        let then_branch = self.parse_block_body()?;
        self.consume(TokenKind::RightBrace, "Expected '}' after then branch")?;

        let mut else_branch = Vec::new();
        if self.match_token(TokenKind::Else) {
            if self.check(TokenKind::If) {
                else_branch.push(self.parse_if_statement()?);
            } else {
                self.consume(TokenKind::LeftBrace, "Expected '{' after 'else'")?;
                else_branch = self.parse_block_body()?;
                self.consume(TokenKind::RightBrace, "Expected '}' after else branch")?;
            }
        }

        Ok(Statement::new(
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            },
            location,
        ))
    }

    /// `while ( expr ) { body }`
    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        self.consume(TokenKind::While, "Expected 'while'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;

        self.consume(TokenKind::LeftBrace, "Expected '{' after condition")?;
        let body = self.parse_block_body()?;
        self.consume(TokenKind::RightBrace, "Expected '}' after while body")?;

        Ok(Statement::new(StatementKind::While { condition, body }, location))
    }

    /// `for ( init-stmt [;] expr [;] update-stmt ) { body }`
    ///
    /// Init and update are full statements; the semicolons after init and
    /// condition are optional.
    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        self.consume(TokenKind::For, "Expected 'for'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let init = self.parse_statement()?;
        self.match_token(TokenKind::Semicolon);

        let condition = self.parse_expression()?;
        self.match_token(TokenKind::Semicolon);

        let update = self.parse_statement()?;
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;

        self.consume(TokenKind::LeftBrace, "Expected '{' after for clauses")?;
        let body = self.parse_block_body()?;
        self.consume(TokenKind::RightBrace, "Expected '}' after for body")?;

        Ok(Statement::new(
            StatementKind::For {
                init: Box::new(init),
                condition,
                update: Box::new(update),
                body,
            },
            location,
        ))
    }

    /// `return [ expr ]`
    ///
    /// The value is omitted when the next token closes the enclosing
    /// block, separates statements, or ends the input.
    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        self.consume(TokenKind::Return, "Expected 'return'")?;

        let value = if self.check(TokenKind::RightBrace)
            || self.check(TokenKind::Semicolon)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };

        Ok(Statement::new(StatementKind::Return { value }, location))
    }

    /// An expression statement, or an assignment if the expression is a
    /// plain name followed by `=`.
    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let location = self.peek().location.clone();
        let expr = self.parse_expression()?;

        if self.match_token(TokenKind::Assign) {
            let assign_location = self.previous().location.clone();
            if let ExprKind::Identifier(target) = expr.kind {
                let value = self.parse_expression()?;
                return Ok(Statement::new(StatementKind::Assign { target, value }, location));
            }
            return Err(ParseError::InvalidAssignmentTarget {
                location: assign_location,
            });
        }

        Ok(Statement::new(StatementKind::Expr(expr), location))
    }

    /// Parses statements up to (but not including) the closing brace.
    fn parse_block_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        self.skip_semicolons();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
            self.skip_semicolons();
        }
        Ok(statements)
    }
}
