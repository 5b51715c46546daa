//! CompilScript recursive-descent parser.
//!
//! Produces the concrete syntax tree defined in `crate::cst`. Syntax errors
//! are collected as diagnostics; the parser recovers by skipping to the
//! next statement boundary, so a single bad statement does not hide the
//! rest of the file.

use crate::cst::{
    BinOp, Expr, ExprKind, FuncDecl, Param, Program, Stmt, StmtKind, SwitchCase, TypeRef, UnOp,
};
use crate::diagnostics::Diagnostic;
use crate::token::{Span, Token, TokenType};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Parse a token stream (as produced by `lexer::tokenize`) into a program.
pub fn parse(tokens: &[Token]) -> (Program, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.diagnostics)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    // ── Token helpers ────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, tt: TokenType) -> bool {
        self.peek().token_type == tt
    }

    fn at_end(&self) -> bool {
        self.check(TokenType::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        tok
    }

    fn match_token(&mut self, tt: TokenType) -> bool {
        if self.check(tt) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, tt: TokenType, msg: &str) -> Option<Token> {
        if self.check(tt) {
            Some(self.advance())
        } else {
            let tok = self.peek().clone();
            self.diagnostics.push(Diagnostic::syntax(
                format!("{}, found '{}'", msg, describe(&tok)),
                tok.span,
            ));
            None
        }
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            self.peek().span
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    /// Skip tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        while !self.at_end() {
            if self.match_token(TokenType::Semicolon) {
                return;
            }
            match self.peek().token_type {
                TokenType::RBrace
                | TokenType::Var
                | TokenType::Const
                | TokenType::Function
                | TokenType::Class
                | TokenType::If
                | TokenType::While
                | TokenType::Do
                | TokenType::For
                | TokenType::Foreach
                | TokenType::Switch
                | TokenType::Return
                | TokenType::Break
                | TokenType::Continue
                | TokenType::Try => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ── Program / statements ─────────────────────────────────────────

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.at_end() {
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => {
                    self.synchronize();
                    // a stray token recovery stopped on still has to go
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }
        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek().token_type {
            TokenType::Var => self.parse_var_decl(false),
            TokenType::Const => self.parse_var_decl(true),
            TokenType::Function => self.parse_function_decl(),
            TokenType::Class => self.parse_class_decl(),
            TokenType::If => self.parse_if(),
            TokenType::While => self.parse_while(),
            TokenType::Do => self.parse_do_while(),
            TokenType::For => self.parse_for(),
            TokenType::Foreach => self.parse_foreach(),
            TokenType::Switch => self.parse_switch(),
            TokenType::Try => self.parse_try_catch(),
            TokenType::Break => {
                let start = self.advance().span;
                self.consume(TokenType::Semicolon, "expected ';' after 'break'")?;
                Some(Stmt {
                    kind: StmtKind::Break,
                    span: start,
                })
            }
            TokenType::Continue => {
                let start = self.advance().span;
                self.consume(TokenType::Semicolon, "expected ';' after 'continue'")?;
                Some(Stmt {
                    kind: StmtKind::Continue,
                    span: start,
                })
            }
            TokenType::Return => self.parse_return(),
            TokenType::LBrace => {
                let start = self.peek().span;
                let body = self.parse_block()?;
                Some(Stmt {
                    kind: StmtKind::Block(body),
                    span: start.to(self.prev_span()),
                })
            }
            _ => self.parse_assign_or_expr(),
        }
    }

    fn parse_block(&mut self) -> Option<Vec<Stmt>> {
        self.consume(TokenType::LBrace, "expected '{'")?;
        let mut statements = Vec::new();
        while !self.check(TokenType::RBrace) && !self.at_end() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        self.consume(TokenType::RBrace, "expected '}'")?;
        Some(statements)
    }

    fn parse_type_ref(&mut self) -> Option<TypeRef> {
        let base_tok = self.consume(TokenType::Identifier, "expected a type name")?;
        let start = base_tok.span;
        let mut dims = 0;
        while self.check(TokenType::LBracket) {
            self.advance();
            self.consume(TokenType::RBracket, "expected ']' in array type")?;
            dims += 1;
        }
        Some(TypeRef {
            base: base_tok.value,
            dims,
            span: start.to(self.prev_span()),
        })
    }

    fn parse_var_decl(&mut self, is_const: bool) -> Option<Stmt> {
        let start = self.advance().span; // var | const
        let name_tok = self.consume(TokenType::Identifier, "expected a variable name")?;
        let ty = if self.match_token(TokenType::Colon) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };
        let init = if self.match_token(TokenType::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenType::Semicolon, "expected ';' after declaration")?;
        Some(Stmt {
            kind: StmtKind::VarDecl {
                name: name_tok.value,
                name_span: name_tok.span,
                ty,
                init,
                is_const,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_function_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // function
        let decl = self.parse_function_rest()?;
        Some(Stmt {
            kind: StmtKind::FuncDecl(decl),
            span: start.to(self.prev_span()),
        })
    }

    /// Everything after the `function` keyword: name, params, return type,
    /// body. Shared by top-level functions and class methods.
    fn parse_function_rest(&mut self) -> Option<FuncDecl> {
        let name_tok = self.consume(TokenType::Identifier, "expected a function name")?;
        self.consume(TokenType::LParen, "expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                let p_name = self.consume(TokenType::Identifier, "expected a parameter name")?;
                let p_ty = if self.match_token(TokenType::Colon) {
                    Some(self.parse_type_ref()?)
                } else {
                    None
                };
                params.push(Param {
                    name: p_name.value,
                    ty: p_ty,
                    span: p_name.span,
                });
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RParen, "expected ')' after parameters")?;
        let ret = if self.match_token(TokenType::Colon) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Some(FuncDecl {
            name: name_tok.value,
            name_span: name_tok.span,
            params,
            ret,
            body,
        })
    }

    fn parse_class_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // class
        let name_tok = self.consume(TokenType::Identifier, "expected a class name")?;
        let superclass = if self.match_token(TokenType::Colon) {
            let sup = self.consume(TokenType::Identifier, "expected a superclass name")?;
            Some((sup.value, sup.span))
        } else {
            None
        };
        self.consume(TokenType::LBrace, "expected '{' to open the class body")?;
        let mut members = Vec::new();
        while !self.check(TokenType::RBrace) && !self.at_end() {
            let member = match self.peek().token_type {
                TokenType::Var => self.parse_var_decl(false),
                TokenType::Const => self.parse_var_decl(true),
                TokenType::Function => self.parse_function_decl(),
                _ => {
                    let tok = self.peek().clone();
                    self.diagnostics.push(Diagnostic::syntax(
                        format!(
                            "expected a field or method declaration, found '{}'",
                            describe(&tok)
                        ),
                        tok.span,
                    ));
                    None
                }
            };
            match member {
                Some(m) => members.push(m),
                None => self.synchronize(),
            }
        }
        self.consume(TokenType::RBrace, "expected '}' to close the class body")?;
        Some(Stmt {
            kind: StmtKind::ClassDecl {
                name: name_tok.value,
                name_span: name_tok.span,
                superclass,
                members,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // if
        self.consume(TokenType::LParen, "expected '(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenType::RParen, "expected ')' after condition")?;
        let then_block = self.parse_block()?;
        let else_block = if self.match_token(TokenType::Else) {
            if self.check(TokenType::If) {
                // else-if chains nest as a one-statement else block
                let nested = self.parse_if()?;
                Some(vec![nested])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Some(Stmt {
            kind: StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // while
        self.consume(TokenType::LParen, "expected '(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenType::RParen, "expected ')' after condition")?;
        let body = self.parse_block()?;
        Some(Stmt {
            kind: StmtKind::While { cond, body },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_do_while(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // do
        let body = self.parse_block()?;
        self.consume(TokenType::While, "expected 'while' after do body")?;
        self.consume(TokenType::LParen, "expected '(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenType::RParen, "expected ')' after condition")?;
        self.consume(TokenType::Semicolon, "expected ';' after do-while")?;
        Some(Stmt {
            kind: StmtKind::DoWhile { body, cond },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // for
        self.consume(TokenType::LParen, "expected '(' after 'for'")?;

        let init = if self.match_token(TokenType::Semicolon) {
            None
        } else if self.check(TokenType::Var) || self.check(TokenType::Const) {
            let is_const = self.check(TokenType::Const);
            Some(Box::new(self.parse_var_decl(is_const)?))
        } else {
            Some(Box::new(self.parse_assign_or_expr()?))
        };

        let cond = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenType::Semicolon, "expected ';' after for condition")?;

        let step = if self.check(TokenType::RParen) {
            None
        } else {
            Some(Box::new(self.parse_step_clause()?))
        };
        self.consume(TokenType::RParen, "expected ')' after for clauses")?;
        let body = self.parse_block()?;
        Some(Stmt {
            kind: StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            span: start.to(self.prev_span()),
        })
    }

    /// The step slot of a `for`: an assignment or a bare expression, with no
    /// trailing semicolon.
    fn parse_step_clause(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        let expr = self.parse_expression()?;
        if self.match_token(TokenType::Assign) {
            let target = self.validate_assign_target(expr)?;
            let value = self.parse_expression()?;
            Some(Stmt {
                kind: StmtKind::Assign { target, value },
                span: start.to(self.prev_span()),
            })
        } else {
            Some(Stmt {
                kind: StmtKind::ExprStmt(expr),
                span: start.to(self.prev_span()),
            })
        }
    }

    fn parse_foreach(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // foreach
        self.consume(TokenType::LParen, "expected '(' after 'foreach'")?;
        let var_tok = self.consume(TokenType::Identifier, "expected a loop variable")?;
        self.consume(TokenType::In, "expected 'in' in foreach")?;
        let iterable = self.parse_expression()?;
        self.consume(TokenType::RParen, "expected ')' after foreach iterable")?;
        let body = self.parse_block()?;
        Some(Stmt {
            kind: StmtKind::Foreach {
                var: var_tok.value,
                var_span: var_tok.span,
                iterable,
                body,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_switch(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // switch
        self.consume(TokenType::LParen, "expected '(' after 'switch'")?;
        let scrutinee = self.parse_expression()?;
        self.consume(TokenType::RParen, "expected ')' after switch expression")?;
        self.consume(TokenType::LBrace, "expected '{' to open the switch body")?;

        let mut cases = Vec::new();
        let mut default = None;
        while !self.check(TokenType::RBrace) && !self.at_end() {
            if self.match_token(TokenType::Case) {
                let value = self.parse_expression()?;
                self.consume(TokenType::Colon, "expected ':' after case value")?;
                let body = self.parse_case_body();
                cases.push(SwitchCase { value, body });
            } else if self.match_token(TokenType::Default) {
                self.consume(TokenType::Colon, "expected ':' after 'default'")?;
                default = Some(self.parse_case_body());
            } else {
                let tok = self.peek().clone();
                self.diagnostics.push(Diagnostic::syntax(
                    format!("expected 'case' or 'default', found '{}'", describe(&tok)),
                    tok.span,
                ));
                self.synchronize();
            }
        }
        self.consume(TokenType::RBrace, "expected '}' to close the switch body")?;
        Some(Stmt {
            kind: StmtKind::Switch {
                scrutinee,
                cases,
                default,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_case_body(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        while !self.check(TokenType::Case)
            && !self.check(TokenType::Default)
            && !self.check(TokenType::RBrace)
            && !self.at_end()
        {
            match self.parse_statement() {
                Some(stmt) => body.push(stmt),
                None => self.synchronize(),
            }
        }
        body
    }

    fn parse_try_catch(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // try
        let try_block = self.parse_block()?;
        self.consume(TokenType::Catch, "expected 'catch' after try block")?;
        self.consume(TokenType::LParen, "expected '(' after 'catch'")?;
        let exc_tok = self.consume(TokenType::Identifier, "expected an exception name")?;
        self.consume(TokenType::RParen, "expected ')' after exception name")?;
        let catch_block = self.parse_block()?;
        Some(Stmt {
            kind: StmtKind::TryCatch {
                try_block,
                exc_name: exc_tok.value,
                exc_span: exc_tok.span,
                catch_block,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // return
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenType::Semicolon, "expected ';' after return")?;
        Some(Stmt {
            kind: StmtKind::Return(value),
            span: start.to(self.prev_span()),
        })
    }

    fn parse_assign_or_expr(&mut self) -> Option<Stmt> {
        let start = self.peek().span;
        let expr = self.parse_expression()?;
        if self.match_token(TokenType::Assign) {
            let target = self.validate_assign_target(expr)?;
            let value = self.parse_expression()?;
            self.consume(TokenType::Semicolon, "expected ';' after assignment")?;
            Some(Stmt {
                kind: StmtKind::Assign { target, value },
                span: start.to(self.prev_span()),
            })
        } else {
            self.consume(TokenType::Semicolon, "expected ';' after expression")?;
            Some(Stmt {
                kind: StmtKind::ExprStmt(expr),
                span: start.to(self.prev_span()),
            })
        }
    }

    fn validate_assign_target(&mut self, expr: Expr) -> Option<Expr> {
        match expr.kind {
            ExprKind::Var(_) | ExprKind::Prop { .. } | ExprKind::Index { .. } => Some(expr),
            _ => {
                self.diagnostics.push(Diagnostic::syntax(
                    "left-hand side of assignment is not assignable",
                    expr.span,
                ));
                None
            }
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Option<Expr> {
        let cond = self.parse_or()?;
        if self.match_token(TokenType::Question) {
            let then_val = self.parse_expression()?;
            self.consume(TokenType::Colon, "expected ':' in ternary expression")?;
            let else_val = self.parse_expression()?;
            let span = cond.span.to(self.prev_span());
            Some(Expr {
                kind: ExprKind::Ternary {
                    cond: Box::new(cond),
                    then_val: Box::new(then_val),
                    else_val: Box::new(else_val),
                },
                span,
            })
        } else {
            Some(cond)
        }
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.match_token(TokenType::OrOr) {
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.match_token(TokenType::AndAnd) {
            let right = self.parse_equality()?;
            left = binary(BinOp::And, left, right);
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::EqualEqual => BinOp::Eq,
                TokenType::NotEqual => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Some(left)
    }

    fn parse_relational(&mut self) -> Option<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Less => BinOp::Lt,
                TokenType::LessEqual => BinOp::Le,
                TokenType::Greater => BinOp::Gt,
                TokenType::GreaterEqual => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Plus => BinOp::Add,
                TokenType::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Star => BinOp::Mul,
                TokenType::Slash => BinOp::Div,
                TokenType::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek().token_type {
            TokenType::Minus => Some(UnOp::Neg),
            TokenType::Bang => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.to(operand.span);
            Some(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            })
        } else {
            self.parse_postfix()
        }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.match_token(TokenType::LParen) {
                let args = self.parse_arguments()?;
                let span = expr.span.to(self.prev_span());
                expr = Expr {
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                };
            } else if self.match_token(TokenType::LBracket) {
                let index = self.parse_expression()?;
                self.consume(TokenType::RBracket, "expected ']' after index")?;
                let span = expr.span.to(self.prev_span());
                expr = Expr {
                    kind: ExprKind::Index {
                        array: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                };
            } else if self.match_token(TokenType::Dot) {
                let name_tok = self.consume(TokenType::Identifier, "expected a member name")?;
                let span = expr.span.to(name_tok.span);
                expr = Expr {
                    kind: ExprKind::Prop {
                        object: Box::new(expr),
                        name: name_tok.value,
                    },
                    span,
                };
            } else {
                break;
            }
        }
        Some(expr)
    }

    fn parse_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RParen, "expected ')' after arguments")?;
        Some(args)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let tok = self.peek().clone();
        match tok.token_type {
            TokenType::IntLit => {
                self.advance();
                let value = tok.value.parse::<i64>().unwrap_or_else(|_| {
                    self.diagnostics.push(Diagnostic::syntax(
                        format!("integer literal '{}' out of range", tok.value),
                        tok.span,
                    ));
                    0
                });
                Some(Expr {
                    kind: ExprKind::IntLit(value),
                    span: tok.span,
                })
            }
            TokenType::FloatLit => {
                self.advance();
                let value = tok.value.parse::<f64>().unwrap_or(0.0);
                Some(Expr {
                    kind: ExprKind::FloatLit(value),
                    span: tok.span,
                })
            }
            TokenType::StringLit => {
                self.advance();
                Some(Expr {
                    kind: ExprKind::StringLit(tok.value),
                    span: tok.span,
                })
            }
            TokenType::True | TokenType::False => {
                self.advance();
                Some(Expr {
                    kind: ExprKind::BoolLit(tok.token_type == TokenType::True),
                    span: tok.span,
                })
            }
            TokenType::Null => {
                self.advance();
                Some(Expr {
                    kind: ExprKind::NullLit,
                    span: tok.span,
                })
            }
            TokenType::This => {
                self.advance();
                Some(Expr {
                    kind: ExprKind::This,
                    span: tok.span,
                })
            }
            TokenType::New => {
                self.advance();
                let class_tok = self.consume(TokenType::Identifier, "expected a class name")?;
                self.consume(TokenType::LParen, "expected '(' after class name")?;
                let args = self.parse_arguments()?;
                Some(Expr {
                    kind: ExprKind::New {
                        class: class_tok.value,
                        class_span: class_tok.span,
                        args,
                    },
                    span: tok.span.to(self.prev_span()),
                })
            }
            TokenType::Identifier => {
                self.advance();
                Some(Expr {
                    kind: ExprKind::Var(tok.value),
                    span: tok.span,
                })
            }
            TokenType::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenType::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenType::RBracket, "expected ']' after array literal")?;
                Some(Expr {
                    kind: ExprKind::ArrayLit(elements),
                    span: tok.span.to(self.prev_span()),
                })
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenType::RParen, "expected ')'")?;
                Some(inner)
            }
            _ => {
                self.diagnostics.push(Diagnostic::syntax(
                    format!("expected an expression, found '{}'", describe(&tok)),
                    tok.span,
                ));
                None
            }
        }
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.to(right.span);
    Expr {
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    }
}

fn describe(tok: &Token) -> String {
    if tok.value.is_empty() {
        tok.token_type.to_string()
    } else {
        tok.value.clone()
    }
}
