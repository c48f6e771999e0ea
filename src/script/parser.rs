use crate::cancel::{CancelSignal, Cancelled};
use crate::diagnostic::Span;
use crate::script::ast::{BinaryOp, Expr, ExprKind, Ident, Lit, Stmt, StmtKind, UnaryOp};
use crate::script::error::ScriptError;
use crate::script::lexer::{Token, TokenKind, lex};

/// Deepest allowed nesting of expressions and blocks. Parsing, code generation and dropping the
/// tree all recurse once per level, so this bounds the stack used by a compile.
const MAX_NESTING: usize = 128;

/// Statements that parsed cleanly plus every lexical and syntax error encountered.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub(crate) stmts: Vec<Stmt>,
    pub(crate) errors: Vec<ScriptError>,
}

/// Parse a whole program, recovering at statement boundaries.
///
/// Cancellation is polled between top-level statements.
pub(crate) fn parse_program(src: &str, cancel: &CancelSignal) -> Result<Parsed, Cancelled> {
    let lexed = lex(src);
    let mut p = Parser {
        tokens: lexed.tokens,
        pos: 0,
        depth: 0,
        errors: lexed.errors,
    };

    let mut stmts = Vec::new();
    loop {
        cancel.check()?;
        match p.peek().kind {
            TokenKind::Eof => break,
            TokenKind::RBrace => {
                let span = p.bump().span;
                p.errors
                    .push(ScriptError::new(span, "unmatched `}` at top level"));
            }
            _ => match p.parse_stmt() {
                Ok(s) => stmts.push(s),
                Err(e) => {
                    p.errors.push(e);
                    p.synchronize();
                }
            },
        }
    }

    Ok(Parsed {
        stmts,
        errors: p.errors,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    errors: Vec<ScriptError>,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        // Eof is sticky.
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Span, ScriptError> {
        if self.peek().kind == kind {
            Ok(self.bump().span)
        } else {
            Err(ScriptError::new(
                self.span(),
                format!(
                    "expected {} {context}, found {}",
                    kind.describe(),
                    self.peek().kind.describe()
                ),
            ))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn ident(&mut self, context: &str) -> Result<Ident, ScriptError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Ident(name) => {
                self.bump();
                Ok(Ident { name, span: t.span })
            }
            other => Err(ScriptError::new(
                t.span,
                format!("expected identifier {context}, found {}", other.describe()),
            )),
        }
    }

    /// Run `f` one nesting level deeper, failing once the level passes [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        if self.depth >= MAX_NESTING {
            return Err(ScriptError::new(
                self.span(),
                format!("nested too deeply (limit is {MAX_NESTING} levels)"),
            ));
        }
        self.depth += 1;
        let res = f(self);
        self.depth -= 1;
        res
    }

    /// Skip to just past the next `;`, or up to (not past) a `}` / end of input.
    fn synchronize(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Semi => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace | TokenKind::Eof => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.nested(Self::parse_block_inner)
    }

    fn parse_block_inner(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect(TokenKind::LBrace, "to open a block")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::RBrace => {
                    self.bump();
                    return Ok(stmts);
                }
                TokenKind::Eof => {
                    return Err(ScriptError::new(self.span(), "unclosed block, expected `}`"));
                }
                _ => match self.parse_stmt() {
                    Ok(s) => stmts.push(s),
                    Err(e) => {
                        self.errors.push(e);
                        self.synchronize();
                    }
                },
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.span();
        match self.peek().kind.clone() {
            TokenKind::Let => {
                self.bump();
                let name = self.ident("after `let`")?;
                self.expect(TokenKind::Assign, "after binding name")?;
                let value = self.parse_expr()?;
                let end = self.expect(TokenKind::Semi, "after `let` binding")?;
                Ok(Stmt {
                    kind: StmtKind::Let { name, value },
                    span: start.to(end),
                })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => {
                self.bump();
                let var = self.ident("after `for`")?;
                self.expect(TokenKind::In, "after loop variable")?;
                let range_start = self.parse_expr()?;
                self.expect(TokenKind::DotDot, "in loop range")?;
                let range_end = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt {
                    kind: StmtKind::For {
                        var,
                        start: range_start,
                        end: range_end,
                        body,
                    },
                    span: start.to(self.prev_span()),
                })
            }
            TokenKind::Ident(name) => {
                self.bump();
                let func = Ident { name, span: start };
                self.expect(TokenKind::LParen, "to call a draw command")?;
                let args = self.parse_args()?;
                let end = self.expect(TokenKind::Semi, "after statement")?;
                Ok(Stmt {
                    kind: StmtKind::Call { func, args },
                    span: start.to(end),
                })
            }
            other => Err(ScriptError::new(
                start,
                format!("expected statement, found {}", other.describe()),
            )),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.expect(TokenKind::If, "")?;
        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_block = if self.consume(TokenKind::Else) {
            if self.peek().kind == TokenKind::If {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            span: start.to(self.prev_span()),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
        self.nested(Self::parse_cond)
    }

    fn parse_cond(&mut self) -> Result<Expr, ScriptError> {
        let cond = self.parse_or()?;
        if !self.consume(TokenKind::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_expr()?;
        self.expect(TokenKind::Colon, "in conditional expression")?;
        let else_expr = self.parse_expr()?;
        let span = cond.span.to(else_expr.span);
        Ok(Expr {
            kind: ExprKind::Cond {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ScriptError> {
        let mut e = self.parse_and()?;
        while self.consume(TokenKind::OrOr) {
            let r = self.parse_and()?;
            e = binary(BinaryOp::Or, e, r);
        }
        Ok(e)
    }

    fn parse_and(&mut self) -> Result<Expr, ScriptError> {
        let mut e = self.parse_equality()?;
        while self.consume(TokenKind::AndAnd) {
            let r = self.parse_equality()?;
            e = binary(BinaryOp::And, e, r);
        }
        Ok(e)
    }

    fn parse_equality(&mut self) -> Result<Expr, ScriptError> {
        let mut e = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            let r = self.parse_comparison()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ScriptError> {
        let mut e = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let r = self.parse_term()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_term(&mut self) -> Result<Expr, ScriptError> {
        let mut e = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let r = self.parse_factor()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_factor(&mut self) -> Result<Expr, ScriptError> {
        let mut e = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let r = self.parse_unary()?;
            e = binary(op, e, r);
        }
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ScriptError> {
        let start = self.span();
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.bump();
        let e = self.nested(Self::parse_unary)?;
        let span = start.to(e.span);
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                expr: Box::new(e),
            },
            span,
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ScriptError> {
        let mut args = Vec::new();
        if self.consume(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen, "to close argument list")?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
        let t = self.bump().clone();
        let kind = match t.kind {
            TokenKind::Number(v) => ExprKind::Lit(Lit::Num(v)),
            TokenKind::Str(s) => ExprKind::Lit(Lit::Str(s)),
            TokenKind::True => ExprKind::Lit(Lit::Bool(true)),
            TokenKind::False => ExprKind::Lit(Lit::Bool(false)),
            TokenKind::Ident(name) => {
                if self.consume(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr {
                        kind: ExprKind::Call {
                            func: Ident { name, span: t.span },
                            args,
                        },
                        span: t.span.to(self.prev_span()),
                    });
                }
                ExprKind::Name(name)
            }
            TokenKind::LParen => {
                let e = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen, "to close parenthesis")?;
                return Ok(Expr {
                    kind: e.kind,
                    span: t.span.to(end),
                });
            }
            other => {
                return Err(ScriptError::new(
                    t.span,
                    format!("expected expression, found {}", other.describe()),
                ));
            }
        };
        Ok(Expr { kind, span: t.span })
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
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
