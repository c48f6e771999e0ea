use std::collections::HashMap;

use crate::cancel::{CancelSignal, Cancelled};
use crate::diagnostic::{Severity, Span};
use crate::script::ast::{BinaryOp, Expr, ExprKind, Ident, Lit, Stmt, StmtKind, UnaryOp};
use crate::script::bytecode::{BuiltinId, BytecodeProgram, DrawCmd, EnvField, LocalSlot, Op, Value};
use crate::script::color::parse_hex;
use crate::script::error::{ScriptError, ScriptMessage};
use crate::script::parser::parse_program;

/// Names the environment provides; they cannot be rebound.
const RESERVED: [&str; 3] = ["width", "height", "pi"];

#[derive(Debug)]
pub(crate) struct CompiledScript {
    /// Present only when no message is an error.
    pub(crate) program: Option<BytecodeProgram>,
    /// Sorted by source position; ties keep discovery order.
    pub(crate) messages: Vec<ScriptMessage>,
}

/// Parse, resolve and lower `src` into bytecode.
pub(crate) fn compile_script(src: &str, cancel: &CancelSignal) -> Result<CompiledScript, Cancelled> {
    let parsed = parse_program(src, cancel)?;

    let mut cg = Codegen {
        program: BytecodeProgram::new(),
        scopes: vec![HashMap::new()],
        messages: parsed.errors.into_iter().map(ScriptMessage::from).collect(),
    };
    for stmt in &parsed.stmts {
        cancel.check()?;
        cg.stmt(stmt);
    }
    cg.pop_scope();
    cancel.check()?;

    let mut messages = cg.messages;
    messages.sort_by_key(|m| m.span.start);
    let has_errors = messages.iter().any(|m| m.severity == Severity::Error);

    Ok(CompiledScript {
        program: (!has_errors).then_some(cg.program),
        messages,
    })
}

#[derive(Debug)]
struct Local {
    slot: LocalSlot,
    span: Span,
    used: bool,
    warn_unused: bool,
}

struct Codegen {
    program: BytecodeProgram,
    scopes: Vec<HashMap<String, Local>>,
    messages: Vec<ScriptMessage>,
}

impl Codegen {
    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.messages.push(ScriptError::new(span, message).into());
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for (name, local) in scope {
                self.warn_if_unused(&name, &local);
            }
        }
    }

    fn warn_if_unused(&mut self, name: &str, local: &Local) {
        if local.warn_unused && !local.used && !name.starts_with('_') {
            self.messages.push(ScriptMessage::warning(
                local.span,
                format!("unused variable `{name}`"),
            ));
        }
    }

    fn declare(&mut self, name: &Ident, warn_unused: bool) -> LocalSlot {
        if RESERVED.contains(&name.name.as_str()) {
            self.error(
                name.span,
                format!("`{}` is provided by the surface and cannot be rebound", name.name),
            );
        }
        let slot = LocalSlot(self.program.locals);
        self.program.locals += 1;
        let local = Local {
            slot,
            span: name.span,
            used: false,
            warn_unused,
        };
        let replaced = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.insert(name.name.clone(), local));
        if let Some(old) = replaced {
            self.warn_if_unused(&name.name, &old);
        }
        slot
    }

    fn resolve(&mut self, name: &str) -> Option<LocalSlot> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(local) = scope.get_mut(name) {
                local.used = true;
                return Some(local.slot);
            }
        }
        None
    }

    fn push_const(&mut self, v: Value, span: Span) {
        let idx = self.program.push_const(v);
        self.program.emit(Op::PushConst(idx), span);
    }

    fn block(&mut self, stmts: &[Stmt]) {
        self.push_scope();
        for s in stmts {
            self.stmt(s);
        }
        self.pop_scope();
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                self.expr(value);
                let slot = self.declare(name, true);
                self.program.emit(Op::StoreLocal(slot), stmt.span);
            }
            StmtKind::Call { func, args } => self.call_stmt(func, args, stmt.span),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expr(cond);
                let jump_else = self.program.emit(Op::JumpIfFalse(0), cond.span);
                self.block(then_block);
                match else_block {
                    Some(else_block) => {
                        let jump_end = self.program.emit(Op::Jump(0), stmt.span);
                        let else_start = self.program.next_index();
                        self.program.patch_jump(jump_else, else_start);
                        self.block(else_block);
                        let end = self.program.next_index();
                        self.program.patch_jump(jump_end, end);
                    }
                    None => {
                        let end = self.program.next_index();
                        self.program.patch_jump(jump_else, end);
                    }
                }
            }
            StmtKind::For {
                var,
                start,
                end,
                body,
            } => {
                self.push_scope();
                self.expr(start);
                let var_slot = self.declare(var, false);
                self.program.emit(Op::StoreLocal(var_slot), start.span);

                self.expr(end);
                let end_slot = LocalSlot(self.program.locals);
                self.program.locals += 1;
                self.program.emit(Op::StoreLocal(end_slot), end.span);

                let loop_start = self.program.next_index();
                self.program.emit(Op::LoadLocal(var_slot), var.span);
                self.program.emit(Op::LoadLocal(end_slot), end.span);
                self.program.emit(Op::Lt, stmt.span);
                let exit = self.program.emit(Op::JumpIfFalse(0), stmt.span);

                self.block(body);

                self.program.emit(Op::LoadLocal(var_slot), var.span);
                self.push_const(Value::Num(1.0), var.span);
                self.program.emit(Op::Add, var.span);
                self.program.emit(Op::StoreLocal(var_slot), var.span);
                self.program.emit(Op::Jump(loop_start), stmt.span);

                let after = self.program.next_index();
                self.program.patch_jump(exit, after);
                self.pop_scope();
            }
        }
    }

    fn call_stmt(&mut self, func: &Ident, args: &[Expr], span: Span) {
        if let Some(cmd) = DrawCmd::lookup(&func.name) {
            if !self.check_arity(func, cmd.arity(), args.len()) {
                return;
            }
            for a in args {
                self.expr(a);
            }
            self.program.emit(
                Op::Draw {
                    cmd,
                    argc: cmd.arity(),
                },
                span,
            );
        } else if func.name == "hex" || BuiltinId::lookup(&func.name).is_some() {
            self.error(
                func.span,
                format!(
                    "`{}` produces a value; only draw commands can be used as statements",
                    func.name
                ),
            );
        } else {
            self.error(func.span, format!("unknown draw command `{}`", func.name));
        }
    }

    fn check_arity(&mut self, func: &Ident, expected: u8, got: usize) -> bool {
        if usize::from(expected) == got {
            return true;
        }
        let plural = if expected == 1 { "" } else { "s" };
        self.error(
            func.span,
            format!(
                "`{}` expects {expected} argument{plural}, got {got}",
                func.name
            ),
        );
        false
    }

    fn expr(&mut self, e: &Expr) {
        match &e.kind {
            ExprKind::Lit(Lit::Num(v)) => self.push_const(Value::Num(*v), e.span),
            ExprKind::Lit(Lit::Bool(v)) => self.push_const(Value::Bool(*v), e.span),
            ExprKind::Lit(Lit::Str(s)) => self.push_const(Value::Str(s.as_str().into()), e.span),
            ExprKind::Name(name) => self.name(name, e.span),
            ExprKind::Unary { op, expr } => {
                self.expr(expr);
                let op = match op {
                    UnaryOp::Neg => Op::Neg,
                    UnaryOp::Not => Op::Not,
                };
                self.program.emit(op, e.span);
            }
            ExprKind::Binary { op, left, right } => {
                self.expr(left);
                self.expr(right);
                self.program.emit(binary_op(*op), e.span);
            }
            ExprKind::Call { func, args } => self.call_expr(func, args, e.span),
            ExprKind::Cond {
                cond,
                then_expr,
                else_expr,
            } => {
                self.expr(cond);
                let jump_else = self.program.emit(Op::JumpIfFalse(0), cond.span);
                self.expr(then_expr);
                let jump_end = self.program.emit(Op::Jump(0), e.span);
                let else_start = self.program.next_index();
                self.program.patch_jump(jump_else, else_start);
                self.expr(else_expr);
                let end = self.program.next_index();
                self.program.patch_jump(jump_end, end);
            }
        }
    }

    fn name(&mut self, name: &str, span: Span) {
        if let Some(slot) = self.resolve(name) {
            self.program.emit(Op::LoadLocal(slot), span);
            return;
        }
        match name {
            "width" => {
                self.program.emit(Op::LoadEnv(EnvField::Width), span);
            }
            "height" => {
                self.program.emit(Op::LoadEnv(EnvField::Height), span);
            }
            "pi" => self.push_const(Value::Num(std::f64::consts::PI), span),
            _ => {
                self.error(span, format!("unknown identifier `{name}`"));
                // Keep the stack shape intact; the program is discarded anyway.
                self.push_const(Value::Num(0.0), span);
            }
        }
    }

    fn call_expr(&mut self, func: &Ident, args: &[Expr], span: Span) {
        if func.name == "hex" {
            let color = match args {
                [
                    Expr {
                        kind: ExprKind::Lit(Lit::Str(s)),
                        span: arg_span,
                    },
                ] => parse_hex(s).map_err(|msg| (*arg_span, msg)),
                _ => Err((span, "`hex` expects a single string literal".to_owned())),
            };
            match color {
                Ok(c) => self.push_const(Value::Color(c), span),
                Err((at, msg)) => {
                    self.error(at, msg);
                    self.push_const(Value::Num(0.0), span);
                }
            }
            return;
        }

        if let Some(id) = BuiltinId::lookup(&func.name) {
            if self.check_arity(func, id.arity(), args.len()) {
                for a in args {
                    self.expr(a);
                }
                self.program.emit(
                    Op::CallBuiltin {
                        id,
                        argc: id.arity(),
                    },
                    span,
                );
            } else {
                self.push_const(Value::Num(0.0), span);
            }
            return;
        }

        if DrawCmd::lookup(&func.name).is_some() {
            self.error(
                func.span,
                format!(
                    "`{}` is a draw command and does not produce a value",
                    func.name
                ),
            );
        } else {
            self.error(func.span, format!("unknown function `{}`", func.name));
        }
        self.push_const(Value::Num(0.0), span);
    }
}

fn binary_op(op: BinaryOp) -> Op {
    match op {
        BinaryOp::Add => Op::Add,
        BinaryOp::Sub => Op::Sub,
        BinaryOp::Mul => Op::Mul,
        BinaryOp::Div => Op::Div,
        BinaryOp::Mod => Op::Mod,
        BinaryOp::Eq => Op::Eq,
        BinaryOp::Ne => Op::Ne,
        BinaryOp::Lt => Op::Lt,
        BinaryOp::Le => Op::Le,
        BinaryOp::Gt => Op::Gt,
        BinaryOp::Ge => Op::Ge,
        BinaryOp::And => Op::And,
        BinaryOp::Or => Op::Or,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/codegen.rs"]
mod tests;
