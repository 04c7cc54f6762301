//! Bytecode compiler
//!
//! Lowers a parsed [`Module`] to a stack-machine [`Program`].
//! Expression statements in interactive input compile to `PrintExpr`, so
//! their value is echoed.

use thiserror::Error;
use tracing::debug;

use crate::backends::InputKind;
use crate::frontend::parser::ast::*;
use crate::util::span::Span;
use crate::vm::opcode::{Const, Op, Program};

/// Compile error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("can't assign to literal")]
    AssignToLiteral { span: Span },

    #[error("can't assign to expression")]
    AssignToExpression { span: Span },

    #[error("'break' outside loop")]
    BreakOutsideLoop { span: Span },

    #[error("'continue' not properly in loop")]
    ContinueOutsideLoop { span: Span },
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::AssignToLiteral { span }
            | CompileError::AssignToExpression { span }
            | CompileError::BreakOutsideLoop { span }
            | CompileError::ContinueOutsideLoop { span } => *span,
        }
    }
}

/// Compile a module
pub fn compile(
    module: &Module,
    kind: InputKind,
) -> Result<Program, CompileError> {
    let mut compiler = Compiler::new(kind);
    for stmt in &module.body {
        compiler.statement(stmt)?;
    }
    debug!("compiled {} ops", compiler.program.ops.len());
    Ok(compiler.program)
}

/// Jump targets of the innermost enclosing loop
#[derive(Debug)]
struct LoopLabels {
    start: usize,
    breaks: Vec<usize>,
}

#[derive(Debug)]
struct Compiler {
    program: Program,
    loops: Vec<LoopLabels>,
    echo: bool,
}

impl Compiler {
    fn new(kind: InputKind) -> Self {
        Self {
            program: Program::default(),
            loops: Vec::new(),
            echo: kind == InputKind::SingleStatement,
        }
    }

    fn emit(
        &mut self,
        op: Op,
        span: Span,
    ) -> usize {
        self.program.ops.push(op);
        self.program.lines.push(span.line());
        self.program.ops.len() - 1
    }

    /// Point the jump at `at` to the next op to be emitted
    fn patch(
        &mut self,
        at: usize,
    ) {
        let target = self.program.ops.len();
        if let Some(op) = self.program.ops.get_mut(at) {
            *op = match *op {
                Op::Jump(_) => Op::Jump(target),
                Op::JumpIfFalse(_) => Op::JumpIfFalse(target),
                Op::JumpIfFalseOrPop(_) => Op::JumpIfFalseOrPop(target),
                Op::JumpIfTrueOrPop(_) => Op::JumpIfTrueOrPop(target),
                other => other,
            };
        }
    }

    fn constant(
        &mut self,
        value: Const,
    ) -> usize {
        if let Some(i) = self.program.consts.iter().position(|c| c == &value) {
            return i;
        }
        self.program.consts.push(value);
        self.program.consts.len() - 1
    }

    fn name(
        &mut self,
        name: &str,
    ) -> usize {
        if let Some(i) = self.program.names.iter().position(|n| n == name) {
            return i;
        }
        self.program.names.push(name.to_string());
        self.program.names.len() - 1
    }

    fn statement(
        &mut self,
        stmt: &Stmt,
    ) -> Result<(), CompileError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.expression(expr)?;
                let op = if self.echo { Op::PrintExpr } else { Op::Pop };
                self.emit(op, expr.span());
            }
            Stmt::Assign {
                targets,
                value,
                span,
            } => {
                for target in targets {
                    check_target(target)?;
                }
                self.expression(value)?;
                for (i, target) in targets.iter().enumerate() {
                    if i + 1 < targets.len() {
                        self.emit(Op::Dup, *span);
                    }
                    if let Expr::Name(name, _) = target {
                        let index = self.name(name);
                        self.emit(Op::StoreName(index), target.span());
                    }
                }
            }
            Stmt::Pass(_) => {}
            Stmt::Break(span) => {
                if self.loops.is_empty() {
                    return Err(CompileError::BreakOutsideLoop { span: *span });
                }
                let jump = self.emit(Op::Jump(0), *span);
                if let Some(labels) = self.loops.last_mut() {
                    labels.breaks.push(jump);
                }
            }
            Stmt::Continue(span) => match self.loops.last() {
                Some(labels) => {
                    let start = labels.start;
                    self.emit(Op::Jump(start), *span);
                }
                None => return Err(CompileError::ContinueOutsideLoop { span: *span }),
            },
            Stmt::Raise { value, span } => {
                if let Some(value) = value {
                    self.expression(value)?;
                }
                self.emit(Op::Raise(value.is_some()), *span);
            }
            Stmt::If {
                branches,
                orelse,
                span,
            } => {
                let mut ends = Vec::new();
                for (condition, body) in branches {
                    self.expression(condition)?;
                    let skip = self.emit(Op::JumpIfFalse(0), condition.span());
                    self.block(body)?;
                    ends.push(self.emit(Op::Jump(0), *span));
                    self.patch(skip);
                }
                self.block(orelse)?;
                for end in ends {
                    self.patch(end);
                }
            }
            Stmt::While {
                condition,
                body,
                span,
            } => {
                let start = self.program.ops.len();
                self.expression(condition)?;
                let exit = self.emit(Op::JumpIfFalse(0), condition.span());
                self.loops.push(LoopLabels {
                    start,
                    breaks: Vec::new(),
                });
                let body = self.block(body);
                let labels = self.loops.pop();
                body?;
                self.emit(Op::Jump(start), *span);
                self.patch(exit);
                for jump in labels.map(|l| l.breaks).unwrap_or_default() {
                    self.patch(jump);
                }
            }
        }
        Ok(())
    }

    fn block(
        &mut self,
        body: &[Stmt],
    ) -> Result<(), CompileError> {
        for stmt in body {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn expression(
        &mut self,
        expr: &Expr,
    ) -> Result<(), CompileError> {
        let span = expr.span();
        match expr {
            Expr::Int(n, _) => self.load_const(Const::Int(*n), span),
            Expr::Str(s, _) => self.load_const(Const::Str(s.clone()), span),
            Expr::Bool(b, _) => self.load_const(Const::Bool(*b), span),
            Expr::None(_) => self.load_const(Const::None, span),
            Expr::Name(name, _) => {
                let index = self.name(name);
                self.emit(Op::LoadName(index), span);
            }
            Expr::List(items, _) => {
                for item in items {
                    self.expression(item)?;
                }
                self.emit(Op::BuildList(items.len()), span);
            }
            Expr::Unary { op, expr, .. } => {
                self.expression(expr)?;
                self.emit(Op::Unary(*op), span);
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                self.expression(left)?;
                self.expression(right)?;
                self.emit(Op::Binary(*op), span);
            }
            Expr::Logical {
                op, left, right, ..
            } => {
                self.expression(left)?;
                let jump = match op {
                    LogicOp::And => Op::JumpIfFalseOrPop(0),
                    LogicOp::Or => Op::JumpIfTrueOrPop(0),
                };
                let at = self.emit(jump, span);
                self.expression(right)?;
                self.patch(at);
            }
            Expr::Call { func, args, .. } => {
                self.expression(func)?;
                for arg in args {
                    self.expression(arg)?;
                }
                self.emit(Op::Call(args.len()), span);
            }
            Expr::Attribute { object, name, .. } => {
                self.expression(object)?;
                let index = self.name(name);
                self.emit(Op::LoadAttr(index), span);
            }
            Expr::Index { object, index, .. } => {
                self.expression(object)?;
                self.expression(index)?;
                self.emit(Op::Subscript, span);
            }
        }
        Ok(())
    }

    fn load_const(
        &mut self,
        value: Const,
        span: Span,
    ) {
        let index = self.constant(value);
        self.emit(Op::LoadConst(index), span);
    }
}

/// Only plain names can be assigned to
fn check_target(target: &Expr) -> Result<(), CompileError> {
    match target {
        Expr::Name(..) => Ok(()),
        t if t.is_literal() => Err(CompileError::AssignToLiteral { span: t.span() }),
        t => Err(CompileError::AssignToExpression { span: t.span() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;
    use crate::frontend::parser::parse;

    fn compile_src(
        source: &str,
        kind: InputKind,
    ) -> Result<Program, CompileError> {
        let module = parse(tokenize(source).unwrap(), kind).unwrap();
        compile(&module, kind)
    }

    #[test]
    fn test_expression_statement() {
        let program = compile_src("1 + x\n", InputKind::File).unwrap();
        assert_eq!(
            program.ops,
            vec![
                Op::LoadConst(0),
                Op::LoadName(0),
                Op::Binary(BinOp::Add),
                Op::Pop
            ]
        );
        assert_eq!(program.lines, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_interactive_echo() {
        let program = compile_src("x\n", InputKind::SingleStatement).unwrap();
        assert_eq!(program.ops, vec![Op::LoadName(0), Op::PrintExpr]);
    }

    #[test]
    fn test_chained_assignment() {
        let program = compile_src("a = b = 1\n", InputKind::File).unwrap();
        assert_eq!(
            program.ops,
            vec![
                Op::LoadConst(0),
                Op::Dup,
                Op::StoreName(0),
                Op::StoreName(1)
            ]
        );
        assert_eq!(program.names, vec!["a", "b"]);
    }

    #[test]
    fn test_while_jumps() {
        let program = compile_src("while x:\n    break\n", InputKind::File).unwrap();
        assert_eq!(
            program.ops,
            vec![
                Op::LoadName(0),
                Op::JumpIfFalse(4),
                Op::Jump(4),
                Op::Jump(0)
            ]
        );
    }

    #[test]
    fn test_if_else_jumps() {
        let program = compile_src("if a:\n  1\nelse:\n  2\n", InputKind::File).unwrap();
        assert_eq!(
            program.ops,
            vec![
                Op::LoadName(0),
                Op::JumpIfFalse(5),
                Op::LoadConst(0),
                Op::Pop,
                Op::Jump(7),
                Op::LoadConst(1),
                Op::Pop
            ]
        );
        assert_eq!(program.line(5), 4);
    }

    #[test]
    fn test_constants_are_shared() {
        let program = compile_src("'a'\n'a'\n", InputKind::File).unwrap();
        assert_eq!(program.consts, vec![Const::Str("a".into())]);
    }

    #[test]
    fn test_errors() {
        let err = compile_src("1 = x\n", InputKind::File).unwrap_err();
        assert_eq!(err.to_string(), "can't assign to literal");

        let err = compile_src("f() = x\n", InputKind::File).unwrap_err();
        assert_eq!(err.to_string(), "can't assign to expression");

        let err = compile_src("x = 1\nbreak\n", InputKind::File).unwrap_err();
        assert_eq!(err.to_string(), "'break' outside loop");
        assert_eq!(err.span().line(), 2);

        let err = compile_src("if x:\n  continue\n", InputKind::File).unwrap_err();
        assert_eq!(err.to_string(), "'continue' not properly in loop");
    }
}
