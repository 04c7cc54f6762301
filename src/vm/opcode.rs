//! Bytecode definitions
//!
//! A compiled unit is a flat stack-machine program. Every op carries the
//! source line it came from (parallel `lines` table) so a fault can name
//! the line it was raised on.

use std::fmt;

use crate::frontend::parser::ast::{BinOp, UnOp};

/// Constant pool entry
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    None,
    Bool(bool),
    Int(i64),
    /// Copied into the runtime heap when loaded
    Str(String),
}

/// Stack machine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Push `consts[i]`
    LoadConst(usize),
    /// Push the value bound to `names[i]`
    LoadName(usize),
    /// Pop and bind to `names[i]`
    StoreName(usize),
    /// Replace TOS with its attribute `names[i]`
    LoadAttr(usize),
    /// Pop index and object, push `object[index]`
    Subscript,
    /// Pop `n` values, push a list of them
    BuildList(usize),
    Unary(UnOp),
    Binary(BinOp),
    /// Pop `n` arguments and the callee, push the result
    Call(usize),
    Dup,
    Pop,
    /// Pop; write its repr to the output stream unless it is `None`
    PrintExpr,
    Jump(usize),
    /// Pop; jump if falsy
    JumpIfFalse(usize),
    /// Jump if TOS is falsy, else pop
    JumpIfFalseOrPop(usize),
    /// Jump if TOS is truthy, else pop
    JumpIfTrueOrPop(usize),
    /// Raise TOS, or re-raise when the flag is false
    Raise(bool),
}

/// Compiled, callable unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub ops: Vec<Op>,
    /// Source line of each op
    pub lines: Vec<usize>,
    pub consts: Vec<Const>,
    pub names: Vec<String>,
}

impl Program {
    /// Source line of the op at `ip`
    pub fn line(
        &self,
        ip: usize,
    ) -> usize {
        self.lines.get(ip).copied().unwrap_or(0)
    }

    /// Name-table entry
    pub fn name(
        &self,
        index: usize,
    ) -> &str {
        self.names.get(index).map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for Program {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (ip, op) in self.ops.iter().enumerate() {
            write!(f, "{:4} {:4}  ", self.line(ip), ip)?;
            match op {
                Op::LoadConst(i) => writeln!(f, "LoadConst {:?}", self.consts.get(*i))?,
                Op::LoadName(i) => writeln!(f, "LoadName {}", self.name(*i))?,
                Op::StoreName(i) => writeln!(f, "StoreName {}", self.name(*i))?,
                Op::LoadAttr(i) => writeln!(f, "LoadAttr {}", self.name(*i))?,
                other => writeln!(f, "{:?}", other)?,
            }
        }
        Ok(())
    }
}
