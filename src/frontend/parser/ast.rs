//! Abstract Syntax Tree types

use crate::util::span::Span;

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64, Span),
    Str(String, Span),
    Bool(bool, Span),
    None(Span),
    Name(String, Span),
    List(Vec<Expr>, Span),
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// Short-circuiting `and` / `or`
    Logical {
        op: LogicOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Attribute {
        object: Box<Expr>,
        name: String,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(_, span)
            | Expr::Str(_, span)
            | Expr::Bool(_, span)
            | Expr::None(span)
            | Expr::Name(_, span)
            | Expr::List(_, span) => *span,
            Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Call { span, .. }
            | Expr::Attribute { span, .. }
            | Expr::Index { span, .. } => *span,
        }
    }

    /// Whether this expression is a literal value
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::Int(..) | Expr::Str(..) | Expr::Bool(..) | Expr::None(_)
        )
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Operator as written in source
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `a = b = value`: every target receives the value
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        span: Span,
    },
    Pass(Span),
    Break(Span),
    Continue(Span),
    Raise {
        value: Option<Expr>,
        span: Span,
    },
    If {
        /// `if` condition and body, then each `elif`
        branches: Vec<(Expr, Vec<Stmt>)>,
        orelse: Vec<Stmt>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(expr) => expr.span(),
            Stmt::Assign { span, .. }
            | Stmt::Raise { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. } => *span,
            Stmt::Pass(span) | Stmt::Break(span) | Stmt::Continue(span) => *span,
        }
    }
}

/// Parsed source unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
}
