//! Parser module
//!
//! This module implements a Pratt Parser for the bundled language.
//! The parser transforms tokens into an Abstract Syntax Tree (AST).

pub mod ast;
mod expr;
mod state;
mod stmt;

pub use state::{ParserState, BP_LOWEST, MAX_NESTING};

use crate::backends::InputKind;
use crate::frontend::lexer::tokens::*;
use crate::util::span::Span;
use ast::*;

/// Parse tokens into an AST module
///
/// `File` input accepts any number of statements. `SingleStatement` input
/// accepts at most one, which may be compound.
pub fn parse(
    tokens: Vec<Token>,
    kind: InputKind,
) -> Result<Module, ParseError> {
    let mut state = ParserState::new(tokens);
    let mut body = Vec::new();

    while !state.at_end() {
        if state.skip(&TokenKind::Newline) {
            continue;
        }
        let stmt = state.parse_statement()?;
        if kind == InputKind::SingleStatement && !body.is_empty() {
            return Err(ParseError::MultipleStatements { span: stmt.span() });
        }
        body.push(stmt);
    }

    Ok(Module { body })
}

/// Parse a single expression
pub fn parse_expression(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    let mut state = ParserState::new(tokens);
    let expr = state.parse_expression(BP_LOWEST)?;
    state.skip(&TokenKind::Newline);
    if !state.at_end() {
        return Err(state.unexpected());
    }
    Ok(expr)
}

/// Parse error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("invalid syntax")]
    InvalidSyntax { span: Span },

    #[error("unexpected indent")]
    UnexpectedIndent { span: Span },

    #[error("expected an indented block")]
    ExpectedIndent { span: Span },

    #[error("multiple statements found while compiling a single statement")]
    MultipleStatements { span: Span },

    #[error("too many nested expressions")]
    TooDeep { span: Span },
}

impl ParseError {
    /// Location of the offending token
    pub fn span(&self) -> Span {
        match self {
            ParseError::InvalidSyntax { span }
            | ParseError::UnexpectedIndent { span }
            | ParseError::ExpectedIndent { span }
            | ParseError::MultipleStatements { span }
            | ParseError::TooDeep { span } => *span,
        }
    }

    /// Whether the error is reported as an indentation error
    pub fn is_indentation(&self) -> bool {
        matches!(
            self,
            ParseError::UnexpectedIndent { .. } | ParseError::ExpectedIndent { .. }
        )
    }
}
