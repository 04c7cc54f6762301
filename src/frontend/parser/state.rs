//! Parser state and token stream management

use super::super::lexer::tokens::*;
use super::ParseError;
use crate::util::span::Span;

/// Binding power levels for Pratt parser
pub const BP_LOWEST: u8 = 0;
pub const BP_OR: u8 = 20;
pub const BP_AND: u8 = 30;
pub const BP_NOT: u8 = 40;
pub const BP_CMP: u8 = 50;
pub const BP_ADD: u8 = 60;
pub const BP_MUL: u8 = 70;
pub const BP_UNARY: u8 = 80;
pub const BP_CALL: u8 = 90;

/// Deepest expression or block nesting the parser accepts
pub const MAX_NESTING: usize = 200;

/// Parser state for tracking position in the token stream
#[derive(Debug)]
pub struct ParserState {
    /// Token stream, always terminated by `Eof`
    tokens: Vec<Token>,
    /// Current position in token stream
    pos: usize,
    /// Depth of the tree under construction
    depth: usize,
}

impl ParserState {
    /// Create a new parser state
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let span = tokens.last().map(|t| Span::new(t.span.end, t.span.end)).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Check if at end of token stream
    #[inline]
    pub fn at_end(&self) -> bool {
        self.at(&TokenKind::Eof)
    }

    /// Get current token
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Get current token kind
    #[inline]
    pub fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    /// Check current token kind
    #[inline]
    pub fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.kind() == kind
    }

    /// Span of the current token
    #[inline]
    pub fn span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token
    #[inline]
    pub fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(i) => self.tokens[i].span,
            None => self.span(),
        }
    }

    /// Advance to next token
    #[inline]
    pub fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    /// Skip a specific token
    #[inline]
    pub fn skip(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expect a specific token
    pub fn expect(
        &mut self,
        kind: &TokenKind,
    ) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected())
        }
    }

    /// Descend one nesting level
    pub fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep { span: self.span() });
        }
        self.depth += 1;
        Ok(())
    }

    /// Return from `levels` nesting levels
    pub fn leave(
        &mut self,
        levels: usize,
    ) {
        self.depth = self.depth.saturating_sub(levels);
    }

    /// Error for the current token
    pub fn unexpected(&self) -> ParseError {
        match self.kind() {
            TokenKind::Indent => ParseError::UnexpectedIndent { span: self.span() },
            _ => ParseError::InvalidSyntax { span: self.span() },
        }
    }
}
