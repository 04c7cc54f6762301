//! Lexer module
//!
//! Produces a flat token stream with explicit layout tokens: `Newline` ends
//! each logical line, `Indent`/`Dedent` bracket indented blocks. Newlines
//! inside brackets and after a trailing backslash do not end a line; blank
//! and comment-only lines produce nothing.

pub mod tokens;

use thiserror::Error;

use crate::util::span::{Position, Span};
use tokens::*;

/// Tab stops for indentation measurement
const TAB_SIZE: usize = 8;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("invalid character '{ch}'")]
    UnexpectedChar { ch: char, position: Position },
    #[error("unterminated string literal")]
    UnterminatedString { position: Position },
    #[error("{message}")]
    InvalidNumber {
        message: &'static str,
        position: Position,
    },
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent { position: Position },
    #[error("unexpected character after line continuation character")]
    BadContinuation { position: Position },
}

impl LexError {
    /// Where the error was detected
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::InvalidNumber { position, .. }
            | LexError::InconsistentDedent { position }
            | LexError::BadContinuation { position } => *position,
        }
    }

    /// Whether this is an indentation problem rather than a bad token
    pub fn is_indentation(&self) -> bool {
        matches!(self, LexError::InconsistentDedent { .. })
    }
}

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    indents: Vec<usize>,
    depth: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn position(&self) -> Position {
        Position::with_offset(self.line, self.column, self.offset)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(
        &mut self,
        kind: TokenKind,
        start: Position,
    ) {
        let span = Span::new(start, self.position());
        self.tokens.push(Token::new(kind, span));
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_line_start && self.depth == 0 {
                self.indentation()?;
                if self.peek().is_none() {
                    break;
                }
            }

            let start = self.position();
            let c = match self.peek() {
                Some(c) => c,
                None => break,
            };

            match c {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.bump();
                }
                '#' => self.skip_comment(),
                '\\' => {
                    self.bump();
                    match self.peek() {
                        Some('\n') => {
                            self.bump();
                        }
                        Some('\r') if self.peek_second() == Some('\n') => {
                            self.bump();
                            self.bump();
                        }
                        _ => return Err(LexError::BadContinuation { position: start }),
                    }
                }
                '\n' => {
                    self.bump();
                    if self.depth == 0 {
                        self.push(TokenKind::Newline, start);
                        self.at_line_start = true;
                    }
                }
                '0'..='9' => self.number(start)?,
                '\'' | '"' => self.string(start)?,
                c if c == '_' || unicode_ident::is_xid_start(c) => self.word(start),
                _ => self.operator(c, start)?,
            }
        }

        let end = self.position();
        if !matches!(
            self.tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline) | Some(TokenKind::Dedent)
        ) {
            self.push(TokenKind::Newline, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end);
        }
        self.push(TokenKind::Eof, end);
        Ok(self.tokens)
    }

    /// Measure leading whitespace of a line and emit layout tokens.
    /// Blank and comment-only lines are consumed whole.
    fn indentation(&mut self) -> Result<(), LexError> {
        loop {
            let mut width = 0;
            while let Some(c) = self.peek() {
                match c {
                    ' ' => width += 1,
                    '\t' => width = (width / TAB_SIZE + 1) * TAB_SIZE,
                    '\x0c' | '\r' => {}
                    _ => break,
                }
                self.bump();
            }

            match self.peek() {
                None => return Ok(()),
                Some('\n') => {
                    self.bump();
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                Some(_) => {}
            }

            let start = self.position();
            let current = self.indents.last().copied().unwrap_or(0);
            if width > current {
                self.indents.push(width);
                self.push(TokenKind::Indent, start);
            } else {
                while width < self.indents.last().copied().unwrap_or(0) {
                    self.indents.pop();
                    self.push(TokenKind::Dedent, start);
                }
                if width != self.indents.last().copied().unwrap_or(0) {
                    return Err(LexError::InconsistentDedent { position: start });
                }
            }
            self.at_line_start = false;
            return Ok(());
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn number(
        &mut self,
        start: Position,
    ) -> Result<(), LexError> {
        let begin = self.offset;
        while matches!(self.peek(), Some('0'..='9')) {
            self.bump();
        }
        if matches!(self.peek(), Some(c) if c == '_' || unicode_ident::is_xid_continue(c)) {
            return Err(LexError::InvalidNumber {
                message: "invalid decimal literal",
                position: start,
            });
        }
        let digits = &self.source[begin..self.offset];
        if digits.len() > 1 && digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
            return Err(LexError::InvalidNumber {
                message: "leading zeros in decimal integer literals are not permitted",
                position: start,
            });
        }
        let value = digits.parse::<i64>().map_err(|_| LexError::InvalidNumber {
            message: "integer literal too large",
            position: start,
        })?;
        self.push(TokenKind::IntLiteral(value), start);
        Ok(())
    }

    fn string(
        &mut self,
        start: Position,
    ) -> Result<(), LexError> {
        let quote = self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(LexError::UnterminatedString { position: start }),
                Some(c) if Some(c) == quote => break,
                Some('\\') => match self.bump() {
                    None => return Err(LexError::UnterminatedString { position: start }),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some('\n') => {}
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some(c) => value.push(c),
            }
        }
        self.push(TokenKind::StringLiteral(value), start);
        Ok(())
    }

    fn word(
        &mut self,
        start: Position,
    ) {
        let begin = self.offset;
        while matches!(self.peek(), Some(c) if c == '_' || unicode_ident::is_xid_continue(c)) {
            self.bump();
        }
        let word = &self.source[begin..self.offset];
        let kind = TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()));
        self.push(kind, start);
    }

    fn operator(
        &mut self,
        c: char,
        start: Position,
    ) -> Result<(), LexError> {
        self.bump();
        let next = self.peek();
        let kind = match (c, next) {
            ('/', Some('/')) => {
                self.bump();
                TokenKind::SlashSlash
            }
            ('=', Some('=')) => {
                self.bump();
                TokenKind::EqEq
            }
            ('!', Some('=')) => {
                self.bump();
                TokenKind::Neq
            }
            ('<', Some('=')) => {
                self.bump();
                TokenKind::Le
            }
            ('>', Some('=')) => {
                self.bump();
                TokenKind::Ge
            }
            ('+', _) => TokenKind::Plus,
            ('-', _) => TokenKind::Minus,
            ('*', _) => TokenKind::Star,
            ('%', _) => TokenKind::Percent,
            ('<', _) => TokenKind::Lt,
            ('>', _) => TokenKind::Gt,
            ('=', _) => TokenKind::Assign,
            (',', _) => TokenKind::Comma,
            (':', _) => TokenKind::Colon,
            ('.', _) => TokenKind::Dot,
            ('(', _) => {
                self.depth += 1;
                TokenKind::LParen
            }
            ('[', _) => {
                self.depth += 1;
                TokenKind::LBracket
            }
            (')', _) => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RParen
            }
            (']', _) => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RBracket
            }
            _ => return Err(LexError::UnexpectedChar { ch: c, position: start }),
        };
        self.push(kind, start);
        Ok(())
    }
}
