//! Token types

use crate::util::span::Span;

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    KwIf,
    KwElif,
    KwElse,
    KwWhile,
    KwBreak,
    KwContinue,
    KwPass,
    KwRaise,
    KwAnd,
    KwOr,
    KwNot,
    KwTrue,
    KwFalse,
    KwNone,

    // Identifiers
    Identifier(String),

    // Literals
    IntLiteral(i64),
    StringLiteral(String),

    // Operators
    Plus,
    Minus,
    Star,
    SlashSlash,
    Percent,
    EqEq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,

    // Layout
    Newline,
    Indent,
    Dedent,

    // End of input
    Eof,
}

impl TokenKind {
    /// Keyword for an identifier-shaped word, if it is one
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "if" => TokenKind::KwIf,
            "elif" => TokenKind::KwElif,
            "else" => TokenKind::KwElse,
            "while" => TokenKind::KwWhile,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "pass" => TokenKind::KwPass,
            "raise" => TokenKind::KwRaise,
            "and" => TokenKind::KwAnd,
            "or" => TokenKind::KwOr,
            "not" => TokenKind::KwNot,
            "True" => TokenKind::KwTrue,
            "False" => TokenKind::KwFalse,
            "None" => TokenKind::KwNone,
            _ => return None,
        };
        Some(kind)
    }
}

/// Token with position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        span: Span,
    ) -> Self {
        Self { kind, span }
    }
}
