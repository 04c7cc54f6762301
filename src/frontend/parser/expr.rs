//! Pratt Parser expression parsing

use super::super::lexer::tokens::*;
use super::ast::*;
use super::state::*;
use super::ParseError;

impl ParserState {
    /// Parse an expression using Pratt parser
    ///
    /// # Algorithm
    /// 1. Parse prefix expression
    /// 2. While the next token is an infix or postfix operator whose left
    ///    binding power is at least `min_bp`, fold it into the left side,
    ///    parsing its right operand with the operator's right binding power
    pub fn parse_expression(
        &mut self,
        min_bp: u8,
    ) -> Result<Expr, ParseError> {
        self.enter()?;
        let mut levels = 1;
        let mut lhs = self.parse_prefix()?;

        // Every fold makes the left operand one level deeper
        while let Some((left_bp, right_bp)) = self.infix_power() {
            if left_bp < min_bp {
                break;
            }
            self.enter()?;
            levels += 1;
            lhs = match self.kind() {
                TokenKind::LParen => self.parse_call(lhs)?,
                TokenKind::LBracket => self.parse_index(lhs)?,
                TokenKind::Dot => self.parse_attribute(lhs)?,
                TokenKind::KwAnd | TokenKind::KwOr => self.parse_logical(lhs, right_bp)?,
                _ => self.parse_binary(lhs, right_bp)?,
            };
        }

        self.leave(levels);
        Ok(lhs)
    }

    /// Whether the current token can begin an expression
    pub fn can_start_expr(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::IntLiteral(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::Identifier(_)
                | TokenKind::KwTrue
                | TokenKind::KwFalse
                | TokenKind::KwNone
                | TokenKind::KwNot
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::LParen
                | TokenKind::LBracket
        )
    }

    /// Left and right binding power of the current token as an infix operator
    fn infix_power(&self) -> Option<(u8, u8)> {
        let bp = match self.kind() {
            TokenKind::KwOr => BP_OR,
            TokenKind::KwAnd => BP_AND,
            TokenKind::EqEq
            | TokenKind::Neq
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => BP_CMP,
            TokenKind::Plus | TokenKind::Minus => BP_ADD,
            TokenKind::Star | TokenKind::SlashSlash | TokenKind::Percent => BP_MUL,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot => BP_CALL,
            _ => return None,
        };
        Some((bp, bp + 1))
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();
        let span = token.span;
        match token.kind {
            TokenKind::IntLiteral(n) => {
                self.bump();
                Ok(Expr::Int(n, span))
            }
            TokenKind::StringLiteral(s) => {
                self.bump();
                // Adjacent literals concatenate
                let mut value = s;
                let mut end = span;
                while let TokenKind::StringLiteral(next) = self.kind() {
                    value.push_str(next);
                    end = self.bump().span;
                }
                Ok(Expr::Str(value, span.to(end)))
            }
            TokenKind::Identifier(name) => {
                self.bump();
                Ok(Expr::Name(name, span))
            }
            TokenKind::KwTrue => {
                self.bump();
                Ok(Expr::Bool(true, span))
            }
            TokenKind::KwFalse => {
                self.bump();
                Ok(Expr::Bool(false, span))
            }
            TokenKind::KwNone => {
                self.bump();
                Ok(Expr::None(span))
            }
            TokenKind::Minus => self.parse_unary(UnOp::Neg, BP_UNARY),
            TokenKind::Plus => self.parse_unary(UnOp::Pos, BP_UNARY),
            TokenKind::KwNot => self.parse_unary(UnOp::Not, BP_NOT),
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expression(BP_LOWEST)?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.bump();
                let items = self.parse_list(&TokenKind::RBracket)?;
                let end = self.expect(&TokenKind::RBracket)?.span;
                Ok(Expr::List(items, span.to(end)))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_unary(
        &mut self,
        op: UnOp,
        bp: u8,
    ) -> Result<Expr, ParseError> {
        let span = self.bump().span;
        let expr = self.parse_expression(bp)?;
        Ok(Expr::Unary {
            op,
            span: span.to(expr.span()),
            expr: Box::new(expr),
        })
    }

    /// Comma-separated expressions up to (not including) `close`; a
    /// trailing comma is allowed.
    fn parse_list(
        &mut self,
        close: &TokenKind,
    ) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.at(close) {
            items.push(self.parse_expression(BP_LOWEST)?);
            if !self.skip(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_binary(
        &mut self,
        lhs: Expr,
        right_bp: u8,
    ) -> Result<Expr, ParseError> {
        let op = match self.bump().kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::SlashSlash => BinOp::FloorDiv,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::Neq => BinOp::Neq,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            _ => return Err(ParseError::InvalidSyntax { span: self.previous_span() }),
        };
        let rhs = self.parse_expression(right_bp)?;
        Ok(Expr::Binary {
            op,
            span: lhs.span().to(rhs.span()),
            left: Box::new(lhs),
            right: Box::new(rhs),
        })
    }

    fn parse_logical(
        &mut self,
        lhs: Expr,
        right_bp: u8,
    ) -> Result<Expr, ParseError> {
        let op = match self.bump().kind {
            TokenKind::KwAnd => LogicOp::And,
            _ => LogicOp::Or,
        };
        let rhs = self.parse_expression(right_bp)?;
        Ok(Expr::Logical {
            op,
            span: lhs.span().to(rhs.span()),
            left: Box::new(lhs),
            right: Box::new(rhs),
        })
    }

    fn parse_call(
        &mut self,
        func: Expr,
    ) -> Result<Expr, ParseError> {
        self.bump(); // consume '('
        let args = self.parse_list(&TokenKind::RParen)?;
        let end = self.expect(&TokenKind::RParen)?.span;
        Ok(Expr::Call {
            span: func.span().to(end),
            func: Box::new(func),
            args,
        })
    }

    fn parse_index(
        &mut self,
        object: Expr,
    ) -> Result<Expr, ParseError> {
        self.bump(); // consume '['
        let index = self.parse_expression(BP_LOWEST)?;
        let end = self.expect(&TokenKind::RBracket)?.span;
        Ok(Expr::Index {
            span: object.span().to(end),
            object: Box::new(object),
            index: Box::new(index),
        })
    }

    fn parse_attribute(
        &mut self,
        object: Expr,
    ) -> Result<Expr, ParseError> {
        self.bump(); // consume '.'
        let token = self.bump();
        match token.kind {
            TokenKind::Identifier(name) => Ok(Expr::Attribute {
                span: object.span().to(token.span),
                object: Box::new(object),
                name,
            }),
            _ => Err(ParseError::InvalidSyntax { span: token.span }),
        }
    }
}
