//! Statement parsing

use super::super::lexer::tokens::*;
use super::ast::*;
use super::state::*;
use super::ParseError;

impl ParserState {
    /// Parse one statement, simple or compound
    pub fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.kind() {
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            _ => self.parse_simple_line(),
        }
    }

    /// Simple statement terminated by a newline
    fn parse_simple_line(&mut self) -> Result<Stmt, ParseError> {
        let stmt = self.parse_simple_statement()?;
        if !self.skip(&TokenKind::Newline) && !self.at_end() {
            return Err(self.unexpected());
        }
        Ok(stmt)
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let span = self.span();
        match self.kind() {
            TokenKind::KwPass => {
                self.bump();
                Ok(Stmt::Pass(span))
            }
            TokenKind::KwBreak => {
                self.bump();
                Ok(Stmt::Break(span))
            }
            TokenKind::KwContinue => {
                self.bump();
                Ok(Stmt::Continue(span))
            }
            TokenKind::KwRaise => {
                self.bump();
                if self.can_start_expr() {
                    let value = self.parse_expression(BP_LOWEST)?;
                    Ok(Stmt::Raise {
                        span: span.to(value.span()),
                        value: Some(value),
                    })
                } else {
                    Ok(Stmt::Raise { value: None, span })
                }
            }
            _ if self.can_start_expr() => self.parse_expr_or_assign(),
            _ => Err(self.unexpected()),
        }
    }

    /// `expr` or `target = [target = ...] value`
    fn parse_expr_or_assign(&mut self) -> Result<Stmt, ParseError> {
        let first = self.parse_expression(BP_LOWEST)?;
        if !self.at(&TokenKind::Assign) {
            return Ok(Stmt::Expr(first));
        }

        let mut targets = vec![first];
        while self.skip(&TokenKind::Assign) {
            targets.push(self.parse_expression(BP_LOWEST)?);
        }
        let value = targets.pop().ok_or(ParseError::InvalidSyntax { span: self.span() })?;
        let span = targets
            .first()
            .map(|t| t.span().to(value.span()))
            .unwrap_or_else(|| value.span());
        Ok(Stmt::Assign {
            targets,
            value,
            span,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let span = self.bump().span; // consume 'if'
        let condition = self.parse_expression(BP_LOWEST)?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_suite()?;
        let mut branches = vec![(condition, body)];

        while self.skip(&TokenKind::KwElif) {
            let condition = self.parse_expression(BP_LOWEST)?;
            self.expect(&TokenKind::Colon)?;
            branches.push((condition, self.parse_suite()?));
        }

        let orelse = if self.skip(&TokenKind::KwElse) {
            self.expect(&TokenKind::Colon)?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            branches,
            orelse,
            span: span.to(self.previous_span()),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let span = self.bump().span; // consume 'while'
        let condition = self.parse_expression(BP_LOWEST)?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_suite()?;
        Ok(Stmt::While {
            condition,
            body,
            span: span.to(self.previous_span()),
        })
    }

    /// Body of a compound statement: a simple statement on the header line,
    /// or an indented block on the following lines.
    fn parse_suite(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if !self.skip(&TokenKind::Newline) {
            return Ok(vec![self.parse_simple_line()?]);
        }
        if !self.skip(&TokenKind::Indent) {
            return Err(ParseError::ExpectedIndent { span: self.span() });
        }

        self.enter()?;
        let mut body = Vec::new();
        while !self.at(&TokenKind::Dedent) && !self.at_end() {
            body.push(self.parse_statement()?);
        }
        self.skip(&TokenKind::Dedent);
        self.leave(1);
        Ok(body)
    }
}
