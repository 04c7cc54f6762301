//! Source diagnostics
//!
//! A [`Diagnostic`] is what the frontend hands back when a source unit
//! cannot be lexed, parsed or compiled. It renders the way the runtime's
//! own tracebacks do, so syntax and runtime faults look alike on the
//! error stream:
//!
//! ```text
//!   File "prog.py", line 3
//! SyntaxError: invalid syntax
//! ```

use std::fmt;

use crate::util::span::Span;

/// Diagnostic kind, printed as the error class name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Malformed tokens or grammar
    Syntax,
    /// Indentation does not line up
    Indentation,
}

impl DiagnosticKind {
    /// Class name shown to the user
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "SyntaxError",
            DiagnosticKind::Indentation => "IndentationError",
        }
    }
}

/// Lex, parse or compile diagnostic for one source unit
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Error class
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
    /// Name of the source unit (file path or `<stdin>`)
    pub source: String,
    /// Location, when known
    pub span: Option<Span>,
}

impl Diagnostic {
    /// Syntax error without a location
    pub fn syntax(
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: DiagnosticKind::Syntax,
            message: message.into(),
            source: source.into(),
            span: None,
        }
    }

    /// Indentation error without a location
    pub fn indentation(
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: DiagnosticKind::Indentation,
            message: message.into(),
            source: source.into(),
            span: None,
        }
    }

    /// Attach a location
    pub fn at(
        mut self,
        span: Span,
    ) -> Self {
        self.span = Some(span);
        self
    }

    /// Line number, when known
    pub fn line(&self) -> Option<usize> {
        self.span.map(|s| s.line())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.line() {
            Some(line) => writeln!(f, "  File \"{}\", line {}", self.source, line)?,
            None => writeln!(f, "  File \"{}\"", self.source)?,
        }
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for Diagnostic {}
