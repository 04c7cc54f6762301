//! Execution side of the host
//!
//! This module defines the seam between the host and the language it runs:
//! - [`Language`]: lex, parse, compile and invoke collaborators
//! - [`Fault`]: the opaque value a failed invocation carries back
//! - [`SourceUnit`]: one piece of program text headed for the pipeline
//! - [`CallContext`]: what a compiled unit can see while it runs
//!
//! # Architecture
//!
//! ```text
//! SourceUnit
//!     |
//!     v
//!   lex -> parse -> compile -> invoke      (Language)
//!     |        |         |         |
//!     +--------+---------+---------+
//!                  |
//!                  v
//!            Driver::run  ->  Ok(()) | FaultRecord
//! ```

pub mod common;
pub mod dev;
pub mod driver;

use std::fmt;
use std::io::Write;

use crate::backends::common::RuntimeHeap;
use crate::host::Ambient;
use crate::util::diagnostic::Diagnostic;

pub use driver::{Driver, FaultRecord};

/// Source name used for interactive input
pub const STDIN_NAME: &str = "<stdin>";

/// How the parser should treat a source unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A whole file: zero or more statements
    File,
    /// One interactive statement, possibly compound
    SingleStatement,
}

/// Program text for one pass through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    name: String,
    text: String,
    kind: InputKind,
}

impl SourceUnit {
    /// Create a source unit
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        kind: InputKind,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            kind,
        }
    }

    /// A file's contents
    pub fn file(
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(name, text, InputKind::File)
    }

    /// One interactive statement
    pub fn statement(text: impl Into<String>) -> Self {
        Self::new(STDIN_NAME, text, InputKind::SingleStatement)
    }

    /// Name tag (file path or `<stdin>`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Input kind
    pub fn kind(&self) -> InputKind {
        self.kind
    }
}

/// Opaque value carried back by an invocation that did not complete.
///
/// `Display` is the human-readable diagnostic for the fault.
pub trait Fault: fmt::Display + fmt::Debug {
    /// `Some(code)` when this fault is a request to end the process
    fn exit_code(&self) -> Option<i64>;
}

/// What a compiled unit sees while it runs.
///
/// The ambient bindings are passed in explicitly rather than living in
/// globals, so repeated invocations (and test harnesses) never interfere.
pub struct CallContext<'a> {
    /// Name of the source unit being executed
    pub source_name: &'a str,
    /// Kind of the source unit being executed
    pub kind: InputKind,
    /// Argument vector and module search path
    pub ambient: &'a Ambient,
    /// The runtime heap
    pub heap: &'a mut RuntimeHeap,
    /// Program output stream
    pub out: &'a mut dyn Write,
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("source_name", &self.source_name)
            .field("kind", &self.kind)
            .field("ambient", &self.ambient)
            .field("heap", &self.heap)
            .finish()
    }
}

/// Language collaborators driven by the host.
///
/// Each stage consumes the previous stage's output, so a later stage can
/// only run once the earlier one succeeded.
pub trait Language {
    /// Lexer output
    type Tokens;
    /// Parser output
    type Tree;
    /// Compiled, callable zero-argument unit
    type Unit;
    /// Fault value carried out of a failed invocation
    type Fault: Fault;

    /// Split source text into tokens
    fn lex(
        &mut self,
        unit: &SourceUnit,
    ) -> Result<Self::Tokens, Diagnostic>;

    /// Build a parse tree
    fn parse(
        &mut self,
        tokens: Self::Tokens,
        unit: &SourceUnit,
    ) -> Result<Self::Tree, Diagnostic>;

    /// Compile a parse tree
    fn compile(
        &mut self,
        tree: Self::Tree,
        unit: &SourceUnit,
    ) -> Result<Self::Unit, Diagnostic>;

    /// Run a compiled unit once
    fn invoke(
        &mut self,
        unit: Self::Unit,
        cx: &mut CallContext<'_>,
    ) -> Result<(), Self::Fault>;

    /// Whether `text` forms one complete interactive statement
    fn is_statement_complete(
        &self,
        text: &str,
    ) -> bool;
}
