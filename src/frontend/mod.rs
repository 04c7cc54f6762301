//! Frontend compilation pipeline
//!
//! This module contains the lexer, parser and bytecode compiler of the
//! bundled language, and [`MiniLanguage`], which plugs them and the
//! [`vm`](crate::vm) into the host as its [`Language`].

pub mod compiler;
pub mod complete;
pub mod lexer;
pub mod parser;

use tracing::debug;

use crate::backends::{CallContext, Language, SourceUnit};
use crate::util::diagnostic::Diagnostic;
use crate::util::span::Span;
use crate::vm::{Exception, Program, Vm};
use lexer::tokens::Token;
use parser::ast::Module;

/// The bundled Python-subset language.
///
/// Module globals live in the VM and persist across invocations, which is
/// what lets one interactive statement see the names bound by another.
#[derive(Debug, Default)]
pub struct MiniLanguage {
    vm: Vm,
}

impl MiniLanguage {
    /// Create a language instance with an empty namespace
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The virtual machine
    pub fn vm(&self) -> &Vm {
        &self.vm
    }
}

impl Language for MiniLanguage {
    type Tokens = Vec<Token>;
    type Tree = Module;
    type Unit = Program;
    type Fault = Exception;

    fn lex(
        &mut self,
        unit: &SourceUnit,
    ) -> Result<Vec<Token>, Diagnostic> {
        let tokens = lexer::tokenize(unit.text()).map_err(|e| {
            let position = e.position();
            let diagnostic = if e.is_indentation() {
                Diagnostic::indentation(unit.name(), e.to_string())
            } else {
                Diagnostic::syntax(unit.name(), e.to_string())
            };
            diagnostic.at(Span::new(position, position))
        })?;
        debug!("tokenized into {} tokens", tokens.len());
        Ok(tokens)
    }

    fn parse(
        &mut self,
        tokens: Vec<Token>,
        unit: &SourceUnit,
    ) -> Result<Module, Diagnostic> {
        parser::parse(tokens, unit.kind()).map_err(|e| {
            let diagnostic = if e.is_indentation() {
                Diagnostic::indentation(unit.name(), e.to_string())
            } else {
                Diagnostic::syntax(unit.name(), e.to_string())
            };
            diagnostic.at(e.span())
        })
    }

    fn compile(
        &mut self,
        tree: Module,
        unit: &SourceUnit,
    ) -> Result<Program, Diagnostic> {
        compiler::compile(&tree, unit.kind())
            .map_err(|e| Diagnostic::syntax(unit.name(), e.to_string()).at(e.span()))
    }

    fn invoke(
        &mut self,
        unit: Program,
        cx: &mut CallContext<'_>,
    ) -> Result<(), Exception> {
        self.vm.run(&unit, cx)
    }

    fn is_statement_complete(
        &self,
        text: &str,
    ) -> bool {
        complete::is_statement_complete(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::common::RuntimeHeap;
    use crate::backends::driver::tests::session;
    use crate::backends::{Driver, FaultRecord};
    use crate::util::diagnostic::DiagnosticKind;

    fn heap() -> RuntimeHeap {
        RuntimeHeap::new(vec![0u8; 4096].into_boxed_slice())
    }

    #[test]
    fn test_diagnostics_carry_kind_and_line() {
        let mut language = MiniLanguage::new();
        let unit = SourceUnit::file("prog.py", "x = 1\n  y = 2\n");
        let tokens = language.lex(&unit).unwrap();
        let diagnostic = language.parse(tokens, &unit).unwrap_err();
        assert_eq!(diagnostic.kind, DiagnosticKind::Indentation);
        assert_eq!(diagnostic.line(), Some(2));

        let unit = SourceUnit::file("prog.py", "x = 'open\n");
        let diagnostic = language.lex(&unit).unwrap_err();
        assert_eq!(diagnostic.kind, DiagnosticKind::Syntax);
        assert_eq!(diagnostic.to_string(), "  File \"prog.py\", line 1\nSyntaxError: unterminated string literal");
    }

    #[test]
    fn test_globals_persist_across_statements() {
        let mut heap = heap();
        let (mut session, out, _err) = session(&mut heap);
        let mut driver = Driver::new(MiniLanguage::new());

        driver.run(SourceUnit::statement("x = 20"), &mut session).unwrap();
        driver.run(SourceUnit::statement("x + 22"), &mut session).unwrap();
        assert_eq!(out.contents(), "42\n");
    }

    #[test]
    fn test_runtime_fault_traceback() {
        let mut heap = heap();
        let (mut session, _out, err) = session(&mut heap);
        let mut driver = Driver::new(MiniLanguage::new());

        let result = driver.run(SourceUnit::file("prog.py", "x = 1\ny = x // 0\n"), &mut session);
        assert!(matches!(result, Err(FaultRecord::Runtime(_))));
        assert_eq!(
            err.contents(),
            "Traceback (most recent call last):\n  File \"prog.py\", line 2, in <module>\n\
             ZeroDivisionError: integer division or modulo by zero\n"
        );
    }

    #[test]
    fn test_system_exit_is_requested_exit() {
        let mut heap = heap();
        let (mut session, _out, err) = session(&mut heap);
        let mut driver = Driver::new(MiniLanguage::new());

        let result = driver.run(SourceUnit::file("prog.py", "raise SystemExit(4)\n"), &mut session);
        assert_eq!(result, Err(FaultRecord::RequestedExit(4)));
        assert_eq!(session.exit.code(), Some(4));
        assert_eq!(err.contents(), "");
    }
}
