//! Execution driver
//!
//! Drives one [`SourceUnit`] through lex → parse → compile → invoke and
//! classifies the outcome. The driver is the single boundary where a fault
//! coming out of an invocation is caught: past this point every failure is
//! a [`FaultRecord`] value, never a propagating error.

use std::io::Write;

use thiserror::Error;
use tracing::{debug, debug_span, warn};

use crate::backends::{CallContext, Fault, Language, SourceUnit};
use crate::host::Session;
use crate::util::diagnostic::Diagnostic;

/// Why a pipeline pass did not complete normally
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FaultRecord {
    /// Lexing or parsing failed; nothing was compiled or run
    #[error("{0}")]
    Parse(Diagnostic),

    /// Compilation failed; nothing was run
    #[error("{0}")]
    Compile(Diagnostic),

    /// The compiled unit raised a fault other than a process exit
    #[error("{0}")]
    Runtime(String),

    /// The compiled unit asked for the process to end with this status
    #[error("exit requested with status {0}")]
    RequestedExit(i64),
}

impl FaultRecord {
    /// Process status this outcome contributes
    pub fn status(&self) -> i64 {
        match self {
            FaultRecord::RequestedExit(code) => *code,
            _ => 1,
        }
    }

    /// Whether this outcome was reported to the user as an error
    pub fn is_reported(&self) -> bool {
        !matches!(self, FaultRecord::RequestedExit(_))
    }
}

/// Runs source units against a [`Language`].
#[derive(Debug)]
pub struct Driver<L> {
    language: L,
}

impl<L: Language> Driver<L> {
    /// Create a driver over a language
    pub fn new(language: L) -> Self {
        Self { language }
    }

    /// The language collaborators
    pub fn language(&self) -> &L {
        &self.language
    }

    /// The language collaborators, mutably
    pub fn language_mut(&mut self) -> &mut L {
        &mut self.language
    }

    /// Ask the parser whether `text` is one complete statement
    pub fn is_statement_complete(
        &self,
        text: &str,
    ) -> bool {
        self.language.is_statement_complete(text)
    }

    /// Run one source unit.
    ///
    /// Parse, compile and runtime faults are written to the session's
    /// error stream before being returned. A requested exit is recorded in
    /// the session's [`ExitState`](crate::host::ExitState) and is not
    /// reported.
    pub fn run(
        &mut self,
        unit: SourceUnit,
        session: &mut Session<'_>,
    ) -> Result<(), FaultRecord> {
        let _span = debug_span!("run", source = unit.name()).entered();

        let result = self.execute(&unit, session);
        let _ = session.out.flush();

        match &result {
            Ok(()) => debug!("completed"),
            Err(record) if record.is_reported() => {
                warn!("{} failed", unit.name());
                if let Err(e) = writeln!(session.err, "{}", record) {
                    warn!("cannot write diagnostic: {}", e);
                }
                let _ = session.err.flush();
            }
            Err(record) => debug!("{}", record),
        }
        result
    }

    fn execute(
        &mut self,
        unit: &SourceUnit,
        session: &mut Session<'_>,
    ) -> Result<(), FaultRecord> {
        debug!("lexing {} bytes", unit.text().len());
        let tokens = self.language.lex(unit).map_err(FaultRecord::Parse)?;

        debug!("parsing");
        let tree = self
            .language
            .parse(tokens, unit)
            .map_err(FaultRecord::Parse)?;

        debug!("compiling");
        let compiled = self
            .language
            .compile(tree, unit)
            .map_err(FaultRecord::Compile)?;

        debug!("invoking");
        let mut cx = CallContext {
            source_name: unit.name(),
            kind: unit.kind(),
            ambient: &session.ambient,
            heap: &mut *session.heap,
            out: &mut *session.out,
        };
        let fault = match self.language.invoke(compiled, &mut cx) {
            Ok(()) => return Ok(()),
            Err(fault) => fault,
        };

        match fault.exit_code() {
            Some(code) => {
                session.exit.request(code);
                Err(FaultRecord::RequestedExit(code))
            }
            None => Err(FaultRecord::Runtime(fault.to_string())),
        }
    }
}
