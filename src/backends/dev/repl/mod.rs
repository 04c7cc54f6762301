//! Interactive prompt
//!
//! Reads one logical statement at a time, possibly spread over several
//! physical lines, and hands each complete statement to the [`Driver`].
//!
//! ```text
//!            line, incomplete
//!   READY ──────────────────▶ CONTINUATION ──┐ line, incomplete
//!     ▲  ◀──────────────────        │   ◀────┘
//!     │   EOF / interrupt:          │
//!     │   discard pending           │ line, complete
//!     │                             ▼
//!     └──────────────────── dispatch (or `quit`)
//! ```

pub mod line;

use std::io::Write;

use thiserror::Error;
use tracing::{debug, info};

use crate::backends::{Driver, Language, SourceUnit};
use crate::host::Session;
use crate::util::config::ReplConfig;

pub use line::{EditorInput, LineSource, ReadLine, ScriptedInput};

/// Raw input line that ends the session without being run
pub const SENTINEL: &str = "quit";

/// Separator placed between physical lines of one statement
const LINE_SEPARATOR: &str = "\n";

/// Interactive input failure
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Physical lines read so far for the statement being entered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInput {
    lines: Vec<String>,
}

impl PendingInput {
    /// Append a physical line
    pub fn push(
        &mut self,
        line: impl Into<String>,
    ) {
        self.lines.push(line.into());
    }

    /// No lines accumulated
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines accumulated
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Forget accumulated lines
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// All lines joined, as the completeness check sees them
    pub fn text(&self) -> String {
        self.lines.join(LINE_SEPARATOR)
    }

    /// The statement to dispatch: blank lines that closed a block are
    /// dropped, so no trailing separator is produced.
    pub fn statement(&self) -> String {
        let end = self
            .lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(0, |i| i + 1);
        self.lines[..end].join(LINE_SEPARATOR)
    }
}

/// How an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input stream ran out
    EndOfInput,
    /// The sentinel was entered
    Sentinel,
    /// A statement requested exit with this status
    Exit(i64),
}

/// Interactive read-dispatch loop
#[derive(Debug)]
pub struct Repl<'c> {
    config: &'c ReplConfig,
    pending: PendingInput,
}

impl<'c> Repl<'c> {
    /// Create a prompt loop with the given prompts and banner setting
    pub fn new(config: &'c ReplConfig) -> Self {
        Self {
            config,
            pending: PendingInput::default(),
        }
    }

    /// Run until end of input, the sentinel, or a requested exit.
    pub fn run<L: Language>(
        &mut self,
        driver: &mut Driver<L>,
        session: &mut Session<'_>,
        input: &mut dyn LineSource,
    ) -> Result<SessionEnd, ReplError> {
        if self.config.banner {
            writeln!(
                session.out,
                "{} {} on {}",
                crate::NAME,
                crate::VERSION,
                std::env::consts::OS
            )?;
            session.out.flush()?;
        }

        let end = loop {
            if let Some(code) = session.exit.code() {
                break SessionEnd::Exit(code);
            }

            let text = match self.read_statement(driver, input)? {
                Some(text) => text,
                None => break SessionEnd::EndOfInput,
            };

            if text == SENTINEL {
                session.exit.request(0);
                break SessionEnd::Sentinel;
            }
            if text.trim().is_empty() {
                continue;
            }

            // The outcome has already been reported; only exit state matters here.
            let _ = driver.run(SourceUnit::statement(text), session);
        };

        input.finish();
        info!("interactive session ended: {:?}", end);
        Ok(end)
    }

    /// Read physical lines until they form one complete statement.
    ///
    /// Returns `None` on end of input with nothing pending.
    fn read_statement<L: Language>(
        &mut self,
        driver: &Driver<L>,
        input: &mut dyn LineSource,
    ) -> Result<Option<String>, ReplError> {
        loop {
            let prompt = if self.pending.is_empty() {
                &self.config.prompt
            } else {
                &self.config.continuation_prompt
            };

            match input.read_line(prompt)? {
                ReadLine::Eof if self.pending.is_empty() => return Ok(None),
                ReadLine::Eof | ReadLine::Interrupted => {
                    if !self.pending.is_empty() {
                        debug!("discarding {} pending line(s)", self.pending.len());
                    }
                    self.pending.clear();
                }
                ReadLine::Line(line) => {
                    self.pending.push(line);
                    if driver.is_statement_complete(&self.pending.text()) {
                        let statement = self.pending.statement();
                        self.pending.clear();
                        return Ok(Some(statement));
                    }
                }
            }
        }
    }
}
