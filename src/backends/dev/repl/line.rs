//! Line sources for the interactive prompt
//!
//! [`EditorInput`] reads from the terminal through rustyline (editing and
//! history); [`ScriptedInput`] replays a fixed sequence, for tests and
//! embedders that feed the prompt programmatically.

use std::collections::VecDeque;
use std::path::PathBuf;

use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use super::ReplError;
use crate::util::config::ReplConfig;

/// One read from the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    /// A physical line, without its line terminator
    Line(String),
    /// The input stream is exhausted
    Eof,
    /// The user aborted the current input (Ctrl-C)
    Interrupted,
}

/// Blocking source of physical lines
pub trait LineSource {
    /// Show `prompt` and wait for one line
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> Result<ReadLine, ReplError>;

    /// Called once when the session ends
    fn finish(&mut self) {}
}

/// Terminal line source with editing and history
pub struct EditorInput {
    editor: DefaultEditor,
    history_file: Option<PathBuf>,
}

impl EditorInput {
    /// Create an editor, loading history when a history file is configured
    pub fn new(config: &ReplConfig) -> Result<Self, ReplError> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .max_history_size(config.history_size)?
            .build();

        let mut editor = DefaultEditor::with_config(rl_config)?;

        if let Some(ref history_file) = config.history_file {
            if history_file.exists() {
                if let Err(e) = editor.load_history(history_file) {
                    warn!("cannot load history {}: {}", history_file.display(), e);
                }
            }
        }

        Ok(Self {
            editor,
            history_file: config.history_file.clone(),
        })
    }
}

impl LineSource for EditorInput {
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> Result<ReadLine, ReplError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(ReadLine::Line(line))
            }
            Err(ReadlineError::Eof) => Ok(ReadLine::Eof),
            Err(ReadlineError::Interrupted) => Ok(ReadLine::Interrupted),
            Err(e) => Err(e.into()),
        }
    }

    fn finish(&mut self) {
        if let Some(ref history_file) = self.history_file {
            match self.editor.save_history(history_file) {
                Ok(()) => debug!("history saved to {}", history_file.display()),
                Err(e) => warn!("cannot save history {}: {}", history_file.display(), e),
            }
        }
    }
}

/// Replays a fixed sequence of reads, then reports end of input forever.
///
/// Every prompt shown is recorded, so callers can check what the user
/// would have seen.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pending: VecDeque<ReadLine>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    /// Script consisting only of lines
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_reads(lines.into_iter().map(|l| ReadLine::Line(l.into())))
    }

    /// Script of arbitrary reads (lines, interrupts, end of input)
    pub fn from_reads(reads: impl IntoIterator<Item = ReadLine>) -> Self {
        Self {
            pending: reads.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts shown so far, in order
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Reads not consumed yet
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl LineSource for ScriptedInput {
    fn read_line(
        &mut self,
        prompt: &str,
    ) -> Result<ReadLine, ReplError> {
        self.prompts.push(prompt.to_string());
        Ok(self.pending.pop_front().unwrap_or(ReadLine::Eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_replays_then_eof() {
        let mut input = ScriptedInput::from_reads([
            ReadLine::Line("a".into()),
            ReadLine::Interrupted,
        ]);
        assert_eq!(input.read_line("> ").unwrap(), ReadLine::Line("a".into()));
        assert_eq!(input.read_line("> ").unwrap(), ReadLine::Interrupted);
        assert_eq!(input.read_line(". ").unwrap(), ReadLine::Eof);
        assert_eq!(input.read_line(". ").unwrap(), ReadLine::Eof);
        assert_eq!(input.prompts(), ["> ", "> ", ". ", ". "]);
    }
}
