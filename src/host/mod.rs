//! Host entry
//!
//! Decides between file mode and interactive mode, owns the runtime heap
//! for the lifetime of the run, and turns the outcome into a process
//! status.
//!
//! ```text
//! Host::run
//!   ├─ HeapLease::acquire          (fatal on failure: status 1)
//!   ├─ file mode:        Driver::run(file) once
//!   │  interactive mode: Repl::run → Driver::run per statement
//!   └─ HeapLease::release          (every path)
//! ```

mod ambient;

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::backends::common::{HeapLease, HeapProvider, RuntimeHeap, SystemHeap};
use crate::backends::dev::repl::{LineSource, Repl};
use crate::backends::{Driver, Language, SourceUnit};
use crate::util::config::HostConfig;

pub use ambient::{Ambient, ExitState};

/// State shared by every execution in one host run.
pub struct Session<'h> {
    /// The runtime heap, leased for the whole run
    pub heap: &'h mut RuntimeHeap,
    /// Argument vector and module search path
    pub ambient: Ambient,
    /// Exit request, set at most once
    pub exit: ExitState,
    /// Program output
    pub out: Box<dyn Write>,
    /// Diagnostics
    pub err: Box<dyn Write>,
}

impl<'h> Session<'h> {
    /// Create a session with no exit requested
    pub fn new(
        heap: &'h mut RuntimeHeap,
        ambient: Ambient,
        out: Box<dyn Write>,
        err: Box<dyn Write>,
    ) -> Self {
        Self {
            heap,
            ambient,
            exit: ExitState::new(),
            out,
            err,
        }
    }
}

impl fmt::Debug for Session<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Session")
            .field("heap", &self.heap)
            .field("ambient", &self.ambient)
            .field("exit", &self.exit)
            .finish()
    }
}

/// What the process was asked to do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Launch {
    /// Script to run; `None` selects interactive mode
    pub file: Option<PathBuf>,
    /// Arguments following the script
    pub args: Vec<String>,
}

/// Execution mode selected by a [`Launch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'a> {
    /// Run one file, then stop
    File { path: &'a Path, args: &'a [String] },
    /// Prompt for statements until the session ends
    Interactive,
}

impl Launch {
    /// Run `file` with `args`
    pub fn file(
        file: impl Into<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        Self {
            file: Some(file.into()),
            args,
        }
    }

    /// Interactive session
    pub fn interactive() -> Self {
        Self::default()
    }

    /// Mode this launch selects
    pub fn mode(&self) -> Mode<'_> {
        match &self.file {
            Some(path) => Mode::File {
                path,
                args: &self.args,
            },
            None => Mode::Interactive,
        }
    }
}

/// Convert a process status to an OS exit code (low eight bits, as POSIX
/// `exit` does).
pub fn exit_code(status: i64) -> u8 {
    (status & 0xff) as u8
}

/// Top-level host: configuration, language and heap provider.
#[derive(Debug)]
pub struct Host<L, P = SystemHeap> {
    config: HostConfig,
    driver: Driver<L>,
    provider: P,
}

impl<L: Language> Host<L, SystemHeap> {
    /// Host that takes its heap from the process allocator
    pub fn with_system_heap(
        config: HostConfig,
        language: L,
    ) -> Self {
        Self::new(config, language, SystemHeap)
    }
}

impl<L: Language, P: HeapProvider> Host<L, P> {
    /// Create a host
    pub fn new(
        config: HostConfig,
        language: L,
        provider: P,
    ) -> Self {
        Self {
            config,
            driver: Driver::new(language),
            provider,
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The execution driver
    pub fn driver(&self) -> &Driver<L> {
        &self.driver
    }

    /// The heap provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run the launch to completion and return the process status.
    ///
    /// `input` is only read in interactive mode. The heap is acquired
    /// before anything runs and released before this returns; if it cannot
    /// be acquired nothing runs and the status is 1.
    pub fn run(
        &mut self,
        launch: &Launch,
        input: &mut dyn LineSource,
        out: Box<dyn Write>,
        mut err: Box<dyn Write>,
    ) -> i64 {
        let size = self.config.heap.size;
        let mut lease = match HeapLease::acquire(&mut self.provider, size) {
            Ok(lease) => lease,
            Err(failure) => {
                error!("{}", failure);
                let _ = writeln!(err, "{}: {}", crate::NAME, failure);
                return 1;
            }
        };

        let lib_dirs = &self.config.path.lib;
        let ambient = match launch.mode() {
            Mode::File { path, args } => Ambient::for_file(path, args, lib_dirs),
            Mode::Interactive => Ambient::interactive(lib_dirs),
        };

        let status = {
            let mut session = Session::new(lease.heap_mut(), ambient, out, err);
            match launch.mode() {
                Mode::File { path, .. } => run_file(&mut self.driver, path, &mut session),
                Mode::Interactive => {
                    let mut repl = Repl::new(&self.config.repl);
                    match repl.run(&mut self.driver, &mut session, input) {
                        Ok(_) => session.exit.code().unwrap_or(0),
                        Err(e) => {
                            error!("interactive session failed: {}", e);
                            let _ = writeln!(session.err, "{}: {}", crate::NAME, e);
                            1
                        }
                    }
                }
            }
        };

        lease.release();
        info!("host finished with status {}", status);
        status
    }
}

/// Execute a file once. Never falls through to interactive mode.
fn run_file<L: Language>(
    driver: &mut Driver<L>,
    path: &Path,
    session: &mut Session<'_>,
) -> i64 {
    info!("running {}", path.display());
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            error!("cannot read {}: {}", path.display(), e);
            let _ = writeln!(
                session.err,
                "{}: can't open file '{}': {}",
                crate::NAME,
                path.display(),
                e
            );
            return 1;
        }
    };

    let status = match driver.run(SourceUnit::file(path.display().to_string(), text), session) {
        Ok(()) => 0,
        Err(record) => record.status(),
    };
    session.exit.code().unwrap_or(status)
}
