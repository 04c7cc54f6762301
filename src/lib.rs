//! microhost
//!
//! Execution host for an embedded Python-family runtime: it turns program
//! text from a file or an interactive prompt into running code, owns the
//! single heap the runtime executes against, and converts uncaught faults
//! into a process exit status.
//!
//! # Example
//!
//! ```no_run
//! use microhost::{Host, HostConfig, Launch, MiniLanguage};
//! use microhost::backends::dev::repl::ScriptedInput;
//!
//! let mut host = Host::with_system_heap(HostConfig::default(), MiniLanguage::new());
//! let mut input = ScriptedInput::new(["print(6 * 7)"]);
//! let status = host.run(
//!     &Launch::interactive(),
//!     &mut input,
//!     Box::new(std::io::stdout()),
//!     Box::new(std::io::stderr()),
//! );
//! assert_eq!(status, 0);
//! ```

#![warn(rust_2018_idioms)]

// Public modules
pub mod backends;
pub mod frontend;
pub mod host;
pub mod vm;

// Utility modules
pub mod util;

// Re-exports
pub use backends::{Driver, FaultRecord, InputKind, Language, SourceUnit};
pub use frontend::MiniLanguage;
pub use host::{Host, Launch};
pub use util::config::HostConfig;

use std::path::Path;

use tracing::debug;

use crate::backends::dev::repl::ScriptedInput;

/// Host version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host name
pub const NAME: &str = "microhost";

/// Run a file with the bundled language and default configuration,
/// writing to the process's stdout and stderr. Returns the process status.
pub fn run_file(
    path: &Path,
    args: Vec<String>,
) -> i64 {
    debug!("run_file: {}", path.display());
    let mut host = Host::with_system_heap(HostConfig::default(), MiniLanguage::new());
    host.run(
        &Launch::file(path, args),
        &mut ScriptedInput::default(),
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
    )
}
