//! Ambient state shared by the host and the code it runs

use std::path::{Path, PathBuf};

/// Configuration visible to compiled units without being passed as call
/// arguments: the program's argument vector and its module search path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ambient {
    /// Program argument vector; in file mode the script path comes first
    pub argv: Vec<String>,
    /// Module search path, most specific directory first
    pub search_path: Vec<PathBuf>,
}

impl Ambient {
    /// Bindings for running `file` with the remaining `args`.
    ///
    /// The file's directory leads the search path (empty when the path has
    /// no directory part), followed by the library directories.
    pub fn for_file(
        file: &Path,
        args: &[String],
        lib_dirs: &[PathBuf],
    ) -> Self {
        let base = file.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(file.display().to_string());
        argv.extend(args.iter().cloned());
        Self {
            argv,
            search_path: std::iter::once(base)
                .chain(lib_dirs.iter().cloned())
                .collect(),
        }
    }

    /// Bindings for an interactive session: no arguments, current
    /// directory first.
    pub fn interactive(lib_dirs: &[PathBuf]) -> Self {
        Self {
            argv: Vec::new(),
            search_path: std::iter::once(PathBuf::new())
                .chain(lib_dirs.iter().cloned())
                .collect(),
        }
    }
}

/// Process-wide request to stop, with the status to stop with.
///
/// Set at most once; the first request wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitState {
    code: Option<i64>,
}

impl ExitState {
    /// Fresh, unset state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exit request. Returns `false` if one was already recorded.
    pub fn request(
        &mut self,
        code: i64,
    ) -> bool {
        if self.code.is_some() {
            return false;
        }
        self.code = Some(code);
        true
    }

    /// Whether an exit has been requested
    pub fn is_set(&self) -> bool {
        self.code.is_some()
    }

    /// Requested code, if any
    pub fn code(&self) -> Option<i64> {
        self.code
    }
}
