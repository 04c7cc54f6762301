//! Shared harness: run the host over captured streams and a counting heap.

use std::io::Write;
use std::path::{Path, PathBuf};

use microhost::backends::common::{AllocationFailure, HeapProvider};
use microhost::backends::dev::repl::{ReadLine, ScriptedInput};
use microhost::util::io::SharedBuffer;
use microhost::{Host, HostConfig, Launch, MiniLanguage};

/// Heap provider that counts acquisitions and releases
#[derive(Debug, Default)]
pub struct CountingProvider {
    pub acquired: usize,
    pub released: usize,
    pub refuse: bool,
}

impl HeapProvider for CountingProvider {
    fn acquire(
        &mut self,
        size: usize,
    ) -> Result<Box<[u8]>, AllocationFailure> {
        if self.refuse {
            return Err(AllocationFailure { size });
        }
        self.acquired += 1;
        Ok(vec![0u8; size].into_boxed_slice())
    }

    fn release(
        &mut self,
        _region: Box<[u8]>,
    ) {
        self.released += 1;
    }
}

/// Everything observable about one host run
#[derive(Debug)]
pub struct Outcome {
    pub status: i64,
    pub out: String,
    pub err: String,
    pub acquired: usize,
    pub released: usize,
    pub prompts: Vec<String>,
    pub unread: usize,
}

pub fn config() -> HostConfig {
    let mut config = HostConfig::default();
    config.heap.size = 64 * 1024;
    config.repl.banner = false;
    config.path.lib = vec![PathBuf::from("/opt/microhost/lib")];
    config
}

pub fn run(
    config: HostConfig,
    provider: CountingProvider,
    launch: &Launch,
    mut input: ScriptedInput,
) -> Outcome {
    let mut host = Host::new(config, MiniLanguage::new(), provider);
    let (out, out_writer) = SharedBuffer::with_writer();
    let (err, err_writer) = SharedBuffer::with_writer();

    let status = host.run(launch, &mut input, out_writer, err_writer);
    Outcome {
        status,
        out: out.contents(),
        err: err.contents(),
        acquired: host.provider().acquired,
        released: host.provider().released,
        prompts: input.prompts().to_vec(),
        unread: input.remaining(),
    }
}

/// Write `text` to a temporary program file
pub fn program(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".py")
        .tempfile()
        .unwrap();
    write!(file, "{}", text).unwrap();
    file
}

/// Run `text` as a program file with `args`
pub fn run_program(
    text: &str,
    args: &[&str],
) -> Outcome {
    let file = program(text);
    run_path(file.path(), args)
}

pub fn run_path(
    path: &Path,
    args: &[&str],
) -> Outcome {
    let launch = Launch::file(path, args.iter().map(|s| s.to_string()).collect());
    run(
        config(),
        CountingProvider::default(),
        &launch,
        ScriptedInput::new(["print('never read')"]),
    )
}

/// Run an interactive session over `lines`
pub fn run_lines(lines: &[&str]) -> Outcome {
    run(
        config(),
        CountingProvider::default(),
        &Launch::interactive(),
        ScriptedInput::new(lines.iter().copied()),
    )
}

/// Run an interactive session over arbitrary reads
pub fn run_reads(reads: Vec<ReadLine>) -> Outcome {
    run(
        config(),
        CountingProvider::default(),
        &Launch::interactive(),
        ScriptedInput::from_reads(reads),
    )
}
