//! microhost - CLI

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use microhost::backends::dev::repl::{EditorInput, LineSource, ScriptedInput};
use microhost::host::exit_code;
use microhost::util::config::{self, parse_size};
use microhost::util::logger;
use microhost::{Host, Launch, MiniLanguage, NAME, VERSION};

/// Run a program file, or start an interactive prompt when no file is given
#[derive(Parser, Debug)]
#[command(name = NAME)]
#[command(version = VERSION)]
#[command(long_about = None)]
struct Args {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Runtime heap size in bytes (`K`/`M` suffixes accepted)
    #[arg(long, value_name = "BYTES", value_parser = parse_heap_size)]
    heap_size: Option<usize>,

    /// Configuration file to use instead of the user config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Program to run, followed by the arguments passed to it
    #[arg(
        value_name = "FILE",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    program: Vec<String>,
}

impl Args {
    /// File mode when a program is named; everything after it belongs to
    /// the program, options included
    fn launch(&self) -> Launch {
        match self.program.split_first() {
            Some((file, args)) => Launch::file(file, args.to_vec()),
            None => Launch::interactive(),
        }
    }
}

fn parse_heap_size(raw: &str) -> Result<usize, String> {
    parse_size(raw).ok_or_else(|| format!("invalid size '{}'", raw))
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", NAME, e);
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let args = Args::parse();
    logger::init_cli(args.verbose);

    let mut config = match &args.config {
        Some(path) => config::load_config(Some(path))
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => config::load_config(None).context("Failed to load config")?,
    };
    if let Some(size) = args.heap_size {
        config.heap.size = size;
    }

    let launch = args.launch();

    let mut input: Box<dyn LineSource> = match launch.file {
        Some(_) => Box::new(ScriptedInput::default()),
        None => Box::new(EditorInput::new(&config.repl).context("Failed to start line editor")?),
    };

    let mut host = Host::with_system_heap(config, MiniLanguage::new());
    let status = host.run(
        &launch,
        input.as_mut(),
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
    );
    Ok(ExitCode::from(exit_code(status)))
}
