//! # microhost benchmarks
//!
//! Criterion benchmarks for the bundled language and the host around it.
//!
//! ## Groups
//! - `frontend`: lexing, parsing and the interactive completeness check
//! - `host`: whole file-mode runs, heap acquisition included
//!
//! ```bash
//! cargo bench           # everything
//! cargo bench frontend  # front end only
//! ```

use std::hint::black_box;
use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion};
use microhost::backends::dev::repl::ScriptedInput;
use microhost::frontend::complete::is_statement_complete;
use microhost::frontend::{lexer, parser};
use microhost::{Host, HostConfig, InputKind, Launch, MiniLanguage};

const PROGRAMS: &[&str] = &["fibonacci", "list_ops", "string_concat"];

fn program_path(name: &str) -> String {
    format!("benches/programs/{}.py", name)
}

fn quiet_logs() {
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(tracing::Level::ERROR)
        .try_init();
}

// ============================================================================
// Front end
// ============================================================================

fn bench_tokenize(c: &mut Criterion) {
    let source = std::fs::read_to_string(program_path("list_ops")).expect("Cannot read list_ops.py");
    c.bench_function("tokenize_list_ops", |b| {
        b.iter(|| lexer::tokenize(black_box(&source)).expect("tokenize failed"))
    });
}

fn bench_parse(c: &mut Criterion) {
    let source = std::fs::read_to_string(program_path("list_ops")).expect("Cannot read list_ops.py");
    let tokens = lexer::tokenize(&source).expect("tokenize failed");
    c.bench_function("parse_list_ops", |b| {
        b.iter(|| parser::parse(black_box(tokens.clone()), InputKind::File).expect("parse failed"))
    });
}

fn bench_completeness(c: &mut Criterion) {
    let pending = "while i < len(items):\n    if items[i] % 3 == 0:\n        total = total + items[i]\n    i = i + 1\n";
    c.bench_function("is_statement_complete", |b| {
        b.iter(|| is_statement_complete(black_box(pending)))
    });
}

// ============================================================================
// Host
// ============================================================================

fn bench_programs(c: &mut Criterion) {
    quiet_logs();
    for name in PROGRAMS {
        let path = program_path(name);
        let launch = Launch::file(Path::new(&path), vec![]);
        c.bench_function(&format!("run_{}", name), |b| {
            b.iter(|| {
                let mut host = Host::with_system_heap(HostConfig::default(), MiniLanguage::new());
                let status = host.run(
                    &launch,
                    &mut ScriptedInput::default(),
                    Box::new(std::io::sink()),
                    Box::new(std::io::sink()),
                );
                assert_eq!(status, 0);
            })
        });
    }
}

criterion_group!(
    name = frontend;
    config = Criterion::default().sample_size(50);
    targets = bench_tokenize, bench_parse, bench_completeness
);

criterion_group!(
    name = host;
    config = Criterion::default().sample_size(20);
    targets = bench_programs
);

criterion_main!(frontend, host);
