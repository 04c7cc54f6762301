use microhost::backends::dev::repl::ScriptedInput;
use microhost::host::exit_code;
use microhost::Launch;

use crate::support::{config, run, run_path, run_program, CountingProvider};

#[test]
fn test_successful_program() {
    let outcome = run_program("x = 6\nprint(x * 7)\n", &[]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.out, "42\n");
    assert_eq!(outcome.err, "");
    assert_eq!((outcome.acquired, outcome.released), (1, 1));
}

#[test]
fn test_faulting_program_reports_once_and_never_prompts() {
    let outcome = run_program("print('start')\nx = [1, 2][5]\nprint('unreached')\n", &[]);
    assert_eq!(outcome.status, 1);
    assert_eq!(outcome.out, "start\n");
    assert_eq!(outcome.err.matches("Traceback").count(), 1);
    assert!(outcome.err.contains("line 2, in <module>"));
    assert!(outcome.err.ends_with("IndexError: list index out of range\n"));
    assert!(outcome.prompts.is_empty());
    assert_eq!(outcome.unread, 1);
    assert_eq!(outcome.released, 1);
}

#[test]
fn test_syntax_error_runs_nothing() {
    let outcome = run_program("print('a')\n1 +\n", &[]);
    assert_eq!(outcome.status, 1);
    assert_eq!(outcome.out, "");
    assert!(outcome.err.contains(", line 2\nSyntaxError: invalid syntax"));
    assert_eq!(outcome.released, 1);
}

#[test]
fn test_compile_error_runs_nothing() {
    let outcome = run_program("print('a')\nbreak\n", &[]);
    assert_eq!(outcome.status, 1);
    assert_eq!(outcome.out, "");
    assert!(outcome.err.contains("SyntaxError: 'break' outside loop"));
}

#[test]
fn test_indentation_error() {
    let outcome = run_program("if True:\nprint(1)\n", &[]);
    assert_eq!(outcome.status, 1);
    assert!(outcome.err.contains("IndentationError: expected an indented block"));
}

#[test]
fn test_exit_statuses() {
    let cases = [
        ("exit()\n", 0),
        ("exit(None)\n", 0),
        ("sys.exit(3)\n", 3),
        ("raise SystemExit(7)\n", 7),
        ("raise SystemExit\n", 0),
        ("exit(True)\n", 1),
        ("exit('bye')\n", 1),
        ("exit(-1)\n", -1),
    ];
    for (text, expected) in cases {
        let outcome = run_program(text, &[]);
        assert_eq!(outcome.status, expected, "{}", text);
        assert_eq!(outcome.err, "", "{}", text);
        assert_eq!(outcome.released, 1);
    }
}

#[test]
fn test_exit_stops_the_program() {
    let outcome = run_program("print(1)\nexit(2)\nprint(3)\n", &[]);
    assert_eq!(outcome.status, 2);
    assert_eq!(outcome.out, "1\n");
}

#[test]
fn test_status_truncates_to_exit_code() {
    let outcome = run_program("exit(256 + 3)\n", &[]);
    assert_eq!(outcome.status, 259);
    assert_eq!(exit_code(outcome.status), 3);
    assert_eq!(exit_code(run_program("exit(-1)\n", &[]).status), 255);
}

#[test]
fn test_ambient_bindings() {
    let file = crate::support::program(
        "print(__name__)\nprint(__file__)\nprint(len(sys.argv), sys.argv[1], sys.argv[-1])\n\
         print(sys.path[0])\nprint(sys.path[-1])\n",
    );
    let outcome = run_path(file.path(), &["-n", "3"]);
    assert_eq!(outcome.status, 0, "{}", outcome.err);
    assert_eq!(
        outcome.out,
        format!(
            "__main__\n{}\n3 -n 3\n{}\n/opt/microhost/lib\n",
            file.path().display(),
            file.path().parent().unwrap().display()
        )
    );
}

#[test]
fn test_argv_without_arguments() {
    let file = crate::support::program("print(sys.argv[0])\nprint(len(sys.argv))\nsys.argv[1]\n");
    let outcome = run_path(file.path(), &[]);
    assert_eq!(outcome.status, 1);
    assert_eq!(outcome.out, format!("{}\n1\n", file.path().display()));
    assert!(outcome.err.contains("line 3, in <module>"));
}

#[test]
fn test_unreadable_file() {
    let outcome = run_path(std::path::Path::new("/no/such/dir/prog.py"), &[]);
    assert_eq!(outcome.status, 1);
    assert!(outcome.err.contains("can't open file '/no/such/dir/prog.py'"));
    assert!(outcome.prompts.is_empty());
    assert_eq!(outcome.released, 1);
}

#[test]
fn test_heap_exhaustion_is_a_runtime_fault() {
    let file = crate::support::program("s = 'abc' * 100000\n");
    let mut config = config();
    config.heap.size = 4096;
    let outcome = run(
        config,
        CountingProvider::default(),
        &Launch::file(file.path(), vec![]),
        ScriptedInput::default(),
    );
    assert_eq!(outcome.status, 1);
    assert!(outcome.err.contains("MemoryError: memory allocation failed"));
    assert_eq!(outcome.released, 1);
}

#[test]
fn test_heap_acquisition_failure() {
    let file = crate::support::program("print('never')\n");
    let outcome = run(
        config(),
        CountingProvider {
            refuse: true,
            ..Default::default()
        },
        &Launch::file(file.path(), vec![]),
        ScriptedInput::default(),
    );
    assert_eq!(outcome.status, 1);
    assert_eq!(outcome.out, "");
    assert_eq!(outcome.err, "microhost: heap allocation failed (65536 bytes)\n");
    assert_eq!((outcome.acquired, outcome.released), (0, 0));
}
