use microhost::backends::dev::repl::{ReadLine, ScriptedInput};
use microhost::Launch;

use crate::support::{config, run, run_lines, run_reads, CountingProvider};

#[test]
fn test_expression_is_echoed() {
    let outcome = run_lines(&["1+1"]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.out, "2\n");
    assert_eq!(outcome.err, "");
    assert_eq!(outcome.prompts, [">>> ", ">>> "]);
    assert_eq!((outcome.acquired, outcome.released), (1, 1));
}

#[test]
fn test_echo_uses_repr_and_skips_none() {
    let outcome = run_lines(&["'a' + 'b'", "None", "print('x')", "[1, 'two', None]"]);
    assert_eq!(outcome.out, "'ab'\nx\n[1, 'two', None]\n");
}

#[test]
fn test_block_prompts_for_continuation() {
    let outcome = run_lines(&["if 1 < 2:", "    print('yes')", "", "3"]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.out, "yes\n3\n");
    assert_eq!(outcome.prompts, [">>> ", "... ", "... ", ">>> ", ">>> "]);
}

#[test]
fn test_open_bracket_continues() {
    let outcome = run_lines(&["x = [1,", "2]", "len(x)"]);
    assert_eq!(outcome.out, "2\n");
    assert_eq!(outcome.prompts[..3], [">>> ", "... ", ">>> "]);
}

#[test]
fn test_sentinel_ends_session() {
    let outcome = run_lines(&["1", "quit", "print('after')"]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.out, "1\n");
    assert_eq!(outcome.unread, 1);
    assert_eq!(outcome.released, 1);
}

#[test]
fn test_exit_ends_session_with_status() {
    let outcome = run_lines(&["exit(5)", "print('after')"]);
    assert_eq!(outcome.status, 5);
    assert_eq!(outcome.out, "");
    assert_eq!(outcome.err, "");
    assert_eq!(outcome.unread, 1);
    assert_eq!(outcome.prompts, [">>> "]);
}

#[test]
fn test_fault_does_not_end_session() {
    let outcome = run_lines(&["1 // 0", "undefined_name", "2"]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.out, "2\n");
    assert!(outcome
        .err
        .contains("  File \"<stdin>\", line 1, in <module>\nZeroDivisionError: integer division or modulo by zero\n"));
    assert!(outcome
        .err
        .contains("NameError: name 'undefined_name' is not defined\n"));
    assert_eq!(outcome.err.matches("Traceback").count(), 2);
}

#[test]
fn test_syntax_error_does_not_end_session() {
    let outcome = run_lines(&["1 +", "7"]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.out, "7\n");
    assert!(outcome.err.contains("  File \"<stdin>\", line 1\nSyntaxError: invalid syntax"));
}

#[test]
fn test_globals_persist_between_statements() {
    let outcome = run_lines(&["x = 40", "y = x + 1", "x + y - 39"]);
    assert_eq!(outcome.out, "42\n");
}

#[test]
fn test_interactive_bindings() {
    let outcome = run_lines(&["__name__", "sys.argv", "sys.path", "__file__"]);
    assert_eq!(
        outcome.out,
        "'__main__'\n[]\n['', '/opt/microhost/lib']\n"
    );
    assert!(outcome
        .err
        .ends_with("NameError: name '__file__' is not defined\n"));
}

#[test]
fn test_interrupt_discards_pending_statement() {
    let outcome = run_reads(vec![
        ReadLine::Line("if True:".into()),
        ReadLine::Line("    print('lost')".into()),
        ReadLine::Interrupted,
        ReadLine::Line("print('kept')".into()),
    ]);
    assert_eq!(outcome.status, 0);
    assert_eq!(outcome.out, "kept\n");
    assert_eq!(outcome.prompts, [">>> ", "... ", "... ", ">>> ", ">>> "]);
}

#[test]
fn test_eof_with_pending_input_is_discarded() {
    let outcome = run_reads(vec![
        ReadLine::Line("print(1,".into()),
        ReadLine::Eof,
        ReadLine::Line("print(2)".into()),
    ]);
    assert_eq!(outcome.out, "2\n");
}

#[test]
fn test_banner_when_enabled() {
    let mut config = config();
    config.repl.banner = true;
    let outcome = run(
        config,
        CountingProvider::default(),
        &Launch::interactive(),
        ScriptedInput::new(["6 * 7"]),
    );
    assert!(outcome.out.starts_with("microhost "));
    assert!(outcome.out.ends_with("\n42\n"));
}

#[test]
fn test_custom_prompts() {
    let mut config = config();
    config.repl.prompt = "> ".to_string();
    config.repl.continuation_prompt = ". ".to_string();
    let outcome = run(
        config,
        CountingProvider::default(),
        &Launch::interactive(),
        ScriptedInput::new(["while False:", "    pass", ""]),
    );
    assert_eq!(outcome.prompts, ["> ", ". ", ". ", "> "]);
}
