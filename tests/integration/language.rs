use crate::support::{run_lines, run_program};

fn output(text: &str) -> String {
    let outcome = run_program(text, &[]);
    assert_eq!(outcome.status, 0, "{}", outcome.err);
    outcome.out
}

#[test]
fn test_while_with_break_and_continue() {
    let text = "\
i = 0
total = 0
while True:
    i = i + 1
    if i % 2 == 0:
        continue
    if i > 9:
        break
    total = total + i
print(total)
";
    assert_eq!(output(text), "25\n");
}

#[test]
fn test_if_elif_else() {
    let text = "\
n = 15
if n % 15 == 0:
    print('fizzbuzz')
elif n % 3 == 0:
    print('fizz')
else:
    print(n)
";
    assert_eq!(output(text), "fizzbuzz\n");
}

#[test]
fn test_string_operations() {
    let text = "\
s = 'ab' + \"cd\"
print(s, len(s), s[0], s[-1])
print('-' * 3, 'x' 'y')
print('tab\\there', 'a' < 'b')
";
    assert_eq!(output(text), "abcd 4 a d\n--- xy\ntab\there True\n");
}

#[test]
fn test_arithmetic_floors_toward_negative_infinity() {
    assert_eq!(output("print(-7 // 2, -7 % 2, 7 % -2, 2 * 3 + 4)\n"), "-4 1 -1 10\n");
}

#[test]
fn test_integer_overflow_is_reported() {
    let outcome = run_program("x = 9223372036854775807\nx + 1\n", &[]);
    assert_eq!(outcome.status, 1);
    assert!(outcome.err.ends_with("OverflowError: integer overflow\n"));
}

#[test]
fn test_conversions() {
    let text = "\
print(int('  42 ') + 1, str(12) + '3', int(True), str(None))
print(len([1, 2, 3]), [1] * 3, [1] + [2])
";
    assert_eq!(output(text), "43 123 1 None\n3 [1, 1, 1] [1, 2]\n");
}

#[test]
fn test_short_circuit_evaluation() {
    let text = "\
print(0 or 'fallback', 1 and 2, None and undefined, not [])
";
    assert_eq!(output(text), "fallback 2 None True\n");
}

#[test]
fn test_equality_compares_contents() {
    assert_eq!(
        output("print('ab' == 'a' + 'b', [1, 'x'] == [1, 'x'], 1 != 2, None == 0)\n"),
        "True True True False\n"
    );
}

#[test]
fn test_type_errors() {
    let outcome = run_program("'a' + 1\n", &[]);
    assert_eq!(outcome.status, 1);
    assert!(outcome
        .err
        .ends_with("TypeError: unsupported operand type(s) for +: 'str' and 'int'\n"));

    let outcome = run_program("x = [1]\nx['0']\n", &[]);
    assert!(outcome
        .err
        .ends_with("TypeError: list indices must be integers, not str\n"));
}

#[test]
fn test_raise_builtin_exceptions() {
    let outcome = run_program("raise ValueError('bad value')\n", &[]);
    assert_eq!(outcome.status, 1);
    assert!(outcome.err.ends_with("ValueError: bad value\n"));

    let outcome = run_program("raise RuntimeError\n", &[]);
    assert!(outcome.err.ends_with("\nRuntimeError\n"));
}

#[test]
fn test_chained_assignment() {
    assert_eq!(output("a = b = 3\nprint(a + b)\n"), "6\n");
}

#[test]
fn test_assignment_to_literal_is_rejected() {
    let outcome = run_program("1 = x\n", &[]);
    assert_eq!(outcome.status, 1);
    assert!(outcome.err.contains("SyntaxError: can't assign to literal"));
}

#[test]
fn test_interactive_multiline_loop() {
    let outcome = run_lines(&[
        "n = 3",
        "while n:",
        "    print(n)",
        "    n = n - 1",
        "",
        "n",
    ]);
    assert_eq!(outcome.out, "3\n2\n1\n0\n");
}

#[test]
fn test_backslash_continuation() {
    assert_eq!(output("x = 1 + \\\n    2\nprint(x)\n"), "3\n");
}

#[test]
fn test_huge_repetition_is_a_memory_error() {
    for text in ["x = 'a' * 100000000000\n", "x = [0] * 100000000000\n"] {
        let outcome = run_program(text, &[]);
        assert_eq!(outcome.status, 1, "{}", text);
        assert!(outcome.err.contains("line 1, in <module>"), "{}", outcome.err);
        assert!(outcome.err.contains("MemoryError: memory allocation failed"), "{}", outcome.err);
        assert_eq!(outcome.released, 1);
    }
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let text = format!("print('never')\nx = {}1\n", "-".repeat(200_000));
    let outcome = run_program(&text, &[]);
    assert_eq!(outcome.status, 1);
    assert_eq!(outcome.out, "");
    assert!(outcome
        .err
        .contains(", line 2\nSyntaxError: too many nested expressions"));
    assert_eq!(outcome.released, 1);

    let outcome = run_lines(&["((((((((((1))))))))))", "7"]);
    assert_eq!(outcome.out, "1\n7\n");
}
