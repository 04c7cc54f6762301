//! Interactive completeness check
//!
//! Decides whether the lines typed so far form one complete statement or
//! whether the prompt should keep asking for continuation lines. The check
//! is lexical and never fails: text that is complete but malformed is
//! handed to the parser, which reports the error.

/// Keywords that open a block, so the statement ends at a blank line
const COMPOUND_KEYWORDS: &[&str] = &["if", "while"];

/// Whether `text` is one complete statement.
///
/// Incomplete while brackets are open, while a string literal is still
/// open, while the text ends with a line-continuation backslash, and, for
/// text that starts with a compound keyword, until the last physical line
/// is blank.
pub fn is_statement_complete(text: &str) -> bool {
    let scan = scan(text);
    if scan.depth > 0 || scan.in_string {
        return false;
    }
    if text.ends_with('\\') {
        return false;
    }
    if starts_with_compound_keyword(text) {
        return ends_with_blank_line(text);
    }
    true
}

#[derive(Debug, Default)]
struct Scan {
    depth: usize,
    in_string: bool,
}

fn scan(text: &str) -> Scan {
    let mut scan = Scan::default();
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => match c {
                '\\' => {
                    chars.next();
                }
                '\n' => quote = None,
                c if c == q => quote = None,
                _ => {}
            },
            None => match c {
                '\'' | '"' => quote = Some(c),
                '#' => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '(' | '[' => scan.depth += 1,
                ')' | ']' => scan.depth = scan.depth.saturating_sub(1),
                _ => {}
            },
        }
    }
    // An unterminated single-line string is a syntax error, not an open
    // statement, unless the line continues with a backslash.
    scan.in_string = quote.is_some() && text.ends_with('\\');
    scan
}

fn starts_with_compound_keyword(text: &str) -> bool {
    let word: String = text
        .trim_start()
        .chars()
        .take_while(|c| *c == '_' || c.is_alphanumeric())
        .collect();
    COMPOUND_KEYWORDS.contains(&word.as_str())
}

fn ends_with_blank_line(text: &str) -> bool {
    match text.rsplit_once('\n') {
        Some((_, last)) => last.trim().is_empty(),
        None => false,
    }
}
