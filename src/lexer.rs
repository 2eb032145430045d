//! Line classifier for automation scripts.
//!
//! Each raw line is reduced to its code part (everything before the `--`
//! comment marker, trimmed) and its leading command token. The validator
//! only ever looks at lines through [`ClassifiedLine`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::vocab;

/// Comment marker; everything from here to end of line is ignored.
pub const COMMENT_MARKER: &str = "--";

static EXPRESSION_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[()!&|^\s]+$").expect("static regex"));

/// A non-empty line of code with its command token extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    /// 1-based line number in the script.
    pub number: usize,
    /// The line with comment stripped and whitespace trimmed.
    pub code: &'a str,
    /// First whitespace-delimited word, upper-cased.
    pub token: String,
    pub known: bool,
    pub expression: bool,
}

impl<'a> ClassifiedLine<'a> {
    /// The `n`th whitespace-delimited word after the command (0-based),
    /// in its original case.
    pub fn argument(&self, n: usize) -> Option<&'a str> {
        self.code.split_whitespace().nth(n + 1)
    }

    pub fn char_len(&self) -> usize {
        self.code.chars().count()
    }
}

/// Remove the comment part of a line and trim surrounding whitespace.
pub fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(pos) => line[..pos].trim(),
        None => line.trim(),
    }
}

/// Upper-cased first word of a cleaned line, or `""` if there is none.
pub fn first_token(code: &str) -> String {
    code.split_whitespace()
        .next()
        .map(str::to_uppercase)
        .unwrap_or_default()
}

/// Lines made only of parentheses and logical operators, or starting with
/// `(` / `!(`, belong to a condition expression rather than a statement.
pub fn is_expression_line(code: &str) -> bool {
    if EXPRESSION_ONLY.is_match(code) {
        return true;
    }
    let token = first_token(code);
    token.starts_with('(') || token.starts_with("!(")
}

/// Classify one raw line. Returns `None` for blank and comment-only lines.
pub fn classify_line(number: usize, raw: &str) -> Option<ClassifiedLine<'_>> {
    let code = strip_comment(raw);
    if code.is_empty() {
        return None;
    }
    let token = first_token(code);
    Some(ClassifiedLine {
        number,
        code,
        known: vocab::is_known_token(&token),
        expression: is_expression_line(code),
        token,
    })
}

/// Split a script into lines (`\r` removed) and classify the non-empty ones.
pub fn classify_script(source: &str) -> impl Iterator<Item = ClassifiedLine<'_>> {
    source
        .split('\n')
        .enumerate()
        .filter_map(|(idx, raw)| classify_line(idx + 1, raw.trim_end_matches('\r')))
}
