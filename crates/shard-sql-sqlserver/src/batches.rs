//! `GO` batch separation.
//!
//! `GO` is not T-SQL. Client tools cut a script into batches on lines that
//! hold nothing but the word, and send each batch to the server separately.

use serde::Serialize;

/// One batch of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Batch<'a> {
    pub text: &'a str,
    /// Byte offset of `text` in the script.
    pub offset: usize,
    /// 1-based line of the first line of `text`.
    pub line: usize,
}

/// Splits `script` on lines consisting solely of `GO` (any case, surrounding
/// whitespace allowed).
///
/// Separator lines are dropped, as are batches holding only whitespace. Text
/// inside strings and comments is not inspected.
#[must_use]
pub fn split_batches(script: &str) -> Vec<Batch<'_>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut start_line = 1;
    let mut offset = 0;
    for (index, line) in script.split_inclusive('\n').enumerate() {
        let end = offset + line.len();
        if is_separator(line) {
            push_batch(&mut batches, script, start, offset, start_line);
            start = end;
            start_line = index + 2;
        }
        offset = end;
    }
    push_batch(&mut batches, script, start, script.len(), start_line);
    batches
}

fn is_separator(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("GO")
}

fn push_batch<'a>(batches: &mut Vec<Batch<'a>>, script: &'a str, start: usize, end: usize, line: usize) {
    let text = &script[start..end];
    if !text.trim().is_empty() {
        batches.push(Batch {
            text,
            offset: start,
            line,
        });
    }
}
