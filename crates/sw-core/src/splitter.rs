//! Statement splitting for migration files.
//!
//! Splits on top-level `;` only. Semicolons inside string literals
//! (including PostgreSQL `E'...'` strings with backslash escapes), quoted
//! identifiers, comments and dollar-quoted bodies stay part of their
//! statement. This is a tokenizer, not a parser: a `BEGIN ... END` trigger
//! body written without dollar quoting is still cut at its inner semicolons.

use crate::lexer::{segments, SegmentKind};

/// Split raw migration SQL into trimmed, non-empty statements in file order.
///
/// Fragments made only of whitespace and comments are discarded. Comments
/// inside or in front of a statement are kept with it.
pub fn split(raw_sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_content = false;

    for seg in segments(raw_sql) {
        if seg.kind != SegmentKind::Code {
            if !seg.kind.is_comment() {
                has_content = true;
            }
            current.push_str(seg.text);
            continue;
        }

        let mut parts = seg.text.split(';');
        if let Some(first) = parts.next() {
            has_content |= !first.trim().is_empty();
            current.push_str(first);
        }
        for part in parts {
            flush(&mut statements, &mut current, has_content);
            has_content = !part.trim().is_empty();
            current.push_str(part);
        }
    }
    flush(&mut statements, &mut current, has_content);
    statements
}

fn flush(statements: &mut Vec<String>, current: &mut String, has_content: bool) {
    let text = std::mem::take(current);
    if has_content {
        statements.push(text.trim().to_string());
    }
}

#[cfg(test)]
#[path = "splitter_test.rs"]
mod tests;
