//! Minimal SQL lexer.
//!
//! Cuts SQL text into code, quoted and comment segments. It knows nothing
//! about statements or keywords; the splitter and the translator build on it
//! so that semicolons, rewrite patterns and keywords inside string literals,
//! quoted identifiers, dollar-quoted bodies and comments are never touched.

/// Kind of a lexical segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Plain SQL text
    Code,
    /// `'...'` string literal (`''` escapes)
    SingleQuoted,
    /// `"..."` quoted identifier (`""` escapes)
    DoubleQuoted,
    /// `$$...$$` or `$tag$...$tag$` body
    DollarQuoted,
    /// `-- ...` up to, not including, the newline
    LineComment,
    /// `/* ... */`
    BlockComment,
}

impl SegmentKind {
    pub(crate) fn is_comment(self) -> bool {
        matches!(self, SegmentKind::LineComment | SegmentKind::BlockComment)
    }
}

/// A contiguous slice of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

/// Cut `sql` into segments. Concatenating the segment texts yields `sql`.
///
/// Unterminated quotes and comments run to the end of the input.
pub(crate) fn segments(sql: &str) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut code_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let (kind, end) = match bytes[i] {
            b'\'' => (
                SegmentKind::SingleQuoted,
                scan_quoted(bytes, i, b'\'', is_escape_string(bytes, i)),
            ),
            b'"' => (SegmentKind::DoubleQuoted, scan_quoted(bytes, i, b'"', false)),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                (SegmentKind::LineComment, scan_line_comment(bytes, i))
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                (SegmentKind::BlockComment, scan_block_comment(bytes, i))
            }
            b'$' => match dollar_tag_len(bytes, i) {
                Some(tag_len) => (
                    SegmentKind::DollarQuoted,
                    scan_dollar_body(bytes, i, tag_len),
                ),
                None => {
                    i += 1;
                    continue;
                }
            },
            _ => {
                i += 1;
                continue;
            }
        };
        if code_start < i {
            out.push(Segment {
                kind: SegmentKind::Code,
                text: &sql[code_start..i],
            });
        }
        out.push(Segment {
            kind,
            text: &sql[i..end],
        });
        i = end;
        code_start = end;
    }

    if code_start < bytes.len() {
        out.push(Segment {
            kind: SegmentKind::Code,
            text: &sql[code_start..],
        });
    }
    out
}

/// Produce an ASCII string of the same byte length as `sql` in which only
/// code is left readable.
///
/// - quoted identifiers become runs of `_` so they still read as one word
/// - string literals, dollar bodies and comments become spaces
/// - non-ASCII bytes in code become `#`
///
/// Byte offsets found by matching against the mask are valid offsets into
/// `sql`.
pub(crate) fn mask(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    for seg in segments(sql) {
        match seg.kind {
            SegmentKind::Code => out.extend(
                seg.text
                    .bytes()
                    .map(|b| if b.is_ascii() { b as char } else { '#' }),
            ),
            SegmentKind::DoubleQuoted => out.extend(std::iter::repeat('_').take(seg.text.len())),
            _ => out.extend(std::iter::repeat(' ').take(seg.text.len())),
        }
    }
    out
}

/// True when the quote at `start` opens a PostgreSQL escape string (`E'...'`).
///
/// The `E` must stand alone, so `TYPE'x'` or `some_e'x'` do not count.
fn is_escape_string(bytes: &[u8], start: usize) -> bool {
    if start == 0 || !matches!(bytes[start - 1], b'E' | b'e') {
        return false;
    }
    match start.checked_sub(2).map(|p| bytes[p]) {
        Some(b) => !(b.is_ascii_alphanumeric() || b == b'_' || b == b'$'),
        None => true,
    }
}

fn scan_quoted(bytes: &[u8], start: usize, quote: u8, backslash_escapes: bool) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if backslash_escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn scan_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + p)
}

fn scan_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |p| start + 2 + p + 2)
}

/// Length of a dollar-quote opening tag (`$$` or `$tag$`) starting at `start`.
///
/// `$1` parameters and identifiers containing `$` are not tags.
fn dollar_tag_len(bytes: &[u8], start: usize) -> Option<usize> {
    if start > 0 {
        let prev = bytes[start - 1];
        if prev.is_ascii_alphanumeric() || prev == b'_' || prev == b'$' {
            return None;
        }
    }
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'$' {
            return Some(i - start + 1);
        }
        let valid = if i == start + 1 {
            b.is_ascii_alphabetic() || b == b'_'
        } else {
            b.is_ascii_alphanumeric() || b == b'_'
        };
        if !valid {
            return None;
        }
        i += 1;
    }
    None
}

fn scan_dollar_body(bytes: &[u8], start: usize, tag_len: usize) -> usize {
    let tag = &bytes[start..start + tag_len];
    let body_start = start + tag_len;
    bytes[body_start..]
        .windows(tag_len)
        .position(|w| w == tag)
        .map_or(bytes.len(), |p| body_start + p + tag_len)
}
