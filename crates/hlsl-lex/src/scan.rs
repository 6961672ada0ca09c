//! Character-level scanning primitives.
//!
//! All helpers take the full source buffer plus a byte position and return
//! the advanced position. None of them panic on truncated input; the only
//! fallible one is [`skip_comment`], which reports an unterminated multiline
//! comment carrying the offset of its opening `/*`.

use crate::error::{LexError, LexErrorKind};

/// Whitespace characters that separate tokens.
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n')
}

pub fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_identifier_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

fn is_identifier_char(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

/// Advances past a `//` or `/* */` comment starting at `pos`.
///
/// Returns `pos` unchanged if the text at `pos` does not start a comment.
/// A `//` comment runs to (and excludes nothing of) the line terminator; the
/// terminator itself is left to the delimiter scan. An unterminated `/*`
/// comment is an error at the offset of the `/*`.
pub fn skip_comment(buf: &[u8], pos: usize) -> Result<usize, LexError> {
    if pos + 1 >= buf.len() || buf[pos] != b'/' {
        return Ok(pos);
    }
    match buf[pos + 1] {
        b'/' => {
            let mut p = pos + 2;
            while p < buf.len() && buf[p] != b'\n' {
                p += 1;
            }
            Ok(p)
        }
        b'*' => {
            let mut p = pos + 2;
            while p + 1 < buf.len() {
                if buf[p] == b'*' && buf[p + 1] == b'/' {
                    return Ok(p + 2);
                }
                p += 1;
            }
            Err(LexError {
                at: pos,
                kind: LexErrorKind::UnterminatedComment,
            })
        }
        _ => Ok(pos),
    }
}

/// Advances past any run of whitespace and comments.
pub fn skip_delimiters_and_comments(buf: &[u8], mut pos: usize) -> Result<usize, LexError> {
    loop {
        while pos < buf.len() && is_delimiter(buf[pos]) {
            pos += 1;
        }
        let after = skip_comment(buf, pos)?;
        if after == pos {
            return Ok(pos);
        }
        pos = after;
    }
}

/// Advances past an identifier (`[_A-Za-z][_A-Za-z0-9]*`), or returns `pos`
/// unchanged if the text at `pos` does not start one.
pub fn skip_identifier(buf: &[u8], pos: usize) -> usize {
    if pos >= buf.len() || !is_identifier_start(buf[pos]) {
        return pos;
    }
    let mut p = pos + 1;
    while p < buf.len() && is_identifier_char(buf[p]) {
        p += 1;
    }
    p
}

/// Advances past an HLSL numeric literal, or returns `pos` unchanged if the
/// text at `pos` does not start one.
///
/// The accepted grammar is deliberately narrow and must not be widened; the
/// tokenizer relies on the exact consumed length to disambiguate unary
/// `+`/`-` from binary operators:
///
/// - optional leading `+`/`-`;
/// - a leading `0` immediately followed by another digit terminates the
///   literal after the `0` (`"01"` consumes one character);
/// - optional fractional part; a bare `.` with no digit on either side is
///   not a number (`"0."` and `".5"` are);
/// - an exponent is consumed only as `[eE][+-][0-9]+` — a missing sign or
///   missing digits leaves the exponent text unconsumed;
/// - a trailing `f`/`F` is consumed only when a fractional part or exponent
///   was present.
pub fn skip_float_number(buf: &[u8], pos: usize) -> usize {
    let start = pos;
    let mut p = pos;
    if p < buf.len() && (buf[p] == b'+' || buf[p] == b'-') {
        p += 1;
    }

    // Integer part, with the leading-zero cutoff.
    if p < buf.len() && buf[p] == b'0' && p + 1 < buf.len() && is_digit(buf[p + 1]) {
        return p + 1;
    }
    let int_start = p;
    while p < buf.len() && is_digit(buf[p]) {
        p += 1;
    }
    let has_int = p > int_start;

    // Fractional part.
    let mut has_frac = false;
    if p < buf.len() && buf[p] == b'.' {
        let frac_start = p + 1;
        let mut q = frac_start;
        while q < buf.len() && is_digit(buf[q]) {
            q += 1;
        }
        if has_int || q > frac_start {
            has_frac = true;
            p = q;
        }
    }

    if !has_int && !has_frac {
        return start;
    }

    // Exponent: requires an explicit sign and at least one digit.
    let mut has_exp = false;
    if p + 2 < buf.len()
        && (buf[p] == b'e' || buf[p] == b'E')
        && (buf[p + 1] == b'+' || buf[p + 1] == b'-')
        && is_digit(buf[p + 2])
    {
        p += 3;
        while p < buf.len() && is_digit(buf[p]) {
            p += 1;
        }
        has_exp = true;
    }

    if (has_frac || has_exp) && p < buf.len() && (buf[p] == b'f' || buf[p] == b'F') {
        p += 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumed(s: &str) -> usize {
        skip_float_number(s.as_bytes(), 0)
    }

    #[test]
    fn float_number_grammar_table() {
        // (input, consumed length)
        let table: &[(&str, usize)] = &[
            ("", 0),
            (".", 0),
            ("e", 0),
            ("+", 0),
            ("-", 0),
            ("+.", 0),
            ("+e1", 0),
            ("0", 1),
            ("01", 1),
            ("0123456789", 1),
            ("-01", 2),
            ("10", 2),
            ("-1fx", 2),
            ("1f", 1),
            ("0.", 2),
            ("+0.", 3),
            ("-0.", 3),
            ("0.f", 3),
            (".0123456789f", 12),
            ("1.5e+3", 6),
            ("1.5e3", 3),
            ("1.5e+", 3),
            ("1e-2f", 5),
            ("0e+0123456789", 13),
            ("1.5E-3F", 7),
            ("123abc", 3),
        ];
        for &(input, want) in table {
            assert_eq!(
                consumed(input),
                want,
                "skip_float_number({input:?}) consumed wrong length"
            );
        }
    }

    #[test]
    fn comment_skipping() {
        let src = b"// line\nx";
        assert_eq!(skip_comment(src, 0).unwrap(), 7);
        let src = b"/* a /* not nested */x";
        assert_eq!(skip_comment(src, 0).unwrap(), 21);
        let src = b"/* open";
        let err = skip_comment(src, 0).unwrap_err();
        assert_eq!(err.at, 0);
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        // Not a comment at all.
        assert_eq!(skip_comment(b"/x", 0).unwrap(), 0);
    }

    #[test]
    fn delimiter_and_comment_runs() {
        let src = b"  // c\n\t/* d */  x";
        let p = skip_delimiters_and_comments(src, 0).unwrap();
        assert_eq!(src[p], b'x');
    }
}
