//! Human-readable context windows for diagnostics.
//!
//! Both renderers are pure functions so every error path (log sink, returned
//! error, test assertion) can decide independently whether to pay for
//! rendering.

use crate::list::{TokenId, TokenList};

/// Renders `context_lines` lines above and below the line containing byte
/// offset `at`, with a `^` caret under the offending column.
pub fn render_source_context(source: &str, at: usize, context_lines: usize) -> String {
    let at = at.min(source.len());
    let bytes = source.as_bytes();

    let line_start = source[..at].rfind('\n').map_or(0, |p| p + 1);
    let column = at - line_start;

    // Walk back over the requested number of preceding lines.
    let mut window_start = line_start;
    for _ in 0..context_lines {
        if window_start == 0 {
            break;
        }
        window_start = source[..window_start - 1].rfind('\n').map_or(0, |p| p + 1);
    }

    let mut out = String::new();
    let mut pos = window_start;
    let mut lines_after = 0usize;
    while pos <= source.len() {
        let line_end = source[pos..]
            .find('\n')
            .map_or(source.len(), |p| pos + p);
        let line = &source[pos..line_end];
        out.push_str(line);
        out.push('\n');
        if pos == line_start {
            // Caret line: align with tabs preserved so the column matches in
            // common terminals.
            for b in &bytes[line_start..line_start + column.min(line.len())] {
                out.push(if *b == b'\t' { '\t' } else { ' ' });
            }
            out.push_str("^\n");
        }
        if pos > line_start {
            lines_after += 1;
            if lines_after >= context_lines {
                break;
            }
        }
        if line_end >= source.len() {
            break;
        }
        pos = line_end + 1;
    }
    out
}

/// Renders a context window around a token by reassembling up to
/// `tokens_around` tokens on each side of `at`, with a caret under the
/// token's literal.
pub fn render_token_context(list: &TokenList, at: TokenId, tokens_around: usize) -> String {
    let mut first = at;
    for _ in 0..tokens_around {
        match list.prev(first) {
            Some(p) => first = p,
            None => break,
        }
    }

    let mut text = String::new();
    let mut target_offset = 0usize;
    let mut cur = Some(first);
    let mut emitted_after = 0usize;
    while let Some(id) = cur {
        let t = &list[id];
        text.push_str(&t.delimiter);
        if id == at {
            target_offset = text.len();
        }
        text.push_str(&t.literal);
        if id == at || emitted_after > 0 {
            emitted_after += 1;
            if emitted_after > tokens_around {
                break;
            }
        }
        cur = list.next(id);
    }

    render_source_context(&text, target_offset, tokens_around.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn caret_points_at_offending_column() {
        let src = "line one\nbad token here\nline three\n";
        let at = src.find("token").unwrap();
        let out = render_source_context(src, at, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "line one");
        assert_eq!(lines[1], "bad token here");
        assert_eq!(lines[2], "    ^");
        assert_eq!(lines[3], "line three");
    }

    #[test]
    fn token_context_reassembles_surrounding_source() {
        let list = tokenize("float4 a = b + c;").unwrap();
        let plus = list
            .iter()
            .find(|(_, t)| t.literal == "+")
            .map(|(id, _)| id)
            .unwrap();
        let out = render_token_context(&list, plus, 3);
        assert!(out.contains("a = b + c"), "unexpected context:\n{out}");
        assert!(out.contains('^'));
    }
}
