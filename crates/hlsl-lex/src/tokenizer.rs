//! The HLSL tokenizer.
//!
//! Produces a [`TokenList`] whose `delimiter + literal` concatenation
//! reproduces the input exactly; nothing is normalized. Two-character
//! operators are formed by extending the previous token in place when the
//! new character follows it with no intervening delimiter, which keeps the
//! per-character dispatch a single pass with no lookahead buffer.

use crate::error::{LexError, LexErrorKind};
use crate::list::TokenList;
use crate::scan::{
    is_digit, skip_comment, skip_delimiters_and_comments, skip_float_number, skip_identifier,
};
use crate::token::{Keyword, Token, TokenType};

/// Tokenizes `source` into an ordered token list.
///
/// Fails on an unterminated string or multiline comment and on a malformed
/// preprocessor directive; the error carries the byte offset of the problem
/// (render it with [`crate::render_source_context`] for a human).
pub fn tokenize(source: &str) -> Result<TokenList, LexError> {
    let buf = source.as_bytes();
    let mut list = TokenList::new();
    let mut pos = 0usize;
    let mut index = 0u32;

    loop {
        let delim_start = pos;
        pos = skip_delimiters_and_comments(buf, pos)?;
        let delimiter = &source[delim_start..pos];

        if pos >= buf.len() {
            // Keep trailing whitespace/comments so reassembly stays lossless.
            if !delimiter.is_empty() {
                let mut t = Token::new(TokenType::TextBlock, "");
                t.delimiter = delimiter.to_string();
                t.index = index;
                list.push_back(t);
            }
            return Ok(list);
        }

        let c = buf[pos];
        let token_start = pos;

        // Two-character operator formation: `=`, `|`, `&`, `<`, `>`, `+`,
        // `-`, `:` may extend the previous token when nothing separates them.
        if delimiter.is_empty() && matches!(c, b'=' | b'|' | b'&' | b'<' | b'>' | b'+' | b'-' | b':')
        {
            if let Some(last) = list.last() {
                let mut candidate = list[last].literal.clone();
                candidate.push(c as char);
                if let Some(ty) = two_char_operator(&candidate) {
                    let t = &mut list[last];
                    t.ty = ty;
                    t.literal = candidate;
                    pos += 1;
                    continue;
                }
            }
        }

        let (ty, literal_end) = match c {
            b'#' => {
                let end = scan_directive(buf, pos)?;
                (TokenType::PreprocessorDirective, end)
            }
            b'"' => {
                let end = scan_string(buf, pos)?;
                (TokenType::StringConstant, end)
            }
            b'=' => (TokenType::Assignment, pos + 1),
            b'|' | b'&' | b'^' | b'~' => (TokenType::BitwiseOp, pos + 1),
            b'<' => (TokenType::OpenAngle, pos + 1),
            b'>' => (TokenType::ClosingAngle, pos + 1),
            b'+' | b'-' => {
                // Unary sign starts a numeric literal only when the previous
                // token cannot end an operand expression.
                let prev_ends_operand = list.last().map_or(false, |id| {
                    matches!(
                        list[id].ty,
                        TokenType::Identifier
                            | TokenType::NumericConstant
                            | TokenType::ClosingParen
                            | TokenType::ClosingSquare
                    )
                });
                let num_end = if prev_ends_operand {
                    pos
                } else {
                    skip_float_number(buf, pos)
                };
                if num_end > pos {
                    (TokenType::NumericConstant, num_end)
                } else {
                    (TokenType::MathOp, pos + 1)
                }
            }
            b':' => (TokenType::Colon, pos + 1),
            b';' => (TokenType::Semicolon, pos + 1),
            b',' => (TokenType::Comma, pos + 1),
            b'?' => (TokenType::QuestionMark, pos + 1),
            b'{' => (TokenType::OpenBrace, pos + 1),
            b'}' => (TokenType::ClosingBrace, pos + 1),
            b'(' => (TokenType::OpenParen, pos + 1),
            b')' => (TokenType::ClosingParen, pos + 1),
            b'[' => (TokenType::OpenSquare, pos + 1),
            b']' => (TokenType::ClosingSquare, pos + 1),
            b'*' | b'/' | b'%' => (TokenType::MathOp, pos + 1),
            b'!' => (TokenType::LogicOp, pos + 1),
            _ => {
                let ident_end = skip_identifier(buf, pos);
                if ident_end > pos {
                    let ident = &source[pos..ident_end];
                    let ty = match Keyword::from_ident(ident) {
                        Some(kw) => TokenType::Keyword(kw),
                        None => TokenType::Identifier,
                    };
                    (ty, ident_end)
                } else if is_digit(c) || c == b'.' {
                    let num_end = skip_float_number(buf, pos);
                    if num_end > pos {
                        (TokenType::NumericConstant, num_end)
                    } else {
                        (TokenType::Dot, pos + 1)
                    }
                } else {
                    (TokenType::Undefined, pos + 1)
                }
            }
        };

        let mut t = Token::new(ty, &source[token_start..literal_end]);
        t.delimiter = delimiter.to_string();
        t.index = index;
        index += 1;
        list.push_back(t);
        pos = literal_end;
    }
}

fn two_char_operator(lit: &str) -> Option<TokenType> {
    use TokenType::*;
    Some(match lit {
        "==" | "!=" | "<=" | ">=" => ComparisonOp,
        "&&" | "||" => LogicOp,
        "<<" | ">>" => BitwiseOp,
        "++" | "--" => IncDecOp,
        "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" => Assignment,
        "::" => DoubleColon,
        _ => return None,
    })
}

/// Scans `#` + directive name. The directive token covers only that much;
/// the rest of the line tokenizes normally.
fn scan_directive(buf: &[u8], pos: usize) -> Result<usize, LexError> {
    debug_assert_eq!(buf[pos], b'#');
    let mut p = pos + 1;
    while p < buf.len() && matches!(buf[p], b' ' | b'\t') {
        p += 1;
    }
    // A comment between `#` and the directive name is rejected rather than
    // silently folded into the directive token.
    if skip_comment(buf, p)? != p {
        return Err(LexError {
            at: pos,
            kind: LexErrorKind::MalformedPreprocessorDirective,
        });
    }
    let name_end = skip_identifier(buf, p);
    if name_end == p {
        return Err(LexError {
            at: pos,
            kind: LexErrorKind::MalformedPreprocessorDirective,
        });
    }
    Ok(name_end)
}

fn scan_string(buf: &[u8], pos: usize) -> Result<usize, LexError> {
    debug_assert_eq!(buf[pos], b'"');
    let mut p = pos + 1;
    while p < buf.len() {
        match buf[p] {
            b'\\' if p + 1 < buf.len() => p += 2,
            b'"' => return Ok(p + 1),
            _ => p += 1,
        }
    }
    Err(LexError {
        at: pos,
        kind: LexErrorKind::UnterminatedString,
    })
}
