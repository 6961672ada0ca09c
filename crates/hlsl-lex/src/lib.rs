//! A hand-written lexer for HLSL shader source.
//!
//! This crate is intended for tokenizing **untrusted** shader text without
//! panicking or reading out of bounds, and for supporting source-to-source
//! rewriting on top of the produced token stream:
//!
//! - Every token records the exact delimiter text (whitespace + comments)
//!   that preceded it, so concatenating `delimiter + literal` over the whole
//!   list reproduces the input byte-for-byte.
//! - The token list is arena-backed with stable ids, so a rewriter can
//!   insert and erase tokens at arbitrary positions in O(1) while holding
//!   positions into unrelated parts of the list.
//! - Structural helpers (matching-bracket search, scoped walks, context
//!   rendering for diagnostics) operate on the list without consuming it.

#![forbid(unsafe_code)]

mod context;
mod error;
mod list;
mod parse;
mod scan;
mod token;
mod tokenizer;

pub use crate::context::{render_source_context, render_token_context};
pub use crate::error::{LexError, LexErrorKind};
pub use crate::list::{BoundedIds, Ids, TokenId, TokenList};
pub use crate::parse::{find_function_call, find_matching_bracket, process_scope};
pub use crate::scan::{
    is_delimiter, is_digit, skip_comment, skip_delimiters_and_comments, skip_float_number,
    skip_identifier,
};
pub use crate::token::{Keyword, Token, TokenType};
pub use crate::tokenizer::tokenize;
