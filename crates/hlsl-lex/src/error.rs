use core::fmt;

/// A tokenization failure, carrying the byte offset it occurred at.
///
/// Rendering a human-readable context window around `at` is the caller's
/// choice; see [`crate::render_source_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset into the source text where the error was detected.
    ///
    /// For unterminated comments/strings this is the offset of the opening
    /// `/*` or `"`, not the end of input.
    pub at: usize,
    pub kind: LexErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedComment,
    UnterminatedString,
    /// `#` was not followed by a directive name, or a comment appeared
    /// between `#` and the directive name.
    MalformedPreprocessorDirective,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lex error at offset {}: ", self.at)?;
        match self.kind {
            LexErrorKind::UnterminatedComment => write!(f, "unterminated multiline comment"),
            LexErrorKind::UnterminatedString => write!(f, "unterminated string constant"),
            LexErrorKind::MalformedPreprocessorDirective => {
                write!(f, "malformed preprocessor directive")
            }
        }
    }
}

impl std::error::Error for LexError {}
