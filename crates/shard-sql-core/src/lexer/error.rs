//! Lexical error type.

use serde::Serialize;

/// What went wrong while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum LexicalErrorKind {
    /// A string literal reached end of input before its closing quote.
    #[error("unterminated string literal")]
    UnterminatedString,
    /// A delimited identifier reached end of input before its closing delimiter.
    #[error("unterminated quoted identifier")]
    UnterminatedIdentifier,
    /// A `/* ... */` comment was never closed.
    #[error("unterminated block comment")]
    UnterminatedComment,
    /// A backslash escape the dialect does not define.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    /// A character that is not a valid digit for a hex or bit string.
    #[error("invalid digit '{0}' in binary literal")]
    InvalidDigit(char),
    /// A character that cannot start any token.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
}

/// A failure to turn source text into tokens.
///
/// Lexing stops at the first such error; `position` is the byte offset where
/// the problem was detected (end of input for unterminated literals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} at line {line}, column {column} (offset {position}): {snippet}")]
pub struct LexicalError {
    /// The kind of error.
    pub kind: LexicalErrorKind,
    /// Byte offset of the error.
    pub position: usize,
    /// 1-based line of `position`.
    pub line: u32,
    /// 1-based column of `position`.
    pub column: u32,
    /// Source text around the offending construct.
    pub snippet: String,
}
