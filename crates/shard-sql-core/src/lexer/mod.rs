//! SQL Lexer/Tokenizer
//!
//! A hand-written, dialect-driven lexer producing a stream of [`Token`]s with
//! byte spans and line/column positions.

mod error;
mod span;
mod token;
mod tokenizer;

pub use error::{LexicalError, LexicalErrorKind};
pub use span::Span;
pub use token::{Keyword, NumberKind, QuoteStyle, Token, TokenKind};
pub use tokenizer::{Lexer, tokenize, tokenize_recovering};
