//! Error type of the top-level parse functions.

use serde::Serialize;
use thiserror::Error;

use crate::builder::BuildError;
use crate::lexer::{LexicalError, Span};
use crate::parser::ParseErrorRecord;

/// Everything that can go wrong turning SQL text into an AST.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ParseError {
    /// The input could not be tokenized.
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalError),

    /// The token stream does not match the grammar. Never empty.
    #[error("syntax error: {}", first_record(.0))]
    Syntax(Vec<ParseErrorRecord>),

    /// The parse tree could not be converted.
    #[error("{0}")]
    Build(#[from] BuildError),

    /// The input holds no statement.
    #[error("no statement found")]
    NoStatement,

    /// A single statement was requested but more input follows it.
    #[error("unexpected input after the statement at position {0}")]
    TrailingInput(Span),
}

fn first_record(records: &[ParseErrorRecord]) -> String {
    match records {
        [] => String::from("no details"),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

impl ParseError {
    /// Syntax error records, empty for other variants.
    #[must_use]
    pub fn records(&self) -> &[ParseErrorRecord] {
        match self {
            Self::Syntax(records) => records,
            _ => &[],
        }
    }

    /// Byte offset the error points at, when it has one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Lexical(error) => Some(error.position),
            Self::Syntax(records) => records.first().map(ParseErrorRecord::position),
            Self::Build(BuildError::Incomplete { span, .. } | BuildError::Malformed { span, .. })
            | Self::TrailingInput(span) => Some(span.start),
            Self::NoStatement => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
