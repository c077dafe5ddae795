//! Keyword / identifier classification.
//!
//! Pure functions over a dialect's keyword table: they decide whether a token
//! may stand where the grammar asks for a name.

use super::{Dialect, KeywordClass};
use crate::ast::Ident;
use crate::lexer::{Token, TokenKind};
use crate::parser::{Expected, ExpectedSet, SyntaxError};

/// Classifies any token kind. Only keywords can be reserved or unreserved.
#[must_use]
pub fn classify(dialect: &dyn Dialect, kind: &TokenKind) -> KeywordClass {
    match kind {
        TokenKind::Keyword(kw) => dialect.keyword_class(*kw),
        _ => KeywordClass::NonKeyword,
    }
}

/// Returns true if `kind` is a keyword the dialect lets act as a name.
#[must_use]
pub fn is_unreserved_word(dialect: &dyn Dialect, kind: &TokenKind) -> bool {
    classify(dialect, kind) == KeywordClass::Unreserved
}

/// Converts a token in a name position into an identifier.
///
/// Plain and delimited identifiers keep their quote style; unreserved
/// keywords become undelimited identifiers spelled as in the source.
///
/// # Errors
///
/// [`SyntaxError::ReservedWord`] for a reserved keyword, and
/// [`SyntaxError::Unexpected`] for any other non-name token.
pub fn as_identifier(dialect: &dyn Dialect, token: &Token) -> Result<Ident, SyntaxError> {
    match &token.kind {
        TokenKind::Identifier { value, quote } => Ok(Ident {
            value: value.clone(),
            quote_style: *quote,
            span: token.span,
        }),
        TokenKind::Keyword(keyword) => match dialect.keyword_class(*keyword) {
            KeywordClass::Reserved => Err(SyntaxError::ReservedWord {
                keyword: *keyword,
                span: token.span,
            }),
            KeywordClass::Unreserved | KeywordClass::NonKeyword => {
                Ok(Ident::new(token.lexeme.clone()).with_span(token.span))
            }
        },
        _ => Err(SyntaxError::unexpected(token, ExpectedSet::single(Expected::Identifier))),
    }
}
