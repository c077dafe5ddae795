//! Syntax error recovery strategies.

use serde::Serialize;

use super::{Expected, ExpectedSet, Rule};
use crate::dialect::Dialect;
use crate::lexer::{Keyword, Token};

/// What the parser does after a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecoveryAction {
    /// Drop the offending token and retry the failed match.
    ResyncSkip,
    /// Pretend the expected token was present and continue.
    ResyncInsert,
    /// Give up on the current statement.
    Abort,
}

/// Parser state handed to an [`ErrorStrategy`].
#[derive(Debug, Clone, Copy)]
pub struct RecoveryContext<'a> {
    /// What the failed match would have accepted.
    pub expected: &'a ExpectedSet,
    /// The token after the offending one.
    pub next: &'a Token,
    /// Innermost rule being parsed.
    pub rule: Rule,
    pub dialect: &'a dyn Dialect,
    /// Set when the failed match asked for one specific token that could be
    /// inserted.
    pub insertable: Option<Expected>,
}

/// Decides how to continue after a syntax error.
///
/// Called once per error; the parser records the error whatever the answer.
pub trait ErrorStrategy: Send + Sync {
    fn on_syntax_error(&self, ctx: &RecoveryContext<'_>, offending: &Token) -> RecoveryAction;
}

/// Never recovers: the first error ends the statement.
#[derive(Debug, Default, Clone, Copy)]
pub struct BailErrorStrategy;

impl ErrorStrategy for BailErrorStrategy {
    fn on_syntax_error(&self, _ctx: &RecoveryContext<'_>, _offending: &Token) -> RecoveryAction {
        RecoveryAction::Abort
    }
}

/// Single-token deletion, then single-token insertion, then abort.
///
/// Deletion applies when the token after the offending one is acceptable.
/// Insertion is limited to closing tokens (`)`, `END`, `THEN`, `AS`) that
/// the failed match asked for by name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorStrategy;

fn is_insertable(expected: Expected) -> bool {
    matches!(
        expected,
        Expected::Punct(")") | Expected::Keyword(Keyword::End | Keyword::Then | Keyword::As)
    )
}

impl ErrorStrategy for DefaultErrorStrategy {
    fn on_syntax_error(&self, ctx: &RecoveryContext<'_>, offending: &Token) -> RecoveryAction {
        if !offending.is_eof() && ctx.expected.accepts(ctx.next, ctx.dialect) {
            return RecoveryAction::ResyncSkip;
        }
        match ctx.insertable {
            Some(expected) if is_insertable(expected) => RecoveryAction::ResyncInsert,
            _ => RecoveryAction::Abort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDialect;
    use crate::lexer::{Span, TokenKind};

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, Span::new(0, lexeme.len()), 1, 1)
    }

    #[test]
    fn test_bail_always_aborts() {
        let expected = ExpectedSet::single(Expected::Punct(")"));
        let next = token(TokenKind::RightParen, ")");
        let ctx = RecoveryContext {
            expected: &expected,
            next: &next,
            rule: Rule::Paren,
            dialect: &GenericDialect,
            insertable: Some(Expected::Punct(")")),
        };
        let offending = token(TokenKind::Comma, ",");
        assert_eq!(BailErrorStrategy.on_syntax_error(&ctx, &offending), RecoveryAction::Abort);
    }

    #[test]
    fn test_default_skips_extraneous_token() {
        let expected = ExpectedSet::single(Expected::Punct(")"));
        let next = token(TokenKind::RightParen, ")");
        let ctx = RecoveryContext {
            expected: &expected,
            next: &next,
            rule: Rule::Paren,
            dialect: &GenericDialect,
            insertable: Some(Expected::Punct(")")),
        };
        let offending = token(TokenKind::Comma, ",");
        assert_eq!(
            DefaultErrorStrategy.on_syntax_error(&ctx, &offending),
            RecoveryAction::ResyncSkip
        );
    }

    #[test]
    fn test_default_inserts_missing_paren() {
        let expected = ExpectedSet::single(Expected::Punct(")"));
        let next = token(TokenKind::Eof, "");
        let ctx = RecoveryContext {
            expected: &expected,
            next: &next,
            rule: Rule::Paren,
            dialect: &GenericDialect,
            insertable: Some(Expected::Punct(")")),
        };
        let offending = token(TokenKind::Keyword(Keyword::From), "FROM");
        assert_eq!(
            DefaultErrorStrategy.on_syntax_error(&ctx, &offending),
            RecoveryAction::ResyncInsert
        );
    }

    #[test]
    fn test_default_aborts_otherwise() {
        let expected = ExpectedSet::single(Expected::Keyword(Keyword::From));
        let next = token(TokenKind::Eof, "");
        let ctx = RecoveryContext {
            expected: &expected,
            next: &next,
            rule: Rule::Select,
            dialect: &GenericDialect,
            insertable: Some(Expected::Keyword(Keyword::From)),
        };
        let offending = token(TokenKind::Comma, ",");
        assert_eq!(DefaultErrorStrategy.on_syntax_error(&ctx, &offending), RecoveryAction::Abort);
    }
}
