//! Syntax error types.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::RecoveryAction;
use crate::dialect::{is_unreserved_word, Dialect};
use crate::lexer::{Keyword, Span, Token, TokenKind};

/// Something the parser would have accepted at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Expected {
    /// A specific keyword.
    Keyword(Keyword),
    /// A specific operator or punctuation token, by spelling.
    Punct(&'static str),
    /// An identifier or unreserved keyword.
    Identifier,
    /// The start of an expression.
    Expression,
    /// A literal value.
    Literal,
    /// A data type name.
    DataType,
    /// The start of a statement.
    Statement,
    /// A variable (`@name`).
    Variable,
    /// End of input.
    EndOfInput,
}

impl Expected {
    /// Whether `token` satisfies this expectation.
    #[must_use]
    pub fn accepts(&self, token: &Token, dialect: &dyn Dialect) -> bool {
        match self {
            Self::Keyword(kw) => token.is_keyword(*kw),
            Self::Punct(p) => token.kind.punctuation() == Some(*p),
            Self::Identifier | Self::DataType => {
                matches!(token.kind, TokenKind::Identifier { .. }) || is_unreserved_word(dialect, &token.kind)
            }
            Self::Expression => can_start_expression(token, dialect),
            Self::Literal => matches!(
                token.kind,
                TokenKind::Number(_) | TokenKind::String { .. } | TokenKind::HexString(_) | TokenKind::BitString(_)
            ),
            Self::Statement => token.as_keyword().is_some_and(starts_statement),
            Self::Variable => matches!(token.kind, TokenKind::Variable(_)),
            Self::EndOfInput => token.is_eof(),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(kw) => write!(f, "{kw}"),
            Self::Punct(p) => write!(f, "'{p}'"),
            Self::Identifier => f.write_str("identifier"),
            Self::Expression => f.write_str("expression"),
            Self::Literal => f.write_str("literal"),
            Self::DataType => f.write_str("data type"),
            Self::Statement => f.write_str("statement"),
            Self::Variable => f.write_str("variable"),
            Self::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Keywords that begin a statement.
#[must_use]
pub const fn starts_statement(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::Select
            | Keyword::With
            | Keyword::Insert
            | Keyword::Update
            | Keyword::Delete
            | Keyword::Merge
            | Keyword::Exec
            | Keyword::Execute
            | Keyword::Create
            | Keyword::Alter
            | Keyword::Drop
            | Keyword::Truncate
            | Keyword::Use
            | Keyword::Begin
            | Keyword::Commit
            | Keyword::Rollback
            | Keyword::Save
    )
}

fn can_start_expression(token: &Token, dialect: &dyn Dialect) -> bool {
    match &token.kind {
        TokenKind::Number(_)
        | TokenKind::String { .. }
        | TokenKind::HexString(_)
        | TokenKind::BitString(_)
        | TokenKind::Identifier { .. }
        | TokenKind::Variable(_)
        | TokenKind::Parameter
        | TokenKind::LeftParen
        | TokenKind::LeftBrace
        | TokenKind::Minus
        | TokenKind::Plus
        | TokenKind::BitNot => true,
        TokenKind::Keyword(kw) => {
            matches!(
                kw,
                Keyword::Not
                    | Keyword::Null
                    | Keyword::True
                    | Keyword::False
                    | Keyword::Case
                    | Keyword::Cast
                    | Keyword::TryCast
                    | Keyword::Convert
                    | Keyword::TryConvert
                    | Keyword::Exists
                    | Keyword::Coalesce
                    | Keyword::Nullif
                    | Keyword::Left
                    | Keyword::Right
                    | Keyword::CurrentTimestamp
                    | Keyword::CurrentUser
                    | Keyword::SessionUser
                    | Keyword::SystemUser
                    | Keyword::User
                    | Keyword::Date
                    | Keyword::Time
                    | Keyword::Timestamp
            ) || !dialect.is_reserved(*kw)
        }
        _ => false,
    }
}

/// The set of alternatives the parser tried at one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpectedSet(BTreeSet<Expected>);

impl ExpectedSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// A set with one element.
    #[must_use]
    pub fn single(expected: Expected) -> Self {
        let mut set = Self::new();
        set.insert(expected);
        set
    }

    pub fn insert(&mut self, expected: Expected) {
        self.0.insert(expected);
    }

    pub fn extend(&mut self, other: &Self) {
        self.0.extend(other.0.iter().copied());
    }

    #[must_use]
    pub fn contains(&self, expected: &Expected) -> bool {
        self.0.contains(expected)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expected> {
        self.0.iter()
    }

    /// Whether any element accepts `token`.
    #[must_use]
    pub fn accepts(&self, token: &Token, dialect: &dyn Dialect) -> bool {
        self.0.iter().any(|e| e.accepts(token, dialect))
    }
}

impl fmt::Display for ExpectedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => f.write_str("nothing"),
            1 => {
                let only = self.0.iter().next().map(ToString::to_string).unwrap_or_default();
                f.write_str(&only)
            }
            _ => {
                f.write_str("one of ")?;
                let mut first = true;
                for expected in &self.0 {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{expected}")?;
                }
                Ok(())
            }
        }
    }
}

/// A grammar production could not match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum SyntaxError {
    /// The next token fits none of the alternatives.
    #[error("unexpected {found}, expected {expected} at position {span}")]
    Unexpected {
        found: Box<Token>,
        expected: ExpectedSet,
        span: Span,
    },
    /// A reserved keyword used where a name is required.
    #[error("reserved word {keyword} cannot be used as an identifier at position {span}")]
    ReservedWord { keyword: Keyword, span: Span },
    /// Speculative parsing ran past the lookahead budget.
    #[error("lookahead budget of {budget} tokens exhausted at position {span}")]
    AmbiguityExhaustion { budget: usize, span: Span },
    /// Nesting exceeded the configured depth.
    #[error("nesting exceeds {limit} levels at position {span}")]
    RecursionLimit { limit: usize, span: Span },
}

impl SyntaxError {
    /// Builds an `Unexpected` error for `found`.
    #[must_use]
    pub fn unexpected(found: &Token, expected: ExpectedSet) -> Self {
        Self::Unexpected {
            span: found.span,
            found: Box::new(found.clone()),
            expected,
        }
    }

    /// Byte range of the offending token.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Unexpected { span, .. }
            | Self::ReservedWord { span, .. }
            | Self::AmbiguityExhaustion { span, .. }
            | Self::RecursionLimit { span, .. } => *span,
        }
    }

    /// Byte offset of the offending token.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.span().start
    }

    /// The expected set, for `Unexpected` errors.
    #[must_use]
    pub const fn expected(&self) -> Option<&ExpectedSet> {
        match self {
            Self::Unexpected { expected, .. } => Some(expected),
            _ => None,
        }
    }
}

/// One reported syntax error and what the parser did about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseErrorRecord {
    pub error: SyntaxError,
    /// 1-based line of the offending token.
    pub line: u32,
    /// 1-based column of the offending token.
    pub column: u32,
    pub action: RecoveryAction,
}

impl ParseErrorRecord {
    /// Byte offset of the offending token.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.error.position()
    }
}

impl fmt::Display for ParseErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.error)
    }
}
