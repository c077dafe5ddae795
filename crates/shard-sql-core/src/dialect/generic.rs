//! Generic SQL dialect.

use super::{Dialect, KeywordClass};
use crate::lexer::{Keyword, QuoteStyle};

/// A generic dialect close to ANSI SQL.
///
/// Accepts `"double"` and `` `backtick` `` delimited identifiers, `LIMIT` /
/// `OFFSET` paging, and reserves only the core SQL words.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn identifier_quote(&self, open: char) -> Option<QuoteStyle> {
        match open {
            '"' => Some(QuoteStyle::DoubleQuote),
            '`' => Some(QuoteStyle::Backtick),
            _ => None,
        }
    }

    fn keyword_class(&self, keyword: Keyword) -> KeywordClass {
        reserved_in_generic(keyword)
    }
}

const fn reserved_in_generic(keyword: Keyword) -> KeywordClass {
    match keyword {
        Keyword::All
        | Keyword::Alter
        | Keyword::And
        | Keyword::Any
        | Keyword::As
        | Keyword::Asc
        | Keyword::Between
        | Keyword::By
        | Keyword::Case
        | Keyword::Cast
        | Keyword::Check
        | Keyword::Collate
        | Keyword::Column
        | Keyword::Constraint
        | Keyword::Create
        | Keyword::Cross
        | Keyword::CurrentDate
        | Keyword::CurrentTime
        | Keyword::CurrentTimestamp
        | Keyword::CurrentUser
        | Keyword::Default
        | Keyword::Delete
        | Keyword::Desc
        | Keyword::Distinct
        | Keyword::Drop
        | Keyword::Else
        | Keyword::End
        | Keyword::Except
        | Keyword::Exists
        | Keyword::False
        | Keyword::Fetch
        | Keyword::For
        | Keyword::Foreign
        | Keyword::From
        | Keyword::Full
        | Keyword::Group
        | Keyword::Having
        | Keyword::In
        | Keyword::Inner
        | Keyword::Insert
        | Keyword::Intersect
        | Keyword::Into
        | Keyword::Is
        | Keyword::Join
        | Keyword::Left
        | Keyword::Like
        | Keyword::Limit
        | Keyword::Not
        | Keyword::Null
        | Keyword::Offset
        | Keyword::On
        | Keyword::Or
        | Keyword::Order
        | Keyword::Outer
        | Keyword::Primary
        | Keyword::References
        | Keyword::Right
        | Keyword::Select
        | Keyword::SessionUser
        | Keyword::Set
        | Keyword::Some
        | Keyword::Table
        | Keyword::Then
        | Keyword::To
        | Keyword::True
        | Keyword::Union
        | Keyword::Unique
        | Keyword::Update
        | Keyword::User
        | Keyword::Using
        | Keyword::Values
        | Keyword::When
        | Keyword::Where
        | Keyword::With => KeywordClass::Reserved,
        _ => KeywordClass::Unreserved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_dialect() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.identifier_quote('`'), Some(QuoteStyle::Backtick));
        assert_eq!(dialect.identifier_quote('['), None);
        assert!(dialect.supports_limit_offset());
        assert!(!dialect.supports_top());
        assert!(!dialect.supports_variables());
    }

    #[test]
    fn test_generic_keyword_classes() {
        let dialect = GenericDialect::new();
        assert!(dialect.is_reserved(Keyword::Select));
        assert!(dialect.is_reserved(Keyword::Limit));
        assert_eq!(dialect.keyword_class(Keyword::Name), KeywordClass::Unreserved);
        assert_eq!(dialect.keyword_class(Keyword::Top), KeywordClass::Unreserved);
        for kw in Keyword::ALL {
            assert_ne!(dialect.keyword_class(*kw), KeywordClass::NonKeyword);
        }
    }
}
