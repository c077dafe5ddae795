//! SQL Dialect support.
//!
//! A dialect supplies the lexical rules (identifier delimiters, string escape
//! style, variables) and the keyword classification used by the parser. The
//! grammar itself is shared; dialect flags switch individual clauses on or
//! off.

mod classifier;
mod generic;

pub use classifier::{as_identifier, classify, is_unreserved_word};
pub use generic::GenericDialect;

use serde::Serialize;

use crate::lexer::{Keyword, QuoteStyle};

/// How a keyword may be used in a given dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeywordClass {
    /// Never usable as a plain identifier; must be delimited.
    Reserved,
    /// A keyword that is accepted wherever the grammar expects a name.
    Unreserved,
    /// Not a keyword at all (plain identifiers, literals, punctuation).
    NonKeyword,
}

/// Escape convention inside string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StringEscape {
    /// A quote is escaped by doubling it: `'it''s'`.
    Doubled,
    /// Backslash escapes (`\'`, `\\`, `\n`, ...) in addition to doubling.
    Backslash,
}

/// Trait for SQL dialect-specific behavior.
///
/// Implementations must be pure: the same input always yields the same answer,
/// so a dialect can be shared across threads parsing independently.
pub trait Dialect: std::fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Maps an opening delimiter to the identifier quote style it starts.
    fn identifier_quote(&self, open: char) -> Option<QuoteStyle> {
        match open {
            '"' => Some(QuoteStyle::DoubleQuote),
            _ => None,
        }
    }

    /// Whether `c` may start a bare identifier.
    fn is_identifier_start(&self, c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    /// Whether `c` may continue a bare identifier.
    fn is_identifier_part(&self, c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Returns the string escape convention.
    fn string_escape(&self) -> StringEscape {
        StringEscape::Doubled
    }

    /// Whether `N'...'` national strings are recognized.
    fn supports_national_strings(&self) -> bool {
        false
    }

    /// Whether `@name` / `@@name` lex as variables.
    fn supports_variables(&self) -> bool {
        false
    }

    /// Whether `/* ... */` comments nest.
    fn supports_nested_comments(&self) -> bool {
        false
    }

    /// Whether `SELECT TOP (n)` is accepted.
    fn supports_top(&self) -> bool {
        false
    }

    /// Whether `LIMIT n [OFFSET m]` is accepted.
    fn supports_limit_offset(&self) -> bool {
        true
    }

    /// Whether `WITH (hint, ...)` may follow a table name.
    fn supports_table_hints(&self) -> bool {
        false
    }

    /// Whether `SELECT alias = expr` names a column rather than comparing.
    fn supports_alias_assignment(&self) -> bool {
        false
    }

    /// Whether a statement may begin right after the previous one without `;`.
    fn supports_implicit_statement_end(&self) -> bool {
        false
    }

    /// Classifies a keyword for this dialect.
    ///
    /// Must never return [`KeywordClass::NonKeyword`] for a [`Keyword`].
    fn keyword_class(&self, keyword: Keyword) -> KeywordClass;

    /// Returns true if the keyword cannot be used as a bare identifier.
    fn is_reserved(&self, keyword: Keyword) -> bool {
        self.keyword_class(keyword) == KeywordClass::Reserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EverythingReserved;

    impl Dialect for EverythingReserved {
        fn name(&self) -> &'static str {
            "everything-reserved"
        }

        fn keyword_class(&self, _keyword: Keyword) -> KeywordClass {
            KeywordClass::Reserved
        }
    }

    #[test]
    fn test_trait_defaults() {
        let dialect = EverythingReserved;
        assert_eq!(dialect.identifier_quote('"'), Some(QuoteStyle::DoubleQuote));
        assert_eq!(dialect.identifier_quote('['), None);
        assert_eq!(dialect.string_escape(), StringEscape::Doubled);
        assert!(dialect.is_identifier_start('_'));
        assert!(!dialect.is_identifier_start('1'));
        assert!(dialect.is_identifier_part('1'));
        assert!(!dialect.supports_top());
        assert!(dialect.supports_limit_offset());
        assert!(dialect.is_reserved(Keyword::Name));
    }
}
