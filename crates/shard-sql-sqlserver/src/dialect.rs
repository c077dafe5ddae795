//! SQL Server dialect implementation.

use shard_sql_core::dialect::{Dialect, KeywordClass};
use shard_sql_core::lexer::{Keyword, QuoteStyle};

/// SQL Server (T-SQL) dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn identifier_quote(&self, open: char) -> Option<QuoteStyle> {
        match open {
            '[' => Some(QuoteStyle::Bracket),
            '"' => Some(QuoteStyle::DoubleQuote),
            _ => None,
        }
    }

    fn is_identifier_start(&self, c: char) -> bool {
        // `#tmp` and `##global` temp tables
        c.is_alphabetic() || c == '_' || c == '#'
    }

    fn is_identifier_part(&self, c: char) -> bool {
        c.is_alphanumeric() || matches!(c, '_' | '#' | '$' | '@')
    }

    fn supports_national_strings(&self) -> bool {
        true
    }

    fn supports_variables(&self) -> bool {
        true
    }

    fn supports_nested_comments(&self) -> bool {
        true
    }

    fn supports_top(&self) -> bool {
        true
    }

    fn supports_limit_offset(&self) -> bool {
        false
    }

    fn supports_table_hints(&self) -> bool {
        true
    }

    fn supports_alias_assignment(&self) -> bool {
        true
    }

    fn supports_implicit_statement_end(&self) -> bool {
        true
    }

    fn keyword_class(&self, keyword: Keyword) -> KeywordClass {
        reserved_in_tsql(keyword)
    }
}

/// The T-SQL reserved word list.
///
/// `CAST`, `TRY_CAST`, `TRUE` and `FALSE` are not reserved by SQL Server
/// itself, but the shared grammar reads them as expression forms wherever they
/// appear, so they cannot name a column without delimiters.
const fn reserved_in_tsql(keyword: Keyword) -> KeywordClass {
    match keyword {
        Keyword::Add
        | Keyword::All
        | Keyword::Alter
        | Keyword::And
        | Keyword::Any
        | Keyword::As
        | Keyword::Asc
        | Keyword::Authorization
        | Keyword::Backup
        | Keyword::Begin
        | Keyword::Between
        | Keyword::Break
        | Keyword::Browse
        | Keyword::Bulk
        | Keyword::By
        | Keyword::Cascade
        | Keyword::Case
        | Keyword::Cast
        | Keyword::Check
        | Keyword::Checkpoint
        | Keyword::Close
        | Keyword::Clustered
        | Keyword::Coalesce
        | Keyword::Collate
        | Keyword::Column
        | Keyword::Commit
        | Keyword::Compute
        | Keyword::Constraint
        | Keyword::Contains
        | Keyword::Continue
        | Keyword::Convert
        | Keyword::Create
        | Keyword::Cross
        | Keyword::Current
        | Keyword::CurrentDate
        | Keyword::CurrentTime
        | Keyword::CurrentTimestamp
        | Keyword::CurrentUser
        | Keyword::Cursor
        | Keyword::Database
        | Keyword::Dbcc
        | Keyword::Deallocate
        | Keyword::Declare
        | Keyword::Default
        | Keyword::Delete
        | Keyword::Deny
        | Keyword::Desc
        | Keyword::Distinct
        | Keyword::Distributed
        | Keyword::Drop
        | Keyword::Else
        | Keyword::End
        | Keyword::Escape
        | Keyword::Except
        | Keyword::Exec
        | Keyword::Execute
        | Keyword::Exists
        | Keyword::Exit
        | Keyword::External
        | Keyword::False
        | Keyword::Fetch
        | Keyword::File
        | Keyword::Fillfactor
        | Keyword::For
        | Keyword::Foreign
        | Keyword::Freetext
        | Keyword::From
        | Keyword::Full
        | Keyword::Function
        | Keyword::Goto
        | Keyword::Grant
        | Keyword::Group
        | Keyword::Having
        | Keyword::Holdlock
        | Keyword::Identity
        | Keyword::If
        | Keyword::In
        | Keyword::Index
        | Keyword::Inner
        | Keyword::Insert
        | Keyword::Intersect
        | Keyword::Into
        | Keyword::Is
        | Keyword::Join
        | Keyword::Key
        | Keyword::Kill
        | Keyword::Left
        | Keyword::Like
        | Keyword::Lineno
        | Keyword::Load
        | Keyword::Merge
        | Keyword::National
        | Keyword::Nocheck
        | Keyword::Nonclustered
        | Keyword::Not
        | Keyword::Null
        | Keyword::Nullif
        | Keyword::Of
        | Keyword::Off
        | Keyword::On
        | Keyword::Open
        | Keyword::Openquery
        | Keyword::Openrowset
        | Keyword::Option
        | Keyword::Or
        | Keyword::Order
        | Keyword::Outer
        | Keyword::Over
        | Keyword::Percent
        | Keyword::Pivot
        | Keyword::Plan
        | Keyword::Precision
        | Keyword::Primary
        | Keyword::Print
        | Keyword::Proc
        | Keyword::Procedure
        | Keyword::Public
        | Keyword::Raiserror
        | Keyword::Read
        | Keyword::Reconfigure
        | Keyword::References
        | Keyword::Replication
        | Keyword::Restore
        | Keyword::Restrict
        | Keyword::Return
        | Keyword::Revert
        | Keyword::Revoke
        | Keyword::Right
        | Keyword::Rollback
        | Keyword::Rowcount
        | Keyword::Rule
        | Keyword::Save
        | Keyword::Schema
        | Keyword::Select
        | Keyword::SessionUser
        | Keyword::Set
        | Keyword::Setuser
        | Keyword::Shutdown
        | Keyword::Some
        | Keyword::Statistics
        | Keyword::SystemUser
        | Keyword::Table
        | Keyword::Tablesample
        | Keyword::Textsize
        | Keyword::Then
        | Keyword::To
        | Keyword::Top
        | Keyword::Tran
        | Keyword::Transaction
        | Keyword::Trigger
        | Keyword::True
        | Keyword::Truncate
        | Keyword::TryCast
        | Keyword::TryConvert
        | Keyword::Union
        | Keyword::Unique
        | Keyword::Unpivot
        | Keyword::Update
        | Keyword::Use
        | Keyword::User
        | Keyword::Values
        | Keyword::Varying
        | Keyword::View
        | Keyword::Waitfor
        | Keyword::When
        | Keyword::Where
        | Keyword::While
        | Keyword::With
        | Keyword::Within
        | Keyword::Writetext => KeywordClass::Reserved,
        _ => KeywordClass::Unreserved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlserver_dialect() {
        let dialect = SqlServerDialect::new();
        assert_eq!(dialect.name(), "sqlserver");
        assert_eq!(dialect.identifier_quote('['), Some(QuoteStyle::Bracket));
        assert_eq!(dialect.identifier_quote('"'), Some(QuoteStyle::DoubleQuote));
        assert_eq!(dialect.identifier_quote('`'), None);
        assert!(dialect.supports_top());
        assert!(dialect.supports_variables());
        assert!(dialect.supports_implicit_statement_end());
        assert!(!dialect.supports_limit_offset());
    }

    #[test]
    fn test_identifier_characters() {
        let dialect = SqlServerDialect;
        assert!(dialect.is_identifier_start('#'));
        assert!(dialect.is_identifier_start('_'));
        assert!(!dialect.is_identifier_start('@'));
        assert!(!dialect.is_identifier_start('$'));
        assert!(dialect.is_identifier_part('$'));
        assert!(dialect.is_identifier_part('@'));
        assert!(dialect.is_identifier_part('#'));
    }

    #[test]
    fn test_keyword_classes() {
        let dialect = SqlServerDialect;
        for kw in [Keyword::Select, Keyword::Top, Keyword::Merge, Keyword::Tran, Keyword::Key] {
            assert!(dialect.is_reserved(kw), "{kw:?} should be reserved");
        }
        for kw in [
            Keyword::Limit,
            Keyword::Offset,
            Keyword::Name,
            Keyword::Target,
            Keyword::Source,
            Keyword::Inserted,
            Keyword::Deleted,
            Keyword::Output,
        ] {
            assert_eq!(dialect.keyword_class(kw), KeywordClass::Unreserved, "{kw:?}");
        }
        for kw in Keyword::ALL {
            assert_ne!(dialect.keyword_class(*kw), KeywordClass::NonKeyword);
        }
    }
}
