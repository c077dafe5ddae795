//! # shard-sql-sqlserver
//!
//! SQL Server (T-SQL) support for `shard-sql-core`.
//!
//! # How SQL Server differs from the generic dialect
//!
//! - **[Delimited identifiers]**: `[bracketed]` (with `]]` as the escape) and
//!   `"double quoted"`. Backticks are not delimiters.
//! - **Temporary tables**: plain identifiers may start with `#` (`#tmp`,
//!   `##global`) and may contain `$`, `@` and `#`.
//! - **[Variables]**: `@name` and `@@name` are single tokens and may appear
//!   wherever an expression or, for table variables, a table name may.
//! - **`N'...'`** national strings and nesting `/* ... */` comments.
//! - **[TOP]** instead of `LIMIT`; paging otherwise uses
//!   `OFFSET ... ROWS FETCH NEXT ... ROWS ONLY`.
//! - **[Table hints]** such as `WITH (NOLOCK)` and `alias = expr` in the
//!   select list.
//! - **Statement separation**: `;` is optional; a statement keyword starts a
//!   new statement.
//! - **[Reserved keywords]**: T-SQL reserves a long list of words (`KEY`,
//!   `FILE`, `PUBLIC`, `USER`, ...) that must be delimited to be used as
//!   names.
//! - **[GO]** separates batches in client tools. It is not T-SQL; see
//!   [`split_batches`].
//!
//! [Delimited identifiers]: https://learn.microsoft.com/sql/relational-databases/databases/database-identifiers
//! [Variables]: https://learn.microsoft.com/sql/t-sql/language-elements/variables-transact-sql
//! [TOP]: https://learn.microsoft.com/sql/t-sql/queries/top-transact-sql
//! [Table hints]: https://learn.microsoft.com/sql/t-sql/queries/hints-transact-sql-table
//! [Reserved keywords]: https://learn.microsoft.com/sql/t-sql/language-elements/reserved-keywords-transact-sql
//! [GO]: https://learn.microsoft.com/sql/t-sql/language-elements/sql-server-utilities-statements-go
//!
//! ## Example
//!
//! ```rust
//! use shard_sql_sqlserver::SqlServerDialect;
//!
//! let statements = shard_sql_core::parse_sql(
//!     "select top 5 [name] from #people with (nolock) select 1",
//!     &SqlServerDialect,
//! )
//! .unwrap();
//! assert_eq!(statements.len(), 2);
//! assert_eq!(statements[0].to_string(), "SELECT TOP 5 [name] FROM #people WITH (nolock)");
//! ```

mod batches;
pub mod cases;
mod dialect;

pub use batches::{split_batches, Batch};
pub use cases::{registry, run_cases, Case, CaseReport, Expectation};
pub use dialect::SqlServerDialect;
