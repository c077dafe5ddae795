//! Regression cases for the SQL Server dialect.
//!
//! Each case pairs a piece of T-SQL with what parsing it must produce: the
//! canonical rendering of its statements, or the byte offset of the first
//! syntax or lexical error. Ids are unique across the registry; a clash is
//! reported by [`registry`] rather than silently shadowing a case.

use std::collections::HashSet;

use serde::Serialize;
use shard_sql_core::{parse_batch, ParserOptions, ScriptOutcome};
use thiserror::Error;
use tracing::{debug, warn};

use crate::SqlServerDialect;

/// What a case must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Expectation {
    /// Every statement parses; renderings joined with `"; "`.
    Canonical(&'static str),
    /// The first syntax error points at this byte offset.
    SyntaxErrorAt(usize),
    /// Tokenizing fails at this byte offset.
    LexicalErrorAt(usize),
}

/// One regression case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Case {
    pub id: &'static str,
    pub sql: &'static str,
    pub expectation: Expectation,
}

const fn canonical(id: &'static str, sql: &'static str, rendered: &'static str) -> Case {
    Case {
        id,
        sql,
        expectation: Expectation::Canonical(rendered),
    }
}

/// A case whose input is already in canonical form.
const fn fixed(id: &'static str, sql: &'static str) -> Case {
    canonical(id, sql, sql)
}

const fn syntax_error(id: &'static str, sql: &'static str, position: usize) -> Case {
    Case {
        id,
        sql,
        expectation: Expectation::SyntaxErrorAt(position),
    }
}

const fn lexical_error(id: &'static str, sql: &'static str, position: usize) -> Case {
    Case {
        id,
        sql,
        expectation: Expectation::LexicalErrorAt(position),
    }
}

/// Errors found while assembling a case list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseError {
    #[error("duplicate case id `{0}`")]
    DuplicateId(&'static str),
}

/// Outcome of running one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    pub id: &'static str,
    /// `None` when the case passed, otherwise what went wrong.
    pub failure: Option<String>,
}

impl CaseReport {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

const CASES: &[Case] = &[
    // select
    canonical("select_simple", "select a, b from t where a > 1", "SELECT a, b FROM t WHERE a > 1"),
    canonical("select_top_literal", "select top 5 * from t", "SELECT TOP 5 * FROM t"),
    fixed("select_top_percent_with_ties", "SELECT TOP (10) PERCENT WITH TIES a FROM t ORDER BY a"),
    fixed("select_alias_assignment", "SELECT total = price * qty FROM lines"),
    fixed("select_variable_assignment", "SELECT @n = count(*) FROM t"),
    fixed("select_into_temp_table", "SELECT * INTO #orders FROM dbo.orders"),
    fixed("select_bracket_identifiers", "SELECT [order].[group] FROM [order]"),
    fixed("select_table_hint", "SELECT a FROM t WITH (NOLOCK) WHERE b = N'x'"),
    fixed("select_apply", "SELECT * FROM t CROSS APPLY f(t.id) AS x OUTER APPLY g(t.id) AS y"),
    canonical(
        "select_join_default_inner",
        "SELECT a FROM t JOIN u ON t.id = u.id",
        "SELECT a FROM t INNER JOIN u ON t.id = u.id",
    ),
    fixed("select_convert_style", "SELECT CONVERT(VARCHAR(10), d, 120) FROM t"),
    fixed("select_offset_fetch", "SELECT a FROM t ORDER BY a OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"),
    fixed("select_group_by_rollup", "SELECT a FROM t GROUP BY a WITH ROLLUP"),
    fixed("select_option_hint", "SELECT a FROM t OPTION (MAXDOP 1)"),
    fixed("select_cte", "WITH x (n) AS (SELECT 1) SELECT n FROM x"),
    fixed("select_union_all", "SELECT a FROM t UNION ALL SELECT b FROM u"),
    // insert
    canonical("insert_without_into", "insert t values (1)", "INSERT INTO t VALUES (1)"),
    fixed("insert_rows", "INSERT INTO t (a, b) VALUES (1, 'x'), (2, NULL)"),
    fixed("insert_default_values", "INSERT INTO t DEFAULT VALUES"),
    // update / delete / merge
    fixed("update_top_output", "UPDATE TOP (5) t SET @v = a, a = 0 OUTPUT deleted.a WHERE b = @b"),
    canonical("delete_without_from", "delete t where x = 1", "DELETE FROM t WHERE x = 1"),
    fixed("delete_top_output_into", "DELETE TOP (10) FROM q OUTPUT deleted.id INTO @gone"),
    fixed(
        "merge_matched_not_matched",
        "MERGE INTO t USING s ON t.id = s.id WHEN MATCHED THEN UPDATE SET v = s.v WHEN NOT MATCHED THEN INSERT (id) VALUES (s.id)",
    ),
    // exec
    fixed("exec_return_status", "EXEC @rc = p @a = 1, @b = @c OUTPUT"),
    canonical("exec_execute_spelling", "EXECUTE p", "EXEC p"),
    // ddl
    fixed("create_table", "CREATE TABLE t (id INT NOT NULL PRIMARY KEY, v NVARCHAR(50) DEFAULT 'x')"),
    fixed("create_unique_index", "CREATE UNIQUE INDEX ux ON t (a, b DESC)"),
    fixed("drop_table_if_exists", "DROP TABLE IF EXISTS t"),
    fixed("truncate_table", "TRUNCATE TABLE t"),
    fixed("alter_table_add", "ALTER TABLE t ADD c INT NULL, CONSTRAINT ck_c CHECK (c > 0)"),
    fixed("alter_table_alter_column", "ALTER TABLE [dbo].[t] ALTER COLUMN v NVARCHAR(MAX) NOT NULL"),
    canonical("alter_table_drop_bare_constraint", "alter table t drop ck_c", "ALTER TABLE t DROP CONSTRAINT ck_c"),
    fixed("create_or_alter_view", "CREATE OR ALTER VIEW dbo.v AS SELECT TOP 10 a FROM t WITH (NOLOCK)"),
    fixed("drop_view_if_exists", "DROP VIEW IF EXISTS v"),
    canonical(
        "script_alter_without_semicolon",
        "SELECT 1 ALTER TABLE t DROP COLUMN c",
        "SELECT 1; ALTER TABLE t DROP COLUMN c",
    ),
    // other statements
    fixed("use_database", "USE db1"),
    canonical("begin_tran_named", "begin tran t1", "BEGIN TRANSACTION t1"),
    canonical("commit_bare", "commit", "COMMIT TRANSACTION"),
    fixed("save_transaction", "SAVE TRANSACTION sp"),
    canonical("script_implicit_statement_end", "SELECT 1 SELECT 2", "SELECT 1; SELECT 2"),
    canonical("script_semicolons", "select 1;; select 2;", "SELECT 1; SELECT 2"),
    // errors
    syntax_error("error_misspelled_from", "SELECT * FORM t", 9),
    syntax_error("error_reserved_table_name", "SELECT a FROM select", 14),
    syntax_error("error_limit_not_supported", "SELECT a FROM t LIMIT 5", 16),
    syntax_error("error_unclosed_paren", "SELECT (1 FROM t", 10),
    lexical_error("lexical_unterminated_string", "SELECT 'abc FROM t", 18),
    lexical_error("lexical_unterminated_comment", "SELECT 1 /* open", 16),
    lexical_error("lexical_lone_bang", "SELECT a ! b", 9),
];

/// Checks that every id in `cases` is unique.
///
/// # Errors
///
/// [`CaseError::DuplicateId`] naming the first repeated id.
pub fn check_unique(cases: &[Case]) -> Result<(), CaseError> {
    let mut seen = HashSet::with_capacity(cases.len());
    for case in cases {
        if !seen.insert(case.id) {
            return Err(CaseError::DuplicateId(case.id));
        }
    }
    Ok(())
}

/// The built-in regression cases.
///
/// # Errors
///
/// [`CaseError::DuplicateId`] if two cases share an id.
pub fn registry() -> Result<&'static [Case], CaseError> {
    check_unique(CASES)?;
    Ok(CASES)
}

/// Parses every case with [`SqlServerDialect`] on up to `workers` threads.
///
/// Reports come back in the order of `cases`.
#[must_use]
pub fn run_cases(cases: &[Case], workers: usize) -> Vec<CaseReport> {
    let inputs: Vec<&str> = cases.iter().map(|case| case.sql).collect();
    let results = parse_batch(&inputs, &SqlServerDialect, &ParserOptions::default(), workers, None);
    let reports: Vec<CaseReport> = cases
        .iter()
        .zip(&results)
        .map(|(case, result)| {
            let failure = evaluate(case.expectation, &result.outcome).err();
            if let Some(failure) = &failure {
                warn!(id = case.id, %failure, "case failed");
            }
            CaseReport { id: case.id, failure }
        })
        .collect();
    debug!(
        cases = reports.len(),
        failed = reports.iter().filter(|r| !r.passed()).count(),
        "ran cases"
    );
    reports
}

fn evaluate(expectation: Expectation, outcome: &ScriptOutcome) -> Result<(), String> {
    match expectation {
        Expectation::Canonical(expected) => {
            if !outcome.is_clean() {
                return Err(format!("expected `{expected}`, got {}", describe_failure(outcome)));
            }
            let rendered = outcome.asts().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            if rendered == expected {
                Ok(())
            } else {
                Err(format!("expected `{expected}`, rendered `{rendered}`"))
            }
        }
        Expectation::SyntaxErrorAt(position) => {
            let first = outcome.statements.iter().flat_map(|s| &s.errors).next();
            match first {
                Some(record) if record.position() == position => Ok(()),
                Some(record) => Err(format!("expected a syntax error at {position}, got {record}")),
                None => Err(format!(
                    "expected a syntax error at {position}, got {}",
                    describe_failure(outcome)
                )),
            }
        }
        Expectation::LexicalErrorAt(position) => match outcome.lexical_errors.first() {
            Some(error) if error.position == position => Ok(()),
            Some(error) => Err(format!("expected a lexical error at {position}, got {error}")),
            None => Err(format!(
                "expected a lexical error at {position}, got {}",
                describe_failure(outcome)
            )),
        },
    }
}

fn describe_failure(outcome: &ScriptOutcome) -> String {
    if let Some(error) = outcome.lexical_errors.first() {
        return format!("lexical error: {error}");
    }
    for statement in &outcome.statements {
        if let Some(record) = statement.errors.first() {
            return format!("syntax error: {record}");
        }
        if let Some(error) = &statement.build_error {
            return error.to_string();
        }
    }
    if outcome.cancelled {
        return String::from("cancelled");
    }
    String::from("a clean parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ids_are_unique() {
        let cases = registry().unwrap();
        assert!(cases.len() >= 40);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let cases = [fixed("a", "SELECT 1"), fixed("b", "SELECT 2"), fixed("a", "SELECT 3")];
        assert_eq!(check_unique(&cases), Err(CaseError::DuplicateId("a")));
        assert_eq!(CaseError::DuplicateId("a").to_string(), "duplicate case id `a`");
    }

    #[test]
    fn test_failure_is_reported() {
        let cases = [
            canonical("wrong_rendering", "select 1", "SELECT 2"),
            syntax_error("wrong_offset", "SELECT * FORM t", 3),
            lexical_error("no_lexical_error", "SELECT 1", 0),
        ];
        let reports = run_cases(&cases, 2);
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| !r.passed()));
        assert_eq!(
            reports[0].failure.as_deref(),
            Some("expected `SELECT 2`, rendered `SELECT 1`")
        );
        assert_eq!(reports[2].failure.as_deref(), Some("expected a lexical error at 0, got a clean parse"));
    }
}
