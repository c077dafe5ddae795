#![allow(dead_code)]

use shard_sql_core::{ParseError, Statement};
use shard_sql_sqlserver::SqlServerDialect;

pub fn parse(sql: &str) -> Statement {
    shard_sql_core::parse(sql, &SqlServerDialect).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> ParseError {
    shard_sql_core::parse(sql, &SqlServerDialect).expect_err(&format!("Expected parse error for: {sql}"))
}

/// Parses `sql` and checks the canonical rendering.
pub fn renders(sql: &str, expected: &str) {
    assert_eq!(parse(sql).to_string(), expected, "input: {sql}");
}

/// Verifies that rendering is a fixed point and that re-parsing the
/// rendering yields the same AST.
pub fn round_trip(sql: &str) {
    let ast1 = parse(sql);
    let rendered1 = ast1.to_string();
    let ast2 = parse(&rendered1);
    let rendered2 = ast2.to_string();
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {sql}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
    assert_eq!(ast1, ast2, "Re-parsed AST differs for: {sql}");
}
