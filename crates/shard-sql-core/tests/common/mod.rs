#![allow(dead_code)]

use shard_sql_core::ast::{Select, SelectStatement, SetExpr, Statement};
use shard_sql_core::dialect::{Dialect, KeywordClass};
use shard_sql_core::lexer::{Keyword, QuoteStyle};
use shard_sql_core::{Expr, GenericDialect, ParseError};

/// A dialect with the SQL Server switches turned on, built only from the
/// public `Dialect` trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct BracketDialect;

impl Dialect for BracketDialect {
    fn name(&self) -> &'static str {
        "bracket"
    }

    fn identifier_quote(&self, open: char) -> Option<QuoteStyle> {
        match open {
            '[' => Some(QuoteStyle::Bracket),
            '"' => Some(QuoteStyle::DoubleQuote),
            _ => None,
        }
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

    fn supports_table_hints(&self) -> bool {
        true
    }

    fn supports_alias_assignment(&self) -> bool {
        true
    }

    fn keyword_class(&self, keyword: Keyword) -> KeywordClass {
        GenericDialect.keyword_class(keyword)
    }
}

pub fn parse(sql: &str) -> Statement {
    shard_sql_core::parse(sql, &GenericDialect)
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_with(sql: &str, dialect: &dyn Dialect) -> Statement {
    shard_sql_core::parse(sql, dialect).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> ParseError {
    shard_sql_core::parse(sql, &GenericDialect).expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn parse_select(sql: &str) -> SelectStatement {
    match parse(sql) {
        Statement::Select(s) => *s,
        other => panic!("Expected SELECT, got {other:?}"),
    }
}

/// The single `SELECT` core of a query without set operations.
pub fn select_core(query: &SelectStatement) -> &Select {
    match &query.body {
        SetExpr::Select(select) => select,
        other => panic!("Expected a plain SELECT body, got {other:?}"),
    }
}

pub fn parse_expr(sql: &str) -> Expr {
    shard_sql_core::parse_expr(sql, &GenericDialect)
        .unwrap_or_else(|e| panic!("Failed to parse expression: {sql}\nError: {e:?}"))
}

/// Verifies that rendering is a fixed point and that re-parsing the
/// rendering yields the same AST.
pub fn round_trip(sql: &str) {
    round_trip_with(sql, &GenericDialect);
}

pub fn round_trip_with(sql: &str, dialect: &dyn Dialect) {
    let ast1 = parse_with(sql, dialect);
    let rendered1 = ast1.to_string();
    let ast2 = parse_with(&rendered1, dialect);
    let rendered2 = ast2.to_string();
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {sql}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
    assert_eq!(ast1, ast2, "Re-parsed AST differs for: {sql}");
}
