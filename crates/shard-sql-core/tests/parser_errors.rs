//! Syntax error reporting in strict mode.

mod common;
use common::*;

use shard_sql_core::lexer::Keyword;
use shard_sql_core::parser::{Expected, RecoveryAction, SyntaxError};
use shard_sql_core::{GenericDialect, ParseError, Parser, ParserOptions};

fn nested(depth: usize) -> String {
    format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
}

// ===================================================================
// Positions and messages
// ===================================================================

#[test]
fn misspelled_keyword() {
    let err = parse_err("SELECT * FORM t");
    let [record] = err.records() else {
        panic!("Expected one record, got {:?}", err.records());
    };
    assert_eq!(record.position(), 9);
    assert_eq!((record.line, record.column), (1, 10));
    assert_eq!(record.action, RecoveryAction::Abort);

    let expected = record.error.expected().expect("expected set");
    assert!(expected.contains(&Expected::Keyword(Keyword::From)));
    assert!(expected.contains(&Expected::EndOfInput));
    assert!(record
        .error
        .to_string()
        .starts_with("unexpected identifier FORM, expected one of"));
}

#[test]
fn line_and_column_on_later_line() {
    let err = parse_err("SELECT *\n  FORM t");
    let record = &err.records()[0];
    assert_eq!(record.position(), 11);
    assert_eq!((record.line, record.column), (2, 3));
    assert!(record.to_string().starts_with("line 2, column 3: unexpected"));
}

#[test]
fn reserved_word_as_table_name() {
    let err = parse_err("SELECT a FROM select");
    assert!(matches!(
        err.records()[0].error,
        SyntaxError::ReservedWord {
            keyword: Keyword::Select,
            ..
        }
    ));
    assert_eq!(err.position(), Some(14));
}

#[test]
fn quoted_reserved_word_is_a_name() {
    let query = parse_select("SELECT \"select\" FROM \"from\"");
    assert_eq!(select_core(&query).from.len(), 1);
}

#[test]
fn missing_expression() {
    let err = parse_err("SELECT a FROM t WHERE");
    assert_eq!(err.position(), Some(21));
    let expected = err.records()[0].error.expected().expect("expected set");
    assert!(expected.contains(&Expected::Expression));
}

#[test]
fn unclosed_parenthesis() {
    let err = parse_err("SELECT (1 + 2 FROM t");
    assert_eq!(err.position(), Some(14));
    let expected = err.records()[0].error.expected().expect("expected set");
    assert!(expected.contains(&Expected::Punct(")")));
}

#[test]
fn garbage_at_statement_start() {
    let err = parse_err("FROB t");
    assert_eq!(err.position(), Some(0));
    let expected = err.records()[0].error.expected().expect("expected set");
    assert!(expected.contains(&Expected::Statement));
}

#[test]
fn statements_need_a_separator_in_generic() {
    let err = parse_err("SELECT 1 SELECT 2");
    assert_eq!(err.position(), Some(9));
}

#[test]
fn error_display_includes_location() {
    let err = parse_err("SELECT * FORM t");
    let message = err.to_string();
    assert!(message.starts_with("syntax error: line 1, column 10: unexpected identifier FORM"));
}

#[test]
fn type_arguments_are_integers() {
    for sql in [
        "SELECT CAST(a AS DECIMAL(1.5))",
        "SELECT CAST(a AS VARCHAR(99999999999999999999999))",
        "SELECT CAST(a AS VARCHAR(1e3))",
    ] {
        let err = parse_err(sql);
        assert!(
            matches!(err.records()[0].error, SyntaxError::Unexpected { .. }),
            "unexpected error for {sql}: {err}"
        );
        assert_eq!(err.position(), Some(25), "{sql}");
    }
}

#[test]
fn reserved_word_as_type_name() {
    let err = parse_err("SELECT CAST(a AS FROM)");
    assert!(matches!(
        err.records()[0].error,
        SyntaxError::ReservedWord {
            keyword: Keyword::From,
            ..
        }
    ));
    assert_eq!(err.position(), Some(17));
    assert_eq!(parse("SELECT CAST(a AS [from])").to_string(), "SELECT CAST(a AS [from])");
    assert_eq!(parse("SELECT CAST(a AS DATE)").to_string(), "SELECT CAST(a AS DATE)");
}

// ===================================================================
// Entry points
// ===================================================================

#[test]
fn parse_select_rejects_trailing_tokens() {
    let mut parser = Parser::from_sql("SELECT 1 SELECT 2", &GenericDialect, ParserOptions::default()).unwrap();
    let err = parser.parse_select().unwrap_err();
    assert_eq!(err.position(), 9);
    assert_eq!(parser.errors().len(), 1);
}

#[test]
fn parse_expr_entry_point() {
    let mut parser = Parser::from_sql("a +", &GenericDialect, ParserOptions::default()).unwrap();
    let err = parser.parse_expr().unwrap_err();
    assert_eq!(err.position(), 3);
    assert_eq!(parser.take_errors().len(), 1);
    assert!(parser.errors().is_empty());
}

#[test]
fn top_level_parse_expr_error() {
    let err = shard_sql_core::parse_expr("CAST(a AS)", &GenericDialect).unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)));
    assert_eq!(err.position(), Some(9));
}

// ===================================================================
// Limits
// ===================================================================

#[test]
fn nesting_within_limit() {
    let mut expr = parse_expr(&nested(30));
    let mut depth = 0;
    while let shard_sql_core::Expr::Nested(inner) = expr {
        depth += 1;
        expr = *inner;
    }
    assert_eq!(depth, 30);
    assert_eq!(expr, shard_sql_core::Expr::integer(1));
}

#[test]
fn nesting_beyond_limit() {
    let err = shard_sql_core::parse_expr(&nested(200), &GenericDialect).unwrap_err();
    assert!(matches!(
        err.records()[0].error,
        SyntaxError::RecursionLimit { limit: 64, .. }
    ));
}

#[test]
fn configurable_depth() {
    let options = ParserOptions::default().with_max_depth(4);
    let mut parser = Parser::from_sql(&format!("SELECT {}", nested(10)), &GenericDialect, options).unwrap();
    let err = parser.parse_statement().unwrap_err();
    assert!(matches!(err, SyntaxError::RecursionLimit { limit: 4, .. }));
}

fn assert_depth_limit(sql: &str) {
    let err = shard_sql_core::parse(sql, &GenericDialect).unwrap_err();
    assert!(
        matches!(err.records()[0].error, SyntaxError::RecursionLimit { limit: 64, .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn long_operator_chains_count_towards_depth() {
    assert_depth_limit(&format!("SELECT 1{}", " + 1".repeat(10_000)));
    assert_depth_limit(&format!("SELECT a FROM t WHERE a = 1{}", " AND a = 1".repeat(10_000)));
    assert_depth_limit(&format!("SELECT 1{}", " UNION SELECT 1".repeat(5_000)));
    assert_depth_limit(&format!("SELECT * FROM t{}", " JOIN t ON 1 = 1".repeat(5_000)));
}

#[test]
fn operator_chain_within_limit() {
    let sql = format!("SELECT 1{}", " + 1".repeat(40));
    assert_eq!(parse(&sql).to_string(), sql);
}

#[test]
fn script_continues_after_depth_limit() {
    let sql = format!("SELECT 1{}; SELECT 2", " * 2".repeat(10_000));
    let options = ParserOptions::default().with_recovery(true);
    let outcome = shard_sql_core::parse_script(&sql, &GenericDialect, &options, None);
    assert_eq!(outcome.statements.len(), 2);
    assert!(matches!(
        outcome.statements[0].errors[0].error,
        SyntaxError::RecursionLimit { .. }
    ));
    assert_eq!(outcome.asts().map(ToString::to_string).collect::<Vec<_>>(), ["SELECT 2"]);
}

#[test]
fn lookahead_budget_exhausted() {
    let options = ParserOptions::default().with_lookahead_budget(0);
    let mut parser = Parser::from_sql("SELECT ((1)) + ((2))", &GenericDialect, options).unwrap();
    let err = parser.parse_statement().unwrap_err();
    assert!(matches!(err, SyntaxError::AmbiguityExhaustion { budget: 0, .. }));
    assert_eq!(err.position(), 15);
}

#[test]
fn lookahead_budget_is_per_statement() {
    let options = ParserOptions::default().with_lookahead_budget(3);
    let mut parser = Parser::from_sql("SELECT ((1)); SELECT ((2))", &GenericDialect, options).unwrap();
    let (statements, cancelled) = parser.parse_script(None);
    assert!(!cancelled);
    assert_eq!(statements.len(), 2);
    assert!(statements.iter().all(|s| s.errors.is_empty()));
}
