//! T-SQL parsing through the SQL Server dialect.

mod common;
use common::*;

use shard_sql_core::lexer::{tokenize, Keyword, LexicalErrorKind, QuoteStyle, TokenKind};
use shard_sql_core::parser::SyntaxError;
use shard_sql_core::{parse_batch, parse_script, parse_sql, GenericDialect, ParserOptions};
use shard_sql_sqlserver::{split_batches, SqlServerDialect};

fn kinds(sql: &str) -> Vec<TokenKind> {
    tokenize(sql, &SqlServerDialect)
        .unwrap_or_else(|e| panic!("Failed to tokenize: {sql}\nError: {e}"))
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// ===================================================================
// Lexical rules
// ===================================================================

#[test]
fn variables_are_single_tokens() {
    assert_eq!(
        kinds("SELECT @@ROWCOUNT, @x"),
        vec![
            TokenKind::Keyword(Keyword::Select),
            TokenKind::Variable(String::from("@@ROWCOUNT")),
            TokenKind::Comma,
            TokenKind::Variable(String::from("@x")),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn bracket_identifier_with_escape() {
    assert_eq!(
        kinds("[a]]b]")[0],
        TokenKind::Identifier {
            value: String::from("a]b"),
            quote: Some(QuoteStyle::Bracket),
        }
    );
    renders("SELECT [a]]b] FROM [dbo].[t]", "SELECT [a]]b] FROM [dbo].[t]");
}

#[test]
fn backtick_is_not_a_delimiter() {
    let err = tokenize("SELECT `a`", &SqlServerDialect).unwrap_err();
    assert_eq!(err.kind, LexicalErrorKind::UnexpectedCharacter('`'));
    assert_eq!(err.position, 7);
}

#[test]
fn national_strings() {
    assert_eq!(
        kinds("N'é'")[0],
        TokenKind::String {
            value: String::from("é"),
            national: true,
        }
    );
    round_trip("SELECT a FROM t WHERE b = N'it''s'");
}

#[test]
fn nested_comments() {
    renders("SELECT /* a /* b */ c */ 1", "SELECT 1");
}

#[test]
fn temp_tables_and_identifier_characters() {
    renders(
        "SELECT * FROM #tmp t JOIN ##g ON t.id = ##g.id",
        "SELECT * FROM #tmp AS t INNER JOIN ##g ON t.id = ##g.id",
    );
    renders("SELECT a$b, c@d FROM t", "SELECT a$b, c@d FROM t");
    renders("select * into #copy from t", "SELECT * INTO #copy FROM t");
}

// ===================================================================
// Keyword classification
// ===================================================================

#[test]
fn tsql_reserved_word_needs_delimiters() {
    let err = parse_err("SELECT a FROM key");
    assert!(matches!(
        err.records()[0].error,
        SyntaxError::ReservedWord {
            keyword: Keyword::Key,
            ..
        }
    ));
    assert_eq!(err.position(), Some(14));
    renders("SELECT a FROM [key]", "SELECT a FROM [key]");
    assert!(shard_sql_core::parse("SELECT a FROM key", &GenericDialect).is_ok());
}

#[test]
fn soft_keywords_are_names() {
    renders("SELECT name, state, target FROM source", "SELECT name, state, target FROM source");
    renders("SELECT inserted.id FROM inserted", "SELECT inserted.id FROM inserted");
}

// ===================================================================
// Grammar switches
// ===================================================================

#[test]
fn top_and_hints() {
    renders(
        "select top 5 [name] from #people with (nolock)",
        "SELECT TOP 5 [name] FROM #people WITH (nolock)",
    );
    round_trip("SELECT TOP (@n) a FROM t WITH (NOLOCK, INDEX(ix_a)) ORDER BY a");
}

#[test]
fn limit_is_not_tsql() {
    assert_eq!(parse_err("SELECT a FROM t LIMIT 5").position(), Some(16));
}

#[test]
fn offset_requires_rows() {
    assert_eq!(parse_err("SELECT a FROM t ORDER BY a OFFSET 5").position(), Some(35));
    round_trip("SELECT a FROM t ORDER BY a OFFSET 5 ROWS");
}

#[test]
fn table_variables() {
    renders("INSERT INTO @t (a) VALUES (1)", "INSERT INTO @t (a) VALUES (1)");
    round_trip("DELETE TOP (10) FROM q OUTPUT deleted.id INTO @gone");
}

// ===================================================================
// Statement separation
// ===================================================================

#[test]
fn statements_without_semicolons() {
    let sql = "UPDATE t SET a = 1 DELETE FROM t WHERE a = 2 SELECT 3";
    let rendered: Vec<String> = parse_sql(sql, &SqlServerDialect)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(rendered, ["UPDATE t SET a = 1", "DELETE FROM t WHERE a = 2", "SELECT 3"]);

    let err = parse_sql(sql, &GenericDialect).unwrap_err();
    assert_eq!(err.position(), Some(19));
}

#[test]
fn recovery_stops_at_next_statement_keyword() {
    let options = ParserOptions::new().with_recovery(true);
    let outcome = parse_script("SELECT * FORM t SELECT 2", &SqlServerDialect, &options, None);
    assert_eq!(outcome.statements[0].errors[0].position(), 9);
    assert!(outcome.error_count() >= 1);
    assert_eq!(outcome.asts().last().map(ToString::to_string).as_deref(), Some("SELECT 2"));
}

#[test]
fn go_batches_map_back_to_script_offsets() {
    let script = "SELECT 1\nGO\nSELECT * FORM t\nGO\n";
    let batches = split_batches(script);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1].line, 3);

    let texts: Vec<&str> = batches.iter().map(|b| b.text).collect();
    let results = parse_batch(&texts, &SqlServerDialect, &ParserOptions::default(), 2, None);
    assert!(results[0].outcome.is_clean());
    let record = &results[1].outcome.statements[0].errors[0];
    let offset = batches[1].offset + record.position();
    assert_eq!(offset, 21);
    assert_eq!(&script[offset..offset + 4], "FORM");
}
