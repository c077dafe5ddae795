//! Tests for the lexer through the public API.

mod common;
use common::BracketDialect;

use shard_sql_core::lexer::{
    tokenize_recovering, Keyword, LexicalErrorKind, NumberKind, QuoteStyle, TokenKind,
};
use shard_sql_core::{tokenize, GenericDialect, Lexer};

fn kinds(sql: &str) -> Vec<TokenKind> {
    tokenize(sql, &BracketDialect)
        .unwrap_or_else(|e| panic!("Failed to tokenize: {sql}\nError: {e}"))
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// ===================================================================
// Names
// ===================================================================

#[test]
fn bracketed_identifier_with_escape() {
    assert_eq!(
        kinds("[order]]s]"),
        vec![
            TokenKind::Identifier {
                value: String::from("order]s"),
                quote: Some(QuoteStyle::Bracket),
            },
            TokenKind::Eof,
        ]
    );
}

#[test]
fn brackets_are_not_quotes_in_generic() {
    let err = tokenize("[a]", &GenericDialect).unwrap_err();
    assert_eq!(err.kind, LexicalErrorKind::UnexpectedCharacter('['));
    assert_eq!(err.position, 0);
}

#[test]
fn variables() {
    assert_eq!(
        kinds("@id @@ROWCOUNT"),
        vec![
            TokenKind::Variable(String::from("@id")),
            TokenKind::Variable(String::from("@@ROWCOUNT")),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_are_case_insensitive() {
    assert_eq!(
        kinds("select SeLeCt"),
        vec![
            TokenKind::Keyword(Keyword::Select),
            TokenKind::Keyword(Keyword::Select),
            TokenKind::Eof,
        ]
    );
}

// ===================================================================
// Literals
// ===================================================================

#[test]
fn national_string() {
    assert_eq!(
        kinds("N'caf''e'"),
        vec![
            TokenKind::String {
                value: String::from("caf'e"),
                national: true,
            },
            TokenKind::Eof,
        ]
    );
}

#[test]
fn number_kinds_and_text() {
    let tokens = tokenize("42 1.5 .5 2.5E-3", &GenericDialect).unwrap();
    let got: Vec<_> = tokens
        .iter()
        .filter_map(|t| match t.kind {
            TokenKind::Number(kind) => Some((kind, t.lexeme.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        got,
        vec![
            (NumberKind::Integer, "42"),
            (NumberKind::Decimal, "1.5"),
            (NumberKind::Decimal, ".5"),
            (NumberKind::Float, "2.5E-3"),
        ]
    );
}

#[test]
fn hex_literals() {
    assert_eq!(
        kinds("X'1F'"),
        vec![TokenKind::HexString(String::from("1F")), TokenKind::Eof]
    );
}

// ===================================================================
// Comments and operators
// ===================================================================

#[test]
fn nested_block_comments() {
    assert_eq!(
        kinds("/* outer /* inner */ still */ 1 -- tail"),
        vec![TokenKind::Number(NumberKind::Integer), TokenKind::Eof]
    );
}

#[test]
fn unterminated_block_comment() {
    let err = tokenize("SELECT /* open", &GenericDialect).unwrap_err();
    assert_eq!(err.kind, LexicalErrorKind::UnterminatedComment);
}

#[test]
fn operators_by_longest_match() {
    assert_eq!(
        kinds("<> != !< !> <= >= << >> ||"),
        vec![
            TokenKind::NotEq,
            TokenKind::NotEq,
            TokenKind::NotLt,
            TokenKind::NotGt,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::LeftShift,
            TokenKind::RightShift,
            TokenKind::Concat,
            TokenKind::Eof,
        ]
    );
}

// ===================================================================
// Positions
// ===================================================================

#[test]
fn lines_columns_and_spans() {
    let tokens = tokenize("SELECT a\n  FROM t", &GenericDialect).unwrap();
    let from = &tokens[2];
    assert_eq!(from.kind, TokenKind::Keyword(Keyword::From));
    assert_eq!((from.line, from.column), (2, 3));
    assert_eq!((from.span.start, from.span.end), (11, 15));
    assert_eq!(from.lexeme, "FROM");
}

#[test]
fn unterminated_string_points_at_end_of_input() {
    let sql = "SELECT 'abc FROM t";
    let err = tokenize(sql, &GenericDialect).unwrap_err();
    assert_eq!(err.kind, LexicalErrorKind::UnterminatedString);
    assert_eq!(err.position, sql.len());
    assert_eq!(err.line, 1);
}

#[test]
fn lexer_is_an_iterator() {
    let lexemes: Vec<String> = Lexer::new("a, b", &GenericDialect)
        .map(|t| t.unwrap().lexeme)
        .collect();
    assert_eq!(lexemes, vec!["a", ",", "b", ""]);
}

#[test]
fn recovering_tokenizer_skips_to_next_statement() {
    let (tokens, errors) = tokenize_recovering("SELECT 'x; SELECT 2", &GenericDialect);
    assert_eq!(errors.len(), 1);
    assert!(tokens.last().is_some_and(|t| t.kind == TokenKind::Eof));
}
