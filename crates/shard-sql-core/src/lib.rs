//! # shard-sql-core
//!
//! A dialect-driven SQL front end: lexer, parser and AST.
//!
//! This crate provides:
//! - A hand-written lexer with byte spans and line/column positions
//! - A recursive descent parser producing a concrete [`parser::ParseTree`],
//!   with precedence climbing for expressions and bounded speculation for
//!   ambiguous parenthesized forms
//! - Single-token error recovery that keeps a script parsing past bad
//!   statements
//! - A typed AST that renders back to canonical SQL, plus a visitor
//!
//! The grammar is shared by all dialects. A [`Dialect`] decides quoting,
//! keyword reservation and which optional clauses are switched on.
//!
//! ## Parsing a statement
//!
//! ```rust
//! use shard_sql_core::{parse, GenericDialect, Statement};
//!
//! let statement = parse("select a, b from t where a > 1", &GenericDialect).unwrap();
//! assert!(matches!(statement, Statement::Select(_)));
//! assert_eq!(statement.to_string(), "SELECT a, b FROM t WHERE a > 1");
//! ```
//!
//! ## Parsing a script with recovery
//!
//! ```rust
//! use shard_sql_core::{parse_script, GenericDialect, ParserOptions};
//!
//! let options = ParserOptions::new().with_recovery(true);
//! let outcome = parse_script("SELECT * FORM t; SELECT 1", &GenericDialect, &options, None);
//! assert_eq!(outcome.statements.len(), 2);
//! assert_eq!(outcome.statements[0].errors[0].position(), 9);
//! assert!(outcome.statements[1].statement.is_some());
//! ```

pub mod ast;
mod batch;
pub mod builder;
mod cancel;
pub mod dialect;
mod error;
pub mod lexer;
pub mod parser;
mod script;

pub use ast::{Expr, Statement};
pub use batch::{parse_batch, BatchResult};
pub use cancel::CancellationToken;
pub use dialect::{Dialect, GenericDialect};
pub use error::{ParseError, Result};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{Parser, ParserOptions};
pub use script::{parse_script, ParsedStatement, ScriptOutcome};

use builder::{build_expr, build_statement};
use parser::StatementTree;

/// Parses `sql` as exactly one statement, strictly.
///
/// A trailing `;` is allowed.
///
/// # Errors
///
/// Returns [`ParseError::NoStatement`] for empty input and
/// [`ParseError::TrailingInput`] when a second statement follows.
pub fn parse(sql: &str, dialect: &dyn Dialect) -> Result<Statement> {
    let trees = strict_trees(sql, dialect)?;
    match trees.as_slice() {
        [] => Err(ParseError::NoStatement),
        [only] => Ok(build_statement(&only.tree)?),
        [_, next, ..] => Err(ParseError::TrailingInput(next.tree.span)),
    }
}

/// Parses every statement in `sql`, strictly.
///
/// # Errors
///
/// Returns the first lexical, syntax or build error.
pub fn parse_sql(sql: &str, dialect: &dyn Dialect) -> Result<Vec<Statement>> {
    strict_trees(sql, dialect)?
        .iter()
        .map(|statement| Ok(build_statement(&statement.tree)?))
        .collect()
}

/// Parses `sql` as a single expression.
///
/// # Errors
///
/// Returns the first lexical, syntax or build error.
pub fn parse_expr(sql: &str, dialect: &dyn Dialect) -> Result<Expr> {
    let mut parser = Parser::from_sql(sql, dialect, ParserOptions::default())?;
    let tree = parser
        .parse_expr()
        .map_err(|_| ParseError::Syntax(parser.take_errors()))?;
    Ok(build_expr(&tree)?)
}

fn strict_trees(sql: &str, dialect: &dyn Dialect) -> Result<Vec<StatementTree>> {
    let mut parser = Parser::from_sql(sql, dialect, ParserOptions::default())?;
    let (trees, _) = parser.parse_script(None);
    if let Some(failed) = trees.iter().find(|t| !t.errors.is_empty()) {
        return Err(ParseError::Syntax(failed.errors.clone()));
    }
    Ok(trees)
}
