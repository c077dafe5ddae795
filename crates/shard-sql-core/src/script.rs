//! Whole-script parsing with per-statement results.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ast::Statement;
use crate::builder::{build_statement, BuildError};
use crate::cancel::CancellationToken;
use crate::dialect::Dialect;
use crate::lexer::{tokenize, tokenize_recovering, LexicalError};
use crate::parser::{ParseErrorRecord, ParseTree, Parser, ParserOptions, StatementTree};

/// One statement of a script.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedStatement {
    /// Concrete tree, including recovery artifacts.
    pub tree: ParseTree,
    /// Set only when the statement parsed and built without errors.
    pub statement: Option<Statement>,
    /// Syntax errors reported inside this statement.
    pub errors: Vec<ParseErrorRecord>,
    /// Set when a clean tree could not be converted.
    pub build_error: Option<BuildError>,
}

impl ParsedStatement {
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.build_error.is_none()
    }
}

/// Result of [`parse_script`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptOutcome {
    pub statements: Vec<ParsedStatement>,
    /// Without recovery this holds at most one error and no statements.
    pub lexical_errors: Vec<LexicalError>,
    /// Parsing stopped early because the token was cancelled.
    pub cancelled: bool,
}

impl ScriptOutcome {
    /// An outcome for input that was never looked at.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }

    /// True when nothing failed and the whole input was parsed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.lexical_errors.is_empty() && self.statements.iter().all(ParsedStatement::is_clean)
    }

    /// Lexical, syntax and build errors together.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.lexical_errors.len()
            + self
                .statements
                .iter()
                .map(|s| s.errors.len() + usize::from(s.build_error.is_some()))
                .sum::<usize>()
    }

    /// The ASTs of the statements that parsed cleanly.
    pub fn asts(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().filter_map(|s| s.statement.as_ref())
    }
}

/// Parses every statement in `sql`.
///
/// With `options.recover` set, lexical errors skip the offending statement and
/// syntax errors are repaired or skipped so later statements still parse.
/// Otherwise the first error of either kind ends the script. Cancellation is
/// checked between statements.
#[must_use]
pub fn parse_script(
    sql: &str,
    dialect: &dyn Dialect,
    options: &ParserOptions,
    cancel: Option<&CancellationToken>,
) -> ScriptOutcome {
    let (tokens, lexical_errors) = if options.recover {
        tokenize_recovering(sql, dialect)
    } else {
        match tokenize(sql, dialect) {
            Ok(tokens) => (tokens, Vec::new()),
            Err(error) => {
                warn!(position = error.position, kind = %error.kind, "lexical error");
                return ScriptOutcome {
                    lexical_errors: vec![error],
                    ..ScriptOutcome::default()
                };
            }
        }
    };
    let mut parser = Parser::new(tokens, dialect, options.clone());
    let (trees, cancelled) = parser.parse_script(cancel);
    let statements: Vec<_> = trees.into_iter().map(finish_statement).collect();
    debug!(
        dialect = dialect.name(),
        statements = statements.len(),
        lexical_errors = lexical_errors.len(),
        cancelled,
        "parsed script"
    );
    ScriptOutcome {
        statements,
        lexical_errors,
        cancelled,
    }
}

fn finish_statement(StatementTree { tree, errors }: StatementTree) -> ParsedStatement {
    let (statement, build_error) = if errors.is_empty() {
        match build_statement(&tree) {
            Ok(statement) => (Some(statement), None),
            Err(error) => {
                warn!(%error, "could not build statement");
                (None, Some(error))
            }
        }
    } else {
        (None, None)
    };
    ParsedStatement {
        tree,
        statement,
        errors,
        build_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDialect;

    #[test]
    fn test_clean_script() {
        let outcome = parse_script("SELECT 1; SELECT 2;", &GenericDialect, &ParserOptions::default(), None);
        assert!(outcome.is_clean());
        assert_eq!(outcome.asts().count(), 2);
        assert_eq!(outcome.error_count(), 0);
    }

    #[test]
    fn test_strict_stops_at_first_error() {
        let outcome = parse_script(
            "SELECT 1; SELECT * FORM t; SELECT 3",
            &GenericDialect,
            &ParserOptions::default(),
            None,
        );
        assert_eq!(outcome.statements.len(), 2);
        assert!(outcome.statements[0].is_clean());
        assert!(outcome.statements[1].statement.is_none());
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_strict_lexical_error() {
        let outcome = parse_script("SELECT 'abc FROM t", &GenericDialect, &ParserOptions::default(), None);
        assert!(outcome.statements.is_empty());
        assert_eq!(outcome.lexical_errors.len(), 1);
        assert_eq!(outcome.lexical_errors[0].position, 18);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = parse_script("SELECT 1", &GenericDialect, &ParserOptions::default(), Some(&token));
        assert!(outcome.cancelled);
        assert!(outcome.statements.is_empty());
        assert!(!outcome.is_clean());
    }
}
