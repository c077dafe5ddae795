//! Parse tree to AST conversion.
//!
//! The builder only sees trees the parser produced, so most shape checks are
//! assertions about the grammar; they surface as [`BuildError::Malformed`]
//! instead of panics. Trees carrying recovery artifacts (missing tokens or
//! error nodes) are rejected with [`BuildError::Incomplete`].

mod expr;
mod query;
mod statement;

use serde::Serialize;
use thiserror::Error;

use crate::ast::{Expr, Ident, ObjectName, SelectStatement, Statement};
use crate::lexer::{Span, Token, TokenKind};
use crate::parser::{ParseNode, ParseTree, Rule};

/// Errors converting a parse tree into an AST.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum BuildError {
    /// The tree contains a missing-token marker or an error node.
    #[error("incomplete {rule:?} at position {span}")]
    Incomplete { rule: Rule, span: Span },

    /// The tree does not have the shape its rule requires.
    #[error("malformed {rule:?} at position {span}: {detail}")]
    Malformed { rule: Rule, span: Span, detail: String },
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Converts a statement parse tree into a [`Statement`].
///
/// # Errors
///
/// Returns [`BuildError::Incomplete`] for trees repaired by error recovery.
pub fn build_statement(tree: &ParseTree) -> BuildResult<Statement> {
    AstBuilder::for_tree(tree)?.statement(tree)
}

/// Converts a query parse tree into a [`SelectStatement`].
///
/// # Errors
///
/// Returns [`BuildError::Incomplete`] for trees repaired by error recovery.
pub fn build_query(tree: &ParseTree) -> BuildResult<SelectStatement> {
    AstBuilder::for_tree(tree)?.query(tree)
}

/// Converts an expression parse tree into an [`Expr`].
///
/// # Errors
///
/// Returns [`BuildError::Incomplete`] for trees repaired by error recovery.
pub fn build_expr(tree: &ParseTree) -> BuildResult<Expr> {
    AstBuilder::for_tree(tree)?.expr(tree)
}

/// Holds per-statement state while walking a tree.
struct AstBuilder {
    /// Start offsets of `?` placeholders, in source order.
    parameters: Vec<usize>,
}

impl AstBuilder {
    fn for_tree(tree: &ParseTree) -> BuildResult<Self> {
        if let Some((rule, span)) = first_incomplete(tree) {
            return Err(BuildError::Incomplete { rule, span });
        }
        let mut parameters = Vec::new();
        collect_parameters(tree, &mut parameters);
        Ok(Self { parameters })
    }

    /// Zero-based index of the placeholder starting at `offset`.
    fn parameter_index(&self, tree: &ParseTree) -> BuildResult<usize> {
        self.parameters
            .binary_search(&tree.span.start)
            .map_err(|_| malformed(tree, "unknown placeholder"))
    }
}

fn first_incomplete(tree: &ParseTree) -> Option<(Rule, Span)> {
    if tree.rule == Rule::Error {
        return Some((tree.rule, tree.span));
    }
    for child in &tree.children {
        match child {
            ParseNode::Missing(_) => return Some((tree.rule, tree.span)),
            ParseNode::Tree(sub) => {
                if let Some(found) = first_incomplete(sub) {
                    return Some(found);
                }
            }
            ParseNode::Token(_) => {}
        }
    }
    None
}

fn collect_parameters(tree: &ParseTree, out: &mut Vec<usize>) {
    if tree.rule == Rule::Parameter {
        out.push(tree.span.start);
    }
    for sub in tree.trees() {
        collect_parameters(sub, out);
    }
}

fn malformed(tree: &ParseTree, detail: &str) -> BuildError {
    BuildError::Malformed {
        rule: tree.rule,
        span: tree.span,
        detail: detail.to_string(),
    }
}

/// The `n`th direct sub-tree.
fn nth_tree(tree: &ParseTree, n: usize) -> BuildResult<&ParseTree> {
    tree.trees()
        .nth(n)
        .ok_or_else(|| malformed(tree, "missing operand"))
}

fn required_child(tree: &ParseTree, rule: Rule) -> BuildResult<&ParseTree> {
    tree.child(rule)
        .ok_or_else(|| malformed(tree, &format!("missing {rule:?}")))
}

/// Converts a name token to an identifier.
///
/// Keywords used as names keep their source spelling; a string literal
/// alias becomes a double-quoted identifier.
pub(crate) fn ident_from_token(token: &Token) -> Option<Ident> {
    let ident = match &token.kind {
        TokenKind::Identifier { value, quote } => Ident {
            value: value.clone(),
            quote_style: *quote,
            span: token.span,
        },
        TokenKind::Keyword(_) | TokenKind::Variable(_) => Ident::new(token.lexeme.clone()),
        TokenKind::String { value, .. } => Ident::with_quote(crate::lexer::QuoteStyle::DoubleQuote, value.clone()),
        _ => return None,
    };
    Some(ident.with_span(token.span))
}

fn is_name_token(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Identifier { .. } | TokenKind::Keyword(_) | TokenKind::Variable(_)
    )
}

/// Identifiers among the direct tokens, skipping punctuation.
fn idents(tree: &ParseTree) -> Vec<Ident> {
    tree.tokens()
        .filter(|t| is_name_token(t))
        .filter_map(ident_from_token)
        .collect()
}

fn object_name(tree: &ParseTree) -> BuildResult<ObjectName> {
    let parts = idents(tree);
    if parts.is_empty() {
        return Err(malformed(tree, "empty name"));
    }
    Ok(ObjectName(parts))
}

fn column_list(tree: Option<&ParseTree>) -> Vec<Ident> {
    tree.map(idents).unwrap_or_default()
}

fn last_ident(tree: &ParseTree) -> BuildResult<Ident> {
    tree.tokens()
        .last()
        .and_then(ident_from_token)
        .ok_or_else(|| malformed(tree, "expected a name"))
}
