//! Concrete parse tree.
//!
//! One [`ParseTree`] node per grammar production, holding its tokens and
//! sub-rules in source order. Recovery may leave [`ParseNode::Missing`]
//! markers for inserted tokens and [`Rule::Error`] nodes around skipped ones.

use std::fmt;

use serde::Serialize;

use super::Expected;
use crate::lexer::{Keyword, Span, Token, TokenKind};

/// Grammar productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Rule {
    // Queries
    Query,
    Select,
    SetOperation,
    ParenQuery,
    WithClause,
    Cte,
    TopClause,
    SelectList,
    SelectItem,
    AliasAssignment,
    VariableAssignment,
    Alias,
    TableAlias,
    IntoClause,
    FromClause,
    Join,
    JoinOn,
    JoinUsing,
    NamedTable,
    DerivedTable,
    TableFunction,
    NestedJoin,
    ObjectName,
    TableHints,
    TableHint,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    OrderByItem,
    OffsetFetch,
    LimitClause,
    OptionClause,
    QueryHint,
    // DML
    Insert,
    ColumnList,
    ValuesClause,
    ValuesRow,
    OutputClause,
    Update,
    Assignment,
    Delete,
    Merge,
    MergeWhen,
    Exec,
    ExecArg,
    // DDL and others
    CreateTable,
    ColumnDef,
    ColumnConstraint,
    TableConstraint,
    ReferentialAction,
    DataType,
    IndexColumn,
    CreateIndex,
    DropTable,
    DropIndex,
    AlterTable,
    AlterTableAdd,
    AlterColumn,
    AlterTableDrop,
    NameList,
    CreateView,
    AlterView,
    DropView,
    Truncate,
    Use,
    Transaction,
    // Expressions
    BinaryExpr,
    UnaryExpr,
    IsPredicate,
    InPredicate,
    BetweenPredicate,
    LikePredicate,
    QuantifiedComparison,
    AtTimeZone,
    Collate,
    Literal,
    TypedLiteral,
    OdbcLiteral,
    ColumnRef,
    Parameter,
    Variable,
    Wildcard,
    QualifiedWildcard,
    FunctionCall,
    OverClause,
    PartitionBy,
    WindowFrame,
    FrameBound,
    Cast,
    Convert,
    Case,
    CaseWhen,
    CaseElse,
    Exists,
    Subquery,
    Paren,
    Row,
    DefaultValue,
    // Recovery
    Error,
}

/// A child of a parse tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParseNode {
    /// A sub-rule.
    Tree(ParseTree),
    /// A consumed token.
    Token(Token),
    /// A token recovery pretended to see.
    Missing(Expected),
}

impl ParseNode {
    /// Returns the sub-tree, if this is one.
    #[must_use]
    pub const fn as_tree(&self) -> Option<&ParseTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Returns the token, if this is one.
    #[must_use]
    pub const fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }
}

/// A labeled subtree for one grammar production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTree {
    pub rule: Rule,
    pub children: Vec<ParseNode>,
    pub span: Span,
}

impl ParseTree {
    /// Creates an empty node starting at `offset`.
    #[must_use]
    pub const fn new(rule: Rule, offset: usize) -> Self {
        Self {
            rule,
            children: Vec::new(),
            span: Span::at(offset),
        }
    }

    /// Appends a token, extending the span.
    pub fn push_token(&mut self, token: Token) {
        self.grow(token.span);
        self.children.push(ParseNode::Token(token));
    }

    /// Appends a sub-tree, extending the span.
    pub fn push_tree(&mut self, tree: Self) {
        self.grow(tree.span);
        self.children.push(ParseNode::Tree(tree));
    }

    /// Appends a missing-token marker.
    pub fn push_missing(&mut self, expected: Expected) {
        self.children.push(ParseNode::Missing(expected));
    }

    fn grow(&mut self, span: Span) {
        if self.children.is_empty() {
            self.span = span;
        } else {
            self.span = self.span.merge(span);
        }
    }

    /// Direct sub-trees.
    pub fn trees(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(ParseNode::as_tree)
    }

    /// Direct tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(ParseNode::as_token)
    }

    /// First direct sub-tree with the given rule.
    #[must_use]
    pub fn child(&self, rule: Rule) -> Option<&Self> {
        self.trees().find(|t| t.rule == rule)
    }

    /// All direct sub-trees with the given rule.
    pub fn children_of(&self, rule: Rule) -> impl Iterator<Item = &Self> {
        self.trees().filter(move |t| t.rule == rule)
    }

    /// Whether a direct token is the given keyword.
    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.tokens().any(|t| t.is_keyword(keyword))
    }

    /// Whether a direct token has the given kind.
    #[must_use]
    pub fn has_token(&self, kind: &TokenKind) -> bool {
        self.tokens().any(|t| t.kind == *kind)
    }

    /// Whether any node in this subtree is a `Missing` marker or an `Error` node.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.rule == Rule::Error
            || self.children.iter().any(|c| match c {
                ParseNode::Missing(_) => true,
                ParseNode::Tree(t) => t.is_incomplete(),
                ParseNode::Token(_) => false,
            })
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}({:?}", "", self.rule, indent = depth * 2)?;
        for child in &self.children {
            match child {
                ParseNode::Tree(tree) => {
                    writeln!(f)?;
                    tree.write_indented(f, depth + 1)?;
                }
                ParseNode::Token(token) => {
                    if !token.is_eof() {
                        write!(f, " {}", token.lexeme)?;
                    }
                }
                ParseNode::Missing(expected) => write!(f, " <missing {expected}>")?,
            }
        }
        f.write_str(")")
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
