//! Query nodes: SELECT, set operations, FROM sources.

use std::fmt;

use serde::Serialize;

use super::{comma_separated, space_separated, Expr, Ident, ObjectName};

/// A complete query: optional CTEs, a body, ordering, paging and hints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectStatement {
    pub with: Option<With>,
    pub body: SetExpr,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<Limit>,
    /// `OPTION (...)` query hints.
    pub hints: Vec<QueryHint>,
}

impl SelectStatement {
    /// Wraps a bare query body.
    #[must_use]
    pub const fn from_body(body: SetExpr) -> Self {
        Self {
            with: None,
            body,
            order_by: Vec::new(),
            limit: None,
            hints: Vec::new(),
        }
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(with) = &self.with {
            write!(f, "{with} ")?;
        }
        write!(f, "{}", self.body)?;
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", comma_separated(&self.order_by))?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " {limit}")?;
        }
        if !self.hints.is_empty() {
            write!(f, " OPTION ({})", comma_separated(&self.hints))?;
        }
        Ok(())
    }
}

/// `WITH cte [, ...]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct With {
    pub ctes: Vec<Cte>,
}

impl fmt::Display for With {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WITH {}", comma_separated(&self.ctes))
    }
}

/// `name [(columns)] AS (query)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Cte {
    pub name: Ident,
    pub columns: Vec<Ident>,
    pub query: Box<SelectStatement>,
}

impl fmt::Display for Cte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.columns.is_empty() {
            write!(f, " ({})", comma_separated(&self.columns))?;
        }
        write!(f, " AS ({})", self.query)
    }
}

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        })
    }
}

/// The body of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SetExpr {
    /// A single SELECT.
    Select(Box<Select>),
    /// `left op [ALL] right`
    SetOperation {
        op: SetOperator,
        all: bool,
        left: Box<Self>,
        right: Box<Self>,
    },
    /// A parenthesized query used as an operand.
    Query(Box<SelectStatement>),
}

impl fmt::Display for SetExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(select) => write!(f, "{select}"),
            Self::SetOperation {
                op,
                all,
                left,
                right,
            } => {
                let all = if *all { " ALL" } else { "" };
                write!(f, "{left} {op}{all} {right}")
            }
            Self::Query(query) => write!(f, "({query})"),
        }
    }
}

/// `DISTINCT` / `ALL` after SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SetQuantifier {
    All,
    Distinct,
}

/// `TOP (n) [PERCENT] [WITH TIES]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Top {
    pub quantity: Expr,
    /// Written as `TOP (expr)` rather than `TOP n`.
    pub parenthesized: bool,
    pub percent: bool,
    pub with_ties: bool,
}

impl fmt::Display for Top {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parenthesized {
            write!(f, "TOP ({})", self.quantity)?;
        } else {
            write!(f, "TOP {}", self.quantity)?;
        }
        if self.percent {
            f.write_str(" PERCENT")?;
        }
        if self.with_ties {
            f.write_str(" WITH TIES")?;
        }
        Ok(())
    }
}

/// `ROLLUP` / `CUBE` trailing a GROUP BY list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupByModifier {
    Rollup,
    Cube,
}

/// A single SELECT query block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Select {
    pub quantifier: Option<SetQuantifier>,
    pub top: Option<Top>,
    pub projection: Vec<SelectItem>,
    /// `SELECT ... INTO new_table`
    pub into: Option<ObjectName>,
    pub from: Vec<TableRef>,
    pub selection: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub group_by_modifier: Option<GroupByModifier>,
    pub having: Option<Expr>,
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        match self.quantifier {
            Some(SetQuantifier::Distinct) => f.write_str("DISTINCT ")?,
            Some(SetQuantifier::All) => f.write_str("ALL ")?,
            None => {}
        }
        if let Some(top) = &self.top {
            write!(f, "{top} ")?;
        }
        write!(f, "{}", comma_separated(&self.projection))?;
        if let Some(into) = &self.into {
            write!(f, " INTO {into}")?;
        }
        if !self.from.is_empty() {
            write!(f, " FROM {}", comma_separated(&self.from))?;
        }
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {selection}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", comma_separated(&self.group_by))?;
            match self.group_by_modifier {
                Some(GroupByModifier::Rollup) => f.write_str(" WITH ROLLUP")?,
                Some(GroupByModifier::Cube) => f.write_str(" WITH CUBE")?,
                None => {}
            }
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        Ok(())
    }
}

/// One item of the select list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SelectItem {
    /// `expr [AS alias]`
    Expr { expr: Expr, alias: Option<Ident> },
    /// `*`
    Wildcard,
    /// `t.*`
    QualifiedWildcard(ObjectName),
    /// `alias = expr`
    AliasAssignment { alias: Ident, expr: Expr },
    /// `@var = expr`
    VariableAssignment { variable: String, expr: Expr },
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr { expr, alias } => {
                write!(f, "{expr}")?;
                if let Some(alias) = alias {
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
            Self::Wildcard => f.write_str("*"),
            Self::QualifiedWildcard(prefix) => write!(f, "{prefix}.*"),
            Self::AliasAssignment { alias, expr } => write!(f, "{alias} = {expr}"),
            Self::VariableAssignment { variable, expr } => write!(f, "{variable} = {expr}"),
        }
    }
}

/// `alias [(col, ...)]` on a table source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableAlias {
    pub name: Ident,
    pub columns: Vec<Ident>,
}

impl fmt::Display for TableAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.columns.is_empty() {
            write!(f, " ({})", comma_separated(&self.columns))?;
        }
        Ok(())
    }
}

/// A table hint such as `NOLOCK` or `INDEX(ix_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableHint {
    pub name: Ident,
    pub args: Vec<Expr>,
}

impl fmt::Display for TableHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "({})", comma_separated(&self.args))?;
        }
        Ok(())
    }
}

/// A query hint inside `OPTION (...)`: a sequence of words and values,
/// e.g. `MAXDOP 1` or `RECOMPILE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryHint {
    pub name: Ident,
    pub args: Vec<Expr>,
}

impl fmt::Display for QueryHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, " {}", space_separated(&self.args))?;
        }
        Ok(())
    }
}

/// Join flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    /// `CROSS APPLY`
    CrossApply,
    /// `OUTER APPLY`
    OuterApply,
}

impl JoinType {
    /// Whether this join takes an `ON` / `USING` constraint.
    #[must_use]
    pub const fn takes_constraint(self) -> bool {
        matches!(self, Self::Inner | Self::Left | Self::Right | Self::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
            Self::CrossApply => "CROSS APPLY",
            Self::OuterApply => "OUTER APPLY",
        })
    }
}

/// `ON expr` or `USING (cols)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum JoinConstraint {
    On(Expr),
    Using(Vec<Ident>),
}

/// A source in the FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TableRef {
    /// A named table or view.
    Table {
        name: ObjectName,
        alias: Option<TableAlias>,
        hints: Vec<TableHint>,
    },
    /// `(SELECT ...) AS alias`
    Derived {
        subquery: Box<SelectStatement>,
        alias: Option<TableAlias>,
    },
    /// `func(args) AS alias`
    Function {
        name: ObjectName,
        args: Vec<Expr>,
        alias: Option<TableAlias>,
    },
    /// `(a JOIN b ON ...)`
    Nested(Box<Self>),
    /// `left JOIN right [constraint]`
    Join {
        left: Box<Self>,
        right: Box<Self>,
        join_type: JoinType,
        constraint: Option<JoinConstraint>,
    },
}

impl TableRef {
    /// Creates a simple named table reference.
    #[must_use]
    pub fn table(name: &str) -> Self {
        Self::Table {
            name: ObjectName(vec![Ident::new(name)]),
            alias: None,
            hints: Vec::new(),
        }
    }
}

fn write_alias(f: &mut fmt::Formatter<'_>, alias: Option<&TableAlias>) -> fmt::Result {
    match alias {
        Some(alias) => write!(f, " AS {alias}"),
        None => Ok(()),
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table { name, alias, hints } => {
                write!(f, "{name}")?;
                write_alias(f, alias.as_ref())?;
                if !hints.is_empty() {
                    write!(f, " WITH ({})", comma_separated(hints))?;
                }
                Ok(())
            }
            Self::Derived { subquery, alias } => {
                write!(f, "({subquery})")?;
                write_alias(f, alias.as_ref())
            }
            Self::Function { name, args, alias } => {
                write!(f, "{name}({})", comma_separated(args))?;
                write_alias(f, alias.as_ref())
            }
            Self::Nested(inner) => write!(f, "({inner})"),
            Self::Join {
                left,
                right,
                join_type,
                constraint,
            } => {
                write!(f, "{left} {join_type} {right}")?;
                match constraint {
                    Some(JoinConstraint::On(expr)) => write!(f, " ON {expr}"),
                    Some(JoinConstraint::Using(columns)) => {
                        write!(f, " USING ({})", comma_separated(columns))
                    }
                    None => Ok(()),
                }
            }
        }
    }
}

/// `expr [ASC|DESC] [NULLS FIRST|LAST]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OrderByExpr {
    pub expr: Expr,
    /// `Some(true)` for ASC, `Some(false)` for DESC.
    pub asc: Option<bool>,
    /// `Some(true)` for NULLS FIRST, `Some(false)` for NULLS LAST.
    pub nulls_first: Option<bool>,
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.asc {
            Some(true) => f.write_str(" ASC")?,
            Some(false) => f.write_str(" DESC")?,
            None => {}
        }
        match self.nulls_first {
            Some(true) => f.write_str(" NULLS FIRST")?,
            Some(false) => f.write_str(" NULLS LAST")?,
            None => {}
        }
        Ok(())
    }
}

/// How paging was spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LimitStyle {
    /// `LIMIT n [OFFSET m]`
    LimitOffset,
    /// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`
    OffsetFetch,
}

/// Result paging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Limit {
    pub style: LimitStyle,
    pub row_count: Option<Expr>,
    pub offset: Option<Expr>,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            LimitStyle::LimitOffset => {
                let mut sep = "";
                if let Some(count) = &self.row_count {
                    write!(f, "LIMIT {count}")?;
                    sep = " ";
                }
                if let Some(offset) = &self.offset {
                    write!(f, "{sep}OFFSET {offset}")?;
                }
                Ok(())
            }
            LimitStyle::OffsetFetch => {
                if let Some(offset) = &self.offset {
                    write!(f, "OFFSET {offset} ROWS")?;
                }
                if let Some(count) = &self.row_count {
                    write!(f, " FETCH NEXT {count} ROWS ONLY")?;
                }
                Ok(())
            }
        }
    }
}
