//! INSERT, UPDATE, DELETE, MERGE and EXEC.

use std::fmt;

use serde::Serialize;

use super::{comma_separated, Expr, Ident, ObjectName, SelectItem, SelectStatement, TableRef, Top, With};

/// Where `OUTPUT ... INTO` writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum OutputTarget {
    Table(ObjectName),
    /// A table variable.
    Variable(String),
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(name) => write!(f, "{name}"),
            Self::Variable(name) => f.write_str(name),
        }
    }
}

/// `OUTPUT items [INTO target [(cols)]]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputClause {
    pub items: Vec<SelectItem>,
    pub into: Option<OutputTarget>,
    pub into_columns: Vec<Ident>,
}

impl fmt::Display for OutputClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OUTPUT {}", comma_separated(&self.items))?;
        if let Some(into) = &self.into {
            write!(f, " INTO {into}")?;
            if !self.into_columns.is_empty() {
                write!(f, " ({})", comma_separated(&self.into_columns))?;
            }
        }
        Ok(())
    }
}

/// Left-hand side of a SET assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum AssignmentTarget {
    Column(ObjectName),
    Variable(String),
}

/// `target = value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Assignment {
    pub target: AssignmentTarget,
    pub value: Expr,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            AssignmentTarget::Column(name) => write!(f, "{name} = {}", self.value),
            AssignmentTarget::Variable(name) => write!(f, "{name} = {}", self.value),
        }
    }
}

/// Rows fed to an INSERT.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum InsertSource {
    /// `VALUES (...), (...)`
    Values(Vec<Vec<Expr>>),
    /// `SELECT ...`
    Query(Box<SelectStatement>),
    /// `DEFAULT VALUES`
    DefaultValues,
    /// `EXEC proc ...`
    Execute(Box<Execute>),
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Insert {
    pub with: Option<With>,
    pub top: Option<Top>,
    pub table: ObjectName,
    pub columns: Vec<Ident>,
    pub output: Option<OutputClause>,
    pub source: InsertSource,
}

impl fmt::Display for Insert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(with) = &self.with {
            write!(f, "{with} ")?;
        }
        f.write_str("INSERT ")?;
        if let Some(top) = &self.top {
            write!(f, "{top} ")?;
        }
        write!(f, "INTO {}", self.table)?;
        if !self.columns.is_empty() {
            write!(f, " ({})", comma_separated(&self.columns))?;
        }
        if let Some(output) = &self.output {
            write!(f, " {output}")?;
        }
        match &self.source {
            InsertSource::Values(rows) => {
                f.write_str(" VALUES ")?;
                let mut first = true;
                for row in rows {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "({})", comma_separated(row))?;
                }
                Ok(())
            }
            InsertSource::Query(query) => write!(f, " {query}"),
            InsertSource::DefaultValues => f.write_str(" DEFAULT VALUES"),
            InsertSource::Execute(exec) => write!(f, " {exec}"),
        }
    }
}

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Update {
    pub with: Option<With>,
    pub top: Option<Top>,
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    pub output: Option<OutputClause>,
    pub from: Vec<TableRef>,
    pub selection: Option<Expr>,
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(with) = &self.with {
            write!(f, "{with} ")?;
        }
        f.write_str("UPDATE ")?;
        if let Some(top) = &self.top {
            write!(f, "{top} ")?;
        }
        write!(f, "{} SET {}", self.table, comma_separated(&self.assignments))?;
        if let Some(output) = &self.output {
            write!(f, " {output}")?;
        }
        if !self.from.is_empty() {
            write!(f, " FROM {}", comma_separated(&self.from))?;
        }
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {selection}")?;
        }
        Ok(())
    }
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Delete {
    pub with: Option<With>,
    pub top: Option<Top>,
    pub table: TableRef,
    pub output: Option<OutputClause>,
    /// Second FROM list (`DELETE t FROM t JOIN u ...`).
    pub from: Vec<TableRef>,
    pub selection: Option<Expr>,
}

impl fmt::Display for Delete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(with) = &self.with {
            write!(f, "{with} ")?;
        }
        f.write_str("DELETE ")?;
        if let Some(top) = &self.top {
            write!(f, "{top} ")?;
        }
        write!(f, "FROM {}", self.table)?;
        if let Some(output) = &self.output {
            write!(f, " {output}")?;
        }
        if !self.from.is_empty() {
            write!(f, " FROM {}", comma_separated(&self.from))?;
        }
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {selection}")?;
        }
        Ok(())
    }
}

/// Which rows a MERGE `WHEN` clause applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MergeMatch {
    /// `WHEN MATCHED`
    Matched,
    /// `WHEN NOT MATCHED [BY TARGET]`
    NotMatchedByTarget,
    /// `WHEN NOT MATCHED BY SOURCE`
    NotMatchedBySource,
}

/// What a MERGE `WHEN` clause does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MergeAction {
    Update(Vec<Assignment>),
    Delete,
    /// `INSERT [(cols)] VALUES (...)`; `values` is `None` for `DEFAULT VALUES`.
    Insert {
        columns: Vec<Ident>,
        values: Option<Vec<Expr>>,
    },
}

/// `WHEN ... [AND cond] THEN action`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MergeClause {
    pub kind: MergeMatch,
    pub condition: Option<Expr>,
    pub action: MergeAction,
}

impl fmt::Display for MergeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.kind {
            MergeMatch::Matched => "WHEN MATCHED",
            MergeMatch::NotMatchedByTarget => "WHEN NOT MATCHED",
            MergeMatch::NotMatchedBySource => "WHEN NOT MATCHED BY SOURCE",
        })?;
        if let Some(condition) = &self.condition {
            write!(f, " AND {condition}")?;
        }
        f.write_str(" THEN ")?;
        match &self.action {
            MergeAction::Update(assignments) => write!(f, "UPDATE SET {}", comma_separated(assignments)),
            MergeAction::Delete => f.write_str("DELETE"),
            MergeAction::Insert { columns, values } => {
                f.write_str("INSERT")?;
                if !columns.is_empty() {
                    write!(f, " ({})", comma_separated(columns))?;
                }
                match values {
                    Some(values) => write!(f, " VALUES ({})", comma_separated(values)),
                    None => f.write_str(" DEFAULT VALUES"),
                }
            }
        }
    }
}

/// MERGE statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Merge {
    pub with: Option<With>,
    pub target: TableRef,
    pub source: TableRef,
    pub on: Expr,
    pub clauses: Vec<MergeClause>,
    pub output: Option<OutputClause>,
}

impl fmt::Display for Merge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(with) = &self.with {
            write!(f, "{with} ")?;
        }
        write!(f, "MERGE INTO {} USING {} ON {}", self.target, self.source, self.on)?;
        for clause in &self.clauses {
            write!(f, " {clause}")?;
        }
        if let Some(output) = &self.output {
            write!(f, " {output}")?;
        }
        Ok(())
    }
}

/// What an EXEC runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ExecTarget {
    /// A stored procedure.
    Procedure(ObjectName),
    /// `EXEC (expr)` dynamic SQL.
    Dynamic(Expr),
}

/// One argument of a procedure call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExecArg {
    /// `@param =` prefix.
    pub name: Option<String>,
    pub value: Expr,
    /// Trailing `OUTPUT` / `OUT`.
    pub output: bool,
}

impl fmt::Display for ExecArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name} = ")?;
        }
        write!(f, "{}", self.value)?;
        if self.output {
            f.write_str(" OUTPUT")?;
        }
        Ok(())
    }
}

/// `EXEC [@ret =] proc args` or `EXEC (sql)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Execute {
    pub return_status: Option<String>,
    pub target: ExecTarget,
    pub args: Vec<ExecArg>,
}

impl fmt::Display for Execute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EXEC ")?;
        if let Some(status) = &self.return_status {
            write!(f, "{status} = ")?;
        }
        match &self.target {
            ExecTarget::Procedure(name) => {
                write!(f, "{name}")?;
                if !self.args.is_empty() {
                    write!(f, " {}", comma_separated(&self.args))?;
                }
                Ok(())
            }
            ExecTarget::Dynamic(expr) => write!(f, "({expr})"),
        }
    }
}
