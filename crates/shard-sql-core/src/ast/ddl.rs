//! Data definition statements.

use std::fmt;

use serde::Serialize;

use super::{comma_separated, DataType, Expr, Ident, ObjectName, SelectStatement};

/// `ON DELETE` / `ON UPDATE` actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReferentialAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
        })
    }
}

fn write_clustered(f: &mut fmt::Formatter<'_>, clustered: Option<bool>) -> fmt::Result {
    match clustered {
        Some(true) => f.write_str(" CLUSTERED"),
        Some(false) => f.write_str(" NONCLUSTERED"),
        None => Ok(()),
    }
}

fn write_actions(
    f: &mut fmt::Formatter<'_>,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
) -> fmt::Result {
    if let Some(action) = on_delete {
        write!(f, " ON DELETE {action}")?;
    }
    if let Some(action) = on_update {
        write!(f, " ON UPDATE {action}")?;
    }
    Ok(())
}

/// A column constraint or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnOption {
    Null,
    NotNull,
    /// `PRIMARY KEY [CLUSTERED|NONCLUSTERED]`
    PrimaryKey { clustered: Option<bool> },
    /// `UNIQUE [CLUSTERED|NONCLUSTERED]`
    Unique { clustered: Option<bool> },
    /// `IDENTITY [(seed, increment)]`
    Identity { seed: Option<Expr>, increment: Option<Expr> },
    Default(Expr),
    /// `REFERENCES table [(col)] [ON DELETE ...] [ON UPDATE ...]`
    References {
        table: ObjectName,
        columns: Vec<Ident>,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    },
    Check(Expr),
}

/// `[CONSTRAINT name] option`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnConstraint {
    pub name: Option<Ident>,
    pub option: ColumnOption,
}

impl fmt::Display for ColumnConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "CONSTRAINT {name} ")?;
        }
        match &self.option {
            ColumnOption::Null => f.write_str("NULL"),
            ColumnOption::NotNull => f.write_str("NOT NULL"),
            ColumnOption::PrimaryKey { clustered } => {
                f.write_str("PRIMARY KEY")?;
                write_clustered(f, *clustered)
            }
            ColumnOption::Unique { clustered } => {
                f.write_str("UNIQUE")?;
                write_clustered(f, *clustered)
            }
            ColumnOption::Identity { seed, increment } => {
                f.write_str("IDENTITY")?;
                if let (Some(seed), Some(increment)) = (seed, increment) {
                    write!(f, "({seed}, {increment})")?;
                }
                Ok(())
            }
            ColumnOption::Default(expr) => write!(f, "DEFAULT {expr}"),
            ColumnOption::References {
                table,
                columns,
                on_delete,
                on_update,
            } => {
                write!(f, "REFERENCES {table}")?;
                if !columns.is_empty() {
                    write!(f, " ({})", comma_separated(columns))?;
                }
                write_actions(f, *on_delete, *on_update)
            }
            ColumnOption::Check(expr) => write!(f, "CHECK ({expr})"),
        }
    }
}

/// A column definition in CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnDef {
    pub name: Ident,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        for constraint in &self.constraints {
            write!(f, " {constraint}")?;
        }
        Ok(())
    }
}

/// An indexed column with optional direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexColumn {
    pub name: Ident,
    pub asc: Option<bool>,
}

impl fmt::Display for IndexColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match self.asc {
            Some(true) => f.write_str(" ASC"),
            Some(false) => f.write_str(" DESC"),
            None => Ok(()),
        }
    }
}

/// The body of a table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TableConstraintKind {
    PrimaryKey {
        clustered: Option<bool>,
        columns: Vec<IndexColumn>,
    },
    Unique {
        clustered: Option<bool>,
        columns: Vec<IndexColumn>,
    },
    ForeignKey {
        columns: Vec<Ident>,
        foreign_table: ObjectName,
        referred_columns: Vec<Ident>,
        on_delete: Option<ReferentialAction>,
        on_update: Option<ReferentialAction>,
    },
    Check(Expr),
}

/// `[CONSTRAINT name] kind`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableConstraint {
    pub name: Option<Ident>,
    pub kind: TableConstraintKind,
}

impl fmt::Display for TableConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "CONSTRAINT {name} ")?;
        }
        match &self.kind {
            TableConstraintKind::PrimaryKey { clustered, columns } => {
                f.write_str("PRIMARY KEY")?;
                write_clustered(f, *clustered)?;
                write!(f, " ({})", comma_separated(columns))
            }
            TableConstraintKind::Unique { clustered, columns } => {
                f.write_str("UNIQUE")?;
                write_clustered(f, *clustered)?;
                write!(f, " ({})", comma_separated(columns))
            }
            TableConstraintKind::ForeignKey {
                columns,
                foreign_table,
                referred_columns,
                on_delete,
                on_update,
            } => {
                write!(f, "FOREIGN KEY ({}) REFERENCES {foreign_table}", comma_separated(columns))?;
                if !referred_columns.is_empty() {
                    write!(f, " ({})", comma_separated(referred_columns))?;
                }
                write_actions(f, *on_delete, *on_update)
            }
            TableConstraintKind::Check(expr) => write!(f, "CHECK ({expr})"),
        }
    }
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CreateTable {
    pub name: ObjectName,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE TABLE {} ({}", self.name, comma_separated(&self.columns))?;
        for constraint in &self.constraints {
            write!(f, ", {constraint}")?;
        }
        f.write_str(")")
    }
}

/// CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CreateIndex {
    pub unique: bool,
    pub clustered: Option<bool>,
    pub name: Ident,
    pub table: ObjectName,
    pub columns: Vec<IndexColumn>,
    pub include: Vec<Ident>,
    /// Filtered index predicate.
    pub predicate: Option<Expr>,
}

impl fmt::Display for CreateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE")?;
        if self.unique {
            f.write_str(" UNIQUE")?;
        }
        write_clustered(f, self.clustered)?;
        write!(
            f,
            " INDEX {} ON {} ({})",
            self.name,
            self.table,
            comma_separated(&self.columns)
        )?;
        if !self.include.is_empty() {
            write!(f, " INCLUDE ({})", comma_separated(&self.include))?;
        }
        if let Some(predicate) = &self.predicate {
            write!(f, " WHERE {predicate}")?;
        }
        Ok(())
    }
}

/// `DROP TABLE [IF EXISTS] t [, ...]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DropTable {
    pub if_exists: bool,
    pub names: Vec<ObjectName>,
}

impl fmt::Display for DropTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_drop(f, "TABLE", self.if_exists, &self.names)
    }
}

/// `DROP INDEX [IF EXISTS] ix ON t` or `DROP INDEX t.ix`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DropIndex {
    pub if_exists: bool,
    pub name: ObjectName,
    pub table: Option<ObjectName>,
}

impl fmt::Display for DropIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DROP INDEX ")?;
        if self.if_exists {
            f.write_str("IF EXISTS ")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(table) = &self.table {
            write!(f, " ON {table}")?;
        }
        Ok(())
    }
}

fn write_drop<T: fmt::Display>(f: &mut fmt::Formatter<'_>, kind: &str, if_exists: bool, names: &[T]) -> fmt::Result {
    write!(f, "DROP {kind} ")?;
    if if_exists {
        f.write_str("IF EXISTS ")?;
    }
    write!(f, "{}", comma_separated(names))
}

/// `DROP VIEW [IF EXISTS] v [, ...]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DropView {
    pub if_exists: bool,
    pub names: Vec<ObjectName>,
}

impl fmt::Display for DropView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_drop(f, "VIEW", self.if_exists, &self.names)
    }
}

/// A column or table constraint in a table body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TableElement {
    Column(ColumnDef),
    Constraint(TableConstraint),
}

impl fmt::Display for TableElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(column) => write!(f, "{column}"),
            Self::Constraint(constraint) => write!(f, "{constraint}"),
        }
    }
}

/// The change made by an ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum AlterTableOperation {
    /// `ADD column | constraint, ...`
    Add(Vec<TableElement>),
    /// `ALTER COLUMN c type [NULL | NOT NULL]`
    AlterColumn {
        name: Ident,
        data_type: DataType,
        /// `Some(false)` for `NOT NULL`.
        nullable: Option<bool>,
    },
    /// `DROP COLUMN [IF EXISTS] a, ...`
    DropColumns { if_exists: bool, names: Vec<Ident> },
    /// `DROP CONSTRAINT [IF EXISTS] a, ...`
    DropConstraints { if_exists: bool, names: Vec<Ident> },
}

impl fmt::Display for AlterTableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(elements) => write!(f, "ADD {}", comma_separated(elements)),
            Self::AlterColumn {
                name,
                data_type,
                nullable,
            } => {
                write!(f, "ALTER COLUMN {name} {data_type}")?;
                match nullable {
                    Some(true) => f.write_str(" NULL"),
                    Some(false) => f.write_str(" NOT NULL"),
                    None => Ok(()),
                }
            }
            Self::DropColumns { if_exists, names } => write_drop(f, "COLUMN", *if_exists, names),
            Self::DropConstraints { if_exists, names } => write_drop(f, "CONSTRAINT", *if_exists, names),
        }
    }
}

/// `ALTER TABLE t operation`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AlterTable {
    pub name: ObjectName,
    pub operation: AlterTableOperation,
}

impl fmt::Display for AlterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ALTER TABLE {} {}", self.name, self.operation)
    }
}

/// The part of CREATE VIEW and ALTER VIEW after the leading keywords.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewDefinition {
    pub name: ObjectName,
    pub columns: Vec<Ident>,
    pub query: Box<SelectStatement>,
    /// `WITH CHECK OPTION`
    pub check_option: bool,
}

impl fmt::Display for ViewDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VIEW {}", self.name)?;
        if !self.columns.is_empty() {
            write!(f, " ({})", comma_separated(&self.columns))?;
        }
        write!(f, " AS {}", self.query)?;
        if self.check_option {
            f.write_str(" WITH CHECK OPTION")?;
        }
        Ok(())
    }
}
