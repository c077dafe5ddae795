//! Top-level statements.

use std::fmt;

use serde::Serialize;

use super::{
    AlterTable, CreateIndex, CreateTable, Delete, DropIndex, DropTable, DropView, Execute, Ident, Insert, Merge,
    ObjectName, SelectStatement, Update, ViewDefinition,
};

/// Transaction control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionStatement {
    /// `BEGIN TRANSACTION [name]`
    Begin { name: Option<Ident> },
    /// `COMMIT [TRANSACTION [name]]`
    Commit { name: Option<Ident> },
    /// `ROLLBACK [TRANSACTION [name]]`
    Rollback { name: Option<Ident> },
    /// `SAVE TRANSACTION name`
    Save { name: Ident },
}

fn write_name(f: &mut fmt::Formatter<'_>, name: Option<&Ident>) -> fmt::Result {
    match name {
        Some(name) => write!(f, " {name}"),
        None => Ok(()),
    }
}

impl fmt::Display for TransactionStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin { name } => {
                f.write_str("BEGIN TRANSACTION")?;
                write_name(f, name.as_ref())
            }
            Self::Commit { name } => {
                f.write_str("COMMIT TRANSACTION")?;
                write_name(f, name.as_ref())
            }
            Self::Rollback { name } => {
                f.write_str("ROLLBACK TRANSACTION")?;
                write_name(f, name.as_ref())
            }
            Self::Save { name } => write!(f, "SAVE TRANSACTION {name}"),
        }
    }
}

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Statement {
    Select(Box<SelectStatement>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
    Merge(Box<Merge>),
    Execute(Box<Execute>),
    CreateTable(Box<CreateTable>),
    CreateIndex(Box<CreateIndex>),
    DropTable(DropTable),
    DropIndex(DropIndex),
    AlterTable(Box<AlterTable>),
    /// `CREATE [OR ALTER] VIEW ...`
    CreateView { or_alter: bool, view: Box<ViewDefinition> },
    AlterView(Box<ViewDefinition>),
    DropView(DropView),
    /// `TRUNCATE TABLE t`
    Truncate { table: ObjectName },
    /// `USE db`
    Use { database: Ident },
    Transaction(TransactionStatement),
}

impl Statement {
    /// Short name of the statement kind, e.g. `"SELECT"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::Insert(_) => "INSERT",
            Self::Update(_) => "UPDATE",
            Self::Delete(_) => "DELETE",
            Self::Merge(_) => "MERGE",
            Self::Execute(_) => "EXECUTE",
            Self::CreateTable(_) => "CREATE TABLE",
            Self::CreateIndex(_) => "CREATE INDEX",
            Self::DropTable(_) => "DROP TABLE",
            Self::DropIndex(_) => "DROP INDEX",
            Self::AlterTable(_) => "ALTER TABLE",
            Self::CreateView { .. } => "CREATE VIEW",
            Self::AlterView(_) => "ALTER VIEW",
            Self::DropView(_) => "DROP VIEW",
            Self::Truncate { .. } => "TRUNCATE",
            Self::Use { .. } => "USE",
            Self::Transaction(_) => "TRANSACTION",
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(query) => write!(f, "{query}"),
            Self::Insert(insert) => write!(f, "{insert}"),
            Self::Update(update) => write!(f, "{update}"),
            Self::Delete(delete) => write!(f, "{delete}"),
            Self::Merge(merge) => write!(f, "{merge}"),
            Self::Execute(exec) => write!(f, "{exec}"),
            Self::CreateTable(create) => write!(f, "{create}"),
            Self::CreateIndex(create) => write!(f, "{create}"),
            Self::DropTable(drop) => write!(f, "{drop}"),
            Self::DropIndex(drop) => write!(f, "{drop}"),
            Self::AlterTable(alter) => write!(f, "{alter}"),
            Self::CreateView { or_alter: false, view } => write!(f, "CREATE {view}"),
            Self::CreateView { or_alter: true, view } => write!(f, "CREATE OR ALTER {view}"),
            Self::AlterView(view) => write!(f, "ALTER {view}"),
            Self::DropView(drop) => write!(f, "{drop}"),
            Self::Truncate { table } => write!(f, "TRUNCATE TABLE {table}"),
            Self::Use { database } => write!(f, "USE {database}"),
            Self::Transaction(tx) => write!(f, "{tx}"),
        }
    }
}
