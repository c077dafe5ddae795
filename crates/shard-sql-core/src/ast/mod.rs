//! Dialect-neutral statement AST.
//!
//! Every node renders canonical SQL through [`std::fmt::Display`]; parsing
//! that rendering again yields an equal tree. Source spans are kept on
//! [`Ident`] only and do not take part in equality.

mod ddl;
mod dml;
mod expression;
mod query;
mod statement;
mod types;
pub mod visitor;

pub use ddl::{
    AlterTable, AlterTableOperation, ColumnConstraint, ColumnDef, ColumnOption, CreateIndex, CreateTable,
    DropIndex, DropTable, DropView, IndexColumn, ReferentialAction, TableConstraint, TableConstraintKind,
    TableElement, ViewDefinition,
};
pub use dml::{
    Assignment, AssignmentTarget, Delete, ExecArg, ExecTarget, Execute, Insert, InsertSource,
    Merge, MergeAction, MergeClause, MergeMatch, OutputClause, OutputTarget, Update,
};
pub use expression::{
    BinaryOp, CaseWhen, CastKind, Expr, FrameBound, FrameUnits, FunctionCall, Ident, InList,
    IsTest, Literal, ObjectName, Quantifier, TemporalKind, UnaryOp, WindowFrame, WindowSpec,
};
pub use query::{
    Cte, GroupByModifier, JoinConstraint, JoinType, Limit, LimitStyle, OrderByExpr, QueryHint,
    Select, SelectItem, SelectStatement, SetExpr, SetOperator, SetQuantifier, TableAlias,
    TableHint, TableRef, Top, With,
};
pub use statement::{Statement, TransactionStatement};
pub use types::{CharLength, DataType, TypeArg};

use std::fmt;

/// Displays a slice joined by a separator.
pub(crate) struct DisplaySeparated<'a, T: fmt::Display> {
    slice: &'a [T],
    sep: &'static str,
}

impl<T: fmt::Display> fmt::Display for DisplaySeparated<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for item in self.slice {
            if !first {
                f.write_str(self.sep)?;
            }
            first = false;
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

pub(crate) const fn comma_separated<T: fmt::Display>(slice: &[T]) -> DisplaySeparated<'_, T> {
    DisplaySeparated { slice, sep: ", " }
}

pub(crate) const fn space_separated<T: fmt::Display>(slice: &[T]) -> DisplaySeparated<'_, T> {
    DisplaySeparated { slice, sep: " " }
}
