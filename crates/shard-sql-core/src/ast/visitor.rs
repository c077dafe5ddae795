//! Depth-first AST walking.
//!
//! [`Visitor`] observes a tree, [`VisitorMut`] may rewrite it in place. Both
//! get a `pre_` hook before a node's children are walked and a `post_` hook
//! after; returning [`ControlFlow::Break`] from any hook stops the walk and
//! hands the value back to the caller.
//!
//! ```
//! use std::ops::ControlFlow;
//! use shard_sql_core::ast::visitor::{visit_statement, Visitor};
//! use shard_sql_core::ast::TableRef;
//! use shard_sql_core::{parse, GenericDialect};
//!
//! #[derive(Default)]
//! struct Tables(Vec<String>);
//!
//! impl Visitor for Tables {
//!     type Break = ();
//!
//!     fn pre_visit_table_ref(&mut self, table: &TableRef) -> ControlFlow<()> {
//!         if let TableRef::Table { name, .. } = table {
//!             self.0.push(name.to_string());
//!         }
//!         ControlFlow::Continue(())
//!     }
//! }
//!
//! let statement = parse("SELECT * FROM a JOIN b ON a.id = b.id", &GenericDialect).unwrap();
//! let mut tables = Tables::default();
//! let _ = visit_statement(&statement, &mut tables);
//! assert_eq!(tables.0, ["a", "b"]);
//! ```

use std::ops::ControlFlow;

use super::{
    AlterTableOperation, ColumnDef, ColumnOption, Expr, ExecTarget, FrameBound, InList, InsertSource, MergeAction,
    OutputClause, Select, SelectItem, SelectStatement, SetExpr, Statement, TableConstraintKind, TableElement,
    TableRef, Top, With,
};

/// Read-only AST visitor.
pub trait Visitor {
    /// Value carried out of the walk by [`ControlFlow::Break`].
    type Break;

    fn pre_visit_statement(&mut self, _statement: &Statement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_statement(&mut self, _statement: &Statement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn pre_visit_query(&mut self, _query: &SelectStatement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &SelectStatement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn pre_visit_table_ref(&mut self, _table: &TableRef) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_table_ref(&mut self, _table: &TableRef) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, _expr: &Expr) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_expr(&mut self, _expr: &Expr) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }
}

/// AST visitor that may modify nodes in place.
pub trait VisitorMut {
    /// Value carried out of the walk by [`ControlFlow::Break`].
    type Break;

    fn pre_visit_statement(&mut self, _statement: &mut Statement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_statement(&mut self, _statement: &mut Statement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn pre_visit_query(&mut self, _query: &mut SelectStatement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &mut SelectStatement) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn pre_visit_table_ref(&mut self, _table: &mut TableRef) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_table_ref(&mut self, _table: &mut TableRef) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, _expr: &mut Expr) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }

    fn post_visit_expr(&mut self, _expr: &mut Expr) -> ControlFlow<Self::Break> {
        ControlFlow::Continue(())
    }
}

// One walker body, instantiated for `&T` and `&mut T`.
macro_rules! walkers {
    (
        $visitor:ident, [$($m:tt)*],
        $statement:ident, $query:ident, $with:ident, $set_expr:ident, $select:ident,
        $top:ident, $output:ident, $table_ref:ident, $column:ident, $expr:ident, $exprs:ident
    ) => {
        /// Walks a statement and everything below it.
        pub fn $statement<V: $visitor + ?Sized>(
            statement: & $($m)* Statement,
            visitor: &mut V,
        ) -> ControlFlow<V::Break> {
            visitor.pre_visit_statement(statement)?;
            match & $($m)* *statement {
                Statement::Select(query) => $query(query, visitor)?,
                Statement::Insert(insert) => {
                    $with(& $($m)* insert.with, visitor)?;
                    $top(& $($m)* insert.top, visitor)?;
                    $output(& $($m)* insert.output, visitor)?;
                    match & $($m)* insert.source {
                        InsertSource::Values(rows) => {
                            for row in rows {
                                $exprs(row, visitor)?;
                            }
                        }
                        InsertSource::Query(query) => $query(query, visitor)?,
                        InsertSource::DefaultValues => {}
                        InsertSource::Execute(exec) => {
                            for arg in & $($m)* exec.args {
                                $expr(& $($m)* arg.value, visitor)?;
                            }
                        }
                    }
                }
                Statement::Update(update) => {
                    $with(& $($m)* update.with, visitor)?;
                    $top(& $($m)* update.top, visitor)?;
                    $table_ref(& $($m)* update.table, visitor)?;
                    for assignment in & $($m)* update.assignments {
                        $expr(& $($m)* assignment.value, visitor)?;
                    }
                    $output(& $($m)* update.output, visitor)?;
                    for table in & $($m)* update.from {
                        $table_ref(table, visitor)?;
                    }
                    if let Some(selection) = & $($m)* update.selection {
                        $expr(selection, visitor)?;
                    }
                }
                Statement::Delete(delete) => {
                    $with(& $($m)* delete.with, visitor)?;
                    $top(& $($m)* delete.top, visitor)?;
                    $table_ref(& $($m)* delete.table, visitor)?;
                    $output(& $($m)* delete.output, visitor)?;
                    for table in & $($m)* delete.from {
                        $table_ref(table, visitor)?;
                    }
                    if let Some(selection) = & $($m)* delete.selection {
                        $expr(selection, visitor)?;
                    }
                }
                Statement::Merge(merge) => {
                    $with(& $($m)* merge.with, visitor)?;
                    $table_ref(& $($m)* merge.target, visitor)?;
                    $table_ref(& $($m)* merge.source, visitor)?;
                    $expr(& $($m)* merge.on, visitor)?;
                    for clause in & $($m)* merge.clauses {
                        if let Some(condition) = & $($m)* clause.condition {
                            $expr(condition, visitor)?;
                        }
                        match & $($m)* clause.action {
                            MergeAction::Update(assignments) => {
                                for assignment in assignments {
                                    $expr(& $($m)* assignment.value, visitor)?;
                                }
                            }
                            MergeAction::Delete => {}
                            MergeAction::Insert { values, .. } => {
                                if let Some(values) = values {
                                    $exprs(values, visitor)?;
                                }
                            }
                        }
                    }
                    $output(& $($m)* merge.output, visitor)?;
                }
                Statement::Execute(exec) => {
                    if let ExecTarget::Dynamic(expr) = & $($m)* exec.target {
                        $expr(expr, visitor)?;
                    }
                    for arg in & $($m)* exec.args {
                        $expr(& $($m)* arg.value, visitor)?;
                    }
                }
                Statement::CreateTable(create) => {
                    for column in & $($m)* create.columns {
                        $column(column, visitor)?;
                    }
                    for constraint in & $($m)* create.constraints {
                        if let TableConstraintKind::Check(expr) = & $($m)* constraint.kind {
                            $expr(expr, visitor)?;
                        }
                    }
                }
                Statement::CreateIndex(create) => {
                    if let Some(predicate) = & $($m)* create.predicate {
                        $expr(predicate, visitor)?;
                    }
                }
                Statement::AlterTable(alter) => {
                    if let AlterTableOperation::Add(elements) = & $($m)* alter.operation {
                        for element in elements {
                            match element {
                                TableElement::Column(column) => $column(column, visitor)?,
                                TableElement::Constraint(constraint) => {
                                    if let TableConstraintKind::Check(expr) = & $($m)* constraint.kind {
                                        $expr(expr, visitor)?;
                                    }
                                }
                            }
                        }
                    }
                }
                Statement::CreateView { view, .. } | Statement::AlterView(view) => {
                    $query(& $($m)* view.query, visitor)?;
                }
                Statement::DropTable(_)
                | Statement::DropView(_)
                | Statement::DropIndex(_)
                | Statement::Truncate { .. }
                | Statement::Use { .. }
                | Statement::Transaction(_) => {}
            }
            visitor.post_visit_statement(statement)
        }

        /// Walks a query and everything below it.
        pub fn $query<V: $visitor + ?Sized>(
            query: & $($m)* SelectStatement,
            visitor: &mut V,
        ) -> ControlFlow<V::Break> {
            visitor.pre_visit_query(query)?;
            $with(& $($m)* query.with, visitor)?;
            $set_expr(& $($m)* query.body, visitor)?;
            for item in & $($m)* query.order_by {
                $expr(& $($m)* item.expr, visitor)?;
            }
            if let Some(limit) = & $($m)* query.limit {
                if let Some(count) = & $($m)* limit.row_count {
                    $expr(count, visitor)?;
                }
                if let Some(offset) = & $($m)* limit.offset {
                    $expr(offset, visitor)?;
                }
            }
            for hint in & $($m)* query.hints {
                $exprs(& $($m)* hint.args, visitor)?;
            }
            visitor.post_visit_query(query)
        }

        fn $with<V: $visitor + ?Sized>(with: & $($m)* Option<With>, visitor: &mut V) -> ControlFlow<V::Break> {
            if let Some(with) = with {
                for cte in & $($m)* with.ctes {
                    $query(& $($m)* cte.query, visitor)?;
                }
            }
            ControlFlow::Continue(())
        }

        fn $set_expr<V: $visitor + ?Sized>(body: & $($m)* SetExpr, visitor: &mut V) -> ControlFlow<V::Break> {
            match body {
                SetExpr::Select(select) => $select(select, visitor),
                SetExpr::SetOperation { left, right, .. } => {
                    $set_expr(left, visitor)?;
                    $set_expr(right, visitor)
                }
                SetExpr::Query(query) => $query(query, visitor),
            }
        }

        fn $select<V: $visitor + ?Sized>(select: & $($m)* Select, visitor: &mut V) -> ControlFlow<V::Break> {
            $top(& $($m)* select.top, visitor)?;
            for item in & $($m)* select.projection {
                match item {
                    SelectItem::Expr { expr, .. }
                    | SelectItem::AliasAssignment { expr, .. }
                    | SelectItem::VariableAssignment { expr, .. } => $expr(expr, visitor)?,
                    SelectItem::Wildcard | SelectItem::QualifiedWildcard(_) => {}
                }
            }
            for table in & $($m)* select.from {
                $table_ref(table, visitor)?;
            }
            if let Some(selection) = & $($m)* select.selection {
                $expr(selection, visitor)?;
            }
            $exprs(& $($m)* select.group_by, visitor)?;
            if let Some(having) = & $($m)* select.having {
                $expr(having, visitor)?;
            }
            ControlFlow::Continue(())
        }

        fn $column<V: $visitor + ?Sized>(column: & $($m)* ColumnDef, visitor: &mut V) -> ControlFlow<V::Break> {
            for constraint in & $($m)* column.constraints {
                match & $($m)* constraint.option {
                    ColumnOption::Default(expr) | ColumnOption::Check(expr) => $expr(expr, visitor)?,
                    ColumnOption::Identity { seed, increment } => {
                        if let Some(seed) = seed {
                            $expr(seed, visitor)?;
                        }
                        if let Some(increment) = increment {
                            $expr(increment, visitor)?;
                        }
                    }
                    _ => {}
                }
            }
            ControlFlow::Continue(())
        }

        fn $top<V: $visitor + ?Sized>(top: & $($m)* Option<Top>, visitor: &mut V) -> ControlFlow<V::Break> {
            if let Some(top) = top {
                $expr(& $($m)* top.quantity, visitor)?;
            }
            ControlFlow::Continue(())
        }

        fn $output<V: $visitor + ?Sized>(
            output: & $($m)* Option<OutputClause>,
            visitor: &mut V,
        ) -> ControlFlow<V::Break> {
            if let Some(output) = output {
                for item in & $($m)* output.items {
                    if let SelectItem::Expr { expr, .. } = item {
                        $expr(expr, visitor)?;
                    }
                }
            }
            ControlFlow::Continue(())
        }

        /// Walks a FROM source and everything below it.
        pub fn $table_ref<V: $visitor + ?Sized>(
            table: & $($m)* TableRef,
            visitor: &mut V,
        ) -> ControlFlow<V::Break> {
            visitor.pre_visit_table_ref(table)?;
            match & $($m)* *table {
                TableRef::Table { hints, .. } => {
                    for hint in hints {
                        $exprs(& $($m)* hint.args, visitor)?;
                    }
                }
                TableRef::Derived { subquery, .. } => $query(subquery, visitor)?,
                TableRef::Function { args, .. } => $exprs(args, visitor)?,
                TableRef::Nested(inner) => $table_ref(inner, visitor)?,
                TableRef::Join {
                    left,
                    right,
                    constraint,
                    ..
                } => {
                    $table_ref(left, visitor)?;
                    $table_ref(right, visitor)?;
                    if let Some(super::JoinConstraint::On(expr)) = constraint {
                        $expr(expr, visitor)?;
                    }
                }
            }
            visitor.post_visit_table_ref(table)
        }

        fn $exprs<V: $visitor + ?Sized>(exprs: & $($m)* [Expr], visitor: &mut V) -> ControlFlow<V::Break> {
            for expr in exprs {
                $expr(expr, visitor)?;
            }
            ControlFlow::Continue(())
        }

        /// Walks an expression and its sub-expressions, including subqueries.
        pub fn $expr<V: $visitor + ?Sized>(expr: & $($m)* Expr, visitor: &mut V) -> ControlFlow<V::Break> {
            visitor.pre_visit_expr(expr)?;
            match & $($m)* *expr {
                Expr::Literal(_)
                | Expr::Column(_)
                | Expr::Variable(_)
                | Expr::Parameter { .. }
                | Expr::Wildcard
                | Expr::Default => {}
                Expr::Binary { left, right, .. } => {
                    $expr(left, visitor)?;
                    $expr(right, visitor)?;
                }
                Expr::Unary { operand, .. } => $expr(operand, visitor)?,
                Expr::Is { expr, .. } | Expr::Collate { expr, .. } | Expr::Nested(expr) => $expr(expr, visitor)?,
                Expr::In { expr, list, .. } => {
                    $expr(expr, visitor)?;
                    match list {
                        InList::Values(values) => $exprs(values, visitor)?,
                        InList::Subquery(query) => $query(query, visitor)?,
                    }
                }
                Expr::Between { expr, low, high, .. } => {
                    $expr(expr, visitor)?;
                    $expr(low, visitor)?;
                    $expr(high, visitor)?;
                }
                Expr::Like {
                    expr, pattern, escape, ..
                } => {
                    $expr(expr, visitor)?;
                    $expr(pattern, visitor)?;
                    if let Some(escape) = escape {
                        $expr(escape, visitor)?;
                    }
                }
                Expr::Quantified { left, subquery, .. } => {
                    $expr(left, visitor)?;
                    $query(subquery, visitor)?;
                }
                Expr::AtTimeZone { expr, zone } => {
                    $expr(expr, visitor)?;
                    $expr(zone, visitor)?;
                }
                Expr::Cast { expr, style, .. } => {
                    $expr(expr, visitor)?;
                    if let Some(style) = style {
                        $expr(style, visitor)?;
                    }
                }
                Expr::Case {
                    operand,
                    conditions,
                    else_result,
                } => {
                    if let Some(operand) = operand {
                        $expr(operand, visitor)?;
                    }
                    for when in conditions {
                        $expr(& $($m)* when.condition, visitor)?;
                        $expr(& $($m)* when.result, visitor)?;
                    }
                    if let Some(else_result) = else_result {
                        $expr(else_result, visitor)?;
                    }
                }
                Expr::Function(call) => {
                    $exprs(& $($m)* call.args, visitor)?;
                    if let Some(over) = & $($m)* call.over {
                        $exprs(& $($m)* over.partition_by, visitor)?;
                        for item in & $($m)* over.order_by {
                            $expr(& $($m)* item.expr, visitor)?;
                        }
                        if let Some(frame) = & $($m)* over.frame {
                            for bound in [& $($m)* frame.start].into_iter().chain(& $($m)* frame.end) {
                                if let FrameBound::Preceding(Some(n)) | FrameBound::Following(Some(n)) = bound {
                                    $expr(n, visitor)?;
                                }
                            }
                        }
                    }
                }
                Expr::Exists(query) | Expr::Subquery(query) => $query(query, visitor)?,
                Expr::Row(items) => $exprs(items, visitor)?,
            }
            visitor.post_visit_expr(expr)
        }
    };
}

walkers!(
    Visitor, [],
    visit_statement, visit_query, visit_with, visit_set_expr, visit_select,
    visit_top, visit_output, visit_table_ref, visit_column_def, visit_expr, visit_exprs
);

walkers!(
    VisitorMut, [mut],
    visit_statement_mut, visit_query_mut, visit_with_mut, visit_set_expr_mut, visit_select_mut,
    visit_top_mut, visit_output_mut, visit_table_ref_mut, visit_column_def_mut, visit_expr_mut, visit_exprs_mut
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Ident, Literal, ObjectName};
    use crate::lexer::NumberKind;

    #[derive(Default)]
    struct ColumnCollector {
        columns: Vec<String>,
        queries: usize,
    }

    impl Visitor for ColumnCollector {
        type Break = ();

        fn pre_visit_query(&mut self, _query: &SelectStatement) -> ControlFlow<()> {
            self.queries += 1;
            ControlFlow::Continue(())
        }

        fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<()> {
            if let Expr::Column(name) = expr {
                self.columns.push(name.to_string());
            }
            ControlFlow::Continue(())
        }
    }

    fn sample_query() -> Statement {
        let inner = SelectStatement::from_body(SetExpr::Select(Box::new(Select {
            quantifier: None,
            top: None,
            projection: vec![SelectItem::Expr {
                expr: Expr::column("id"),
                alias: None,
            }],
            into: None,
            from: vec![TableRef::table("u")],
            selection: None,
            group_by: vec![],
            group_by_modifier: None,
            having: None,
        })));
        let outer = Select {
            quantifier: None,
            top: None,
            projection: vec![SelectItem::Wildcard],
            into: None,
            from: vec![TableRef::table("t")],
            selection: Some(Expr::binary(
                Expr::binary(Expr::column("a"), BinaryOp::Eq, Expr::integer(1)),
                BinaryOp::And,
                Expr::In {
                    expr: Box::new(Expr::column("b")),
                    list: InList::Subquery(Box::new(inner)),
                    negated: false,
                },
            )),
            group_by: vec![],
            group_by_modifier: None,
            having: None,
        };
        Statement::Select(Box::new(SelectStatement::from_body(SetExpr::Select(Box::new(outer)))))
    }

    #[test]
    fn test_visitor_reaches_subqueries() {
        let statement = sample_query();
        let mut collector = ColumnCollector::default();
        let flow = visit_statement(&statement, &mut collector);
        assert!(flow.is_continue());
        assert_eq!(collector.columns, ["a", "b", "id"]);
        assert_eq!(collector.queries, 2);
    }

    #[test]
    fn test_visitor_break_stops_walk() {
        struct FirstLiteral;

        impl Visitor for FirstLiteral {
            type Break = Literal;

            fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Literal> {
                match expr {
                    Expr::Literal(lit) => ControlFlow::Break(lit.clone()),
                    _ => ControlFlow::Continue(()),
                }
            }
        }

        let statement = sample_query();
        let flow = visit_statement(&statement, &mut FirstLiteral);
        assert_eq!(
            flow,
            ControlFlow::Break(Literal::Number {
                value: String::from("1"),
                kind: NumberKind::Integer,
            })
        );
    }

    #[test]
    fn test_visitor_mut_renames_tables() {
        struct Prefix;

        impl VisitorMut for Prefix {
            type Break = ();

            fn pre_visit_table_ref(&mut self, table: &mut TableRef) -> ControlFlow<()> {
                if let TableRef::Table { name, .. } = table {
                    name.0.insert(0, Ident::new("shard_0"));
                }
                ControlFlow::Continue(())
            }
        }

        let mut statement = sample_query();
        let _ = visit_statement_mut(&mut statement, &mut Prefix);
        assert_eq!(
            statement.to_string(),
            "SELECT * FROM shard_0.t WHERE a = 1 AND b IN (SELECT id FROM shard_0.u)"
        );
        let Statement::Select(query) = &statement else {
            panic!("expected a query");
        };
        let SetExpr::Select(select) = &query.body else {
            panic!("expected a select");
        };
        assert!(matches!(
            &select.from[0],
            TableRef::Table { name, .. } if *name == ObjectName::from_parts(&["shard_0", "t"])
        ));
    }
}
