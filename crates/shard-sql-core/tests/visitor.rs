//! Walking parsed statements.

mod common;
use common::*;

use std::ops::ControlFlow;

use shard_sql_core::ast::visitor::{visit_statement, visit_statement_mut, Visitor, VisitorMut};
use shard_sql_core::ast::{SelectStatement, TableRef};
use shard_sql_core::Expr;

#[derive(Default)]
struct Tables(Vec<String>);

impl Visitor for Tables {
    type Break = ();

    fn pre_visit_table_ref(&mut self, table: &TableRef) -> ControlFlow<()> {
        if let TableRef::Table { name, .. } = table {
            self.0.push(name.to_string());
        }
        ControlFlow::Continue(())
    }
}

fn tables(sql: &str) -> Vec<String> {
    let mut tables = Tables::default();
    let flow = visit_statement(&parse(sql), &mut tables);
    assert!(flow.is_continue());
    tables.0
}

// ===================================================================
// Read-only walks
// ===================================================================

#[test]
fn tables_in_ctes_joins_and_subqueries() {
    let sql = "WITH c AS (SELECT id FROM a) \
               SELECT * FROM c JOIN (SELECT id FROM b) AS d ON c.id = d.id \
               WHERE EXISTS (SELECT 1 FROM e)";
    assert_eq!(tables(sql), ["a", "c", "b", "e"]);
}

#[test]
fn tables_in_dml() {
    assert_eq!(
        tables("UPDATE t SET a = (SELECT max(b) FROM u) FROM t JOIN v ON t.id = v.id"),
        ["t", "u", "t", "v"]
    );
    assert_eq!(
        tables("MERGE tgt USING src ON tgt.id = src.id WHEN MATCHED THEN DELETE"),
        ["tgt", "src"]
    );
    assert_eq!(tables("DELETE FROM t WHERE id IN (SELECT id FROM gone)"), ["t", "gone"]);
    assert_eq!(tables("INSERT INTO t SELECT * FROM u UNION SELECT * FROM w"), ["u", "w"]);
}

#[test]
fn query_hooks_are_balanced() {
    #[derive(Default)]
    struct Depth {
        current: usize,
        deepest: usize,
    }

    impl Visitor for Depth {
        type Break = ();

        fn pre_visit_query(&mut self, _query: &SelectStatement) -> ControlFlow<()> {
            self.current += 1;
            self.deepest = self.deepest.max(self.current);
            ControlFlow::Continue(())
        }

        fn post_visit_query(&mut self, _query: &SelectStatement) -> ControlFlow<()> {
            self.current -= 1;
            ControlFlow::Continue(())
        }
    }

    let statement = parse("SELECT a FROM t WHERE a IN (SELECT b FROM u WHERE b > (SELECT min(c) FROM w))");
    let mut depth = Depth::default();
    let _ = visit_statement(&statement, &mut depth);
    assert_eq!(depth.current, 0);
    assert_eq!(depth.deepest, 3);
}

#[test]
fn break_returns_the_first_variable() {
    struct FirstVariable;

    impl Visitor for FirstVariable {
        type Break = String;

        fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<String> {
            match expr {
                Expr::Variable(name) => ControlFlow::Break(name.clone()),
                _ => ControlFlow::Continue(()),
            }
        }
    }

    let statement = parse_with("SELECT a FROM t WHERE b = @x AND c = @y", &BracketDialect);
    assert_eq!(
        visit_statement(&statement, &mut FirstVariable),
        ControlFlow::Break(String::from("@x"))
    );
}

// ===================================================================
// Rewrites
// ===================================================================

#[test]
fn parameters_become_named_variables() {
    struct NameParameters;

    impl VisitorMut for NameParameters {
        type Break = ();

        fn pre_visit_expr(&mut self, expr: &mut Expr) -> ControlFlow<()> {
            if let Expr::Parameter { index } = expr {
                *expr = Expr::Variable(format!("@p{index}"));
            }
            ControlFlow::Continue(())
        }
    }

    let mut statement = parse("SELECT * FROM t WHERE a = ? AND b IN (?, ?)");
    let _ = visit_statement_mut(&mut statement, &mut NameParameters);
    assert_eq!(
        statement.to_string(),
        "SELECT * FROM t WHERE a = @p0 AND b IN (@p1, @p2)"
    );
}

#[test]
fn rewrite_table_names_in_update() {
    struct Schema;

    impl VisitorMut for Schema {
        type Break = ();

        fn pre_visit_table_ref(&mut self, table: &mut TableRef) -> ControlFlow<()> {
            if let TableRef::Table { name, .. } = table {
                if name.0.len() == 1 {
                    name.0.insert(0, shard_sql_core::ast::Ident::new("archive"));
                }
            }
            ControlFlow::Continue(())
        }
    }

    let mut statement = parse("UPDATE t SET a = 1 FROM t JOIN dbo.u ON t.id = u.id");
    let _ = visit_statement_mut(&mut statement, &mut Schema);
    assert_eq!(
        statement.to_string(),
        "UPDATE archive.t SET a = 1 FROM archive.t INNER JOIN dbo.u ON t.id = u.id"
    );
}
