//! Tests for query parsing: projections, FROM, joins, grouping, set
//! operations and paging.

mod common;
use common::*;

use shard_sql_core::ast::{
    Expr, GroupByModifier, JoinConstraint, JoinType, LimitStyle, ObjectName, SelectItem, SetExpr,
    SetOperator, SetQuantifier, TableRef,
};
use shard_sql_core::Statement;

// ===================================================================
// Projection
// ===================================================================

#[test]
fn select_wildcards() {
    let q = parse_select("SELECT *, t.*, db.t.* FROM t");
    let select = select_core(&q);
    assert_eq!(select.projection.len(), 3);
    assert_eq!(select.projection[0], SelectItem::Wildcard);
    assert_eq!(
        select.projection[1],
        SelectItem::QualifiedWildcard(ObjectName::from_parts(&["t"]))
    );
    assert_eq!(
        select.projection[2],
        SelectItem::QualifiedWildcard(ObjectName::from_parts(&["db", "t"]))
    );
    round_trip("SELECT *, t.*, db.t.* FROM t");
}

#[test]
fn select_aliases() {
    let q = parse_select("SELECT a AS x, b y, c 'z' FROM t");
    let aliases: Vec<_> = select_core(&q)
        .projection
        .iter()
        .map(|item| match item {
            SelectItem::Expr { alias, .. } => alias.as_ref().map(|a| a.value.clone()),
            other => panic!("Expected expression item, got {other:?}"),
        })
        .collect();
    assert_eq!(
        aliases,
        vec![Some("x".to_string()), Some("y".to_string()), Some("z".to_string())]
    );
}

#[test]
fn select_distinct_and_all() {
    let q = parse_select("SELECT DISTINCT a FROM t");
    assert_eq!(select_core(&q).quantifier, Some(SetQuantifier::Distinct));
    let q = parse_select("SELECT ALL a FROM t");
    assert_eq!(select_core(&q).quantifier, Some(SetQuantifier::All));
    let q = parse_select("SELECT a FROM t");
    assert_eq!(select_core(&q).quantifier, None);
}

#[test]
fn select_without_from() {
    let q = parse_select("SELECT 1 + 1");
    assert!(select_core(&q).from.is_empty());
    round_trip("SELECT 1 + 1");
}

#[test]
fn select_into() {
    let q = parse_select("SELECT a INTO archive FROM t");
    assert_eq!(select_core(&q).into, Some(ObjectName::from_parts(&["archive"])));
    round_trip("SELECT a INTO archive FROM t");
}

#[test]
fn alias_assignment_needs_dialect_support() {
    let Statement::Select(q) = parse_with("SELECT total = a + b FROM t", &BracketDialect) else {
        panic!("Expected SELECT");
    };
    assert!(matches!(
        &select_core(&q).projection[0],
        SelectItem::AliasAssignment { alias, .. } if alias.value == "total"
    ));

    // Without it the same text is a comparison.
    let q = parse_select("SELECT total = a + b FROM t");
    assert!(matches!(
        &select_core(&q).projection[0],
        SelectItem::Expr { expr: Expr::Binary { .. }, alias: None }
    ));
}

#[test]
fn variable_assignment() {
    let Statement::Select(q) = parse_with("SELECT @n = COUNT(*) FROM t", &BracketDialect) else {
        panic!("Expected SELECT");
    };
    assert!(matches!(
        &select_core(&q).projection[0],
        SelectItem::VariableAssignment { variable, .. } if variable == "@n"
    ));
    round_trip_with("SELECT @n = COUNT(*) FROM t", &BracketDialect);
}

// ===================================================================
// TOP
// ===================================================================

#[test]
fn top_clause() {
    let Statement::Select(q) = parse_with("SELECT TOP (10) PERCENT WITH TIES a FROM t ORDER BY a", &BracketDialect)
    else {
        panic!("Expected SELECT");
    };
    let top = select_core(&q).top.as_ref().expect("TOP clause");
    assert!(top.parenthesized);
    assert!(top.percent);
    assert!(top.with_ties);
    assert_eq!(top.quantity, Expr::integer(10));
    round_trip_with("SELECT TOP (10) PERCENT WITH TIES a FROM t ORDER BY a", &BracketDialect);
}

#[test]
fn top_without_parentheses() {
    let Statement::Select(q) = parse_with("SELECT TOP 5 a FROM t", &BracketDialect) else {
        panic!("Expected SELECT");
    };
    let top = select_core(&q).top.as_ref().expect("TOP clause");
    assert!(!top.parenthesized);
    assert!(!top.percent);
}

#[test]
fn top_is_a_column_in_generic() {
    let q = parse_select("SELECT top FROM t");
    assert!(select_core(&q).top.is_none());
    assert_eq!(select_core(&q).projection.len(), 1);
}

// ===================================================================
// FROM and joins
// ===================================================================

#[test]
fn multi_part_table_names() {
    let q = parse_select("SELECT * FROM srv.db.dbo.t");
    let TableRef::Table { name, .. } = &select_core(&q).from[0] else {
        panic!("Expected table");
    };
    assert_eq!(*name, ObjectName::from_parts(&["srv", "db", "dbo", "t"]));
}

#[test]
fn comma_separated_tables() {
    let q = parse_select("SELECT * FROM a, b AS x, c");
    assert_eq!(select_core(&q).from.len(), 3);
    round_trip("SELECT * FROM a, b AS x, c");
}

#[test]
fn joins_are_left_deep() {
    let q = parse_select("SELECT * FROM a JOIN b ON a.id = b.id LEFT JOIN c ON b.id = c.id");
    let TableRef::Join {
        left, join_type, right, ..
    } = &select_core(&q).from[0]
    else {
        panic!("Expected join");
    };
    assert_eq!(*join_type, JoinType::Left);
    assert!(matches!(right.as_ref(), TableRef::Table { .. }));
    assert!(matches!(
        left.as_ref(),
        TableRef::Join {
            join_type: JoinType::Inner,
            ..
        }
    ));
    round_trip("SELECT * FROM a JOIN b ON a.id = b.id LEFT JOIN c ON b.id = c.id");
}

#[test]
fn join_kinds() {
    for (sql, expected) in [
        ("SELECT * FROM a INNER JOIN b ON a.x = b.x", JoinType::Inner),
        ("SELECT * FROM a RIGHT OUTER JOIN b ON a.x = b.x", JoinType::Right),
        ("SELECT * FROM a FULL JOIN b ON a.x = b.x", JoinType::Full),
        ("SELECT * FROM a CROSS JOIN b", JoinType::Cross),
        ("SELECT * FROM a CROSS APPLY f(a.x)", JoinType::CrossApply),
        ("SELECT * FROM a OUTER APPLY f(a.x)", JoinType::OuterApply),
    ] {
        let q = parse_select(sql);
        let TableRef::Join { join_type, .. } = &select_core(&q).from[0] else {
            panic!("Expected join for {sql}");
        };
        assert_eq!(*join_type, expected, "{sql}");
        round_trip(sql);
    }
}

#[test]
fn join_using() {
    let q = parse_select("SELECT * FROM a JOIN b USING (id, k)");
    let TableRef::Join {
        constraint: Some(JoinConstraint::Using(columns)),
        ..
    } = &select_core(&q).from[0]
    else {
        panic!("Expected USING join");
    };
    assert_eq!(columns.len(), 2);
}

#[test]
fn derived_table_with_column_aliases() {
    let q = parse_select("SELECT d.x FROM (SELECT 1) AS d (x)");
    let TableRef::Derived { alias, .. } = &select_core(&q).from[0] else {
        panic!("Expected derived table");
    };
    let alias = alias.as_ref().expect("alias");
    assert_eq!(alias.name.value, "d");
    assert_eq!(alias.columns.len(), 1);
}

#[test]
fn nested_join_in_parentheses() {
    let q = parse_select("SELECT * FROM (a JOIN b ON a.id = b.id)");
    assert!(matches!(&select_core(&q).from[0], TableRef::Nested(inner) if matches!(inner.as_ref(), TableRef::Join { .. })));
    round_trip("SELECT * FROM (a JOIN b ON a.id = b.id)");
}

#[test]
fn doubly_parenthesized_derived_table() {
    let q = parse_select("SELECT * FROM ((SELECT 1 AS x)) AS d");
    assert!(matches!(&select_core(&q).from[0], TableRef::Derived { .. }));
}

#[test]
fn table_valued_function() {
    let q = parse_select("SELECT * FROM dbo.split('a,b', ',') AS s");
    let TableRef::Function { name, args, alias } = &select_core(&q).from[0] else {
        panic!("Expected table function");
    };
    assert_eq!(*name, ObjectName::from_parts(&["dbo", "split"]));
    assert_eq!(args.len(), 2);
    assert!(alias.is_some());
}

#[test]
fn table_hints() {
    let Statement::Select(q) = parse_with("SELECT * FROM t AS x WITH (NOLOCK, INDEX(ix_a))", &BracketDialect) else {
        panic!("Expected SELECT");
    };
    let TableRef::Table { hints, alias, .. } = &select_core(&q).from[0] else {
        panic!("Expected table");
    };
    assert_eq!(alias.as_ref().map(|a| a.name.value.as_str()), Some("x"));
    assert_eq!(hints.len(), 2);
    assert!(hints[0].name.value.eq_ignore_ascii_case("nolock"));
    assert_eq!(hints[1].args.len(), 1);
    round_trip_with("SELECT * FROM t AS x WITH (NOLOCK, INDEX(ix_a))", &BracketDialect);
}

// ===================================================================
// WHERE, GROUP BY, HAVING
// ===================================================================

#[test]
fn group_by_with_rollup() {
    let q = parse_select("SELECT a, COUNT(*) FROM t GROUP BY a WITH ROLLUP");
    let select = select_core(&q);
    assert_eq!(select.group_by.len(), 1);
    assert_eq!(select.group_by_modifier, Some(GroupByModifier::Rollup));
    round_trip("SELECT a, COUNT(*) FROM t GROUP BY a WITH ROLLUP");
}

#[test]
fn where_and_having() {
    let q = parse_select("SELECT a FROM t WHERE b > 1 GROUP BY a HAVING COUNT(*) > 2");
    let select = select_core(&q);
    assert!(select.selection.is_some());
    assert!(select.having.is_some());
}

// ===================================================================
// Set operations
// ===================================================================

#[test]
fn intersect_binds_tighter_than_union() {
    let q = parse_select("SELECT 1 UNION SELECT 2 INTERSECT SELECT 3");
    let SetExpr::SetOperation { op, right, .. } = &q.body else {
        panic!("Expected set operation");
    };
    assert_eq!(*op, SetOperator::Union);
    assert!(matches!(
        right.as_ref(),
        SetExpr::SetOperation {
            op: SetOperator::Intersect,
            ..
        }
    ));
    round_trip("SELECT 1 UNION SELECT 2 INTERSECT SELECT 3");
}

#[test]
fn union_all_and_except_are_left_associative() {
    let q = parse_select("SELECT 1 UNION ALL SELECT 2 EXCEPT SELECT 3");
    let SetExpr::SetOperation { op, left, all, .. } = &q.body else {
        panic!("Expected set operation");
    };
    assert_eq!(*op, SetOperator::Except);
    assert!(!all);
    assert!(matches!(
        left.as_ref(),
        SetExpr::SetOperation {
            op: SetOperator::Union,
            all: true,
            ..
        }
    ));
}

#[test]
fn parenthesized_set_operand() {
    round_trip("(SELECT 1) UNION (SELECT 2)");
    round_trip("SELECT a FROM t UNION SELECT b FROM u ORDER BY 1");
}

// ===================================================================
// CTEs, ORDER BY, paging, OPTION
// ===================================================================

#[test]
fn common_table_expressions() {
    let q = parse_select("WITH a (x) AS (SELECT 1), b AS (SELECT x FROM a) SELECT * FROM b");
    let with = q.with.as_ref().expect("WITH clause");
    assert_eq!(with.ctes.len(), 2);
    assert_eq!(with.ctes[0].name.value, "a");
    assert_eq!(with.ctes[0].columns.len(), 1);
    assert!(with.ctes[1].columns.is_empty());
    round_trip("WITH a (x) AS (SELECT 1), b AS (SELECT x FROM a) SELECT * FROM b");
}

#[test]
fn order_by_directions() {
    let q = parse_select("SELECT a FROM t ORDER BY a DESC, b ASC, c");
    let directions: Vec<_> = q.order_by.iter().map(|o| o.asc).collect();
    assert_eq!(directions, vec![Some(false), Some(true), None]);
}

#[test]
fn offset_fetch() {
    let q = parse_select("SELECT a FROM t ORDER BY a OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY");
    let limit = q.limit.as_ref().expect("paging");
    assert_eq!(limit.style, LimitStyle::OffsetFetch);
    assert_eq!(limit.offset, Some(Expr::integer(10)));
    assert_eq!(limit.row_count, Some(Expr::integer(5)));
    round_trip("SELECT a FROM t ORDER BY a OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY");
}

#[test]
fn limit_offset() {
    let q = parse_select("SELECT a FROM t LIMIT 10 OFFSET 20");
    let limit = q.limit.as_ref().expect("paging");
    assert_eq!(limit.style, LimitStyle::LimitOffset);
    assert_eq!(limit.row_count, Some(Expr::integer(10)));
    assert_eq!(limit.offset, Some(Expr::integer(20)));
}

#[test]
fn query_hints() {
    let q = parse_select("SELECT a FROM t OPTION (RECOMPILE, MAXDOP 1)");
    assert_eq!(q.hints.len(), 2);
    assert_eq!(q.hints[1].args.len(), 1);
    round_trip("SELECT a FROM t OPTION (RECOMPILE, MAXDOP 1)");
}
