//! Tests for CREATE, ALTER, DROP, TRUNCATE, USE and transaction statements.

mod common;
use common::*;

use shard_sql_core::ast::{
    AlterTableOperation, CharLength, ColumnOption, DataType, Expr, Ident, IndexColumn, ObjectName,
    ReferentialAction, TableConstraintKind, TableElement, TransactionStatement,
};
use shard_sql_core::Statement;

// ===================================================================
// CREATE TABLE
// ===================================================================

#[test]
fn create_table_columns_and_options() {
    let sql = "CREATE TABLE dbo.orders (\
               id INT IDENTITY(1, 1) PRIMARY KEY, \
               email NVARCHAR(MAX) NOT NULL, \
               amount DECIMAL(10, 2) NULL CHECK (amount >= 0), \
               created DATETIME2(3) DEFAULT GETDATE())";
    let Statement::CreateTable(create) = parse(sql) else {
        panic!("Expected CREATE TABLE");
    };
    assert_eq!(create.name, ObjectName::from_parts(&["dbo", "orders"]));
    assert_eq!(create.columns.len(), 4);

    let id = &create.columns[0];
    assert_eq!(id.name, Ident::new("id"));
    assert_eq!(id.data_type, DataType::Int);
    assert_eq!(
        id.constraints[0].option,
        ColumnOption::Identity {
            seed: Some(Expr::integer(1)),
            increment: Some(Expr::integer(1)),
        }
    );
    assert_eq!(id.constraints[1].option, ColumnOption::PrimaryKey { clustered: None });

    assert_eq!(create.columns[1].data_type, DataType::NVarChar(Some(CharLength::Max)));
    assert_eq!(create.columns[1].constraints[0].option, ColumnOption::NotNull);
    assert_eq!(
        create.columns[2].data_type,
        DataType::Decimal {
            precision: Some(10),
            scale: Some(2)
        }
    );
    assert!(matches!(create.columns[2].constraints[1].option, ColumnOption::Check(_)));
    assert_eq!(create.columns[3].data_type, DataType::DateTime2(Some(3)));
    assert!(matches!(create.columns[3].constraints[0].option, ColumnOption::Default(Expr::Function(_))));
    round_trip(sql);
}

#[test]
fn create_table_constraints() {
    let sql = "CREATE TABLE lines (\
               order_id INT NOT NULL, \
               line INT NOT NULL, \
               qty INT, \
               CONSTRAINT pk_lines PRIMARY KEY CLUSTERED (order_id, line DESC), \
               UNIQUE (qty), \
               CONSTRAINT fk_order FOREIGN KEY (order_id) REFERENCES orders (id) ON DELETE CASCADE ON UPDATE NO ACTION, \
               CHECK (qty > 0))";
    let Statement::CreateTable(create) = parse(sql) else {
        panic!("Expected CREATE TABLE");
    };
    assert_eq!(create.columns.len(), 3);
    assert_eq!(create.constraints.len(), 4);

    let primary = &create.constraints[0];
    assert_eq!(primary.name, Some(Ident::new("pk_lines")));
    assert_eq!(
        primary.kind,
        TableConstraintKind::PrimaryKey {
            clustered: Some(true),
            columns: vec![
                IndexColumn {
                    name: Ident::new("order_id"),
                    asc: None,
                },
                IndexColumn {
                    name: Ident::new("line"),
                    asc: Some(false),
                },
            ],
        }
    );
    assert!(create.constraints[1].name.is_none());

    let TableConstraintKind::ForeignKey {
        columns,
        foreign_table,
        referred_columns,
        on_delete,
        on_update,
    } = &create.constraints[2].kind
    else {
        panic!("Expected FOREIGN KEY");
    };
    assert_eq!(columns, &vec![Ident::new("order_id")]);
    assert_eq!(foreign_table, &ObjectName::from_parts(&["orders"]));
    assert_eq!(referred_columns, &vec![Ident::new("id")]);
    assert_eq!(*on_delete, Some(ReferentialAction::Cascade));
    assert_eq!(*on_update, Some(ReferentialAction::NoAction));
    assert!(matches!(create.constraints[3].kind, TableConstraintKind::Check(_)));
    round_trip(sql);
}

#[test]
fn column_references_and_named_constraint() {
    let sql = "CREATE TABLE child (parent_id INT CONSTRAINT fk_parent REFERENCES parent (id) ON DELETE SET NULL)";
    let Statement::CreateTable(create) = parse(sql) else {
        panic!("Expected CREATE TABLE");
    };
    let constraint = &create.columns[0].constraints[0];
    assert_eq!(constraint.name, Some(Ident::new("fk_parent")));
    assert!(matches!(
        &constraint.option,
        ColumnOption::References {
            on_delete: Some(ReferentialAction::SetNull),
            on_update: None,
            ..
        }
    ));
    round_trip(sql);
}

#[test]
fn data_types() {
    let cases = [
        ("BIT", DataType::Bit),
        ("bigint", DataType::BigInt),
        ("VARCHAR(50)", DataType::VarChar(Some(CharLength::Fixed(50)))),
        ("NCHAR", DataType::NChar(None)),
        ("FLOAT(24)", DataType::Float(Some(24))),
        ("DOUBLE PRECISION", DataType::DoublePrecision),
        ("UNIQUEIDENTIFIER", DataType::UniqueIdentifier),
        ("VARBINARY(MAX)", DataType::VarBinary(Some(CharLength::Max))),
    ];
    for (ty, expected) in cases {
        let Statement::CreateTable(create) = parse(&format!("CREATE TABLE t (c {ty})")) else {
            panic!("Expected CREATE TABLE");
        };
        assert_eq!(create.columns[0].data_type, expected, "type {ty}");
    }
}

#[test]
fn custom_data_type() {
    let Statement::CreateTable(create) = parse("CREATE TABLE t (c dbo.money_code)") else {
        panic!("Expected CREATE TABLE");
    };
    assert!(matches!(
        &create.columns[0].data_type,
        DataType::Custom { name, args } if name.0.len() == 2 && args.is_empty()
    ));
}

#[test]
fn create_table_requires_elements() {
    let _ = parse_err("CREATE TABLE t ()");
    let _ = parse_err("CREATE TABLE t (a INT,)");
}

// ===================================================================
// CREATE INDEX
// ===================================================================

#[test]
fn create_index_forms() {
    let Statement::CreateIndex(index) = parse("CREATE INDEX ix_a ON t (a)") else {
        panic!("Expected CREATE INDEX");
    };
    assert!(!index.unique);
    assert!(index.clustered.is_none());
    assert_eq!(index.name, Ident::new("ix_a"));

    let sql = "CREATE UNIQUE NONCLUSTERED INDEX ux_email ON customers (email ASC) INCLUDE (id, created) WHERE email IS NOT NULL";
    let Statement::CreateIndex(index) = parse(sql) else {
        panic!("Expected CREATE INDEX");
    };
    assert!(index.unique);
    assert_eq!(index.clustered, Some(false));
    assert_eq!(index.columns[0].asc, Some(true));
    assert_eq!(index.include.len(), 2);
    assert!(index.predicate.is_some());
    round_trip(sql);
}

#[test]
fn create_needs_table_or_index() {
    let err = parse_err("CREATE VIEW v AS SELECT 1");
    assert_eq!(err.position(), Some(7));
}

// ===================================================================
// DROP / TRUNCATE / USE
// ===================================================================

#[test]
fn drop_table() {
    let Statement::DropTable(drop) = parse("DROP TABLE IF EXISTS a, dbo.b") else {
        panic!("Expected DROP TABLE");
    };
    assert!(drop.if_exists);
    assert_eq!(drop.names.len(), 2);

    let Statement::DropTable(drop) = parse("DROP TABLE a") else {
        panic!("Expected DROP TABLE");
    };
    assert!(!drop.if_exists);
}

#[test]
fn drop_index() {
    let Statement::DropIndex(drop) = parse("DROP INDEX ix_a ON t") else {
        panic!("Expected DROP INDEX");
    };
    assert_eq!(drop.name, ObjectName::from_parts(&["ix_a"]));
    assert_eq!(drop.table, Some(ObjectName::from_parts(&["t"])));

    let Statement::DropIndex(drop) = parse("DROP INDEX t.ix_a") else {
        panic!("Expected DROP INDEX");
    };
    assert_eq!(drop.name, ObjectName::from_parts(&["t", "ix_a"]));
    assert!(drop.table.is_none());
    round_trip("DROP INDEX IF EXISTS ix_a ON t");
}

#[test]
fn truncate_and_use() {
    assert_eq!(
        parse("TRUNCATE TABLE dbo.logs"),
        Statement::Truncate {
            table: ObjectName::from_parts(&["dbo", "logs"])
        }
    );
    assert_eq!(
        parse("use sales"),
        Statement::Use {
            database: Ident::new("sales")
        }
    );
    let _ = parse_err("TRUNCATE dbo.logs");
}

// ===================================================================
// ALTER TABLE
// ===================================================================

#[test]
fn alter_table_add() {
    let Statement::AlterTable(alter) = parse("ALTER TABLE dbo.t ADD c INT NULL, CONSTRAINT pk PRIMARY KEY (id)") else {
        panic!("Expected ALTER TABLE");
    };
    assert_eq!(alter.name, ObjectName::from_parts(&["dbo", "t"]));
    let AlterTableOperation::Add(elements) = &alter.operation else {
        panic!("Expected ADD, got {:?}", alter.operation);
    };
    assert!(matches!(&elements[0], TableElement::Column(c) if c.data_type == DataType::Int));
    assert!(matches!(
        &elements[1],
        TableElement::Constraint(c) if matches!(c.kind, TableConstraintKind::PrimaryKey { .. })
    ));
    assert_eq!(
        alter.to_string(),
        "ALTER TABLE dbo.t ADD c INT NULL, CONSTRAINT pk PRIMARY KEY (id)"
    );
}

#[test]
fn alter_table_alter_column() {
    let Statement::AlterTable(alter) = parse("alter table t alter column title nvarchar(100) not null") else {
        panic!("Expected ALTER TABLE");
    };
    assert_eq!(
        alter.operation,
        AlterTableOperation::AlterColumn {
            name: Ident::new("title"),
            data_type: DataType::NVarChar(Some(CharLength::Fixed(100))),
            nullable: Some(false),
        }
    );
    assert_eq!(alter.to_string(), "ALTER TABLE t ALTER COLUMN title NVARCHAR(100) NOT NULL");
    round_trip("ALTER TABLE t ALTER COLUMN title VARCHAR(10)");
}

#[test]
fn alter_table_drop() {
    let Statement::AlterTable(alter) = parse("ALTER TABLE t DROP COLUMN IF EXISTS a, b") else {
        panic!("Expected ALTER TABLE");
    };
    assert_eq!(
        alter.operation,
        AlterTableOperation::DropColumns {
            if_exists: true,
            names: vec![Ident::new("a"), Ident::new("b")],
        }
    );
    assert_eq!(
        parse("ALTER TABLE t DROP ck_a").to_string(),
        "ALTER TABLE t DROP CONSTRAINT ck_a"
    );
    round_trip("ALTER TABLE t DROP CONSTRAINT IF EXISTS ck_a, ck_b");
}

#[test]
fn alter_table_needs_a_change() {
    assert_eq!(parse_err("ALTER TABLE t RENAME x").position(), Some(14));
    assert_eq!(parse_err("ALTER t ADD c INT").position(), Some(6));
}

// ===================================================================
// Views
// ===================================================================

#[test]
fn create_view() {
    let sql = "create or alter view dbo.v (a, b) as select x, y from t where x > 0 with check option";
    let Statement::CreateView { or_alter, view } = parse(sql) else {
        panic!("Expected CREATE VIEW");
    };
    assert!(or_alter);
    assert!(view.check_option);
    assert_eq!(view.columns, [Ident::new("a"), Ident::new("b")]);
    assert_eq!(
        parse(sql).to_string(),
        "CREATE OR ALTER VIEW dbo.v (a, b) AS SELECT x, y FROM t WHERE x > 0 WITH CHECK OPTION"
    );
    round_trip("CREATE VIEW v AS WITH c AS (SELECT 1 AS one) SELECT one FROM c");
}

#[test]
fn alter_and_drop_view() {
    let Statement::AlterView(view) = parse("ALTER VIEW v AS SELECT a FROM t UNION ALL SELECT a FROM u") else {
        panic!("Expected ALTER VIEW");
    };
    assert_eq!(view.name, ObjectName::from_parts(&["v"]));
    assert!(!view.check_option);

    let Statement::DropView(drop) = parse("DROP VIEW IF EXISTS v, dbo.w") else {
        panic!("Expected DROP VIEW");
    };
    assert!(drop.if_exists);
    assert_eq!(drop.names.len(), 2);
    round_trip("DROP VIEW v");
}

#[test]
fn view_needs_a_query() {
    assert_eq!(parse_err("CREATE VIEW v AS t").position(), Some(17));
    assert_eq!(parse_err("CREATE OR REPLACE VIEW v AS SELECT 1").position(), Some(10));
}

// ===================================================================
// Transactions
// ===================================================================

#[test]
fn transaction_statements() {
    assert_eq!(
        parse("BEGIN TRAN t1"),
        Statement::Transaction(TransactionStatement::Begin {
            name: Some(Ident::new("t1"))
        })
    );
    assert_eq!(
        parse("BEGIN TRANSACTION"),
        Statement::Transaction(TransactionStatement::Begin { name: None })
    );
    assert_eq!(
        parse("COMMIT"),
        Statement::Transaction(TransactionStatement::Commit { name: None })
    );
    assert_eq!(
        parse("ROLLBACK TRANSACTION sp1"),
        Statement::Transaction(TransactionStatement::Rollback {
            name: Some(Ident::new("sp1"))
        })
    );
    assert_eq!(
        parse("SAVE TRANSACTION sp1"),
        Statement::Transaction(TransactionStatement::Save {
            name: Ident::new("sp1")
        })
    );
    round_trip("COMMIT TRANSACTION");
}

#[test]
fn begin_requires_tran() {
    let _ = parse_err("BEGIN SELECT 1");
}

#[test]
fn commit_work_takes_no_name() {
    let trees = shard_sql_core::parse_sql("COMMIT WORK; SELECT 1", &shard_sql_core::GenericDialect).unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(
        trees[0],
        Statement::Transaction(TransactionStatement::Commit { name: None })
    );
}
