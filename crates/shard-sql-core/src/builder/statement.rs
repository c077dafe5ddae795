use super::expr::data_type;
use super::{
    column_list, ident_from_token, idents, last_ident, malformed, nth_tree, object_name, required_child,
    AstBuilder, BuildResult,
};
use crate::ast::{
    AlterTable, AlterTableOperation, Assignment, AssignmentTarget, ColumnConstraint, ColumnDef, ColumnOption,
    CreateIndex, CreateTable, Delete, DropIndex, DropTable, DropView, ExecArg, ExecTarget, Execute, Ident,
    IndexColumn, Insert, InsertSource, Merge, MergeAction, MergeClause, MergeMatch, ObjectName, OutputClause,
    OutputTarget, ReferentialAction, Statement, TableConstraint, TableConstraintKind, TableElement,
    TransactionStatement, Update, ViewDefinition,
};
use crate::lexer::{Keyword, Token, TokenKind};
use crate::parser::{ParseTree, Rule};

impl AstBuilder {
    pub(super) fn statement(&self, tree: &ParseTree) -> BuildResult<Statement> {
        Ok(match tree.rule {
            Rule::Query => Statement::Select(Box::new(self.query(tree)?)),
            Rule::Insert => Statement::Insert(Box::new(self.insert(tree)?)),
            Rule::Update => Statement::Update(Box::new(self.update(tree)?)),
            Rule::Delete => Statement::Delete(Box::new(self.delete(tree)?)),
            Rule::Merge => Statement::Merge(Box::new(self.merge(tree)?)),
            Rule::Exec => Statement::Execute(Box::new(self.execute(tree)?)),
            Rule::CreateTable => Statement::CreateTable(Box::new(self.create_table(tree)?)),
            Rule::CreateIndex => Statement::CreateIndex(Box::new(self.create_index(tree)?)),
            Rule::DropTable => Statement::DropTable(DropTable {
                if_exists: tree.has_keyword(Keyword::If),
                names: object_names(tree)?,
            }),
            Rule::DropView => Statement::DropView(DropView {
                if_exists: tree.has_keyword(Keyword::If),
                names: object_names(tree)?,
            }),
            Rule::AlterTable => Statement::AlterTable(Box::new(self.alter_table(tree)?)),
            Rule::CreateView => Statement::CreateView {
                or_alter: tree.has_keyword(Keyword::Alter),
                view: Box::new(self.view(tree)?),
            },
            Rule::AlterView => Statement::AlterView(Box::new(self.view(tree)?)),
            Rule::DropIndex => Statement::DropIndex(DropIndex {
                if_exists: tree.has_keyword(Keyword::If),
                name: object_name(nth_tree(tree, 0)?)?,
                table: tree.trees().nth(1).map(object_name).transpose()?,
            }),
            Rule::Truncate => Statement::Truncate {
                table: object_name(required_child(tree, Rule::ObjectName)?)?,
            },
            Rule::Use => Statement::Use {
                database: last_ident(tree)?,
            },
            Rule::Transaction => Statement::Transaction(transaction(tree)?),
            _ => return Err(malformed(tree, "not a statement")),
        })
    }

    fn insert(&self, tree: &ParseTree) -> BuildResult<Insert> {
        let source = if let Some(values) = tree.child(Rule::ValuesClause) {
            InsertSource::Values(
                values
                    .children_of(Rule::ValuesRow)
                    .map(|row| self.exprs(row.trees()))
                    .collect::<BuildResult<_>>()?,
            )
        } else if let Some(exec) = tree.child(Rule::Exec) {
            InsertSource::Execute(Box::new(self.execute(exec)?))
        } else if let Some(query) = tree.child(Rule::Query) {
            InsertSource::Query(Box::new(self.query(query)?))
        } else if tree.has_keyword(Keyword::Default) {
            InsertSource::DefaultValues
        } else {
            return Err(malformed(tree, "missing insert source"));
        };
        Ok(Insert {
            with: tree.child(Rule::WithClause).map(|w| self.with_clause(w)).transpose()?,
            top: tree.child(Rule::TopClause).map(|t| self.top(t)).transpose()?,
            table: object_name(required_child(tree, Rule::ObjectName)?)?,
            columns: column_list(tree.child(Rule::ColumnList)),
            output: tree.child(Rule::OutputClause).map(|o| self.output(o)).transpose()?,
            source,
        })
    }

    fn output(&self, tree: &ParseTree) -> BuildResult<OutputClause> {
        let items = tree
            .trees()
            .filter(|t| !matches!(t.rule, Rule::ObjectName | Rule::ColumnList))
            .map(|item| self.select_item(item))
            .collect::<BuildResult<_>>()?;
        let into = match tree.child(Rule::ObjectName) {
            Some(target) => match target.tokens().next().map(|t| &t.kind) {
                Some(TokenKind::Variable(name)) => Some(OutputTarget::Variable(name.clone())),
                _ => Some(OutputTarget::Table(object_name(target)?)),
            },
            None => None,
        };
        Ok(OutputClause {
            items,
            into,
            into_columns: column_list(tree.child(Rule::ColumnList)),
        })
    }

    /// The table operand of UPDATE and DELETE.
    fn dml_target<'t>(tree: &'t ParseTree) -> BuildResult<&'t ParseTree> {
        tree.trees()
            .find(|t| !matches!(t.rule, Rule::WithClause | Rule::TopClause))
            .ok_or_else(|| malformed(tree, "missing target table"))
    }

    fn update(&self, tree: &ParseTree) -> BuildResult<Update> {
        Ok(Update {
            with: tree.child(Rule::WithClause).map(|w| self.with_clause(w)).transpose()?,
            top: tree.child(Rule::TopClause).map(|t| self.top(t)).transpose()?,
            table: self.table_ref(Self::dml_target(tree)?)?,
            assignments: self.assignments(tree)?,
            output: tree.child(Rule::OutputClause).map(|o| self.output(o)).transpose()?,
            from: self.from_clause(tree.child(Rule::FromClause))?,
            selection: self.where_clause(tree.child(Rule::WhereClause))?,
        })
    }

    fn delete(&self, tree: &ParseTree) -> BuildResult<Delete> {
        Ok(Delete {
            with: tree.child(Rule::WithClause).map(|w| self.with_clause(w)).transpose()?,
            top: tree.child(Rule::TopClause).map(|t| self.top(t)).transpose()?,
            table: self.table_ref(Self::dml_target(tree)?)?,
            output: tree.child(Rule::OutputClause).map(|o| self.output(o)).transpose()?,
            from: self.from_clause(tree.child(Rule::FromClause))?,
            selection: self.where_clause(tree.child(Rule::WhereClause))?,
        })
    }

    fn assignments(&self, tree: &ParseTree) -> BuildResult<Vec<Assignment>> {
        tree.children_of(Rule::Assignment)
            .map(|assignment| {
                let target_tree = nth_tree(assignment, 0)?;
                let target = match target_tree.rule {
                    Rule::Variable => match target_tree.tokens().next().map(|t| &t.kind) {
                        Some(TokenKind::Variable(name)) => AssignmentTarget::Variable(name.clone()),
                        _ => return Err(malformed(target_tree, "expected a variable")),
                    },
                    _ => AssignmentTarget::Column(object_name(target_tree)?),
                };
                Ok(Assignment {
                    target,
                    value: self.expr(nth_tree(assignment, 1)?)?,
                })
            })
            .collect()
    }

    fn merge(&self, tree: &ParseTree) -> BuildResult<Merge> {
        let mut operands = tree
            .trees()
            .filter(|t| !matches!(t.rule, Rule::WithClause | Rule::MergeWhen | Rule::OutputClause));
        let mut next_operand = || operands.next().ok_or_else(|| malformed(tree, "missing MERGE operand"));
        let target = self.table_ref(next_operand()?)?;
        let source = self.table_ref(next_operand()?)?;
        let on = self.expr(next_operand()?)?;
        let clauses = tree
            .children_of(Rule::MergeWhen)
            .map(|clause| self.merge_clause(clause))
            .collect::<BuildResult<_>>()?;
        Ok(Merge {
            with: tree.child(Rule::WithClause).map(|w| self.with_clause(w)).transpose()?,
            target,
            source,
            on,
            clauses,
            output: tree.child(Rule::OutputClause).map(|o| self.output(o)).transpose()?,
        })
    }

    fn merge_clause(&self, tree: &ParseTree) -> BuildResult<MergeClause> {
        let kind = if !tree.has_keyword(Keyword::Not) {
            MergeMatch::Matched
        } else if tree.has_keyword(Keyword::Source) {
            MergeMatch::NotMatchedBySource
        } else {
            MergeMatch::NotMatchedByTarget
        };
        let condition = if tree.has_keyword(Keyword::And) {
            Some(self.expr(nth_tree(tree, 0)?)?)
        } else {
            None
        };
        let action = if tree.has_keyword(Keyword::Update) {
            MergeAction::Update(self.assignments(tree)?)
        } else if tree.has_keyword(Keyword::Delete) {
            MergeAction::Delete
        } else if tree.has_keyword(Keyword::Insert) {
            MergeAction::Insert {
                columns: column_list(tree.child(Rule::ColumnList)),
                values: tree
                    .child(Rule::ValuesRow)
                    .map(|row| self.exprs(row.trees()))
                    .transpose()?,
            }
        } else {
            return Err(malformed(tree, "missing MERGE action"));
        };
        Ok(MergeClause {
            kind,
            condition,
            action,
        })
    }

    fn execute(&self, tree: &ParseTree) -> BuildResult<Execute> {
        if tree.has_token(&TokenKind::LeftParen) {
            return Ok(Execute {
                return_status: None,
                target: ExecTarget::Dynamic(self.expr(nth_tree(tree, 0)?)?),
                args: Vec::new(),
            });
        }
        let return_status = tree
            .child(Rule::Variable)
            .and_then(|status| status.tokens().next())
            .map(|token| token.lexeme.clone());
        let args = tree
            .children_of(Rule::ExecArg)
            .map(|arg| {
                let name = if arg.has_token(&TokenKind::Eq) {
                    arg.tokens().next().map(|t| t.lexeme.clone())
                } else {
                    None
                };
                Ok(ExecArg {
                    name,
                    value: self.expr(nth_tree(arg, 0)?)?,
                    output: arg.has_keyword(Keyword::Output) || arg.has_keyword(Keyword::Out),
                })
            })
            .collect::<BuildResult<_>>()?;
        Ok(Execute {
            return_status,
            target: ExecTarget::Procedure(object_name(required_child(tree, Rule::ObjectName)?)?),
            args,
        })
    }

    fn create_table(&self, tree: &ParseTree) -> BuildResult<CreateTable> {
        let columns = tree
            .children_of(Rule::ColumnDef)
            .map(|column| self.column_def(column))
            .collect::<BuildResult<_>>()?;
        let constraints = tree
            .children_of(Rule::TableConstraint)
            .map(|constraint| self.table_constraint(constraint))
            .collect::<BuildResult<_>>()?;
        Ok(CreateTable {
            name: object_name(required_child(tree, Rule::ObjectName)?)?,
            columns,
            constraints,
        })
    }

    fn alter_table(&self, tree: &ParseTree) -> BuildResult<AlterTable> {
        let change = tree
            .trees()
            .find(|t| matches!(t.rule, Rule::AlterTableAdd | Rule::AlterColumn | Rule::AlterTableDrop))
            .ok_or_else(|| malformed(tree, "missing table change"))?;
        let operation = match change.rule {
            Rule::AlterTableAdd => AlterTableOperation::Add(
                change
                    .trees()
                    .map(|element| match element.rule {
                        Rule::ColumnDef => self.column_def(element).map(TableElement::Column),
                        _ => self.table_constraint(element).map(TableElement::Constraint),
                    })
                    .collect::<BuildResult<_>>()?,
            ),
            Rule::AlterColumn => {
                let name = change
                    .tokens()
                    .nth(2)
                    .and_then(ident_from_token)
                    .ok_or_else(|| malformed(change, "missing column name"))?;
                let nullable = if change.has_keyword(Keyword::Not) {
                    Some(false)
                } else if change.has_keyword(Keyword::Null) {
                    Some(true)
                } else {
                    None
                };
                AlterTableOperation::AlterColumn {
                    name,
                    data_type: data_type(required_child(change, Rule::DataType)?)?,
                    nullable,
                }
            }
            _ => {
                let if_exists = change.has_keyword(Keyword::If);
                let names = idents(required_child(change, Rule::NameList)?);
                if change.has_keyword(Keyword::Column) {
                    AlterTableOperation::DropColumns { if_exists, names }
                } else {
                    AlterTableOperation::DropConstraints { if_exists, names }
                }
            }
        };
        Ok(AlterTable {
            name: object_name(required_child(tree, Rule::ObjectName)?)?,
            operation,
        })
    }

    fn view(&self, tree: &ParseTree) -> BuildResult<ViewDefinition> {
        Ok(ViewDefinition {
            name: object_name(required_child(tree, Rule::ObjectName)?)?,
            columns: column_list(tree.child(Rule::ColumnList)),
            query: Box::new(self.query(required_child(tree, Rule::Query)?)?),
            check_option: tree.has_keyword(Keyword::Check),
        })
    }

    fn column_def(&self, tree: &ParseTree) -> BuildResult<ColumnDef> {
        let name = tree
            .tokens()
            .next()
            .and_then(ident_from_token)
            .ok_or_else(|| malformed(tree, "missing column name"))?;
        let constraints = tree
            .children_of(Rule::ColumnConstraint)
            .map(|constraint| self.column_constraint(constraint))
            .collect::<BuildResult<_>>()?;
        Ok(ColumnDef {
            name,
            data_type: data_type(required_child(tree, Rule::DataType)?)?,
            constraints,
        })
    }

    fn column_constraint(&self, tree: &ParseTree) -> BuildResult<ColumnConstraint> {
        let (name, head) = constraint_head(tree)?;
        let option = match head {
            Keyword::Null => ColumnOption::Null,
            Keyword::Not => ColumnOption::NotNull,
            Keyword::Primary => ColumnOption::PrimaryKey {
                clustered: clustering(tree),
            },
            Keyword::Unique => ColumnOption::Unique {
                clustered: clustering(tree),
            },
            Keyword::Identity => ColumnOption::Identity {
                seed: tree.trees().next().map(|t| self.expr(t)).transpose()?,
                increment: tree.trees().nth(1).map(|t| self.expr(t)).transpose()?,
            },
            Keyword::Default => ColumnOption::Default(self.expr(nth_tree(tree, 0)?)?),
            Keyword::References => {
                let (on_delete, on_update) = referential_actions(tree)?;
                ColumnOption::References {
                    table: object_name(required_child(tree, Rule::ObjectName)?)?,
                    columns: column_list(tree.child(Rule::ColumnList)),
                    on_delete,
                    on_update,
                }
            }
            Keyword::Check => ColumnOption::Check(self.expr(nth_tree(tree, 0)?)?),
            _ => return Err(malformed(tree, "unknown column option")),
        };
        Ok(ColumnConstraint { name, option })
    }

    fn table_constraint(&self, tree: &ParseTree) -> BuildResult<TableConstraint> {
        let (name, head) = constraint_head(tree)?;
        let kind = match head {
            Keyword::Primary => TableConstraintKind::PrimaryKey {
                clustered: clustering(tree),
                columns: index_columns(tree)?,
            },
            Keyword::Unique => TableConstraintKind::Unique {
                clustered: clustering(tree),
                columns: index_columns(tree)?,
            },
            Keyword::Foreign => {
                let mut lists = tree.children_of(Rule::ColumnList);
                let columns = column_list(lists.next());
                let referred_columns = column_list(lists.next());
                let (on_delete, on_update) = referential_actions(tree)?;
                TableConstraintKind::ForeignKey {
                    columns,
                    foreign_table: object_name(required_child(tree, Rule::ObjectName)?)?,
                    referred_columns,
                    on_delete,
                    on_update,
                }
            }
            Keyword::Check => TableConstraintKind::Check(self.expr(nth_tree(tree, 0)?)?),
            _ => return Err(malformed(tree, "unknown table constraint")),
        };
        Ok(TableConstraint { name, kind })
    }

    fn create_index(&self, tree: &ParseTree) -> BuildResult<CreateIndex> {
        let name = tree
            .tokens()
            .skip_while(|t| !t.is_keyword(Keyword::Index))
            .nth(1)
            .and_then(ident_from_token)
            .ok_or_else(|| malformed(tree, "missing index name"))?;
        Ok(CreateIndex {
            unique: tree.has_keyword(Keyword::Unique),
            clustered: clustering(tree),
            name,
            table: object_name(required_child(tree, Rule::ObjectName)?)?,
            columns: index_columns(tree)?,
            include: column_list(tree.child(Rule::ColumnList)),
            predicate: self.where_clause(tree.child(Rule::WhereClause))?,
        })
    }
}

fn object_names(tree: &ParseTree) -> BuildResult<Vec<ObjectName>> {
    tree.children_of(Rule::ObjectName).map(object_name).collect()
}

/// Splits off `CONSTRAINT name` and returns the keyword opening the body.
fn constraint_head(tree: &ParseTree) -> BuildResult<(Option<Ident>, Keyword)> {
    let tokens: Vec<&Token> = tree.tokens().collect();
    let (name, rest) = match tokens.as_slice() {
        [first, name, rest @ ..] if first.is_keyword(Keyword::Constraint) => (ident_from_token(name), rest),
        rest => (None, rest),
    };
    let head = rest
        .first()
        .and_then(|t| t.as_keyword())
        .ok_or_else(|| malformed(tree, "missing constraint body"))?;
    Ok((name, head))
}

fn clustering(tree: &ParseTree) -> Option<bool> {
    if tree.has_keyword(Keyword::Clustered) {
        Some(true)
    } else if tree.has_keyword(Keyword::Nonclustered) {
        Some(false)
    } else {
        None
    }
}

fn index_columns(tree: &ParseTree) -> BuildResult<Vec<IndexColumn>> {
    tree.children_of(Rule::IndexColumn)
        .map(|column| {
            let name = column
                .tokens()
                .next()
                .and_then(ident_from_token)
                .ok_or_else(|| malformed(column, "missing column name"))?;
            let asc = if column.has_keyword(Keyword::Asc) {
                Some(true)
            } else if column.has_keyword(Keyword::Desc) {
                Some(false)
            } else {
                None
            };
            Ok(IndexColumn { name, asc })
        })
        .collect()
}

type Actions = (Option<ReferentialAction>, Option<ReferentialAction>);

fn referential_actions(tree: &ParseTree) -> BuildResult<Actions> {
    let mut on_delete = None;
    let mut on_update = None;
    for clause in tree.children_of(Rule::ReferentialAction) {
        let action = if clause.has_keyword(Keyword::Cascade) {
            ReferentialAction::Cascade
        } else if clause.has_keyword(Keyword::Restrict) {
            ReferentialAction::Restrict
        } else if clause.has_keyword(Keyword::No) {
            ReferentialAction::NoAction
        } else if clause.has_keyword(Keyword::Null) {
            ReferentialAction::SetNull
        } else if clause.has_keyword(Keyword::Default) {
            ReferentialAction::SetDefault
        } else {
            return Err(malformed(clause, "unknown referential action"));
        };
        if clause.has_keyword(Keyword::Delete) {
            on_delete = Some(action);
        } else {
            on_update = Some(action);
        }
    }
    Ok((on_delete, on_update))
}

fn transaction(tree: &ParseTree) -> BuildResult<TransactionStatement> {
    let has_tran = tree.has_keyword(Keyword::Tran) || tree.has_keyword(Keyword::Transaction);
    let name = if has_tran {
        tree.tokens().nth(2).and_then(ident_from_token)
    } else {
        None
    };
    match tree.tokens().next().and_then(Token::as_keyword) {
        Some(Keyword::Begin) => Ok(TransactionStatement::Begin { name }),
        Some(Keyword::Commit) => Ok(TransactionStatement::Commit { name }),
        Some(Keyword::Rollback) => Ok(TransactionStatement::Rollback { name }),
        Some(Keyword::Save) => name
            .map(|name| TransactionStatement::Save { name })
            .ok_or_else(|| malformed(tree, "SAVE TRANSACTION requires a name")),
        _ => Err(malformed(tree, "not a transaction statement")),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{
        ColumnOption, ExecTarget, InsertSource, MergeAction, MergeMatch, Statement, TableConstraintKind,
        TransactionStatement,
    };
    use crate::builder::build_statement;
    use crate::dialect::GenericDialect;
    use crate::parser::{Parser, ParserOptions};

    fn statement(sql: &str) -> Statement {
        let tree = Parser::from_sql(sql, &GenericDialect, ParserOptions::default())
            .unwrap()
            .parse_statement()
            .unwrap();
        build_statement(&tree).unwrap()
    }

    #[test]
    fn test_round_trip_display() {
        for sql in [
            "INSERT INTO t (a, b) VALUES (1, DEFAULT), (2, 3)",
            "INSERT INTO t DEFAULT VALUES",
            "INSERT INTO t SELECT * FROM u",
            "UPDATE t SET a = 1, b = b + 1 WHERE id = 2",
            "DELETE FROM t WHERE id = 2",
            "DROP TABLE IF EXISTS a, b",
            "TRUNCATE TABLE t",
        ] {
            assert_eq!(statement(sql).to_string(), sql);
        }
    }

    #[test]
    fn test_insert_sources() {
        let Statement::Insert(insert) = statement("INSERT INTO t VALUES (1, 2)") else {
            panic!("expected insert");
        };
        assert!(matches!(&insert.source, InsertSource::Values(rows) if rows.len() == 1 && rows[0].len() == 2));
    }

    #[test]
    fn test_merge_clauses() {
        let Statement::Merge(merge) = statement(
            "MERGE INTO t USING s ON t.id = s.id \
             WHEN MATCHED AND s.gone = 1 THEN DELETE \
             WHEN MATCHED THEN UPDATE SET v = s.v \
             WHEN NOT MATCHED THEN INSERT (id, v) VALUES (s.id, s.v) \
             WHEN NOT MATCHED BY SOURCE THEN DELETE",
        ) else {
            panic!("expected merge");
        };
        let kinds: Vec<_> = merge.clauses.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MergeMatch::Matched,
                MergeMatch::Matched,
                MergeMatch::NotMatchedByTarget,
                MergeMatch::NotMatchedBySource,
            ]
        );
        assert!(merge.clauses[0].condition.is_some());
        assert!(matches!(&merge.clauses[1].action, MergeAction::Update(a) if a.len() == 1));
        assert!(matches!(&merge.clauses[2].action, MergeAction::Insert { columns, values: Some(v) } if columns.len() == 2 && v.len() == 2));
    }

    #[test]
    fn test_create_table_constraints() {
        let Statement::CreateTable(create) = statement(
            "CREATE TABLE t (id INT NOT NULL PRIMARY KEY, pid INT, \
             CONSTRAINT fk FOREIGN KEY (pid) REFERENCES p (id) ON DELETE CASCADE)",
        ) else {
            panic!("expected create table");
        };
        assert_eq!(create.columns.len(), 2);
        let options: Vec<_> = create.columns[0].constraints.iter().map(|c| &c.option).collect();
        assert_eq!(options[0], &ColumnOption::NotNull);
        assert!(matches!(options[1], ColumnOption::PrimaryKey { clustered: None }));
        let fk = &create.constraints[0];
        assert_eq!(fk.name.as_ref().map(|n| n.value.as_str()), Some("fk"));
        assert!(matches!(
            &fk.kind,
            TableConstraintKind::ForeignKey { columns, referred_columns, on_delete: Some(_), .. }
                if columns.len() == 1 && referred_columns.len() == 1
        ));
    }

    #[test]
    fn test_exec_arguments() {
        let Statement::Execute(exec) = statement("EXEC dbo.my_proc 1, 'x'") else {
            panic!("expected exec");
        };
        assert!(matches!(&exec.target, ExecTarget::Procedure(name) if name.0.len() == 2));
        assert_eq!(exec.args.len(), 2);
        assert!(exec.args.iter().all(|a| a.name.is_none() && !a.output));
    }

    #[test]
    fn test_transaction_names() {
        assert_eq!(
            statement("COMMIT"),
            Statement::Transaction(TransactionStatement::Commit { name: None })
        );
        let Statement::Transaction(TransactionStatement::Rollback { name: Some(name) }) =
            statement("ROLLBACK TRANSACTION t1")
        else {
            panic!("expected named rollback");
        };
        assert_eq!(name.value, "t1");
    }
}
