use super::{
    column_list, ident_from_token, malformed, nth_tree, object_name, required_child, AstBuilder,
    BuildResult,
};
use crate::ast::{
    Cte, Expr, GroupByModifier, JoinConstraint, JoinType, Limit, LimitStyle, QueryHint, Select, SelectItem,
    SelectStatement, SetExpr, SetOperator, SetQuantifier, TableAlias, TableHint, TableRef, Top, With,
};
use crate::lexer::{Keyword, TokenKind};
use crate::parser::{ParseTree, Rule};

impl AstBuilder {
    /// Builds a `Query` tree.
    pub(super) fn query(&self, tree: &ParseTree) -> BuildResult<SelectStatement> {
        if tree.rule != Rule::Query {
            return Err(malformed(tree, "not a query"));
        }
        let body = tree
            .trees()
            .find(|t| {
                !matches!(
                    t.rule,
                    Rule::WithClause | Rule::OrderByClause | Rule::OffsetFetch | Rule::LimitClause | Rule::OptionClause
                )
            })
            .ok_or_else(|| malformed(tree, "missing query body"))?;

        let with = tree.child(Rule::WithClause).map(|w| self.with_clause(w)).transpose()?;
        let order_by = match tree.child(Rule::OrderByClause) {
            Some(order_by) => self.order_by(order_by)?,
            None => Vec::new(),
        };
        let limit = if let Some(paging) = tree.child(Rule::OffsetFetch) {
            Some(Limit {
                style: LimitStyle::OffsetFetch,
                offset: Some(self.expr(nth_tree(paging, 0)?)?),
                row_count: paging.trees().nth(1).map(|t| self.expr(t)).transpose()?,
            })
        } else if let Some(paging) = tree.child(Rule::LimitClause) {
            Some(Limit {
                style: LimitStyle::LimitOffset,
                row_count: Some(self.expr(nth_tree(paging, 0)?)?),
                offset: paging.trees().nth(1).map(|t| self.expr(t)).transpose()?,
            })
        } else {
            None
        };
        let hints = match tree.child(Rule::OptionClause) {
            Some(option) => option
                .children_of(Rule::QueryHint)
                .map(|hint| self.query_hint(hint))
                .collect::<BuildResult<_>>()?,
            None => Vec::new(),
        };

        Ok(SelectStatement {
            with,
            body: self.set_expr(body)?,
            order_by,
            limit,
            hints,
        })
    }

    /// The query inside a `ParenQuery` (or a `Subquery` built from one).
    pub(super) fn paren_query(&self, tree: &ParseTree) -> BuildResult<SelectStatement> {
        self.query(required_child(tree, Rule::Query)?)
    }

    pub(super) fn with_clause(&self, tree: &ParseTree) -> BuildResult<With> {
        let ctes = tree
            .children_of(Rule::Cte)
            .map(|cte| {
                let name = cte
                    .tokens()
                    .next()
                    .and_then(ident_from_token)
                    .ok_or_else(|| malformed(cte, "missing CTE name"))?;
                Ok(Cte {
                    name,
                    columns: column_list(cte.child(Rule::ColumnList)),
                    query: Box::new(self.query(required_child(cte, Rule::Query)?)?),
                })
            })
            .collect::<BuildResult<_>>()?;
        Ok(With { ctes })
    }

    fn set_expr(&self, tree: &ParseTree) -> BuildResult<SetExpr> {
        match tree.rule {
            Rule::Select => Ok(SetExpr::Select(Box::new(self.select(tree)?))),
            Rule::ParenQuery => Ok(SetExpr::Query(Box::new(self.paren_query(tree)?))),
            Rule::SetOperation => {
                let op = tree
                    .tokens()
                    .find_map(|t| match t.as_keyword() {
                        Some(Keyword::Union) => Some(SetOperator::Union),
                        Some(Keyword::Intersect) => Some(SetOperator::Intersect),
                        Some(Keyword::Except) => Some(SetOperator::Except),
                        _ => None,
                    })
                    .ok_or_else(|| malformed(tree, "missing set operator"))?;
                Ok(SetExpr::SetOperation {
                    op,
                    all: tree.has_keyword(Keyword::All),
                    left: Box::new(self.set_expr(nth_tree(tree, 0)?)?),
                    right: Box::new(self.set_expr(nth_tree(tree, 1)?)?),
                })
            }
            _ => Err(malformed(tree, "not a query body")),
        }
    }

    fn select(&self, tree: &ParseTree) -> BuildResult<Select> {
        let quantifier = if tree.has_keyword(Keyword::Distinct) {
            Some(SetQuantifier::Distinct)
        } else if tree.has_keyword(Keyword::All) {
            Some(SetQuantifier::All)
        } else {
            None
        };
        let projection = required_child(tree, Rule::SelectList)?
            .trees()
            .map(|item| self.select_item(item))
            .collect::<BuildResult<_>>()?;
        let into = tree
            .child(Rule::IntoClause)
            .map(|into| required_child(into, Rule::ObjectName).and_then(object_name))
            .transpose()?;
        let (group_by, group_by_modifier) = match tree.child(Rule::GroupByClause) {
            Some(group_by) => {
                let modifier = if group_by.has_keyword(Keyword::Rollup) {
                    Some(GroupByModifier::Rollup)
                } else if group_by.has_keyword(Keyword::Cube) {
                    Some(GroupByModifier::Cube)
                } else {
                    None
                };
                (self.exprs(group_by.trees())?, modifier)
            }
            None => (Vec::new(), None),
        };
        Ok(Select {
            quantifier,
            top: tree.child(Rule::TopClause).map(|t| self.top(t)).transpose()?,
            projection,
            into,
            from: self.from_clause(tree.child(Rule::FromClause))?,
            selection: self.where_clause(tree.child(Rule::WhereClause))?,
            group_by,
            group_by_modifier,
            having: tree
                .child(Rule::HavingClause)
                .map(|h| nth_tree(h, 0).and_then(|e| self.expr(e)))
                .transpose()?,
        })
    }

    pub(super) fn top(&self, tree: &ParseTree) -> BuildResult<Top> {
        Ok(Top {
            quantity: self.expr(nth_tree(tree, 0)?)?,
            parenthesized: tree.has_token(&TokenKind::LeftParen),
            percent: tree.has_keyword(Keyword::Percent),
            with_ties: tree.has_keyword(Keyword::Ties),
        })
    }

    /// One projection item; also used for `OUTPUT` lists.
    pub(super) fn select_item(&self, tree: &ParseTree) -> BuildResult<SelectItem> {
        match tree.rule {
            Rule::Wildcard => Ok(SelectItem::Wildcard),
            Rule::QualifiedWildcard => Ok(SelectItem::QualifiedWildcard(object_name(required_child(
                tree,
                Rule::ObjectName,
            )?)?)),
            Rule::VariableAssignment => {
                let variable = match tree.tokens().next().map(|t| &t.kind) {
                    Some(TokenKind::Variable(name)) => name.clone(),
                    _ => return Err(malformed(tree, "expected a variable")),
                };
                Ok(SelectItem::VariableAssignment {
                    variable,
                    expr: self.expr(nth_tree(tree, 0)?)?,
                })
            }
            Rule::AliasAssignment => {
                let alias = tree
                    .tokens()
                    .next()
                    .and_then(ident_from_token)
                    .ok_or_else(|| malformed(tree, "missing alias"))?;
                Ok(SelectItem::AliasAssignment {
                    alias,
                    expr: self.expr(nth_tree(tree, 0)?)?,
                })
            }
            Rule::SelectItem => {
                let alias = tree
                    .child(Rule::Alias)
                    .map(|alias| {
                        alias
                            .tokens()
                            .last()
                            .and_then(ident_from_token)
                            .ok_or_else(|| malformed(alias, "missing alias"))
                    })
                    .transpose()?;
                Ok(SelectItem::Expr {
                    expr: self.expr(nth_tree(tree, 0)?)?,
                    alias,
                })
            }
            _ => Err(malformed(tree, "not a select item")),
        }
    }

    pub(super) fn from_clause(&self, tree: Option<&ParseTree>) -> BuildResult<Vec<TableRef>> {
        match tree {
            Some(from) => from.trees().map(|t| self.table_ref(t)).collect(),
            None => Ok(Vec::new()),
        }
    }

    pub(super) fn where_clause(&self, tree: Option<&ParseTree>) -> BuildResult<Option<Expr>> {
        tree.map(|w| nth_tree(w, 0).and_then(|e| self.expr(e))).transpose()
    }

    pub(super) fn table_ref(&self, tree: &ParseTree) -> BuildResult<TableRef> {
        let alias = tree.child(Rule::TableAlias).map(table_alias).transpose()?;
        match tree.rule {
            Rule::NamedTable => {
                let hints = match tree.child(Rule::TableHints) {
                    Some(hints) => hints
                        .children_of(Rule::TableHint)
                        .map(|hint| self.table_hint(hint))
                        .collect::<BuildResult<_>>()?,
                    None => Vec::new(),
                };
                Ok(TableRef::Table {
                    name: object_name(required_child(tree, Rule::ObjectName)?)?,
                    alias,
                    hints,
                })
            }
            Rule::DerivedTable => Ok(TableRef::Derived {
                subquery: Box::new(self.paren_query(required_child(tree, Rule::ParenQuery)?)?),
                alias,
            }),
            Rule::TableFunction => Ok(TableRef::Function {
                name: object_name(required_child(tree, Rule::ObjectName)?)?,
                args: self.exprs(
                    tree.trees()
                        .filter(|t| !matches!(t.rule, Rule::ObjectName | Rule::TableAlias)),
                )?,
                alias,
            }),
            Rule::NestedJoin => Ok(TableRef::Nested(Box::new(self.table_ref(nth_tree(tree, 0)?)?))),
            Rule::Join => {
                let join_type = join_type(tree);
                let constraint = if let Some(on) = tree.child(Rule::JoinOn) {
                    Some(JoinConstraint::On(self.expr(nth_tree(on, 0)?)?))
                } else {
                    tree.child(Rule::JoinUsing)
                        .map(|using| JoinConstraint::Using(column_list(using.child(Rule::ColumnList))))
                };
                Ok(TableRef::Join {
                    left: Box::new(self.table_ref(nth_tree(tree, 0)?)?),
                    right: Box::new(self.table_ref(nth_tree(tree, 1)?)?),
                    join_type,
                    constraint,
                })
            }
            _ => Err(malformed(tree, "not a table source")),
        }
    }

    fn table_hint(&self, tree: &ParseTree) -> BuildResult<TableHint> {
        let name = tree
            .tokens()
            .next()
            .and_then(ident_from_token)
            .ok_or_else(|| malformed(tree, "missing hint name"))?;
        Ok(TableHint {
            name,
            args: self.exprs(tree.trees())?,
        })
    }

    fn query_hint(&self, tree: &ParseTree) -> BuildResult<QueryHint> {
        let name = tree
            .tokens()
            .next()
            .and_then(ident_from_token)
            .ok_or_else(|| malformed(tree, "missing hint name"))?;
        Ok(QueryHint {
            name,
            args: self.exprs(tree.trees())?,
        })
    }
}

fn join_type(tree: &ParseTree) -> JoinType {
    let apply = tree.has_keyword(Keyword::Apply);
    if apply && tree.has_keyword(Keyword::Cross) {
        JoinType::CrossApply
    } else if apply {
        JoinType::OuterApply
    } else if tree.has_keyword(Keyword::Cross) {
        JoinType::Cross
    } else if tree.has_keyword(Keyword::Left) {
        JoinType::Left
    } else if tree.has_keyword(Keyword::Right) {
        JoinType::Right
    } else if tree.has_keyword(Keyword::Full) {
        JoinType::Full
    } else {
        JoinType::Inner
    }
}

fn table_alias(tree: &ParseTree) -> BuildResult<TableAlias> {
    let name = tree
        .tokens()
        .find(|token| !token.is_keyword(Keyword::As))
        .and_then(ident_from_token)
        .ok_or_else(|| malformed(tree, "missing alias"))?;
    Ok(TableAlias {
        name,
        columns: column_list(tree.child(Rule::ColumnList)),
    })
}

#[cfg(test)]
mod tests {
    use crate::ast::{JoinType, SelectItem, SetExpr, TableRef};
    use crate::builder::build_query;
    use crate::dialect::GenericDialect;
    use crate::parser::{Parser, ParserOptions};

    fn query(sql: &str) -> crate::ast::SelectStatement {
        let tree = Parser::from_sql(sql, &GenericDialect, ParserOptions::default())
            .unwrap()
            .parse_select()
            .unwrap();
        build_query(&tree).unwrap()
    }

    #[test]
    fn test_round_trip_display() {
        for sql in [
            "SELECT a, b AS c FROM t WHERE a > 1",
            "SELECT DISTINCT a FROM t ORDER BY a DESC LIMIT 10 OFFSET 5",
            "SELECT a FROM t UNION ALL SELECT b FROM u",
            "WITH cte (x) AS (SELECT 1) SELECT x FROM cte",
            "SELECT t.* FROM t AS t INNER JOIN u ON t.id = u.id",
            "SELECT count(*) FROM t GROUP BY a HAVING count(*) > 1",
            "SELECT * FROM (SELECT 1) AS d (x)",
        ] {
            assert_eq!(query(sql).to_string(), sql);
        }
    }

    #[test]
    fn test_alias_without_as() {
        let q = query("SELECT a x FROM t y");
        let SetExpr::Select(select) = &q.body else {
            panic!("expected select");
        };
        let SelectItem::Expr { alias, .. } = &select.projection[0] else {
            panic!("expected expression item");
        };
        assert_eq!(alias.as_ref().map(|a| a.value.as_str()), Some("x"));
        let TableRef::Table { alias, .. } = &select.from[0] else {
            panic!("expected named table");
        };
        assert_eq!(alias.as_ref().map(|a| a.name.value.as_str()), Some("y"));
    }

    #[test]
    fn test_join_types() {
        let q = query("SELECT * FROM a LEFT OUTER JOIN b ON a.x = b.x CROSS JOIN c");
        let SetExpr::Select(select) = &q.body else {
            panic!("expected select");
        };
        let TableRef::Join { left, join_type, constraint, .. } = &select.from[0] else {
            panic!("expected join");
        };
        assert_eq!(*join_type, JoinType::Cross);
        assert!(constraint.is_none());
        assert!(matches!(
            left.as_ref(),
            TableRef::Join {
                join_type: JoinType::Left,
                ..
            }
        ));
    }
}
