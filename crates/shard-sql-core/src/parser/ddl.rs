//! Schema and session grammar: CREATE, ALTER, DROP, TRUNCATE, USE and
//! transactions.

use super::parser::{PResult, Parser};
use super::{ParseTree, Rule};
use crate::lexer::{Keyword, TokenKind};

impl Parser<'_> {
    pub(super) fn parse_create(&mut self) -> PResult<ParseTree> {
        let start = self.start_offset();
        let mut head = ParseTree::new(Rule::Error, start);
        self.expect_keyword(&mut head, Keyword::Create)?;
        loop {
            if self.check_keyword(Keyword::Table) {
                return self.parse_create_table(head);
            }
            if self.check_keyword(Keyword::View) {
                return self.parse_view(Rule::CreateView, head);
            }
            if self.check_keyword(Keyword::Or) {
                self.bump(&mut head);
                self.expect_keyword(&mut head, Keyword::Alter)?;
                return self.parse_view(Rule::CreateView, head);
            }
            let index = self.check_keyword(Keyword::Unique)
                | self.check_keyword(Keyword::Clustered)
                | self.check_keyword(Keyword::Nonclustered)
                | self.check_keyword(Keyword::Index);
            if index {
                return self.parse_create_index(head);
            }
            self.fail_alternatives(&mut head)?;
        }
    }

    /// `CREATE TABLE name ( column | constraint, ... )`
    fn parse_create_table(&mut self, head: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::CreateTable, head.span.start);
        node.children = head.children;
        node.span = head.span;
        self.expect_keyword(&mut node, Keyword::Table)?;
        let name = self.parse_object_name()?;
        node.push_tree(name);
        self.expect(&mut node, &TokenKind::LeftParen)?;
        self.parse_table_elements(&mut node)?;
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    /// `{column | constraint}, ...`
    fn parse_table_elements(&mut self, node: &mut ParseTree) -> PResult<()> {
        loop {
            let element = if self.at_table_constraint() {
                self.parse_table_constraint()?
            } else {
                self.parse_column_def()?
            };
            node.push_tree(element);
            if !self.eat(node, &TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    fn at_table_constraint(&self) -> bool {
        [Keyword::Constraint, Keyword::Primary, Keyword::Unique, Keyword::Foreign, Keyword::Check]
            .iter()
            .any(|kw| self.peek_keyword(*kw))
    }

    fn parse_column_def(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::ColumnDef, self.start_offset());
        self.expect_identifier(&mut node)?;
        let data_type = self.parse_data_type()?;
        node.push_tree(data_type);
        while let Some(constraint) = self.parse_column_constraint()? {
            node.push_tree(constraint);
        }
        Ok(node)
    }

    /// One column option, optionally named with `CONSTRAINT name`.
    fn parse_column_constraint(&mut self) -> PResult<Option<ParseTree>> {
        let mut node = ParseTree::new(Rule::ColumnConstraint, self.start_offset());
        let named = self.eat_keyword(&mut node, Keyword::Constraint);
        if named {
            self.expect_identifier(&mut node)?;
        }
        loop {
            if self.check_keyword(Keyword::Null) {
                self.bump(&mut node);
            } else if self.check_keyword(Keyword::Not) {
                self.bump(&mut node);
                self.expect_keyword(&mut node, Keyword::Null)?;
            } else if self.check_keyword(Keyword::Primary) {
                self.bump(&mut node);
                self.expect_keyword(&mut node, Keyword::Key)?;
                self.parse_clustering(&mut node);
            } else if self.check_keyword(Keyword::Unique) {
                self.bump(&mut node);
                self.parse_clustering(&mut node);
            } else if self.check_keyword(Keyword::Identity) {
                self.bump(&mut node);
                if self.eat(&mut node, &TokenKind::LeftParen) {
                    let seed = self.parse_expression()?;
                    node.push_tree(seed);
                    self.expect(&mut node, &TokenKind::Comma)?;
                    let increment = self.parse_expression()?;
                    node.push_tree(increment);
                    self.expect(&mut node, &TokenKind::RightParen)?;
                }
            } else if self.check_keyword(Keyword::Default) {
                self.bump(&mut node);
                let value = self.parse_expression()?;
                node.push_tree(value);
            } else if self.check_keyword(Keyword::References) {
                self.bump(&mut node);
                self.parse_references_tail(&mut node)?;
            } else if self.check_keyword(Keyword::Check) {
                self.bump(&mut node);
                self.expect(&mut node, &TokenKind::LeftParen)?;
                let condition = self.parse_expression()?;
                node.push_tree(condition);
                self.expect(&mut node, &TokenKind::RightParen)?;
            } else if named {
                self.fail_alternatives(&mut node)?;
                continue;
            } else {
                return Ok(None);
            }
            return Ok(Some(node));
        }
    }

    fn parse_clustering(&mut self, node: &mut ParseTree) {
        if !self.eat_keyword(node, Keyword::Clustered) {
            self.eat_keyword(node, Keyword::Nonclustered);
        }
    }

    /// `table [(cols)] [ON DELETE action] [ON UPDATE action]`
    fn parse_references_tail(&mut self, node: &mut ParseTree) -> PResult<()> {
        let table = self.parse_object_name()?;
        node.push_tree(table);
        if self.peek().kind == TokenKind::LeftParen {
            let columns = self.parse_column_list()?;
            node.push_tree(columns);
        }
        while self.peek_keyword(Keyword::On)
            && (self.peek_nth_keyword(1, Keyword::Delete) || self.peek_nth_keyword(1, Keyword::Update))
        {
            let action = self.parse_referential_action()?;
            node.push_tree(action);
        }
        Ok(())
    }

    fn parse_referential_action(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::ReferentialAction, self.start_offset());
        self.expect_keyword(&mut node, Keyword::On)?;
        self.expect_one_of_keywords(&mut node, &[Keyword::Delete, Keyword::Update])?;
        loop {
            if self.eat_keyword(&mut node, Keyword::Cascade) || self.eat_keyword(&mut node, Keyword::Restrict) {
                break;
            }
            if self.eat_keyword(&mut node, Keyword::No) {
                self.expect_keyword(&mut node, Keyword::Action)?;
                break;
            }
            if self.eat_keyword(&mut node, Keyword::Set) {
                self.expect_one_of_keywords(&mut node, &[Keyword::Null, Keyword::Default])?;
                break;
            }
            self.fail_alternatives(&mut node)?;
        }
        Ok(node)
    }

    /// `[CONSTRAINT name] {PRIMARY KEY | UNIQUE | FOREIGN KEY | CHECK} ...`
    fn parse_table_constraint(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::TableConstraint, self.start_offset());
        if self.eat_keyword(&mut node, Keyword::Constraint) {
            self.expect_identifier(&mut node)?;
        }
        loop {
            if self.check_keyword(Keyword::Primary) || self.check_keyword(Keyword::Unique) {
                let primary = self.peek_keyword(Keyword::Primary);
                self.bump(&mut node);
                if primary {
                    self.expect_keyword(&mut node, Keyword::Key)?;
                }
                self.parse_clustering(&mut node);
                self.parse_index_columns(&mut node)?;
            } else if self.check_keyword(Keyword::Foreign) {
                self.bump(&mut node);
                self.expect_keyword(&mut node, Keyword::Key)?;
                let columns = self.parse_column_list()?;
                node.push_tree(columns);
                self.expect_keyword(&mut node, Keyword::References)?;
                self.parse_references_tail(&mut node)?;
            } else if self.check_keyword(Keyword::Check) {
                self.bump(&mut node);
                self.expect(&mut node, &TokenKind::LeftParen)?;
                let condition = self.parse_expression()?;
                node.push_tree(condition);
                self.expect(&mut node, &TokenKind::RightParen)?;
            } else {
                self.fail_alternatives(&mut node)?;
                continue;
            }
            return Ok(node);
        }
    }

    /// `( column [ASC | DESC], ... )`
    fn parse_index_columns(&mut self, node: &mut ParseTree) -> PResult<()> {
        self.expect(node, &TokenKind::LeftParen)?;
        loop {
            let mut column = ParseTree::new(Rule::IndexColumn, self.start_offset());
            self.expect_identifier(&mut column)?;
            if !self.eat_keyword(&mut column, Keyword::Asc) {
                self.eat_keyword(&mut column, Keyword::Desc);
            }
            node.push_tree(column);
            if !self.eat(node, &TokenKind::Comma) {
                break;
            }
        }
        self.expect(node, &TokenKind::RightParen)
    }

    /// `CREATE [UNIQUE] [CLUSTERED | NONCLUSTERED] INDEX name ON table (cols) [INCLUDE (cols)] [WHERE ...]`
    fn parse_create_index(&mut self, head: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::CreateIndex, head.span.start);
        node.children = head.children;
        node.span = head.span;
        self.eat_keyword(&mut node, Keyword::Unique);
        self.parse_clustering(&mut node);
        self.expect_keyword(&mut node, Keyword::Index)?;
        self.expect_identifier(&mut node)?;
        self.expect_keyword(&mut node, Keyword::On)?;
        let table = self.parse_object_name()?;
        node.push_tree(table);
        self.parse_index_columns(&mut node)?;
        if self.eat_keyword(&mut node, Keyword::Include) {
            let include = self.parse_column_list()?;
            node.push_tree(include);
        }
        if self.check_keyword(Keyword::Where) {
            let predicate = self.parse_where_clause()?;
            node.push_tree(predicate);
        }
        Ok(node)
    }

    /// `DROP {TABLE | VIEW} [IF EXISTS] name, ...` or `DROP INDEX [IF EXISTS] name [ON table]`
    pub(super) fn parse_drop(&mut self) -> PResult<ParseTree> {
        let start = self.start_offset();
        let mut node = ParseTree::new(Rule::DropTable, start);
        self.expect_keyword(&mut node, Keyword::Drop)?;
        loop {
            if self.eat_keyword(&mut node, Keyword::Table) {
                break;
            }
            if self.eat_keyword(&mut node, Keyword::View) {
                node.rule = Rule::DropView;
                break;
            }
            if self.eat_keyword(&mut node, Keyword::Index) {
                node.rule = Rule::DropIndex;
                break;
            }
            self.fail_alternatives(&mut node)?;
        }
        self.parse_if_exists(&mut node);
        if node.rule == Rule::DropIndex {
            let name = self.parse_object_name()?;
            node.push_tree(name);
            if self.eat_keyword(&mut node, Keyword::On) {
                let table = self.parse_object_name()?;
                node.push_tree(table);
            }
            return Ok(node);
        }
        loop {
            let name = self.parse_object_name()?;
            node.push_tree(name);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        Ok(node)
    }

    fn parse_if_exists(&mut self, node: &mut ParseTree) {
        if self.peek_keyword(Keyword::If) && self.peek_nth_keyword(1, Keyword::Exists) {
            self.bump(node);
            self.bump(node);
        }
    }

    /// `ALTER TABLE ...` or `ALTER VIEW ...`
    pub(super) fn parse_alter(&mut self) -> PResult<ParseTree> {
        let mut head = ParseTree::new(Rule::Error, self.start_offset());
        self.expect_keyword(&mut head, Keyword::Alter)?;
        loop {
            if self.check_keyword(Keyword::Table) {
                return self.parse_alter_table(head);
            }
            if self.check_keyword(Keyword::View) {
                return self.parse_view(Rule::AlterView, head);
            }
            self.fail_alternatives(&mut head)?;
        }
    }

    /// `ALTER TABLE name {ADD ... | ALTER COLUMN ... | DROP ...}`
    ///
    /// One change per statement, as SQL Server allows.
    fn parse_alter_table(&mut self, head: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::AlterTable, head.span.start);
        node.children = head.children;
        node.span = head.span;
        self.expect_keyword(&mut node, Keyword::Table)?;
        let name = self.parse_object_name()?;
        node.push_tree(name);
        loop {
            let change = if self.check_keyword(Keyword::Add) {
                let mut add = ParseTree::new(Rule::AlterTableAdd, self.start_offset());
                self.bump(&mut add);
                self.parse_table_elements(&mut add)?;
                add
            } else if self.check_keyword(Keyword::Alter) {
                self.parse_alter_column()?
            } else if self.check_keyword(Keyword::Drop) {
                self.parse_alter_drop()?
            } else {
                self.fail_alternatives(&mut node)?;
                continue;
            };
            node.push_tree(change);
            return Ok(node);
        }
    }

    /// `ALTER COLUMN name type [NULL | NOT NULL]`
    fn parse_alter_column(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::AlterColumn, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Alter)?;
        self.expect_keyword(&mut node, Keyword::Column)?;
        self.expect_identifier(&mut node)?;
        let data_type = self.parse_data_type()?;
        node.push_tree(data_type);
        if self.eat_keyword(&mut node, Keyword::Not) {
            self.expect_keyword(&mut node, Keyword::Null)?;
        } else {
            self.eat_keyword(&mut node, Keyword::Null);
        }
        Ok(node)
    }

    /// `DROP [COLUMN | CONSTRAINT] [IF EXISTS] name, ...`
    ///
    /// A bare name is a constraint.
    fn parse_alter_drop(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::AlterTableDrop, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Drop)?;
        if !self.eat_keyword(&mut node, Keyword::Column) {
            self.eat_keyword(&mut node, Keyword::Constraint);
        }
        self.parse_if_exists(&mut node);
        let mut names = ParseTree::new(Rule::NameList, self.start_offset());
        loop {
            self.expect_identifier(&mut names)?;
            if !self.eat(&mut names, &TokenKind::Comma) {
                break;
            }
        }
        node.push_tree(names);
        Ok(node)
    }

    /// `VIEW name [(columns)] AS query [WITH CHECK OPTION]`, after the
    /// `CREATE [OR ALTER]` or `ALTER` already in `head`.
    fn parse_view(&mut self, rule: Rule, head: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(rule, head.span.start);
        node.children = head.children;
        node.span = head.span;
        self.expect_keyword(&mut node, Keyword::View)?;
        let name = self.parse_object_name()?;
        node.push_tree(name);
        if self.peek().kind == TokenKind::LeftParen {
            let columns = self.parse_column_list()?;
            node.push_tree(columns);
        }
        self.expect_keyword(&mut node, Keyword::As)?;
        let query = self.parse_query()?;
        node.push_tree(query);
        if self.peek_keyword(Keyword::With) && self.peek_nth_keyword(1, Keyword::Check) {
            self.bump(&mut node);
            self.bump(&mut node);
            self.expect_keyword(&mut node, Keyword::Option)?;
        }
        Ok(node)
    }

    /// `TRUNCATE TABLE name`
    pub(super) fn parse_truncate(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Truncate, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Truncate)?;
        self.expect_keyword(&mut node, Keyword::Table)?;
        let name = self.parse_object_name()?;
        node.push_tree(name);
        Ok(node)
    }

    /// `USE database`
    pub(super) fn parse_use(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Use, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Use)?;
        self.expect_identifier(&mut node)?;
        Ok(node)
    }

    /// `{BEGIN | COMMIT | ROLLBACK | SAVE} [TRAN | TRANSACTION | WORK] [name]`
    ///
    /// `BEGIN` alone would open a block, so it requires `TRAN`/`TRANSACTION`.
    pub(super) fn parse_transaction(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Transaction, self.start_offset());
        let begin = self.peek_keyword(Keyword::Begin);
        let save = self.peek_keyword(Keyword::Save);
        self.expect_one_of_keywords(
            &mut node,
            &[Keyword::Begin, Keyword::Commit, Keyword::Rollback, Keyword::Save],
        )?;
        let has_tran = if begin || save {
            self.expect_one_of_keywords(&mut node, &[Keyword::Tran, Keyword::Transaction])?;
            true
        } else {
            self.eat_keyword(&mut node, Keyword::Tran)
                || self.eat_keyword(&mut node, Keyword::Transaction)
                || self.eat_keyword(&mut node, Keyword::Work)
        };
        let named = has_tran
            && !node.has_keyword(Keyword::Work)
            && (self.peek_nth_is_name(0) || matches!(self.peek().kind, TokenKind::Variable(_)))
            && !self.at_statement_start();
        if named {
            self.bump(&mut node);
        }
        Ok(node)
    }
}
