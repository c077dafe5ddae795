//! Data modification grammar: INSERT, UPDATE, DELETE, MERGE and EXEC.

use super::parser::{PResult, Parser};
use super::{Expected, ParseTree, Rule};
use crate::lexer::{Keyword, TokenKind};

impl Parser<'_> {
    fn start_node(&self, rule: Rule, with: Option<ParseTree>) -> ParseTree {
        let mut node = ParseTree::new(rule, self.start_offset());
        if let Some(with) = with {
            node.push_tree(with);
        }
        node
    }

    fn parse_optional_top(&mut self, node: &mut ParseTree) -> PResult<()> {
        if self.at_top_clause() {
            let top = self.parse_top_clause()?;
            node.push_tree(top);
        }
        Ok(())
    }

    /// `INSERT [TOP (n)] [INTO] table [(cols)] [OUTPUT ...] source`
    pub(super) fn parse_insert(&mut self, with: Option<ParseTree>) -> PResult<ParseTree> {
        let mut node = self.start_node(Rule::Insert, with);
        self.expect_keyword(&mut node, Keyword::Insert)?;
        self.parse_optional_top(&mut node)?;
        self.eat_keyword(&mut node, Keyword::Into);
        let table = self.parse_object_name()?;
        node.push_tree(table);

        let columns_follow = self.peek().kind == TokenKind::LeftParen
            && !self.peek_nth_keyword(1, Keyword::Select)
            && !self.peek_nth_keyword(1, Keyword::With);
        if columns_follow {
            let columns = self.parse_column_list()?;
            node.push_tree(columns);
        }

        if self.check_keyword(Keyword::Output) {
            let output = self.parse_output_clause()?;
            node.push_tree(output);
        }

        loop {
            if self.check_keyword(Keyword::Values) {
                let values = self.parse_values_clause()?;
                node.push_tree(values);
                break;
            }
            if self.check_keyword(Keyword::Default) {
                self.bump(&mut node);
                self.expect_keyword(&mut node, Keyword::Values)?;
                break;
            }
            if self.check_keyword(Keyword::Exec) || self.check_keyword(Keyword::Execute) {
                let exec = self.parse_exec()?;
                node.push_tree(exec);
                break;
            }
            if self.check_keyword(Keyword::Select)
                || self.check_keyword(Keyword::With)
                || self.check(&TokenKind::LeftParen)
            {
                let query = self.parse_query()?;
                node.push_tree(query);
                break;
            }
            self.fail_alternatives(&mut node)?;
        }
        Ok(node)
    }

    /// `VALUES (expr, ...), ...`
    fn parse_values_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::ValuesClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Values)?;
        loop {
            let row = self.parse_values_row()?;
            node.push_tree(row);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        Ok(node)
    }

    fn parse_values_row(&mut self) -> PResult<ParseTree> {
        let mut row = ParseTree::new(Rule::ValuesRow, self.start_offset());
        self.expect(&mut row, &TokenKind::LeftParen)?;
        self.with_default_allowed(|p| p.parse_expression_list(&mut row))?;
        self.expect(&mut row, &TokenKind::RightParen)?;
        Ok(row)
    }

    /// `OUTPUT item, ... [INTO target [(cols)]]`
    fn parse_output_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::OutputClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Output)?;
        loop {
            let item = self.parse_select_item()?;
            node.push_tree(item);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        if self.eat_keyword(&mut node, Keyword::Into) {
            let target = self.parse_object_name()?;
            node.push_tree(target);
            if self.peek().kind == TokenKind::LeftParen {
                let columns = self.parse_column_list()?;
                node.push_tree(columns);
            }
        }
        Ok(node)
    }

    /// `UPDATE [TOP (n)] table SET assignments [OUTPUT ...] [FROM ...] [WHERE ...]`
    pub(super) fn parse_update(&mut self, with: Option<ParseTree>) -> PResult<ParseTree> {
        let mut node = self.start_node(Rule::Update, with);
        self.expect_keyword(&mut node, Keyword::Update)?;
        self.parse_optional_top(&mut node)?;
        let table = self.parse_table_factor()?;
        node.push_tree(table);
        self.expect_keyword(&mut node, Keyword::Set)?;
        self.parse_assignments(&mut node)?;
        self.parse_dml_tail(&mut node)?;
        Ok(node)
    }

    fn parse_assignments(&mut self, node: &mut ParseTree) -> PResult<()> {
        loop {
            let assignment = self.parse_assignment()?;
            node.push_tree(assignment);
            if !self.eat(node, &TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    /// `column = expr` or `@var = expr`
    fn parse_assignment(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Assignment, self.start_offset());
        self.note(Expected::Variable);
        if matches!(self.peek().kind, TokenKind::Variable(_)) {
            let mut variable = ParseTree::new(Rule::Variable, self.start_offset());
            self.bump(&mut variable);
            node.push_tree(variable);
        } else {
            let mut column = self.parse_object_name()?;
            column.rule = Rule::ColumnRef;
            node.push_tree(column);
        }
        self.expect(&mut node, &TokenKind::Eq)?;
        let value = self.with_default_allowed(Self::parse_expression)?;
        node.push_tree(value);
        Ok(node)
    }

    /// `[OUTPUT ...] [FROM ...] [WHERE ...]` shared by UPDATE and DELETE.
    fn parse_dml_tail(&mut self, node: &mut ParseTree) -> PResult<()> {
        if self.check_keyword(Keyword::Output) {
            let output = self.parse_output_clause()?;
            node.push_tree(output);
        }
        if self.check_keyword(Keyword::From) {
            let mut from = ParseTree::new(Rule::FromClause, self.start_offset());
            self.bump(&mut from);
            loop {
                let table = self.parse_table_ref()?;
                from.push_tree(table);
                if !self.eat(&mut from, &TokenKind::Comma) {
                    break;
                }
            }
            node.push_tree(from);
        }
        if self.check_keyword(Keyword::Where) {
            let selection = self.parse_where_clause()?;
            node.push_tree(selection);
        }
        Ok(())
    }

    /// `DELETE [TOP (n)] [FROM] table [OUTPUT ...] [FROM ...] [WHERE ...]`
    pub(super) fn parse_delete(&mut self, with: Option<ParseTree>) -> PResult<ParseTree> {
        let mut node = self.start_node(Rule::Delete, with);
        self.expect_keyword(&mut node, Keyword::Delete)?;
        self.parse_optional_top(&mut node)?;
        self.eat_keyword(&mut node, Keyword::From);
        let table = self.parse_table_factor()?;
        node.push_tree(table);
        self.parse_dml_tail(&mut node)?;
        Ok(node)
    }

    /// `MERGE [INTO] target USING source ON cond WHEN ... [OUTPUT ...]`
    pub(super) fn parse_merge(&mut self, with: Option<ParseTree>) -> PResult<ParseTree> {
        let mut node = self.start_node(Rule::Merge, with);
        self.expect_keyword(&mut node, Keyword::Merge)?;
        self.eat_keyword(&mut node, Keyword::Into);
        let target = self.parse_table_factor()?;
        node.push_tree(target);
        self.expect_keyword(&mut node, Keyword::Using)?;
        let source = self.parse_table_factor()?;
        node.push_tree(source);
        self.expect_keyword(&mut node, Keyword::On)?;
        let condition = self.parse_expression()?;
        node.push_tree(condition);

        let mut clauses = 0;
        while self.check_keyword(Keyword::When) || clauses == 0 {
            let clause = self.parse_merge_when()?;
            node.push_tree(clause);
            clauses += 1;
        }
        if self.check_keyword(Keyword::Output) {
            let output = self.parse_output_clause()?;
            node.push_tree(output);
        }
        Ok(node)
    }

    /// `WHEN [NOT] MATCHED [BY TARGET | BY SOURCE] [AND cond] THEN action`
    fn parse_merge_when(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::MergeWhen, self.start_offset());
        self.expect_keyword(&mut node, Keyword::When)?;
        self.eat_keyword(&mut node, Keyword::Not);
        self.expect_keyword(&mut node, Keyword::Matched)?;
        if self.eat_keyword(&mut node, Keyword::By) {
            self.expect_one_of_keywords(&mut node, &[Keyword::Target, Keyword::Source])?;
        }
        if self.eat_keyword(&mut node, Keyword::And) {
            let condition = self.parse_expression()?;
            node.push_tree(condition);
        }
        self.expect_keyword(&mut node, Keyword::Then)?;
        loop {
            if self.check_keyword(Keyword::Update) {
                self.bump(&mut node);
                self.expect_keyword(&mut node, Keyword::Set)?;
                self.parse_assignments(&mut node)?;
                break;
            }
            if self.check_keyword(Keyword::Delete) {
                self.bump(&mut node);
                break;
            }
            if self.check_keyword(Keyword::Insert) {
                self.bump(&mut node);
                if self.peek().kind == TokenKind::LeftParen {
                    let columns = self.parse_column_list()?;
                    node.push_tree(columns);
                }
                if self.eat_keyword(&mut node, Keyword::Default) {
                    self.expect_keyword(&mut node, Keyword::Values)?;
                } else {
                    self.expect_keyword(&mut node, Keyword::Values)?;
                    let row = self.parse_values_row()?;
                    node.push_tree(row);
                }
                break;
            }
            self.fail_alternatives(&mut node)?;
        }
        Ok(node)
    }

    /// `EXEC [@status =] proc [arg, ...]` or `EXEC ( expr )`
    pub(super) fn parse_exec(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Exec, self.start_offset());
        self.expect_one_of_keywords(&mut node, &[Keyword::Exec, Keyword::Execute])?;

        if self.eat(&mut node, &TokenKind::LeftParen) {
            let batch = self.parse_expression()?;
            node.push_tree(batch);
            self.expect(&mut node, &TokenKind::RightParen)?;
            return Ok(node);
        }

        if matches!(self.peek().kind, TokenKind::Variable(_)) && self.peek_nth_is(1, &TokenKind::Eq) {
            let mut status = ParseTree::new(Rule::Variable, self.start_offset());
            self.bump(&mut status);
            node.push_tree(status);
            self.bump(&mut node);
        }

        let procedure = self.parse_object_name()?;
        node.push_tree(procedure);

        if self.at_exec_argument() {
            loop {
                let arg = self.parse_exec_arg()?;
                node.push_tree(arg);
                if !self.eat(&mut node, &TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(node)
    }

    fn at_exec_argument(&self) -> bool {
        let token = self.peek();
        !(token.is_eof()
            || matches!(token.kind, TokenKind::Semicolon | TokenKind::RightParen)
            || self.at_statement_start())
    }

    /// `[@name =] expr [OUTPUT]`
    fn parse_exec_arg(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::ExecArg, self.start_offset());
        if matches!(self.peek().kind, TokenKind::Variable(_)) && self.peek_nth_is(1, &TokenKind::Eq) {
            self.bump(&mut node);
            self.bump(&mut node);
        }
        let value = self.with_default_allowed(Self::parse_expression)?;
        node.push_tree(value);
        if !self.eat_keyword(&mut node, Keyword::Output) {
            self.eat_keyword(&mut node, Keyword::Out);
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::dialect::GenericDialect;
    use crate::parser::{ParseTree, Parser, ParserOptions, Rule};

    fn tree(sql: &str) -> ParseTree {
        Parser::from_sql(sql, &GenericDialect, ParserOptions::default())
            .unwrap()
            .parse_statement()
            .unwrap()
    }

    #[test]
    fn test_insert_values_with_default() {
        let t = tree("INSERT INTO t (a, b) VALUES (1, DEFAULT), (2, 3)");
        assert_eq!(t.rule, Rule::Insert);
        let values = t.child(Rule::ValuesClause).unwrap();
        assert_eq!(values.children_of(Rule::ValuesRow).count(), 2);
        let first = values.child(Rule::ValuesRow).unwrap();
        assert!(first.child(Rule::DefaultValue).is_some());
    }

    #[test]
    fn test_insert_select_is_not_column_list() {
        let t = tree("INSERT INTO t (SELECT a FROM u)");
        assert!(t.child(Rule::ColumnList).is_none());
        assert!(t.child(Rule::Query).is_some());
    }

    #[test]
    fn test_update_shape() {
        let t = tree("UPDATE t SET a = 1, b = DEFAULT WHERE id = 2");
        assert_eq!(t.children_of(Rule::Assignment).count(), 2);
        assert!(t.child(Rule::WhereClause).is_some());
    }

    #[test]
    fn test_merge_clauses() {
        let t = tree(
            "MERGE INTO t USING s ON t.id = s.id \
             WHEN MATCHED AND s.gone = 1 THEN DELETE \
             WHEN MATCHED THEN UPDATE SET v = s.v \
             WHEN NOT MATCHED THEN INSERT (id, v) VALUES (s.id, s.v)",
        );
        assert_eq!(t.children_of(Rule::MergeWhen).count(), 3);
    }

    #[test]
    fn test_default_outside_values_is_error() {
        let result = Parser::from_sql("SELECT DEFAULT", &GenericDialect, ParserOptions::default())
            .unwrap()
            .parse_statement();
        assert!(result.is_err());
    }
}
