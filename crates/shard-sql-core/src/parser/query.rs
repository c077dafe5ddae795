//! Query grammar: `SELECT`, set operations, CTEs and table references.

use super::parser::{PResult, Parser};
use super::{Expected, ParseTree, Rule};
use crate::lexer::{Keyword, TokenKind};

/// Unreserved words that begin a clause and so never act as an implicit alias.
const CLAUSE_WORDS: &[Keyword] = &[
    Keyword::Apply,
    Keyword::Fetch,
    Keyword::For,
    Keyword::Limit,
    Keyword::Offset,
    Keyword::Option,
    Keyword::Output,
    Keyword::Pivot,
    Keyword::Tablesample,
    Keyword::Unpivot,
    Keyword::Using,
];

impl Parser<'_> {
    /// `query := [WITH ...] body [ORDER BY ...] [OFFSET/FETCH | LIMIT] [OPTION (...)]`
    pub(super) fn parse_query(&mut self) -> PResult<ParseTree> {
        let with = if self.peek_keyword(Keyword::With) {
            Some(self.parse_with_clause()?)
        } else {
            None
        };
        self.parse_query_with(with)
    }

    pub(super) fn parse_query_with(&mut self, with: Option<ParseTree>) -> PResult<ParseTree> {
        let default_allowed = std::mem::replace(&mut self.default_allowed, false);
        let result = self.parse_query_body(with);
        self.default_allowed = default_allowed;
        result
    }

    fn parse_query_body(&mut self, with: Option<ParseTree>) -> PResult<ParseTree> {
        let _guard = self.enter()?;
        let mut node = ParseTree::new(Rule::Query, self.start_offset());
        if let Some(with) = with {
            node.push_tree(with);
        }
        let body = self.parse_set_expr(1)?;
        node.push_tree(body);

        // ORDER BY clause
        if self.check_keyword(Keyword::Order) {
            let order_by = self.parse_order_by_clause()?;
            node.push_tree(order_by);
        }

        // OFFSET / FETCH or LIMIT
        if self.check_keyword(Keyword::Offset) {
            let offset = self.parse_offset_fetch()?;
            node.push_tree(offset);
        } else if self.dialect.supports_limit_offset() && self.check_keyword(Keyword::Limit) {
            let limit = self.parse_limit_clause()?;
            node.push_tree(limit);
        }

        // OPTION (query hints)
        if self.check_keyword(Keyword::Option) {
            let option = self.parse_option_clause()?;
            node.push_tree(option);
        }
        Ok(node)
    }

    /// Precedence climbing over `UNION`/`EXCEPT` (1) and `INTERSECT` (2).
    fn parse_set_expr(&mut self, min: u8) -> PResult<ParseTree> {
        let mut spine = Vec::new();
        let mut lhs = self.parse_set_operand()?;
        loop {
            let union = self.check_keyword(Keyword::Union);
            let except = !union && self.check_keyword(Keyword::Except);
            let intersect = !union && !except && self.check_keyword(Keyword::Intersect);
            let level = match (union || except, intersect) {
                (true, _) => 1,
                (false, true) => 2,
                (false, false) => break,
            };
            if level < min {
                break;
            }
            spine.push(self.enter()?);
            let mut node = ParseTree::new(Rule::SetOperation, lhs.span.start);
            node.push_tree(lhs);
            self.bump(&mut node);
            if !self.eat_keyword(&mut node, Keyword::All) {
                self.eat_keyword(&mut node, Keyword::Distinct);
            }
            let rhs = self.parse_set_expr(level + 1)?;
            node.push_tree(rhs);
            lhs = node;
        }
        Ok(lhs)
    }

    fn parse_set_operand(&mut self) -> PResult<ParseTree> {
        let mut scratch = ParseTree::new(Rule::Error, self.start_offset());
        loop {
            if self.check_keyword(Keyword::Select) {
                return self.parse_select_core();
            }
            if self.check(&TokenKind::LeftParen) {
                return self.parse_paren_query();
            }
            self.fail_alternatives(&mut scratch)?;
        }
    }

    /// `( query )`, memoized when it fails during speculation.
    pub(super) fn parse_paren_query(&mut self) -> PResult<ParseTree> {
        let start = self.position();
        if self.is_speculating() && self.paren_query_known_to_fail() {
            return Err(self.unexpected_here());
        }
        let result = self.parse_paren_query_inner();
        if result.is_err() && self.is_speculating() {
            self.mark_paren_query_failed(start);
        }
        result
    }

    fn parse_paren_query_inner(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::ParenQuery, self.start_offset());
        self.expect(&mut node, &TokenKind::LeftParen)?;
        let query = self.parse_query()?;
        node.push_tree(query);
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    /// `WITH name [(cols)] AS (query), ...`
    pub(super) fn parse_with_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::WithClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::With)?;
        loop {
            let cte = self.parse_cte()?;
            node.push_tree(cte);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        Ok(node)
    }

    fn parse_cte(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Cte, self.start_offset());
        self.expect_identifier(&mut node)?;
        if self.check(&TokenKind::LeftParen) {
            let columns = self.parse_column_list()?;
            node.push_tree(columns);
        }
        self.expect_keyword(&mut node, Keyword::As)?;
        self.expect(&mut node, &TokenKind::LeftParen)?;
        let query = self.parse_query()?;
        node.push_tree(query);
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    /// `( name, ... )`
    pub(super) fn parse_column_list(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::ColumnList, self.start_offset());
        self.expect(&mut node, &TokenKind::LeftParen)?;
        loop {
            self.expect_identifier(&mut node)?;
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    fn parse_select_core(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Select, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Select)?;

        if !self.eat_keyword(&mut node, Keyword::Distinct) {
            self.eat_keyword(&mut node, Keyword::All);
        }

        if self.at_top_clause() {
            let top = self.parse_top_clause()?;
            node.push_tree(top);
        }

        let list = self.parse_select_list()?;
        node.push_tree(list);

        // INTO clause
        if self.check_keyword(Keyword::Into) {
            let mut into = ParseTree::new(Rule::IntoClause, self.start_offset());
            self.bump(&mut into);
            let name = self.parse_object_name()?;
            into.push_tree(name);
            node.push_tree(into);
        }

        // FROM clause
        if self.check_keyword(Keyword::From) {
            let from = self.parse_from_clause()?;
            node.push_tree(from);
        }

        // WHERE clause
        if self.check_keyword(Keyword::Where) {
            let selection = self.parse_where_clause()?;
            node.push_tree(selection);
        }

        // GROUP BY clause
        if self.check_keyword(Keyword::Group) {
            let mut group_by = ParseTree::new(Rule::GroupByClause, self.start_offset());
            self.bump(&mut group_by);
            self.expect_keyword(&mut group_by, Keyword::By)?;
            self.parse_expression_list(&mut group_by)?;
            if self.peek_keyword(Keyword::With)
                && (self.peek_nth_keyword(1, Keyword::Rollup) || self.peek_nth_keyword(1, Keyword::Cube))
            {
                self.bump(&mut group_by);
                self.bump(&mut group_by);
            }
            node.push_tree(group_by);
        }

        // HAVING clause
        if self.check_keyword(Keyword::Having) {
            let mut having = ParseTree::new(Rule::HavingClause, self.start_offset());
            self.bump(&mut having);
            let condition = self.parse_expression()?;
            having.push_tree(condition);
            node.push_tree(having);
        }
        Ok(node)
    }

    /// `TOP` only opens a clause when followed by `(` or a number.
    pub(super) fn at_top_clause(&self) -> bool {
        self.dialect.supports_top()
            && self.peek_keyword(Keyword::Top)
            && matches!(
                self.peek_nth(1).kind,
                TokenKind::LeftParen | TokenKind::Number(_) | TokenKind::Variable(_) | TokenKind::Parameter
            )
    }

    /// `TOP (expr) [PERCENT] [WITH TIES]` or `TOP n ...`
    pub(super) fn parse_top_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::TopClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Top)?;
        if self.eat(&mut node, &TokenKind::LeftParen) {
            let quantity = self.parse_expression()?;
            node.push_tree(quantity);
            self.expect(&mut node, &TokenKind::RightParen)?;
        } else {
            let quantity = self.parse_primary()?;
            node.push_tree(quantity);
        }
        self.eat_keyword(&mut node, Keyword::Percent);
        if self.peek_keyword(Keyword::With) && self.peek_nth_keyword(1, Keyword::Ties) {
            self.bump(&mut node);
            self.bump(&mut node);
        }
        Ok(node)
    }

    fn parse_select_list(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::SelectList, self.start_offset());
        loop {
            let item = self.parse_select_item()?;
            node.push_tree(item);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        Ok(node)
    }

    /// One projection item; also used for `OUTPUT` lists.
    pub(super) fn parse_select_item(&mut self) -> PResult<ParseTree> {
        let start = self.start_offset();

        if self.check(&TokenKind::Star) {
            let mut node = ParseTree::new(Rule::Wildcard, start);
            self.bump(&mut node);
            return Ok(node);
        }

        if self.qualified_wildcard_ahead() {
            let mut node = ParseTree::new(Rule::QualifiedWildcard, start);
            let mut name = ParseTree::new(Rule::ObjectName, start);
            self.bump(&mut name);
            while self.peek().kind == TokenKind::Dot && !self.peek_nth_is(1, &TokenKind::Star) {
                self.bump(&mut name);
                self.bump(&mut name);
            }
            node.push_tree(name);
            self.bump(&mut node);
            self.bump(&mut node);
            return Ok(node);
        }

        // @var = expr
        if matches!(self.peek().kind, TokenKind::Variable(_)) && self.peek_nth_is(1, &TokenKind::Eq) {
            let mut node = ParseTree::new(Rule::VariableAssignment, start);
            self.bump(&mut node);
            self.bump(&mut node);
            let value = self.parse_expression()?;
            node.push_tree(value);
            return Ok(node);
        }

        // alias = expr
        let named = self.peek_nth_is_name(0) || matches!(self.peek().kind, TokenKind::String { .. });
        if self.dialect.supports_alias_assignment() && named && self.peek_nth_is(1, &TokenKind::Eq) {
            let mut node = ParseTree::new(Rule::AliasAssignment, start);
            self.bump(&mut node);
            self.bump(&mut node);
            let value = self.parse_expression()?;
            node.push_tree(value);
            return Ok(node);
        }

        let mut node = ParseTree::new(Rule::SelectItem, start);
        let expr = self.parse_expression()?;
        node.push_tree(expr);
        if let Some(alias) = self.parse_column_alias()? {
            node.push_tree(alias);
        }
        Ok(node)
    }

    /// Scans `name(.name)*.*` without consuming anything.
    fn qualified_wildcard_ahead(&self) -> bool {
        let mut n = 0;
        while self.peek_nth_is_name(n) && self.peek_nth_is(n + 1, &TokenKind::Dot) {
            if self.peek_nth_is(n + 2, &TokenKind::Star) {
                return true;
            }
            n += 2;
        }
        false
    }

    fn at_implicit_alias(&self) -> bool {
        self.peek_nth_is_name(0)
            && !self
                .peek()
                .as_keyword()
                .is_some_and(|kw| CLAUSE_WORDS.contains(&kw))
    }

    /// `[AS] alias`, where the alias may also be a string literal.
    fn parse_column_alias(&mut self) -> PResult<Option<ParseTree>> {
        let mut node = ParseTree::new(Rule::Alias, self.start_offset());
        if self.eat_keyword(&mut node, Keyword::As) {
            if matches!(self.peek().kind, TokenKind::String { .. }) {
                self.bump(&mut node);
            } else {
                self.expect_identifier(&mut node)?;
            }
            return Ok(Some(node));
        }
        self.note(Expected::Identifier);
        if self.at_implicit_alias() || matches!(self.peek().kind, TokenKind::String { .. }) {
            self.bump(&mut node);
            return Ok(Some(node));
        }
        Ok(None)
    }

    /// `[AS] alias [(cols)]`; column lists only where `with_columns` is set.
    fn parse_table_alias(&mut self, with_columns: bool) -> PResult<Option<ParseTree>> {
        let mut node = ParseTree::new(Rule::TableAlias, self.start_offset());
        if self.eat_keyword(&mut node, Keyword::As) {
            self.expect_identifier(&mut node)?;
        } else {
            self.note(Expected::Identifier);
            if !self.at_implicit_alias() {
                return Ok(None);
            }
            self.bump(&mut node);
        }
        if with_columns && self.peek().kind == TokenKind::LeftParen {
            let columns = self.parse_column_list()?;
            node.push_tree(columns);
        }
        Ok(Some(node))
    }

    /// `name(.name)*`; a variable stands in for a table name.
    pub(super) fn parse_object_name(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::ObjectName, self.start_offset());
        if matches!(self.peek().kind, TokenKind::Variable(_)) {
            self.bump(&mut node);
            return Ok(node);
        }
        self.expect_identifier(&mut node)?;
        while self.peek().kind == TokenKind::Dot && self.peek_nth_is_name(1) {
            self.bump(&mut node);
            self.bump(&mut node);
        }
        Ok(node)
    }

    fn parse_from_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::FromClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::From)?;
        loop {
            let table = self.parse_table_ref()?;
            node.push_tree(table);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        Ok(node)
    }

    /// Consumes join keywords; returns whether the join takes ON/USING.
    fn parse_join_operator(&mut self, node: &mut ParseTree) -> PResult<Option<bool>> {
        if self.check_keyword(Keyword::Join) {
            self.bump(node);
            return Ok(Some(true));
        }
        if self.check_keyword(Keyword::Inner) {
            self.bump(node);
            self.expect_keyword(node, Keyword::Join)?;
            return Ok(Some(true));
        }
        let outer = self.check_keyword(Keyword::Left) || self.check_keyword(Keyword::Right) || self.check_keyword(Keyword::Full);
        if outer {
            self.bump(node);
            self.eat_keyword(node, Keyword::Outer);
            self.expect_keyword(node, Keyword::Join)?;
            return Ok(Some(true));
        }
        if self.check_keyword(Keyword::Cross) {
            self.bump(node);
            if self.peek_keyword(Keyword::Apply) {
                self.bump(node);
            } else {
                self.expect_keyword(node, Keyword::Join)?;
            }
            return Ok(Some(false));
        }
        if self.peek_keyword(Keyword::Outer) && self.peek_nth_keyword(1, Keyword::Apply) {
            self.bump(node);
            self.bump(node);
            return Ok(Some(false));
        }
        Ok(None)
    }

    /// A table factor followed by any number of joins, left-associative.
    pub(super) fn parse_table_ref(&mut self) -> PResult<ParseTree> {
        let _guard = self.enter()?;
        let mut spine = Vec::new();
        let mut left = self.parse_table_factor()?;
        loop {
            let mut node = ParseTree::new(Rule::Join, left.span.start);
            let Some(takes_constraint) = self.parse_join_operator(&mut node)? else {
                break;
            };
            spine.push(self.enter()?);
            // The join keywords go after the left operand.
            node.children.insert(0, super::ParseNode::Tree(left));
            node.span = node.trees().fold(node.span, |span, t| span.merge(t.span));
            let right = self.parse_table_factor()?;
            node.push_tree(right);
            if takes_constraint {
                if self.check_keyword(Keyword::Using) {
                    let mut using = ParseTree::new(Rule::JoinUsing, self.start_offset());
                    self.bump(&mut using);
                    let columns = self.parse_column_list()?;
                    using.push_tree(columns);
                    node.push_tree(using);
                } else {
                    let mut on = ParseTree::new(Rule::JoinOn, self.start_offset());
                    self.expect_keyword(&mut on, Keyword::On)?;
                    let condition = self.parse_expression()?;
                    on.push_tree(condition);
                    node.push_tree(on);
                }
            }
            left = node;
        }
        Ok(left)
    }

    pub(super) fn parse_table_factor(&mut self) -> PResult<ParseTree> {
        let start = self.start_offset();
        if self.check(&TokenKind::LeftParen) {
            if self.peek_nth_keyword(1, Keyword::Select) || self.peek_nth_keyword(1, Keyword::With) {
                let query = self.parse_paren_query()?;
                return self.finish_derived_table(query);
            }
            if self.peek_nth_is(1, &TokenKind::LeftParen) {
                if let Some(query) = self.speculate(Rule::DerivedTable, Self::parse_paren_query)? {
                    return self.finish_derived_table(query);
                }
            }
            let mut node = ParseTree::new(Rule::NestedJoin, start);
            self.bump(&mut node);
            let inner = self.parse_table_ref()?;
            node.push_tree(inner);
            self.expect(&mut node, &TokenKind::RightParen)?;
            return Ok(node);
        }

        let name = self.parse_object_name()?;
        if self.peek().kind == TokenKind::LeftParen {
            let mut node = ParseTree::new(Rule::TableFunction, start);
            node.push_tree(name);
            self.bump(&mut node);
            if !self.check(&TokenKind::RightParen) {
                self.parse_expression_list(&mut node)?;
            }
            self.expect(&mut node, &TokenKind::RightParen)?;
            if let Some(alias) = self.parse_table_alias(true)? {
                node.push_tree(alias);
            }
            return Ok(node);
        }

        let mut node = ParseTree::new(Rule::NamedTable, start);
        node.push_tree(name);
        if let Some(alias) = self.parse_table_alias(false)? {
            node.push_tree(alias);
        }
        if self.dialect.supports_table_hints() && self.peek_keyword(Keyword::With) && self.peek_nth_is(1, &TokenKind::LeftParen) {
            let hints = self.parse_table_hints()?;
            node.push_tree(hints);
        }
        Ok(node)
    }

    fn finish_derived_table(&mut self, query: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::DerivedTable, query.span.start);
        node.push_tree(query);
        if let Some(alias) = self.parse_table_alias(true)? {
            node.push_tree(alias);
        }
        Ok(node)
    }

    /// `WITH ( hint [(args)], ... )`
    fn parse_table_hints(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::TableHints, self.start_offset());
        self.expect_keyword(&mut node, Keyword::With)?;
        self.expect(&mut node, &TokenKind::LeftParen)?;
        loop {
            let mut hint = ParseTree::new(Rule::TableHint, self.start_offset());
            // Hint names include reserved words such as HOLDLOCK.
            if matches!(self.peek().kind, TokenKind::Keyword(_)) {
                self.bump(&mut hint);
            } else {
                self.expect_identifier(&mut hint)?;
            }
            if self.eat(&mut hint, &TokenKind::LeftParen) {
                self.parse_expression_list(&mut hint)?;
                self.expect(&mut hint, &TokenKind::RightParen)?;
            }
            node.push_tree(hint);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    pub(super) fn parse_where_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::WhereClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Where)?;
        let condition = self.parse_expression()?;
        node.push_tree(condition);
        Ok(node)
    }

    /// `ORDER BY item, ...`; also used inside `OVER (...)`.
    pub(super) fn parse_order_by_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::OrderByClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Order)?;
        self.expect_keyword(&mut node, Keyword::By)?;
        loop {
            let mut item = ParseTree::new(Rule::OrderByItem, self.start_offset());
            let expr = self.parse_expression()?;
            item.push_tree(expr);
            if !self.eat_keyword(&mut item, Keyword::Asc) {
                self.eat_keyword(&mut item, Keyword::Desc);
            }
            if self.eat_keyword(&mut item, Keyword::Nulls) {
                self.expect_one_of_keywords(&mut item, &[Keyword::First, Keyword::Last])?;
            }
            node.push_tree(item);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        Ok(node)
    }

    /// `OFFSET n ROWS [FETCH NEXT m ROWS ONLY]`
    fn parse_offset_fetch(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::OffsetFetch, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Offset)?;
        let offset = self.parse_expression()?;
        node.push_tree(offset);
        let has_rows = self.eat_keyword(&mut node, Keyword::Rows) || self.eat_keyword(&mut node, Keyword::Row);
        if !has_rows && !self.dialect.supports_limit_offset() {
            self.expect_keyword(&mut node, Keyword::Rows)?;
        }
        if self.eat_keyword(&mut node, Keyword::Fetch) {
            self.expect_one_of_keywords(&mut node, &[Keyword::Next, Keyword::First])?;
            let count = self.parse_expression()?;
            node.push_tree(count);
            self.expect_one_of_keywords(&mut node, &[Keyword::Rows, Keyword::Row])?;
            self.expect_keyword(&mut node, Keyword::Only)?;
        }
        Ok(node)
    }

    /// `LIMIT n [OFFSET m]`
    fn parse_limit_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::LimitClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Limit)?;
        let count = self.parse_expression()?;
        node.push_tree(count);
        if self.eat_keyword(&mut node, Keyword::Offset) {
            let offset = self.parse_expression()?;
            node.push_tree(offset);
        }
        Ok(node)
    }

    /// `OPTION ( hint [arg ...], ... )`
    fn parse_option_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::OptionClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Option)?;
        self.expect(&mut node, &TokenKind::LeftParen)?;
        loop {
            let mut hint = ParseTree::new(Rule::QueryHint, self.start_offset());
            if matches!(self.peek().kind, TokenKind::Keyword(_)) {
                self.bump(&mut hint);
            } else {
                self.expect_identifier(&mut hint)?;
            }
            loop {
                let token = self.peek();
                let is_word = matches!(token.kind, TokenKind::Identifier { .. } | TokenKind::Keyword(_));
                let is_value = matches!(token.kind, TokenKind::Number(_) | TokenKind::String { .. });
                if is_word {
                    let mut word = ParseTree::new(Rule::ColumnRef, token.span.start);
                    self.bump(&mut word);
                    hint.push_tree(word);
                } else if is_value {
                    let mut literal = ParseTree::new(Rule::Literal, token.span.start);
                    self.bump(&mut literal);
                    hint.push_tree(literal);
                } else {
                    break;
                }
            }
            node.push_tree(hint);
            if !self.eat(&mut node, &TokenKind::Comma) {
                break;
            }
        }
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }
}
