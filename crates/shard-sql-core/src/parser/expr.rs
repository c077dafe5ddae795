//! Expression grammar.
//!
//! Binary operators are parsed by precedence climbing over the table in
//! [`precedence`](super::precedence); predicates (`IS`, `IN`, `BETWEEN`,
//! `LIKE`) and postfix operators (`COLLATE`, `AT TIME ZONE`) share the same
//! loop. Everything else is a primary.

use super::parser::{PResult, Parser};
use super::precedence::{self, BIT_OR, UNARY};
use super::{Expected, ParseNode, ParseTree, Rule};
use crate::lexer::{Keyword, NumberKind, Token, TokenKind};

impl Parser<'_> {
    /// Parses an expression.
    pub(super) fn parse_expression(&mut self) -> PResult<ParseTree> {
        self.parse_subexpr(precedence::LOWEST)
    }

    /// `expr (, expr)*`, pushed into `node` along with the commas.
    pub(super) fn parse_expression_list(&mut self, node: &mut ParseTree) -> PResult<()> {
        loop {
            let expr = self.parse_expression()?;
            node.push_tree(expr);
            if !self.eat(node, &TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    /// Parses operators binding at least as tightly as `min`.
    pub(super) fn parse_subexpr(&mut self, min: u8) -> PResult<ParseTree> {
        let _guard = self.enter()?;
        // Each operator applied here nests `lhs` one level deeper.
        let mut spine = Vec::new();
        let mut lhs = self.parse_prefix()?;
        loop {
            let negated = self.peek_keyword(Keyword::Not)
                && (self.peek_nth_keyword(1, Keyword::In)
                    || self.peek_nth_keyword(1, Keyword::Between)
                    || self.peek_nth_keyword(1, Keyword::Like));
            let operator = if negated { self.peek_nth(1) } else { self.peek() };
            let Some((level, associativity)) = precedence::infix_precedence(&operator.kind) else {
                break;
            };
            if level < min {
                break;
            }
            let keyword = operator.as_keyword();
            if keyword == Some(Keyword::At)
                && !(self.peek_nth_keyword(1, Keyword::Time) && self.peek_nth_keyword(2, Keyword::Zone))
            {
                break;
            }
            spine.push(self.enter()?);
            lhs = match keyword {
                Some(Keyword::Is) => self.parse_is(lhs)?,
                Some(Keyword::In) => self.parse_in(lhs)?,
                Some(Keyword::Between) => self.parse_between(lhs)?,
                Some(Keyword::Like) => self.parse_like(lhs)?,
                Some(Keyword::Collate) => self.parse_collate(lhs)?,
                Some(Keyword::At) => self.parse_at_time_zone(lhs)?,
                _ => self.parse_binary(lhs, associativity.right_operand_min(level))?,
            };
        }
        Ok(lhs)
    }

    fn parse_binary(&mut self, lhs: ParseTree, right_min: u8) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::BinaryExpr, lhs.span.start);
        node.push_tree(lhs);
        let is_comparison =
            precedence::token_to_binary_op(&self.peek().kind).is_some_and(|op| op.is_comparison());
        self.bump(&mut node);
        let quantified = is_comparison
            && (self.peek_keyword(Keyword::Any) || self.peek_keyword(Keyword::Some) || self.peek_keyword(Keyword::All))
            && self.peek_nth_is(1, &TokenKind::LeftParen);
        if quantified {
            node.rule = Rule::QuantifiedComparison;
            self.bump(&mut node);
            let query = self.parse_paren_query()?;
            node.push_tree(query);
        } else {
            let rhs = self.parse_subexpr(right_min)?;
            node.push_tree(rhs);
        }
        Ok(node)
    }

    /// `expr IS [NOT] {NULL | TRUE | FALSE | UNKNOWN}`
    fn parse_is(&mut self, lhs: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::IsPredicate, lhs.span.start);
        node.push_tree(lhs);
        self.expect_keyword(&mut node, Keyword::Is)?;
        self.eat_keyword(&mut node, Keyword::Not);
        self.expect_one_of_keywords(
            &mut node,
            &[Keyword::Null, Keyword::True, Keyword::False, Keyword::Unknown],
        )?;
        Ok(node)
    }

    /// `expr [NOT] IN ( query | expr, ... )`
    fn parse_in(&mut self, lhs: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::InPredicate, lhs.span.start);
        node.push_tree(lhs);
        self.eat_keyword(&mut node, Keyword::Not);
        self.expect_keyword(&mut node, Keyword::In)?;
        if self.peek().kind == TokenKind::LeftParen
            && (self.peek_nth_keyword(1, Keyword::Select) || self.peek_nth_keyword(1, Keyword::With))
        {
            let query = self.parse_paren_query()?;
            node.push_tree(query);
            return Ok(node);
        }
        self.expect(&mut node, &TokenKind::LeftParen)?;
        self.parse_expression_list(&mut node)?;
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    /// `expr [NOT] BETWEEN low AND high`
    fn parse_between(&mut self, lhs: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::BetweenPredicate, lhs.span.start);
        node.push_tree(lhs);
        self.eat_keyword(&mut node, Keyword::Not);
        self.expect_keyword(&mut node, Keyword::Between)?;
        let low = self.parse_subexpr(BIT_OR)?;
        node.push_tree(low);
        self.expect_keyword(&mut node, Keyword::And)?;
        let high = self.parse_subexpr(BIT_OR)?;
        node.push_tree(high);
        Ok(node)
    }

    /// `expr [NOT] LIKE pattern [ESCAPE char]`
    fn parse_like(&mut self, lhs: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::LikePredicate, lhs.span.start);
        node.push_tree(lhs);
        self.eat_keyword(&mut node, Keyword::Not);
        self.expect_keyword(&mut node, Keyword::Like)?;
        let pattern = self.parse_subexpr(BIT_OR)?;
        node.push_tree(pattern);
        if self.eat_keyword(&mut node, Keyword::Escape) {
            let escape = self.parse_subexpr(BIT_OR)?;
            node.push_tree(escape);
        }
        Ok(node)
    }

    fn parse_collate(&mut self, lhs: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Collate, lhs.span.start);
        node.push_tree(lhs);
        self.expect_keyword(&mut node, Keyword::Collate)?;
        self.expect_identifier(&mut node)?;
        Ok(node)
    }

    fn parse_at_time_zone(&mut self, lhs: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::AtTimeZone, lhs.span.start);
        node.push_tree(lhs);
        self.expect_keyword(&mut node, Keyword::At)?;
        self.expect_keyword(&mut node, Keyword::Time)?;
        self.expect_keyword(&mut node, Keyword::Zone)?;
        let zone = self.parse_subexpr(UNARY)?;
        node.push_tree(zone);
        Ok(node)
    }

    fn parse_prefix(&mut self) -> PResult<ParseTree> {
        let Some(level) = precedence::prefix_precedence(&self.peek().kind) else {
            return self.parse_primary();
        };
        let mut node = ParseTree::new(Rule::UnaryExpr, self.start_offset());
        self.bump(&mut node);
        let operand = self.parse_subexpr(level)?;
        node.push_tree(operand);
        Ok(node)
    }

    /// Parses a primary expression.
    ///
    /// Tokens skipped by recovery are kept in an error node ahead of the
    /// primary.
    pub(super) fn parse_primary(&mut self) -> PResult<ParseTree> {
        let mut skipped = ParseTree::new(Rule::Error, self.start_offset());
        let mut primary = self.parse_primary_inner(&mut skipped)?;
        if !skipped.children.is_empty() {
            primary.span = skipped.span.merge(primary.span);
            primary.children.insert(0, ParseNode::Tree(skipped));
        }
        Ok(primary)
    }

    fn parse_primary_inner(&mut self, scratch: &mut ParseTree) -> PResult<ParseTree> {
        loop {
            self.note(Expected::Expression);
            let start = self.start_offset();
            let next_is_paren = self.peek_nth_is(1, &TokenKind::LeftParen);
            let is_name = self.check_identifier();
            match self.peek().kind.clone() {
                TokenKind::Number(_)
                | TokenKind::String { .. }
                | TokenKind::HexString(_)
                | TokenKind::BitString(_)
                | TokenKind::Keyword(Keyword::Null | Keyword::True | Keyword::False) => {
                    return Ok(self.single(Rule::Literal));
                }
                TokenKind::Parameter => return Ok(self.single(Rule::Parameter)),
                TokenKind::Variable(_) => return Ok(self.single(Rule::Variable)),
                TokenKind::LeftParen => return self.parse_paren_expr(),
                TokenKind::LeftBrace => return self.parse_odbc_literal(),
                TokenKind::Keyword(Keyword::Case) => return self.parse_case(),
                TokenKind::Keyword(Keyword::Cast | Keyword::TryCast) => return self.parse_cast(),
                TokenKind::Keyword(Keyword::Convert | Keyword::TryConvert) => return self.parse_convert(),
                TokenKind::Keyword(Keyword::Exists) => {
                    let mut node = ParseTree::new(Rule::Exists, start);
                    self.bump(&mut node);
                    let query = self.parse_paren_query()?;
                    node.push_tree(query);
                    return Ok(node);
                }
                TokenKind::Keyword(Keyword::Default) if self.default_allowed => {
                    return Ok(self.single(Rule::DefaultValue));
                }
                TokenKind::Keyword(Keyword::Date | Keyword::Time | Keyword::Timestamp)
                    if matches!(self.peek_nth(1).kind, TokenKind::String { .. }) =>
                {
                    let mut node = ParseTree::new(Rule::TypedLiteral, start);
                    self.bump(&mut node);
                    self.bump(&mut node);
                    return Ok(node);
                }
                TokenKind::Keyword(
                    Keyword::CurrentTimestamp
                    | Keyword::CurrentDate
                    | Keyword::CurrentTime
                    | Keyword::CurrentUser
                    | Keyword::SessionUser
                    | Keyword::SystemUser
                    | Keyword::User,
                ) if !next_is_paren => {
                    let mut node = ParseTree::new(Rule::FunctionCall, start);
                    let name = self.single(Rule::ObjectName);
                    node.push_tree(name);
                    return Ok(node);
                }
                TokenKind::Keyword(Keyword::Left | Keyword::Right | Keyword::Coalesce | Keyword::Nullif)
                    if next_is_paren =>
                {
                    let name = self.single(Rule::ObjectName);
                    return self.parse_function_call(name);
                }
                _ if is_name => {
                    let mut name = self.parse_object_name()?;
                    if self.peek().kind == TokenKind::LeftParen {
                        return self.parse_function_call(name);
                    }
                    name.rule = Rule::ColumnRef;
                    return Ok(name);
                }
                _ => self.fail_alternatives(scratch)?,
            }
        }
    }

    /// A node holding just the current token.
    fn single(&mut self, rule: Rule) -> ParseTree {
        let mut node = ParseTree::new(rule, self.start_offset());
        self.bump(&mut node);
        node
    }

    /// `(` opens a subquery, a parenthesized expression or a row value.
    fn parse_paren_expr(&mut self) -> PResult<ParseTree> {
        if self.peek_nth_keyword(1, Keyword::Select) || self.peek_nth_keyword(1, Keyword::With) {
            let mut query = self.parse_paren_query()?;
            query.rule = Rule::Subquery;
            return Ok(query);
        }
        if self.peek_nth_is(1, &TokenKind::LeftParen) {
            if let Some(mut query) = self.speculate(Rule::Subquery, Self::parse_paren_query)? {
                query.rule = Rule::Subquery;
                return Ok(query);
            }
        }
        let mut node = ParseTree::new(Rule::Paren, self.start_offset());
        self.expect(&mut node, &TokenKind::LeftParen)?;
        let inner = self.parse_expression()?;
        node.push_tree(inner);
        if self.check(&TokenKind::Comma) {
            node.rule = Rule::Row;
            while self.eat(&mut node, &TokenKind::Comma) {
                let item = self.parse_expression()?;
                node.push_tree(item);
            }
        }
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    /// `{d '...'}`, `{t '...'}`, `{ts '...'}`
    fn parse_odbc_literal(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::OdbcLiteral, self.start_offset());
        self.expect(&mut node, &TokenKind::LeftBrace)?;
        self.expect_identifier(&mut node)?;
        self.note(Expected::Literal);
        if matches!(self.peek().kind, TokenKind::String { .. }) {
            self.bump(&mut node);
        } else {
            node.push_missing(Expected::Literal);
            return Err(self.unexpected_here());
        }
        self.expect(&mut node, &TokenKind::RightBrace)?;
        Ok(node)
    }

    /// `name ( [DISTINCT | ALL] args ) [OVER (...)]`
    fn parse_function_call(&mut self, name: ParseTree) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::FunctionCall, name.span.start);
        node.push_tree(name);
        self.expect(&mut node, &TokenKind::LeftParen)?;
        if !self.eat_keyword(&mut node, Keyword::Distinct) {
            self.eat_keyword(&mut node, Keyword::All);
        }
        if self.check(&TokenKind::Star) {
            let wildcard = self.single(Rule::Wildcard);
            node.push_tree(wildcard);
        } else if !self.check(&TokenKind::RightParen) {
            self.parse_expression_list(&mut node)?;
        }
        self.expect(&mut node, &TokenKind::RightParen)?;
        if self.peek_keyword(Keyword::Over) && self.peek_nth_is(1, &TokenKind::LeftParen) {
            let over = self.parse_over_clause()?;
            node.push_tree(over);
        }
        Ok(node)
    }

    /// `OVER ( [PARTITION BY ...] [ORDER BY ...] [frame] )`
    fn parse_over_clause(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::OverClause, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Over)?;
        self.expect(&mut node, &TokenKind::LeftParen)?;
        if self.check_keyword(Keyword::Partition) {
            let mut partition = ParseTree::new(Rule::PartitionBy, self.start_offset());
            self.bump(&mut partition);
            self.expect_keyword(&mut partition, Keyword::By)?;
            self.parse_expression_list(&mut partition)?;
            node.push_tree(partition);
        }
        if self.check_keyword(Keyword::Order) {
            let order_by = self.parse_order_by_clause()?;
            node.push_tree(order_by);
        }
        if self.check_keyword(Keyword::Rows) || self.check_keyword(Keyword::Range) {
            let frame = self.parse_window_frame()?;
            node.push_tree(frame);
        }
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    fn parse_window_frame(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::WindowFrame, self.start_offset());
        self.expect_one_of_keywords(&mut node, &[Keyword::Rows, Keyword::Range])?;
        if self.eat_keyword(&mut node, Keyword::Between) {
            let start = self.parse_frame_bound()?;
            node.push_tree(start);
            self.expect_keyword(&mut node, Keyword::And)?;
            let end = self.parse_frame_bound()?;
            node.push_tree(end);
        } else {
            let start = self.parse_frame_bound()?;
            node.push_tree(start);
        }
        Ok(node)
    }

    /// `UNBOUNDED {PRECEDING | FOLLOWING}`, `CURRENT ROW`, or `n {PRECEDING | FOLLOWING}`
    fn parse_frame_bound(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::FrameBound, self.start_offset());
        if self.eat_keyword(&mut node, Keyword::Current) {
            self.expect_keyword(&mut node, Keyword::Row)?;
            return Ok(node);
        }
        if !self.eat_keyword(&mut node, Keyword::Unbounded) {
            let offset = self.parse_subexpr(BIT_OR)?;
            node.push_tree(offset);
        }
        self.expect_one_of_keywords(&mut node, &[Keyword::Preceding, Keyword::Following])?;
        Ok(node)
    }

    /// `CAST ( expr AS type )` and `TRY_CAST`
    fn parse_cast(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Cast, self.start_offset());
        self.bump(&mut node);
        self.expect(&mut node, &TokenKind::LeftParen)?;
        let expr = self.parse_expression()?;
        node.push_tree(expr);
        self.expect_keyword(&mut node, Keyword::As)?;
        let data_type = self.parse_data_type()?;
        node.push_tree(data_type);
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    /// `CONVERT ( type, expr [, style] )` and `TRY_CONVERT`
    fn parse_convert(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Convert, self.start_offset());
        self.bump(&mut node);
        self.expect(&mut node, &TokenKind::LeftParen)?;
        let data_type = self.parse_data_type()?;
        node.push_tree(data_type);
        self.expect(&mut node, &TokenKind::Comma)?;
        let expr = self.parse_expression()?;
        node.push_tree(expr);
        if self.eat(&mut node, &TokenKind::Comma) {
            let style = self.parse_expression()?;
            node.push_tree(style);
        }
        self.expect(&mut node, &TokenKind::RightParen)?;
        Ok(node)
    }

    /// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
    fn parse_case(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::Case, self.start_offset());
        self.expect_keyword(&mut node, Keyword::Case)?;
        if !self.check_keyword(Keyword::When) {
            let operand = self.parse_expression()?;
            node.push_tree(operand);
        }
        loop {
            let mut when = ParseTree::new(Rule::CaseWhen, self.start_offset());
            self.expect_keyword(&mut when, Keyword::When)?;
            let condition = self.parse_expression()?;
            when.push_tree(condition);
            self.expect_keyword(&mut when, Keyword::Then)?;
            let result = self.parse_expression()?;
            when.push_tree(result);
            node.push_tree(when);
            if !self.check_keyword(Keyword::When) {
                break;
            }
        }
        if self.check_keyword(Keyword::Else) {
            let mut otherwise = ParseTree::new(Rule::CaseElse, self.start_offset());
            self.bump(&mut otherwise);
            let result = self.parse_expression()?;
            otherwise.push_tree(result);
            node.push_tree(otherwise);
        }
        self.expect_keyword(&mut node, Keyword::End)?;
        Ok(node)
    }

    /// `name[.name] [PRECISION] [( n | MAX, ... )]`
    ///
    /// Type names are looked up later, so any name is accepted here. Reserved
    /// words other than the temporal type keywords need delimiters.
    pub(super) fn parse_data_type(&mut self) -> PResult<ParseTree> {
        let mut node = ParseTree::new(Rule::DataType, self.start_offset());
        self.note(Expected::DataType);
        if TYPE_KEYWORDS.iter().any(|kw| self.peek_keyword(*kw)) {
            self.bump(&mut node);
        } else {
            self.expect_identifier(&mut node)?;
        }
        while self.peek().kind == TokenKind::Dot && self.peek_nth_is_name(1) {
            self.bump(&mut node);
            self.bump(&mut node);
        }
        if self.peek_keyword(Keyword::Precision) {
            self.bump(&mut node);
        }
        if self.eat(&mut node, &TokenKind::LeftParen) {
            loop {
                self.note(Expected::Literal);
                let is_max = matches!(&self.peek().kind, TokenKind::Identifier { value, quote: None } if value.eq_ignore_ascii_case("max"));
                if is_type_argument(self.peek()) || is_max {
                    self.bump(&mut node);
                } else {
                    self.fail_alternatives(&mut node)?;
                    continue;
                }
                if !self.eat(&mut node, &TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&mut node, &TokenKind::RightParen)?;
        }
        Ok(node)
    }
}

/// Keywords that name a data type even where they are reserved.
const TYPE_KEYWORDS: [Keyword; 3] = [Keyword::Date, Keyword::Time, Keyword::Timestamp];

/// Lengths, precisions and scales are unsigned integers.
fn is_type_argument(token: &Token) -> bool {
    token.kind == TokenKind::Number(NumberKind::Integer) && token.lexeme.parse::<u64>().is_ok()
}

#[cfg(test)]
mod tests {
    use crate::dialect::GenericDialect;
    use crate::parser::{ParseTree, Parser, ParserOptions, Rule, SyntaxError};

    fn expr(sql: &str) -> ParseTree {
        Parser::from_sql(sql, &GenericDialect, ParserOptions::default())
            .unwrap()
            .parse_expr()
            .unwrap()
    }

    fn rules(tree: &ParseTree) -> Vec<Rule> {
        tree.trees().map(|t| t.rule).collect()
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let tree = expr("1 + 2 * 3");
        assert_eq!(tree.rule, Rule::BinaryExpr);
        assert_eq!(rules(&tree), vec![Rule::Literal, Rule::BinaryExpr]);
    }

    #[test]
    fn test_left_associative() {
        let tree = expr("1 - 2 - 3");
        assert_eq!(rules(&tree), vec![Rule::BinaryExpr, Rule::Literal]);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let tree = expr("a OR b AND c");
        assert_eq!(rules(&tree), vec![Rule::ColumnRef, Rule::BinaryExpr]);
    }

    #[test]
    fn test_not_between() {
        let tree = expr("x NOT BETWEEN 1 AND 2 AND y = 3");
        assert_eq!(tree.rule, Rule::BinaryExpr);
        assert_eq!(tree.trees().next().unwrap().rule, Rule::BetweenPredicate);
    }

    #[test]
    fn test_prefix_not_covers_comparison() {
        let tree = expr("NOT a = 1");
        assert_eq!(tree.rule, Rule::UnaryExpr);
        assert_eq!(rules(&tree), vec![Rule::BinaryExpr]);
    }

    #[test]
    fn test_paren_speculation() {
        let tree = expr("((SELECT 1))");
        assert_eq!(tree.rule, Rule::Subquery);

        let tree = expr("((1) + 2)");
        assert_eq!(tree.rule, Rule::Paren);

        let tree = expr("(1, 2)");
        assert_eq!(tree.rule, Rule::Row);
    }

    #[test]
    fn test_function_with_window() {
        let tree = expr("SUM(x) OVER (PARTITION BY g ORDER BY d ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)");
        assert_eq!(tree.rule, Rule::FunctionCall);
        let over = tree.child(Rule::OverClause).unwrap();
        assert_eq!(rules(over), vec![Rule::PartitionBy, Rule::OrderByClause, Rule::WindowFrame]);
    }

    #[test]
    fn test_case_and_cast() {
        let tree = expr("CASE WHEN a THEN CAST(b AS VARCHAR(10)) ELSE 0 END");
        assert_eq!(rules(&tree), vec![Rule::CaseWhen, Rule::CaseElse]);
    }

    #[test]
    fn test_recursion_limit() {
        let sql = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        let err = Parser::from_sql(&sql, &GenericDialect, ParserOptions::default())
            .unwrap()
            .parse_expr()
            .unwrap_err();
        assert!(matches!(err, SyntaxError::RecursionLimit { limit: 64, .. }));
    }
}
