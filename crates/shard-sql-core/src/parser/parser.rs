//! SQL Parser implementation.
//!
//! The parser works on a pre-lexed token buffer so it can rewind for
//! speculative parsing. Each grammar rule is one method that builds a
//! [`ParseTree`] node; the methods live in `query.rs`, `expr.rs`, `dml.rs`
//! and `ddl.rs` next to this file.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::error::starts_statement;
use super::{
    BailErrorStrategy, DefaultErrorStrategy, ErrorStrategy, Expected, ExpectedSet, ParseErrorRecord,
    ParseNode, ParseTree, ParserOptions, RecoveryAction, RecoveryContext, Rule, SyntaxError,
};
use crate::cancel::CancellationToken;
use crate::dialect::{is_unreserved_word, Dialect};
use crate::lexer::{tokenize, Keyword, LexicalError, Span, Token, TokenKind};

pub(super) type PResult<T> = Result<T, SyntaxError>;

/// Tracks remaining nesting depth; shared with the guards it hands out.
#[derive(Debug)]
struct RecursionCounter {
    remaining: Rc<Cell<usize>>,
}

impl RecursionCounter {
    fn new(limit: usize) -> Self {
        Self {
            remaining: Rc::new(Cell::new(limit)),
        }
    }

    fn try_decrease(&self) -> Option<DepthGuard> {
        let old = self.remaining.get();
        if old == 0 {
            return None;
        }
        self.remaining.set(old - 1);
        Some(DepthGuard {
            remaining: Rc::clone(&self.remaining),
        })
    }
}

/// Gives one level of depth back when dropped.
#[derive(Debug)]
pub(super) struct DepthGuard {
    remaining: Rc<Cell<usize>>,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let old = self.remaining.get();
        self.remaining.set(old + 1);
    }
}

/// The parse tree and error records for one statement of a script.
#[derive(Debug, Clone)]
pub struct StatementTree {
    pub tree: ParseTree,
    /// Empty when the statement parsed cleanly.
    pub errors: Vec<ParseErrorRecord>,
}

/// SQL Parser.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    pub(super) dialect: &'a dyn Dialect,
    options: ParserOptions,
    strategy: Box<dyn ErrorStrategy + 'a>,
    errors: Vec<ParseErrorRecord>,
    /// Alternatives tried at `expected_pos`.
    expected: ExpectedSet,
    expected_pos: usize,
    /// Nesting of active speculative parses.
    speculating: usize,
    /// Furthest token index reached by the current speculation.
    speculation_reach: usize,
    /// Tokens examined by failed speculations in the current statement.
    lookahead_used: usize,
    /// Positions where a parenthesized query is known not to parse.
    failed_paren_queries: HashSet<usize>,
    last_insert: Option<usize>,
    recursion: RecursionCounter,
    /// `DEFAULT` is accepted as an expression (VALUES rows, SET, EXEC args).
    pub(super) default_allowed: bool,
}

impl<'a> Parser<'a> {
    /// Creates a parser over already lexed tokens.
    ///
    /// An end-of-input token is appended if the buffer lacks one.
    #[must_use]
    pub fn new(mut tokens: Vec<Token>, dialect: &'a dyn Dialect, options: ParserOptions) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            let (line, column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
            tokens.push(Token::new(TokenKind::Eof, "", Span::at(end), line, column));
        }
        let strategy: Box<dyn ErrorStrategy> = if options.recover {
            Box::new(DefaultErrorStrategy)
        } else {
            Box::new(BailErrorStrategy)
        };
        Self {
            tokens,
            pos: 0,
            dialect,
            recursion: RecursionCounter::new(options.max_depth),
            options,
            strategy,
            errors: Vec::new(),
            expected: ExpectedSet::new(),
            expected_pos: 0,
            speculating: 0,
            speculation_reach: 0,
            lookahead_used: 0,
            failed_paren_queries: HashSet::new(),
            last_insert: None,
            default_allowed: false,
        }
    }

    /// Lexes `sql` and creates a parser over it.
    ///
    /// # Errors
    ///
    /// Returns the first lexical error.
    pub fn from_sql(sql: &str, dialect: &'a dyn Dialect, options: ParserOptions) -> Result<Self, LexicalError> {
        Ok(Self::new(tokenize(sql, dialect)?, dialect, options))
    }

    /// Replaces the error strategy chosen from the options.
    #[must_use]
    pub fn with_error_strategy(mut self, strategy: Box<dyn ErrorStrategy + 'a>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Error records collected so far.
    #[must_use]
    pub fn errors(&self) -> &[ParseErrorRecord] {
        &self.errors
    }

    /// Takes the error records collected so far.
    pub fn take_errors(&mut self) -> Vec<ParseErrorRecord> {
        std::mem::take(&mut self.errors)
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    pub(super) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    pub(super) fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub(super) fn peek_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    pub(super) fn peek_nth_keyword(&self, n: usize, keyword: Keyword) -> bool {
        self.peek_nth(n).is_keyword(keyword)
    }

    pub(super) fn peek_nth_is(&self, n: usize, kind: &TokenKind) -> bool {
        self.peek_nth(n).kind == *kind
    }

    /// Whether the token `n` ahead can serve as a name.
    pub(super) fn peek_nth_is_name(&self, n: usize) -> bool {
        let token = self.peek_nth(n);
        matches!(token.kind, TokenKind::Identifier { .. }) || is_unreserved_word(self.dialect, &token.kind)
    }

    pub(super) fn at_eof(&self) -> bool {
        self.peek().is_eof()
    }

    pub(super) fn start_offset(&self) -> usize {
        self.peek().span.start
    }

    /// Moves the current token into `node`.
    pub(super) fn bump(&mut self, node: &mut ParseTree) {
        let token = self.peek().clone();
        if !token.is_eof() {
            self.pos += 1;
            if self.speculating > 0 {
                self.speculation_reach = self.speculation_reach.max(self.pos);
            }
        }
        node.push_token(token);
    }

    // ------------------------------------------------------------------
    // Expected-set bookkeeping
    // ------------------------------------------------------------------

    /// Records that `expected` was tried at the current position.
    pub(super) fn note(&mut self, expected: Expected) {
        if self.expected_pos != self.pos {
            self.expected = ExpectedSet::new();
            self.expected_pos = self.pos;
        }
        self.expected.insert(expected);
    }

    fn expected_here(&self) -> ExpectedSet {
        if self.expected_pos == self.pos {
            self.expected.clone()
        } else {
            ExpectedSet::new()
        }
    }

    fn punct(kind: &TokenKind) -> Expected {
        kind.punctuation().map_or(Expected::EndOfInput, Expected::Punct)
    }

    /// Checks the current token kind, noting the expectation.
    pub(super) fn check(&mut self, kind: &TokenKind) -> bool {
        self.note(Self::punct(kind));
        self.peek().kind == *kind
    }

    /// Checks for a keyword, noting the expectation.
    pub(super) fn check_keyword(&mut self, keyword: Keyword) -> bool {
        self.note(Expected::Keyword(keyword));
        self.peek_keyword(keyword)
    }

    /// Checks for an identifier or unreserved keyword, noting the expectation.
    pub(super) fn check_identifier(&mut self) -> bool {
        self.note(Expected::Identifier);
        self.peek_nth_is_name(0)
    }

    /// Consumes the token if it has the given kind.
    pub(super) fn eat(&mut self, node: &mut ParseTree, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.bump(node);
            true
        } else {
            false
        }
    }

    /// Consumes the token if it is the given keyword.
    pub(super) fn eat_keyword(&mut self, node: &mut ParseTree, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.bump(node);
            true
        } else {
            false
        }
    }

    /// Expects a punctuation or operator token.
    pub(super) fn expect(&mut self, node: &mut ParseTree, kind: &TokenKind) -> PResult<()> {
        self.expect_with(node, Self::punct(kind))
    }

    /// Expects a keyword.
    pub(super) fn expect_keyword(&mut self, node: &mut ParseTree, keyword: Keyword) -> PResult<()> {
        self.expect_with(node, Expected::Keyword(keyword))
    }

    /// Expects an identifier or unreserved keyword.
    pub(super) fn expect_identifier(&mut self, node: &mut ParseTree) -> PResult<()> {
        self.expect_with(node, Expected::Identifier)
    }

    /// Expects one of several keywords.
    pub(super) fn expect_one_of_keywords(&mut self, node: &mut ParseTree, keywords: &[Keyword]) -> PResult<()> {
        loop {
            for keyword in keywords {
                if self.eat_keyword(node, *keyword) {
                    return Ok(());
                }
            }
            self.fail_alternatives(node)?;
        }
    }

    fn expect_with(&mut self, node: &mut ParseTree, expected: Expected) -> PResult<()> {
        self.note(expected);
        if expected.accepts(self.peek(), self.dialect) {
            self.bump(node);
            return Ok(());
        }
        let error = match (&self.peek().kind, expected) {
            (TokenKind::Keyword(keyword), Expected::Identifier) => SyntaxError::ReservedWord {
                keyword: *keyword,
                span: self.peek().span,
            },
            _ => SyntaxError::unexpected(self.peek(), self.expected_here()),
        };
        let decision = ExpectedSet::single(expected);
        match self.recover(node.rule, error, &decision, Some(expected))? {
            RecoveryAction::ResyncSkip => {
                self.skip_into(node);
                self.bump(node);
            }
            RecoveryAction::ResyncInsert | RecoveryAction::Abort => node.push_missing(expected),
        }
        Ok(())
    }

    /// Reports that no alternative matched at the current position.
    ///
    /// Returns `Ok` after skipping one token so the caller can retry its
    /// alternatives; returns the error when recovery gives up.
    pub(super) fn fail_alternatives(&mut self, node: &mut ParseTree) -> PResult<()> {
        let expected = self.expected_here();
        let error = SyntaxError::unexpected(self.peek(), expected.clone());
        match self.recover(node.rule, error.clone(), &expected, None)? {
            RecoveryAction::ResyncSkip => {
                self.skip_into(node);
                Ok(())
            }
            RecoveryAction::ResyncInsert | RecoveryAction::Abort => Err(error),
        }
    }

    /// Wraps the current token in an error node.
    fn skip_into(&mut self, node: &mut ParseTree) {
        let mut skipped = ParseTree::new(Rule::Error, self.start_offset());
        self.bump(&mut skipped);
        node.push_tree(skipped);
    }

    /// Consults the error strategy and records the error.
    ///
    /// Returns `Err` when the strategy aborts, and always while speculating.
    fn recover(
        &mut self,
        rule: Rule,
        error: SyntaxError,
        decision: &ExpectedSet,
        insertable: Option<Expected>,
    ) -> PResult<RecoveryAction> {
        if self.speculating > 0 {
            return Err(error);
        }
        let offending = self.peek().clone();
        let ctx = RecoveryContext {
            expected: decision,
            next: self.peek_nth(1),
            rule,
            dialect: self.dialect,
            insertable,
        };
        let mut action = self.strategy.on_syntax_error(&ctx, &offending);
        match action {
            RecoveryAction::ResyncSkip if offending.is_eof() => action = RecoveryAction::Abort,
            RecoveryAction::ResyncInsert if insertable.is_none() || self.last_insert == Some(self.pos) => {
                action = RecoveryAction::Abort;
            }
            _ => {}
        }
        if self.errors.len() + 1 >= self.options.max_errors {
            action = RecoveryAction::Abort;
        }
        warn!(
            position = offending.span.start,
            line = offending.line,
            column = offending.column,
            action = ?action,
            "{error}"
        );
        self.errors.push(ParseErrorRecord {
            error: error.clone(),
            line: offending.line,
            column: offending.column,
            action,
        });
        match action {
            RecoveryAction::Abort => Err(error),
            RecoveryAction::ResyncInsert => {
                self.last_insert = Some(self.pos);
                Ok(action)
            }
            RecoveryAction::ResyncSkip => Ok(action),
        }
    }

    // ------------------------------------------------------------------
    // Depth and speculation
    // ------------------------------------------------------------------

    /// Enters one level of nesting.
    pub(super) fn enter(&self) -> PResult<DepthGuard> {
        self.recursion.try_decrease().ok_or(SyntaxError::RecursionLimit {
            limit: self.options.max_depth,
            span: self.peek().span,
        })
    }

    /// Tries `f` without committing to it.
    ///
    /// On failure the cursor and expected set are restored and `Ok(None)` is
    /// returned; errors inside a speculation are never recorded. Depth and
    /// lookahead-budget errors are not recoverable by backtracking and are
    /// returned as they are.
    pub(super) fn speculate<T>(&mut self, rule: Rule, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        if self.lookahead_used > self.options.lookahead_budget {
            return Err(SyntaxError::AmbiguityExhaustion {
                budget: self.options.lookahead_budget,
                span: self.peek().span,
            });
        }
        let start = self.pos;
        let saved_expected = (self.expected.clone(), self.expected_pos);
        let saved_reach = self.speculation_reach;
        self.speculating += 1;
        self.speculation_reach = start;
        trace!(rule = ?rule, position = self.start_offset(), "speculating");
        let result = f(self);
        self.speculating -= 1;
        let reach = self.speculation_reach;
        self.speculation_reach = saved_reach.max(reach);
        match result {
            Ok(value) => Ok(Some(value)),
            Err(error @ (SyntaxError::RecursionLimit { .. } | SyntaxError::AmbiguityExhaustion { .. })) => Err(error),
            Err(_) => {
                self.lookahead_used += reach.saturating_sub(start) + 1;
                self.pos = start;
                (self.expected, self.expected_pos) = saved_expected;
                trace!(rule = ?rule, examined = reach - start, "speculation failed");
                Ok(None)
            }
        }
    }

    pub(super) fn is_speculating(&self) -> bool {
        self.speculating > 0
    }

    /// Remembers that a parenthesized query does not parse at `pos`.
    pub(super) fn mark_paren_query_failed(&mut self, pos: usize) {
        self.failed_paren_queries.insert(pos);
    }

    pub(super) fn paren_query_known_to_fail(&self) -> bool {
        self.failed_paren_queries.contains(&self.pos)
    }

    pub(super) const fn position(&self) -> usize {
        self.pos
    }

    /// An error for the current token with the expected set so far.
    pub(super) fn unexpected_here(&self) -> SyntaxError {
        SyntaxError::unexpected(self.peek(), self.expected_here())
    }

    /// Runs `f` with `DEFAULT` accepted as an expression.
    pub(super) fn with_default_allowed<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved = self.default_allowed;
        self.default_allowed = true;
        let result = f(self);
        self.default_allowed = saved;
        result
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Whether the current token may begin a statement.
    pub(super) fn at_statement_start(&self) -> bool {
        self.peek().as_keyword().is_some_and(starts_statement)
    }

    /// Parses one statement, including its terminator check.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the statement; it has also been added
    /// to [`errors`](Self::errors).
    pub fn parse_statement(&mut self) -> PResult<ParseTree> {
        self.lookahead_used = 0;
        self.failed_paren_queries.clear();
        let recorded = self.errors.len();
        let result = self.parse_statement_inner();
        self.record_abort(recorded, &result);
        result
    }

    /// Makes sure the error that ended an entry point is in the records.
    fn record_abort(&mut self, recorded: usize, result: &PResult<ParseTree>) {
        if let Err(error) = result {
            let already = self.errors[recorded..].iter().any(|r| r.error == *error);
            if !already {
                let token = self.peek();
                self.errors.push(ParseErrorRecord {
                    error: error.clone(),
                    line: token.line,
                    column: token.column,
                    action: RecoveryAction::Abort,
                });
            }
        }
    }

    fn parse_statement_inner(&mut self) -> PResult<ParseTree> {
        let mut tree = self.parse_statement_body()?;
        self.expect_statement_end(&mut tree)?;
        Ok(tree)
    }

    fn parse_statement_body(&mut self) -> PResult<ParseTree> {
        let mut leading = ParseTree::new(Rule::Error, self.start_offset());
        loop {
            self.note(Expected::Statement);
            let tree = match self.peek().as_keyword() {
                Some(Keyword::Select) => self.parse_query()?,
                Some(Keyword::With) => self.parse_with_statement()?,
                Some(Keyword::Insert) => self.parse_insert(None)?,
                Some(Keyword::Update) => self.parse_update(None)?,
                Some(Keyword::Delete) => self.parse_delete(None)?,
                Some(Keyword::Merge) => self.parse_merge(None)?,
                Some(Keyword::Exec | Keyword::Execute) => self.parse_exec()?,
                Some(Keyword::Create) => self.parse_create()?,
                Some(Keyword::Alter) => self.parse_alter()?,
                Some(Keyword::Drop) => self.parse_drop()?,
                Some(Keyword::Truncate) => self.parse_truncate()?,
                Some(Keyword::Use) => self.parse_use()?,
                Some(Keyword::Begin | Keyword::Commit | Keyword::Rollback | Keyword::Save) => {
                    self.parse_transaction()?
                }
                _ if self.peek().kind == TokenKind::LeftParen => self.parse_query()?,
                _ => {
                    self.fail_alternatives(&mut leading)?;
                    continue;
                }
            };
            return Ok(if leading.children.is_empty() {
                tree
            } else {
                let mut tree = tree;
                tree.span = leading.span.merge(tree.span);
                tree.children.insert(0, ParseNode::Tree(leading));
                tree
            });
        }
    }

    /// `WITH ...` followed by the statement it prefixes.
    fn parse_with_statement(&mut self) -> PResult<ParseTree> {
        let with = self.parse_with_clause()?;
        let mut skipped = ParseTree::new(Rule::Error, self.start_offset());
        let mut tree = loop {
            match self.peek().as_keyword() {
                Some(Keyword::Insert) => break self.parse_insert(Some(with))?,
                Some(Keyword::Update) => break self.parse_update(Some(with))?,
                Some(Keyword::Delete) => break self.parse_delete(Some(with))?,
                Some(Keyword::Merge) => break self.parse_merge(Some(with))?,
                _ if self.peek_keyword(Keyword::Select) || self.peek().kind == TokenKind::LeftParen => {
                    break self.parse_query_with(Some(with))?;
                }
                _ => {
                    for keyword in [Keyword::Select, Keyword::Insert, Keyword::Update, Keyword::Delete, Keyword::Merge] {
                        self.note(Expected::Keyword(keyword));
                    }
                    self.fail_alternatives(&mut skipped)?;
                }
            }
        };
        if !skipped.children.is_empty() {
            tree.span = tree.span.merge(skipped.span);
            tree.children.push(ParseNode::Tree(skipped));
        }
        Ok(tree)
    }

    /// The statement must be followed by `;`, end of input, or (where the
    /// dialect allows it) the start of the next statement.
    fn expect_statement_end(&mut self, tree: &mut ParseTree) -> PResult<()> {
        loop {
            self.note(Expected::Punct(";"));
            self.note(Expected::EndOfInput);
            if self.dialect.supports_implicit_statement_end() {
                self.note(Expected::Statement);
            }
            let token = self.peek();
            let ends = token.is_eof()
                || token.kind == TokenKind::Semicolon
                || (self.dialect.supports_implicit_statement_end() && self.at_statement_start());
            if ends {
                return Ok(());
            }
            self.fail_alternatives(tree)?;
        }
    }

    /// Skips the rest of a failed statement, returning what was skipped.
    ///
    /// Stops at `;`, end of input, or a statement keyword when the dialect
    /// separates statements implicitly. At least one token is consumed.
    fn synchronize(&mut self, start: usize) -> ParseTree {
        let mut skipped = ParseTree::new(Rule::Error, self.tokens[start].span.start);
        for token in &self.tokens[start..self.pos] {
            skipped.push_token(token.clone());
        }
        let implicit_end = self.dialect.supports_implicit_statement_end();
        loop {
            let token = self.peek();
            if token.is_eof() || token.kind == TokenKind::Semicolon {
                break;
            }
            if implicit_end && self.at_statement_start() && self.pos > start {
                break;
            }
            self.bump(&mut skipped);
        }
        skipped
    }

    /// Parses every statement in the token buffer.
    ///
    /// Without recovery, parsing stops after the first failed statement.
    /// Cancellation is checked before each statement.
    pub fn parse_script(&mut self, cancel: Option<&CancellationToken>) -> (Vec<StatementTree>, bool) {
        let mut statements = Vec::new();
        loop {
            while self.peek().kind == TokenKind::Semicolon {
                self.pos += 1;
            }
            if self.at_eof() {
                return (statements, false);
            }
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                debug!(parsed = statements.len(), "parse cancelled");
                return (statements, true);
            }
            let start = self.pos;
            let recorded = self.errors.len();
            let result = self.parse_statement();
            let failed = result.is_err();
            let tree = result.unwrap_or_else(|_| self.synchronize(start));
            let errors = self.errors[recorded..].to_vec();
            debug!(
                statement = statements.len(),
                tokens = self.pos - start,
                errors = errors.len(),
                "parsed statement"
            );
            let stop = !errors.is_empty() && (!self.options.recover || self.errors.len() >= self.options.max_errors);
            statements.push(StatementTree { tree, errors });
            if stop || (failed && self.at_eof()) {
                return (statements, false);
            }
        }
    }

    /// Parses a query (`SELECT`, set operations, CTEs) that must span the
    /// whole input.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error.
    pub fn parse_select(&mut self) -> PResult<ParseTree> {
        let recorded = self.errors.len();
        let result = self.parse_query().and_then(|mut tree| {
            self.expect_end_of_input(&mut tree)?;
            Ok(tree)
        });
        self.record_abort(recorded, &result);
        result
    }

    /// Parses a standalone expression that must span the whole input.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error.
    pub fn parse_expr(&mut self) -> PResult<ParseTree> {
        let recorded = self.errors.len();
        let result = self.parse_expression().and_then(|mut tree| {
            self.expect_end_of_input(&mut tree)?;
            Ok(tree)
        });
        self.record_abort(recorded, &result);
        result
    }

    fn expect_end_of_input(&mut self, tree: &mut ParseTree) -> PResult<()> {
        loop {
            self.note(Expected::EndOfInput);
            if self.at_eof() {
                return Ok(());
            }
            self.fail_alternatives(tree)?;
        }
    }
}
