use super::{
    ident_from_token, last_ident, malformed, nth_tree, object_name, required_child, AstBuilder, BuildResult,
};
use crate::ast::{
    CaseWhen, CastKind, DataType, Expr, FrameBound, FrameUnits, FunctionCall, InList, IsTest, Literal,
    ObjectName, OrderByExpr, Quantifier, TemporalKind, TypeArg, WindowFrame, WindowSpec,
};
use crate::lexer::{Keyword, TokenKind};
use crate::parser::precedence::{token_to_binary_op, token_to_unary_op};
use crate::parser::{ParseTree, Rule};

impl AstBuilder {
    fn boxed(&self, tree: &ParseTree, n: usize) -> BuildResult<Box<Expr>> {
        Ok(Box::new(self.expr(nth_tree(tree, n)?)?))
    }

    pub(super) fn exprs<'t>(&self, trees: impl Iterator<Item = &'t ParseTree>) -> BuildResult<Vec<Expr>> {
        trees.map(|t| self.expr(t)).collect()
    }

    pub(super) fn expr(&self, tree: &ParseTree) -> BuildResult<Expr> {
        let negated = tree.has_keyword(Keyword::Not);
        Ok(match tree.rule {
            Rule::Literal => Expr::Literal(literal(tree)?),
            Rule::TypedLiteral | Rule::OdbcLiteral => Expr::Literal(temporal_literal(tree)?),
            Rule::ColumnRef => Expr::Column(object_name(tree)?),
            Rule::Parameter => Expr::Parameter {
                index: self.parameter_index(tree)?,
            },
            Rule::Variable => match tree.tokens().next().map(|t| &t.kind) {
                Some(TokenKind::Variable(name)) => Expr::Variable(name.clone()),
                _ => return Err(malformed(tree, "expected a variable")),
            },
            Rule::Wildcard => Expr::Wildcard,
            Rule::DefaultValue => Expr::Default,
            Rule::BinaryExpr => {
                let op = tree
                    .tokens()
                    .find_map(|t| token_to_binary_op(&t.kind))
                    .ok_or_else(|| malformed(tree, "missing operator"))?;
                Expr::Binary {
                    left: self.boxed(tree, 0)?,
                    op,
                    right: self.boxed(tree, 1)?,
                }
            }
            Rule::QuantifiedComparison => {
                let op = tree
                    .tokens()
                    .find_map(|t| token_to_binary_op(&t.kind))
                    .ok_or_else(|| malformed(tree, "missing operator"))?;
                let quantifier = if tree.has_keyword(Keyword::All) {
                    Quantifier::All
                } else if tree.has_keyword(Keyword::Some) {
                    Quantifier::Some
                } else {
                    Quantifier::Any
                };
                Expr::Quantified {
                    left: self.boxed(tree, 0)?,
                    op,
                    quantifier,
                    subquery: Box::new(self.paren_query(nth_tree(tree, 1)?)?),
                }
            }
            Rule::UnaryExpr => {
                let op = tree
                    .tokens()
                    .find_map(|t| token_to_unary_op(&t.kind))
                    .ok_or_else(|| malformed(tree, "missing operator"))?;
                Expr::Unary {
                    op,
                    operand: self.boxed(tree, 0)?,
                }
            }
            Rule::IsPredicate => {
                let test = match tree.tokens().last().and_then(|t| t.as_keyword()) {
                    Some(Keyword::Null) => IsTest::Null,
                    Some(Keyword::True) => IsTest::True,
                    Some(Keyword::False) => IsTest::False,
                    Some(Keyword::Unknown) => IsTest::Unknown,
                    _ => return Err(malformed(tree, "missing IS test")),
                };
                Expr::Is {
                    expr: self.boxed(tree, 0)?,
                    negated,
                    test,
                }
            }
            Rule::InPredicate => {
                let list = match tree.child(Rule::ParenQuery) {
                    Some(query) => InList::Subquery(Box::new(self.paren_query(query)?)),
                    None => InList::Values(self.exprs(tree.trees().skip(1))?),
                };
                Expr::In {
                    expr: self.boxed(tree, 0)?,
                    list,
                    negated,
                }
            }
            Rule::BetweenPredicate => Expr::Between {
                expr: self.boxed(tree, 0)?,
                low: self.boxed(tree, 1)?,
                high: self.boxed(tree, 2)?,
                negated,
            },
            Rule::LikePredicate => Expr::Like {
                expr: self.boxed(tree, 0)?,
                pattern: self.boxed(tree, 1)?,
                escape: tree.trees().nth(2).map(|t| self.expr(t)).transpose()?.map(Box::new),
                negated,
            },
            Rule::AtTimeZone => Expr::AtTimeZone {
                expr: self.boxed(tree, 0)?,
                zone: self.boxed(tree, 1)?,
            },
            Rule::Collate => Expr::Collate {
                expr: self.boxed(tree, 0)?,
                collation: last_ident(tree)?,
            },
            Rule::Cast => {
                let kind = if tree.has_keyword(Keyword::TryCast) {
                    CastKind::TryCast
                } else {
                    CastKind::Cast
                };
                Expr::Cast {
                    kind,
                    expr: self.boxed(tree, 0)?,
                    data_type: data_type(nth_tree(tree, 1)?)?,
                    style: None,
                }
            }
            Rule::Convert => {
                let kind = if tree.has_keyword(Keyword::TryConvert) {
                    CastKind::TryConvert
                } else {
                    CastKind::Convert
                };
                Expr::Cast {
                    kind,
                    data_type: data_type(nth_tree(tree, 0)?)?,
                    expr: self.boxed(tree, 1)?,
                    style: tree.trees().nth(2).map(|t| self.expr(t)).transpose()?.map(Box::new),
                }
            }
            Rule::Case => self.case(tree)?,
            Rule::FunctionCall => Expr::Function(self.function_call(tree)?),
            Rule::Exists => Expr::Exists(Box::new(self.paren_query(required_child(tree, Rule::ParenQuery)?)?)),
            Rule::Subquery => Expr::Subquery(Box::new(self.query(required_child(tree, Rule::Query)?)?)),
            Rule::Paren => Expr::Nested(self.boxed(tree, 0)?),
            Rule::Row => Expr::Row(self.exprs(tree.trees())?),
            _ => return Err(malformed(tree, "not an expression")),
        })
    }

    fn case(&self, tree: &ParseTree) -> BuildResult<Expr> {
        let operand = match tree.trees().next() {
            Some(first) if !matches!(first.rule, Rule::CaseWhen | Rule::CaseElse) => Some(Box::new(self.expr(first)?)),
            _ => None,
        };
        let conditions = tree
            .children_of(Rule::CaseWhen)
            .map(|when| {
                Ok(CaseWhen {
                    condition: self.expr(nth_tree(when, 0)?)?,
                    result: self.expr(nth_tree(when, 1)?)?,
                })
            })
            .collect::<BuildResult<Vec<_>>>()?;
        let else_result = tree
            .child(Rule::CaseElse)
            .map(|otherwise| self.boxed(otherwise, 0))
            .transpose()?;
        Ok(Expr::Case {
            operand,
            conditions,
            else_result,
        })
    }

    fn function_call(&self, tree: &ParseTree) -> BuildResult<FunctionCall> {
        let name = object_name(required_child(tree, Rule::ObjectName)?)?;
        let args = self.exprs(
            tree.trees()
                .filter(|t| !matches!(t.rule, Rule::ObjectName | Rule::OverClause)),
        )?;
        let over = tree.child(Rule::OverClause).map(|o| self.window_spec(o)).transpose()?;
        Ok(FunctionCall {
            name,
            distinct: tree.has_keyword(Keyword::Distinct),
            args,
            niladic: !tree.has_token(&TokenKind::LeftParen),
            over,
        })
    }

    fn window_spec(&self, tree: &ParseTree) -> BuildResult<WindowSpec> {
        let partition_by = match tree.child(Rule::PartitionBy) {
            Some(partition) => self.exprs(partition.trees())?,
            None => Vec::new(),
        };
        let order_by = match tree.child(Rule::OrderByClause) {
            Some(order_by) => self.order_by(order_by)?,
            None => Vec::new(),
        };
        let frame = tree.child(Rule::WindowFrame).map(|f| self.window_frame(f)).transpose()?;
        Ok(WindowSpec {
            partition_by,
            order_by,
            frame,
        })
    }

    fn window_frame(&self, tree: &ParseTree) -> BuildResult<WindowFrame> {
        let units = if tree.has_keyword(Keyword::Range) {
            FrameUnits::Range
        } else {
            FrameUnits::Rows
        };
        let mut bounds = tree.children_of(Rule::FrameBound);
        let start = bounds
            .next()
            .ok_or_else(|| malformed(tree, "missing frame bound"))
            .and_then(|b| self.frame_bound(b))?;
        let end = bounds.next().map(|b| self.frame_bound(b)).transpose()?;
        Ok(WindowFrame { units, start, end })
    }

    fn frame_bound(&self, tree: &ParseTree) -> BuildResult<FrameBound> {
        if tree.has_keyword(Keyword::Current) {
            return Ok(FrameBound::CurrentRow);
        }
        let offset = tree.trees().next().map(|t| self.expr(t)).transpose()?.map(Box::new);
        if tree.has_keyword(Keyword::Preceding) {
            Ok(FrameBound::Preceding(offset))
        } else {
            Ok(FrameBound::Following(offset))
        }
    }

    /// `ORDER BY` items.
    pub(super) fn order_by(&self, tree: &ParseTree) -> BuildResult<Vec<OrderByExpr>> {
        tree.children_of(Rule::OrderByItem)
            .map(|item| {
                let asc = if item.has_keyword(Keyword::Asc) {
                    Some(true)
                } else if item.has_keyword(Keyword::Desc) {
                    Some(false)
                } else {
                    None
                };
                let nulls_first = if item.has_keyword(Keyword::First) {
                    Some(true)
                } else if item.has_keyword(Keyword::Last) {
                    Some(false)
                } else {
                    None
                };
                Ok(OrderByExpr {
                    expr: self.expr(nth_tree(item, 0)?)?,
                    asc,
                    nulls_first,
                })
            })
            .collect()
    }
}

fn literal(tree: &ParseTree) -> BuildResult<Literal> {
    let token = tree
        .tokens()
        .next()
        .ok_or_else(|| malformed(tree, "empty literal"))?;
    Ok(match &token.kind {
        TokenKind::Number(kind) => Literal::Number {
            value: token.lexeme.clone(),
            kind: *kind,
        },
        TokenKind::String { value, national } => Literal::String {
            value: value.clone(),
            national: *national,
        },
        TokenKind::HexString(digits) => Literal::Hex {
            digits: digits.clone(),
            quoted: token.lexeme.ends_with('\''),
        },
        TokenKind::BitString(digits) => Literal::BitString(digits.clone()),
        TokenKind::Keyword(Keyword::Null) => Literal::Null,
        TokenKind::Keyword(Keyword::True) => Literal::Boolean(true),
        TokenKind::Keyword(Keyword::False) => Literal::Boolean(false),
        _ => return Err(malformed(tree, "not a literal")),
    })
}

/// `DATE '...'` or `{d '...'}`
fn temporal_literal(tree: &ParseTree) -> BuildResult<Literal> {
    let odbc = tree.rule == Rule::OdbcLiteral;
    let mut kind = None;
    let mut value = None;
    for token in tree.tokens() {
        match &token.kind {
            TokenKind::Keyword(Keyword::Date) => kind = Some(TemporalKind::Date),
            TokenKind::Keyword(Keyword::Time) => kind = Some(TemporalKind::Time),
            TokenKind::Keyword(Keyword::Timestamp) => kind = Some(TemporalKind::Timestamp),
            TokenKind::Identifier { value: tag, .. } if odbc => {
                kind = match tag.to_ascii_lowercase().as_str() {
                    "d" => Some(TemporalKind::Date),
                    "t" => Some(TemporalKind::Time),
                    "ts" => Some(TemporalKind::Timestamp),
                    _ => None,
                };
            }
            TokenKind::String { value: text, .. } => value = Some(text.clone()),
            _ => {}
        }
    }
    match (kind, value) {
        (Some(kind), Some(value)) => Ok(Literal::Temporal { kind, value, odbc }),
        _ => Err(malformed(tree, "unknown temporal literal")),
    }
}

/// Resolves a `DataType` tree.
pub(super) fn data_type(tree: &ParseTree) -> BuildResult<DataType> {
    let mut name = Vec::new();
    let mut args = Vec::new();
    let mut in_args = false;
    let mut precision = false;
    for token in tree.tokens() {
        match &token.kind {
            TokenKind::LeftParen => in_args = true,
            TokenKind::Keyword(Keyword::Precision) if !in_args => precision = true,
            TokenKind::Number(_) if in_args => {
                let n = token
                    .lexeme
                    .parse::<u64>()
                    .map_err(|_| malformed(tree, "type argument is not an integer"))?;
                args.push(TypeArg::Number(n));
            }
            TokenKind::Identifier { .. } if in_args => args.push(TypeArg::Max),
            TokenKind::Identifier { .. } | TokenKind::Keyword(_) if !in_args => {
                if let Some(ident) = ident_from_token(token) {
                    name.push(ident);
                }
            }
            _ => {}
        }
    }
    if name.is_empty() {
        return Err(malformed(tree, "missing type name"));
    }
    let double = name.len() == 1 && name[0].quote_style.is_none() && name[0].value.eq_ignore_ascii_case("double");
    if precision && double && args.is_empty() {
        return Ok(DataType::DoublePrecision);
    }
    Ok(DataType::resolve(ObjectName(name), args))
}
