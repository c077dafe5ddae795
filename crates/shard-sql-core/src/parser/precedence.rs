//! Operator precedence table for the expression sub-parser.
//!
//! Levels, lowest to highest:
//!
//! | level | operators |
//! |-------|-----------|
//! | 1 | `OR` |
//! | 2 | `AND` |
//! | 3 | prefix `NOT` |
//! | 4 | `= <> != < <= > >= !< !>`, `IS`, `[NOT] IN`, `[NOT] BETWEEN`, `[NOT] LIKE` |
//! | 5 | `\|` |
//! | 6 | `^` |
//! | 7 | `&` |
//! | 8 | `<< >>` |
//! | 9 | `+ - \|\|` |
//! | 10 | `* / %` |
//! | 11 | postfix `COLLATE`, `AT TIME ZONE` |
//! | 12 | prefix `- + ~` |

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Accepts every operator.
pub const LOWEST: u8 = 0;
pub const OR: u8 = 1;
pub const AND: u8 = 2;
pub const NOT: u8 = 3;
pub const COMPARISON: u8 = 4;
pub const BIT_OR: u8 = 5;
pub const BIT_XOR: u8 = 6;
pub const BIT_AND: u8 = 7;
pub const SHIFT: u8 = 8;
pub const ADDITIVE: u8 = 9;
pub const MULTIPLICATIVE: u8 = 10;
pub const POSTFIX: u8 = 11;
pub const UNARY: u8 = 12;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

impl Associativity {
    /// Minimum precedence for the right operand of an operator at `level`.
    #[must_use]
    pub const fn right_operand_min(self, level: u8) -> u8 {
        match self {
            Self::Left => level + 1,
            Self::Right => level,
        }
    }
}

/// Precedence and associativity of a token in infix or postfix position.
///
/// `NOT` is not listed: it only continues an expression as part of
/// `NOT IN` / `NOT BETWEEN` / `NOT LIKE`, which the parser checks with one
/// token of lookahead and then treats at [`COMPARISON`] level.
#[must_use]
pub const fn infix_precedence(kind: &TokenKind) -> Option<(u8, Associativity)> {
    let level = match kind {
        TokenKind::Keyword(Keyword::Or) => OR,
        TokenKind::Keyword(Keyword::And) => AND,
        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::NotLt
        | TokenKind::NotGt
        | TokenKind::Keyword(Keyword::Is | Keyword::In | Keyword::Between | Keyword::Like) => COMPARISON,
        TokenKind::BitOr => BIT_OR,
        TokenKind::BitXor => BIT_XOR,
        TokenKind::BitAnd => BIT_AND,
        TokenKind::LeftShift | TokenKind::RightShift => SHIFT,
        TokenKind::Plus | TokenKind::Minus | TokenKind::Concat => ADDITIVE,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => MULTIPLICATIVE,
        TokenKind::Keyword(Keyword::Collate | Keyword::At) => POSTFIX,
        _ => return None,
    };
    Some((level, Associativity::Left))
}

/// Precedence of a prefix operator; its operand is parsed at this level.
#[must_use]
pub const fn prefix_precedence(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Keyword(Keyword::Not) => Some(NOT),
        TokenKind::Minus | TokenKind::Plus | TokenKind::BitNot => Some(UNARY),
        _ => None,
    }
}

/// Converts a token to a binary operator.
#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::NotLt => Some(BinaryOp::NotLt),
        TokenKind::NotGt => Some(BinaryOp::NotGt),
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::Concat => Some(BinaryOp::Concat),
        TokenKind::BitAnd => Some(BinaryOp::BitAnd),
        TokenKind::BitOr => Some(BinaryOp::BitOr),
        TokenKind::BitXor => Some(BinaryOp::BitXor),
        TokenKind::LeftShift => Some(BinaryOp::LeftShift),
        TokenKind::RightShift => Some(BinaryOp::RightShift),
        _ => None,
    }
}

/// Converts a token to a unary operator.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
        TokenKind::Minus => Some(UnaryOp::Minus),
        TokenKind::Plus => Some(UnaryOp::Plus),
        TokenKind::BitNot => Some(UnaryOp::BitNot),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(kind: &TokenKind) -> u8 {
        infix_precedence(kind).map(|(l, _)| l).unwrap()
    }

    #[test]
    fn test_precedence_order() {
        let or = level(&TokenKind::Keyword(Keyword::Or));
        let and = level(&TokenKind::Keyword(Keyword::And));
        let eq = level(&TokenKind::Eq);
        let bit_or = level(&TokenKind::BitOr);
        let add = level(&TokenKind::Plus);
        let mul = level(&TokenKind::Star);
        assert!(or < and);
        assert!(and < eq);
        assert!(eq < bit_or);
        assert!(bit_or < add);
        assert!(add < mul);
        assert!(mul < UNARY);
    }

    #[test]
    fn test_predicates_share_comparison_level() {
        for kw in [Keyword::Is, Keyword::In, Keyword::Between, Keyword::Like] {
            assert_eq!(level(&TokenKind::Keyword(kw)), COMPARISON);
        }
        assert_eq!(level(&TokenKind::NotLt), COMPARISON);
    }

    #[test]
    fn test_associativity() {
        assert_eq!(Associativity::Left.right_operand_min(ADDITIVE), ADDITIVE + 1);
        assert_eq!(Associativity::Right.right_operand_min(ADDITIVE), ADDITIVE);
        assert_eq!(infix_precedence(&TokenKind::Minus), Some((ADDITIVE, Associativity::Left)));
    }

    #[test]
    fn test_not_is_prefix_only() {
        assert_eq!(infix_precedence(&TokenKind::Keyword(Keyword::Not)), None);
        assert_eq!(prefix_precedence(&TokenKind::Keyword(Keyword::Not)), Some(NOT));
        assert_eq!(prefix_precedence(&TokenKind::BitNot), Some(UNARY));
    }

    #[test]
    fn test_token_to_op() {
        assert_eq!(token_to_binary_op(&TokenKind::NotGt), Some(BinaryOp::NotGt));
        assert_eq!(token_to_binary_op(&TokenKind::Keyword(Keyword::Like)), None);
        assert_eq!(token_to_unary_op(&TokenKind::Minus), Some(UnaryOp::Minus));
        assert_eq!(token_to_unary_op(&TokenKind::Star), None);
    }
}
