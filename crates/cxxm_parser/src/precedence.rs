//! Operator precedence for binary operators.

use cxxm_lexer::TokenKind;

/// Binary operator precedence levels, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    // Ranges from lowest to highest
    Comma = 0,
    Assignment = 1,
    Conditional = 2,
    LogicalOr = 3,
    LogicalAnd = 4,
    BitwiseOr = 5,
    BitwiseXor = 6,
    BitwiseAnd = 7,
    Equality = 8,
    Relational = 9,
    Shift = 10,
    Additive = 11,
    Multiplicative = 12,
    Invalid = 255,
}

/// Get the binary operator precedence for a given token kind.
///
/// `>` `>` is a shift only when the grammar joins the two tokens; a single
/// `>` here is always relational.
pub fn binary_operator_precedence(kind: TokenKind) -> OperatorPrecedence {
    match kind {
        TokenKind::BarBar => OperatorPrecedence::LogicalOr,
        TokenKind::AmpAmp => OperatorPrecedence::LogicalAnd,
        TokenKind::Bar => OperatorPrecedence::BitwiseOr,
        TokenKind::Caret => OperatorPrecedence::BitwiseXor,
        TokenKind::Amp => OperatorPrecedence::BitwiseAnd,
        TokenKind::EqualEqual | TokenKind::NotEqual => OperatorPrecedence::Equality,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
            OperatorPrecedence::Relational
        }
        TokenKind::LessLess => OperatorPrecedence::Shift,
        TokenKind::Plus | TokenKind::Minus => OperatorPrecedence::Additive,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => OperatorPrecedence::Multiplicative,
        _ => OperatorPrecedence::Invalid,
    }
}
