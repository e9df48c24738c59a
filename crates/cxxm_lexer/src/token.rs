//! Token kinds and scanned tokens.

use cxxm_core::intern::InternedString;
use cxxm_core::text::{TextPos, TextSpan};

/// The kind of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    EndOfFile,
    Unknown,

    // Literals and names
    Identifier,
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Colon,
    ColonColon,
    Dot,
    Arrow,
    Ellipsis,
    Question,
    Tilde,
    Not,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Bar,
    Caret,
    AmpAmp,
    BarBar,
    PlusPlus,
    MinusMinus,
    EqualEqual,
    NotEqual,
    Less,
    /// Always a single `>`; the grammar joins adjacent `>` `>` into a shift
    /// so nested template argument lists close naturally.
    Greater,
    LessEqual,
    GreaterEqual,
    LessLess,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    BarAssign,
    CaretAssign,
    LessLessAssign,

    // Declaration keywords
    Namespace,
    Using,
    Class,
    Struct,
    Union,
    Enum,
    Typedef,
    Template,
    Typename,
    Public,
    Protected,
    Private,
    Friend,
    Static,
    Extern,
    Inline,
    Virtual,
    Explicit,
    Mutable,
    Constexpr,
    Const,
    Volatile,
    Operator,

    // Builtin type keywords
    Void,
    Bool,
    Char,
    WcharT,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Auto,

    // Statement keywords
    If,
    Else,
    Switch,
    Case,
    Default,
    While,
    Do,
    For,
    Break,
    Continue,
    Return,
    Goto,

    // Expression keywords
    This,
    True,
    False,
    Nullptr,
    New,
    Delete,
    Sizeof,
}

impl TokenKind {
    pub fn from_keyword(text: &str) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match text {
            "namespace" => Namespace,
            "using" => Using,
            "class" => Class,
            "struct" => Struct,
            "union" => Union,
            "enum" => Enum,
            "typedef" => Typedef,
            "template" => Template,
            "typename" => Typename,
            "public" => Public,
            "protected" => Protected,
            "private" => Private,
            "friend" => Friend,
            "static" => Static,
            "extern" => Extern,
            "inline" => Inline,
            "virtual" => Virtual,
            "explicit" => Explicit,
            "mutable" => Mutable,
            "constexpr" => Constexpr,
            "const" => Const,
            "volatile" => Volatile,
            "operator" => Operator,
            "void" => Void,
            "bool" => Bool,
            "char" => Char,
            "wchar_t" => WcharT,
            "short" => Short,
            "int" => Int,
            "long" => Long,
            "float" => Float,
            "double" => Double,
            "signed" => Signed,
            "unsigned" => Unsigned,
            "auto" => Auto,
            "if" => If,
            "else" => Else,
            "switch" => Switch,
            "case" => Case,
            "default" => Default,
            "while" => While,
            "do" => Do,
            "for" => For,
            "break" => Break,
            "continue" => Continue,
            "return" => Return,
            "goto" => Goto,
            "this" => This,
            "true" => True,
            "false" => False,
            "nullptr" => Nullptr,
            "new" => New,
            "delete" => Delete,
            "sizeof" => Sizeof,
            _ => return None,
        };
        Some(kind)
    }

    /// Builtin simple type keywords (`int`, `unsigned`, `void`, ...).
    pub fn is_builtin_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Void | Bool | Char | WcharT | Short | Int | Long | Float | Double | Signed | Unsigned | Auto
        )
    }

    pub fn is_cv_qualifier(self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Volatile)
    }

    /// Specifier keywords that may precede a type in a declaration.
    pub fn is_decl_specifier(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Typedef | Friend | Static | Extern | Inline | Virtual | Explicit | Mutable | Constexpr
        )
    }

    pub fn is_class_key(self) -> bool {
        matches!(self, TokenKind::Class | TokenKind::Struct | TokenKind::Union)
    }

    pub fn is_assignment_operator(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Assign
                | PlusAssign
                | MinusAssign
                | StarAssign
                | SlashAssign
                | PercentAssign
                | AmpAssign
                | BarAssign
                | CaretAssign
                | LessLessAssign
        )
    }

    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntLiteral | FloatLiteral | CharLiteral | StringLiteral | True | False | Nullptr
        )
    }
}

/// A scanned token. Offsets are byte offsets into the token's own file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The token's source text, interned.
    pub text: InternedString,
    pub offset: TextPos,
    /// End offset (exclusive).
    pub end: TextPos,
}

impl Token {
    pub fn new(kind: TokenKind, text: InternedString, offset: TextPos, end: TextPos) -> Self {
        Self {
            kind,
            text,
            offset,
            end,
        }
    }

    #[inline]
    pub fn span(&self) -> TextSpan {
        TextSpan::from_bounds(self.offset, self.end)
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(TokenKind::from_keyword("namespace"), Some(TokenKind::Namespace));
        assert_eq!(TokenKind::from_keyword("wchar_t"), Some(TokenKind::WcharT));
        assert_eq!(TokenKind::from_keyword("Namespace"), None);
        assert_eq!(TokenKind::from_keyword("vector"), None);
    }

    #[test]
    fn test_classification() {
        assert!(TokenKind::Unsigned.is_builtin_type());
        assert!(!TokenKind::Identifier.is_builtin_type());
        assert!(TokenKind::Typedef.is_decl_specifier());
        assert!(!TokenKind::Const.is_decl_specifier());
        assert!(TokenKind::Const.is_cv_qualifier());
        assert!(TokenKind::Union.is_class_key());
        assert!(TokenKind::LessLessAssign.is_assignment_operator());
        assert!(!TokenKind::EqualEqual.is_assignment_operator());
    }
}
