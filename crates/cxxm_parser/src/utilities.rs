//! Parser utility functions.

use crate::builders::Specifiers;
use cxxm_core::intern::StringInterner;
use cxxm_lexer::{Token, TokenKind};
use cxxm_model::{ClassKind, Visibility};

/// Check if a token kind can start an expression.
pub fn can_start_expression(kind: TokenKind) -> bool {
    use TokenKind::*;
    kind.is_literal()
        || kind.is_builtin_type()
        || matches!(
            kind,
            Identifier
                | ColonColon
                | LeftParen
                | LeftBracket
                | LeftBrace
                | Plus
                | Minus
                | Star
                | Amp
                | Tilde
                | Not
                | PlusPlus
                | MinusMinus
                | This
                | New
                | Delete
                | Sizeof
                | Operator
        )
}

/// Check if a token kind can only start a statement, never a declaration.
pub fn is_statement_keyword(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        If | Switch | Case | Default | While | Do | For | Break | Continue | Return | Goto
    )
}

/// Check if a token kind can start a declaration inside a block.
pub fn starts_block_declaration(kind: TokenKind) -> bool {
    kind.is_builtin_type()
        || kind.is_cv_qualifier()
        || kind.is_decl_specifier()
        || kind.is_class_key()
        || matches!(
            kind,
            TokenKind::Enum | TokenKind::Typename | TokenKind::Using | TokenKind::Namespace | TokenKind::Template
        )
}

pub fn specifier_for(kind: TokenKind) -> Option<Specifiers> {
    let specifier = match kind {
        TokenKind::Typedef => Specifiers::TYPEDEF,
        TokenKind::Friend => Specifiers::FRIEND,
        TokenKind::Static => Specifiers::STATIC,
        TokenKind::Extern => Specifiers::EXTERN,
        TokenKind::Inline => Specifiers::INLINE,
        TokenKind::Virtual => Specifiers::VIRTUAL,
        TokenKind::Explicit => Specifiers::EXPLICIT,
        TokenKind::Mutable => Specifiers::MUTABLE,
        TokenKind::Constexpr => Specifiers::CONSTEXPR,
        _ => return None,
    };
    Some(specifier)
}

pub fn class_kind_for(kind: TokenKind) -> Option<ClassKind> {
    match kind {
        TokenKind::Class => Some(ClassKind::Class),
        TokenKind::Struct => Some(ClassKind::Struct),
        TokenKind::Union => Some(ClassKind::Union),
        _ => None,
    }
}

pub fn visibility_for(kind: TokenKind) -> Option<Visibility> {
    match kind {
        TokenKind::Public => Some(Visibility::Public),
        TokenKind::Protected => Some(Visibility::Protected),
        TokenKind::Private => Some(Visibility::Private),
        _ => None,
    }
}

/// Word-like tokens need a space between them when rendered.
fn is_word(kind: TokenKind) -> bool {
    use TokenKind::*;
    !matches!(
        kind,
        LeftParen
            | RightParen
            | LeftBrace
            | RightBrace
            | LeftBracket
            | RightBracket
            | Semicolon
            | Comma
            | Colon
            | ColonColon
            | Dot
            | Arrow
            | Ellipsis
            | Question
            | Tilde
            | Not
            | Assign
            | Plus
            | Minus
            | Star
            | Slash
            | Percent
            | Amp
            | Bar
            | Caret
            | AmpAmp
            | BarBar
            | PlusPlus
            | MinusMinus
            | EqualEqual
            | NotEqual
            | Less
            | Greater
            | LessEqual
            | GreaterEqual
            | LessLess
    ) && !kind.is_assignment_operator()
}

/// Render tokens the way they would be written, with a space only between
/// adjacent words: `unsigned int`, `std::vector<int>`.
pub fn render_tokens(tokens: &[Token], interner: &StringInterner) -> String {
    let mut text = String::new();
    let mut previous: Option<TokenKind> = None;
    for token in tokens {
        if previous.is_some_and(is_word) && is_word(token.kind) {
            text.push(' ');
        }
        text.push_str(interner.resolve(token.text));
        previous = Some(token.kind);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxm_lexer::Scanner;

    fn render(source: &str) -> String {
        let interner = StringInterner::new();
        let scan = Scanner::new(source, interner.clone()).tokenize();
        render_tokens(&scan.tokens, &interner)
    }

    #[test]
    fn test_render_keeps_words_apart() {
        assert_eq!(render("unsigned   long int"), "unsigned long int");
        assert_eq!(render("std :: vector < int >"), "std::vector<int>");
        assert_eq!(render("const char *"), "const char*");
    }

    #[test]
    fn test_keyword_classes() {
        assert!(is_statement_keyword(TokenKind::Case));
        assert!(!is_statement_keyword(TokenKind::Int));
        assert!(starts_block_declaration(TokenKind::Typedef));
        assert!(can_start_expression(TokenKind::Identifier));
        assert_eq!(specifier_for(TokenKind::Friend), Some(Specifiers::FRIEND));
        assert_eq!(visibility_for(TokenKind::Protected), Some(Visibility::Protected));
        assert_eq!(class_kind_for(TokenKind::Union), Some(ClassKind::Union));
    }
}
