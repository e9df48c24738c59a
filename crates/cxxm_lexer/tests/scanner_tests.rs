//! Scanner integration tests.
//!
//! Verifies that the scanner correctly tokenizes the supported C++ constructs.

use cxxm_core::intern::StringInterner;
use cxxm_lexer::{Scanner, TokenKind};

/// Helper: scan all tokens from source and return as (kind, text) pairs.
fn scan_all(source: &str) -> Vec<(TokenKind, String)> {
    let interner = StringInterner::new();
    let result = Scanner::new(source, interner.clone()).tokenize();
    result
        .tokens
        .iter()
        .map(|t| (t.kind, interner.resolve(t.text).to_string()))
        .collect()
}

/// Helper: scan all token kinds.
fn scan_kinds(source: &str) -> Vec<TokenKind> {
    scan_all(source).into_iter().map(|(k, _)| k).collect()
}

// ============================================================================
// Trivia
// ============================================================================

#[test]
fn test_empty_source() {
    assert!(scan_all("").is_empty());
}

#[test]
fn test_comments_are_skipped() {
    let kinds = scan_kinds("int /* block\n comment */ x; // trailing\n");
    assert_eq!(kinds, vec![TokenKind::Int, TokenKind::Identifier, TokenKind::Semicolon]);
}

#[test]
fn test_unterminated_comment_is_reported() {
    let result = Scanner::new("int x; /* never closed", StringInterner::new()).tokenize();
    assert_eq!(result.tokens.len(), 3);
    assert_eq!(result.diagnostics.error_count(), 1);
}

// ============================================================================
// Preprocessor lines
// ============================================================================

#[test]
fn test_directives_are_dropped() {
    let kinds = scan_kinds("#define X \\\n  1\n#pragma once\nint x;");
    assert_eq!(kinds, vec![TokenKind::Int, TokenKind::Identifier, TokenKind::Semicolon]);
}

#[test]
fn test_include_directive_position() {
    let source = "int a;\n#include \"util.h\"\n#include <vector>\nint b;";
    let result = Scanner::new(source, StringInterner::new()).tokenize();
    assert_eq!(result.includes.len(), 2);
    assert_eq!(result.includes[0].path, "util.h");
    assert!(result.includes[0].quoted);
    assert_eq!(result.includes[0].position, 3);
    assert_eq!(result.includes[1].path, "vector");
    assert!(!result.includes[1].quoted);
}

#[test]
fn test_hash_mid_line_is_not_a_directive() {
    let result = Scanner::new("x # y", StringInterner::new()).tokenize();
    assert!(result.diagnostics.has_errors());
}

// ============================================================================
// Tokens
// ============================================================================

#[test]
fn test_keywords_and_identifiers() {
    let tokens = scan_all("namespace N { class Foo; }");
    assert_eq!(tokens[0].0, TokenKind::Namespace);
    assert_eq!(tokens[1], (TokenKind::Identifier, "N".to_string()));
    assert_eq!(tokens[3].0, TokenKind::Class);
    assert_eq!(tokens[4], (TokenKind::Identifier, "Foo".to_string()));
}

#[test]
fn test_numeric_literals() {
    let tokens = scan_all("42 0x1F 3.14 1e10 2.5f 10ul 1'000");
    let kinds: Vec<_> = tokens.iter().map(|t| t.0).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::IntLiteral,
            TokenKind::IntLiteral,
            TokenKind::FloatLiteral,
            TokenKind::FloatLiteral,
            TokenKind::FloatLiteral,
            TokenKind::IntLiteral,
            TokenKind::IntLiteral,
        ]
    );
    assert_eq!(tokens[1].1, "0x1F");
    assert_eq!(tokens[6].1, "1'000");
}

#[test]
fn test_string_and_char_literals() {
    let tokens = scan_all(r#""a \"quoted\" s" 'c' '\n' L"wide""#);
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0].0, TokenKind::StringLiteral);
    assert_eq!(tokens[0].1, r#""a \"quoted\" s""#);
    assert_eq!(tokens[1].0, TokenKind::CharLiteral);
    assert_eq!(tokens[2].0, TokenKind::CharLiteral);
    assert_eq!(tokens[3], (TokenKind::StringLiteral, "L\"wide\"".to_string()));
}

#[test]
fn test_operators() {
    let kinds = scan_kinds("a += b << 2 && c != d; ~x; p->q; ++i--");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::PlusAssign,
            TokenKind::Identifier,
            TokenKind::LessLess,
            TokenKind::IntLiteral,
            TokenKind::AmpAmp,
            TokenKind::Identifier,
            TokenKind::NotEqual,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Tilde,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::PlusPlus,
            TokenKind::Identifier,
            TokenKind::MinusMinus,
        ]
    );
}

#[test]
fn test_offsets_are_byte_offsets() {
    let interner = StringInterner::new();
    let result = Scanner::new("int  héllo;", interner.clone()).tokenize();
    let ident = result.tokens[1];
    assert_eq!(ident.kind, TokenKind::Identifier);
    assert_eq!(interner.resolve(ident.text), "héllo");
    assert_eq!(ident.offset, 5);
    assert_eq!(ident.end, 11);
}
