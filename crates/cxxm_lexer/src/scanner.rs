//! The C++ scanner.
//!
//! Converts one file's text into tokens. Trivia and preprocessor lines are
//! dropped; `#include "..."` lines are reported as [`IncludeDirective`]s
//! together with the token position they occurred at, so a caller that
//! resolves them can splice the included tokens into a [`TokenStream`].
//!
//! [`TokenStream`]: crate::TokenStream

use crate::token::{Token, TokenKind};
use cxxm_core::intern::StringInterner;
use cxxm_core::text::{TextPos, TextSpan};
use cxxm_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use unicode_xid::UnicodeXID;

/// An `#include` line found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// The path between the quotes or angle brackets.
    pub path: String,
    /// `true` for `"..."`, `false` for `<...>`.
    pub quoted: bool,
    /// Number of tokens scanned before the directive.
    pub position: usize,
    pub span: TextSpan,
}

/// Everything a scan of one file produced.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub includes: Vec<IncludeDirective>,
    pub diagnostics: DiagnosticCollection,
}

pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Only whitespace seen since the last line break; `#` starts a directive.
    at_line_start: bool,
    interner: StringInterner,
    includes: Vec<IncludeDirective>,
    diagnostics: DiagnosticCollection,
    token_count: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, interner: StringInterner) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            at_line_start: true,
            interner,
            includes: Vec::new(),
            diagnostics: DiagnosticCollection::new(),
            token_count: 0,
        }
    }

    /// Scan the whole text. The returned token list does not contain the
    /// end-of-file token.
    pub fn tokenize(mut self) -> ScanResult {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan();
            if token.kind == TokenKind::EndOfFile {
                break;
            }
            tokens.push(token);
            self.token_count += 1;
        }
        ScanResult {
            tokens,
            includes: self.includes,
            diagnostics: self.diagnostics,
        }
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    #[inline]
    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn error(&mut self, message: &DiagnosticMessage, start: usize, args: &[&str]) {
        let span = TextSpan::from_bounds(start as TextPos, self.pos as TextPos);
        self.diagnostics.add(Diagnostic::new(message, args).at(span));
    }

    /// Skip whitespace, comments and preprocessor lines.
    fn skip_trivia(&mut self) {
        while let Some(b) = self.byte_at(0) {
            match b {
                b'\n' => {
                    self.pos += 1;
                    self.at_line_start = true;
                }
                b' ' | b'\t' | b'\r' | 0x0B | 0x0C => self.pos += 1,
                b'\\' if matches!(self.byte_at(1), Some(b'\n')) => self.pos += 2,
                b'/' if self.byte_at(1) == Some(b'/') => self.skip_to_line_end(),
                b'/' if self.byte_at(1) == Some(b'*') => {
                    let start = self.pos;
                    match memchr::memmem::find(&self.bytes[self.pos + 2..], b"*/") {
                        Some(rel) => self.pos += rel + 4,
                        None => {
                            self.pos = self.bytes.len();
                            self.error(&messages::UNTERMINATED_COMMENT, start, &[]);
                        }
                    }
                }
                b'#' if self.at_line_start => self.scan_directive(),
                _ => return,
            }
        }
    }

    fn skip_to_line_end(&mut self) {
        match memchr::memchr(b'\n', &self.bytes[self.pos..]) {
            Some(rel) => self.pos += rel,
            None => self.pos = self.bytes.len(),
        }
    }

    /// Consume a preprocessor line, honouring backslash continuations.
    fn scan_directive(&mut self) {
        let start = self.pos;
        loop {
            self.skip_to_line_end();
            let line = &self.bytes[start..self.pos];
            let continued = line.ends_with(b"\\") || line.ends_with(b"\\\r");
            if continued && !self.is_eof() {
                self.pos += 1;
                continue;
            }
            break;
        }
        let line = &self.text[start + 1..self.pos];
        if let Some(directive) = parse_include(line) {
            let (path, quoted) = directive;
            self.includes.push(IncludeDirective {
                path: path.to_string(),
                quoted,
                position: self.token_count,
                span: TextSpan::from_bounds(start as TextPos, self.pos as TextPos),
            });
        }
    }

    /// Scan the next token.
    pub fn scan(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;
        self.at_line_start = false;

        let Some(b) = self.byte_at(0) else {
            return self.make(TokenKind::EndOfFile, start);
        };

        let kind = match b {
            b'(' => self.single(TokenKind::LeftParen),
            b')' => self.single(TokenKind::RightParen),
            b'{' => self.single(TokenKind::LeftBrace),
            b'}' => self.single(TokenKind::RightBrace),
            b'[' => self.single(TokenKind::LeftBracket),
            b']' => self.single(TokenKind::RightBracket),
            b';' => self.single(TokenKind::Semicolon),
            b',' => self.single(TokenKind::Comma),
            b'?' => self.single(TokenKind::Question),
            b'~' => self.single(TokenKind::Tilde),
            b'>' => self.pick(&[(b"=", TokenKind::GreaterEqual)], TokenKind::Greater),
            b':' => self.pick(&[(b":", TokenKind::ColonColon)], TokenKind::Colon),
            b'=' => self.pick(&[(b"=", TokenKind::EqualEqual)], TokenKind::Assign),
            b'!' => self.pick(&[(b"=", TokenKind::NotEqual)], TokenKind::Not),
            b'*' => self.pick(&[(b"=", TokenKind::StarAssign)], TokenKind::Star),
            b'/' => self.pick(&[(b"=", TokenKind::SlashAssign)], TokenKind::Slash),
            b'%' => self.pick(&[(b"=", TokenKind::PercentAssign)], TokenKind::Percent),
            b'^' => self.pick(&[(b"=", TokenKind::CaretAssign)], TokenKind::Caret),
            b'+' => self.pick(
                &[(b"+", TokenKind::PlusPlus), (b"=", TokenKind::PlusAssign)],
                TokenKind::Plus,
            ),
            b'-' => self.pick(
                &[
                    (b">", TokenKind::Arrow),
                    (b"-", TokenKind::MinusMinus),
                    (b"=", TokenKind::MinusAssign),
                ],
                TokenKind::Minus,
            ),
            b'&' => self.pick(
                &[(b"&", TokenKind::AmpAmp), (b"=", TokenKind::AmpAssign)],
                TokenKind::Amp,
            ),
            b'|' => self.pick(
                &[(b"|", TokenKind::BarBar), (b"=", TokenKind::BarAssign)],
                TokenKind::Bar,
            ),
            b'<' => self.pick(
                &[
                    (b"<=", TokenKind::LessLessAssign),
                    (b"<", TokenKind::LessLess),
                    (b"=", TokenKind::LessEqual),
                ],
                TokenKind::Less,
            ),
            b'.' => {
                if self.byte_at(1) == Some(b'.') && self.byte_at(2) == Some(b'.') {
                    self.pos += 3;
                    TokenKind::Ellipsis
                } else if self.byte_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    self.single(TokenKind::Dot)
                }
            }
            b'"' => self.scan_quoted(b'"'),
            b'\'' => self.scan_quoted(b'\''),
            b'0'..=b'9' => self.scan_number(),
            _ if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 => self.scan_identifier(),
            _ => {
                self.pos += 1;
                let text = (b as char).to_string();
                self.error(&messages::INVALID_CHARACTER, start, &[&text]);
                TokenKind::Unknown
            }
        };

        self.make(kind, start)
    }

    fn make(&self, kind: TokenKind, start: usize) -> Token {
        let text = self.interner.intern(&self.text[start..self.pos]);
        Token::new(kind, text, start as TextPos, self.pos as TextPos)
    }

    #[inline]
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    /// Longest-match on the bytes following the current one.
    fn pick(&mut self, options: &[(&[u8], TokenKind)], fallback: TokenKind) -> TokenKind {
        let rest = &self.bytes[self.pos + 1..];
        for (suffix, kind) in options {
            if rest.starts_with(suffix) {
                self.pos += 1 + suffix.len();
                return *kind;
            }
        }
        self.pos += 1;
        fallback
    }

    // ========================================================================
    // Token-specific scanning methods
    // ========================================================================

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(ch) = self.text[self.pos..].chars().next() {
            let ok = if ch.is_ascii() {
                ch.is_ascii_alphanumeric() || ch == '_'
            } else if self.pos == start {
                UnicodeXID::is_xid_start(ch)
            } else {
                UnicodeXID::is_xid_continue(ch)
            };
            if !ok {
                break;
            }
            self.pos += ch.len_utf8();
        }
        if self.pos == start {
            // A non-identifier, non-ASCII character.
            let ch = self.text[self.pos..].chars().next().unwrap_or('?');
            self.pos += ch.len_utf8().max(1);
            let text = ch.to_string();
            self.error(&messages::INVALID_CHARACTER, start, &[&text]);
            return TokenKind::Unknown;
        }
        let word = &self.text[start..self.pos];
        // Prefixed literals: L"..", u8"..", U'..'
        if matches!(word, "L" | "u" | "U" | "u8") {
            if let Some(q @ (b'"' | b'\'')) = self.byte_at(0) {
                return self.scan_quoted(q);
            }
        }
        TokenKind::from_keyword(word).unwrap_or(TokenKind::Identifier)
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut is_float = false;
        if self.byte_at(0) == Some(b'0') && matches!(self.byte_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            while self.byte_at(0).is_some_and(|c| c.is_ascii_hexdigit() || c == b'\'') {
                self.pos += 1;
            }
        } else {
            while let Some(c) = self.byte_at(0) {
                match c {
                    b'0'..=b'9' | b'\'' => self.pos += 1,
                    b'.' => {
                        is_float = true;
                        self.pos += 1;
                    }
                    b'e' | b'E' => {
                        is_float = true;
                        self.pos += 1;
                        if matches!(self.byte_at(0), Some(b'+' | b'-')) {
                            self.pos += 1;
                        }
                    }
                    _ => break,
                }
            }
        }
        // Suffixes: u, l, ul, f, ...
        while self.byte_at(0).is_some_and(|c| matches!(c, b'u' | b'U' | b'l' | b'L' | b'f' | b'F')) {
            if matches!(self.byte_at(0), Some(b'f' | b'F')) {
                is_float = true;
            }
            self.pos += 1;
        }
        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn scan_quoted(&mut self, quote: u8) -> TokenKind {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.byte_at(0) {
                None | Some(b'\n') => {
                    let message = if quote == b'"' {
                        &messages::UNTERMINATED_STRING_LITERAL
                    } else {
                        &messages::UNTERMINATED_CHARACTER_LITERAL
                    };
                    self.error(message, start, &[]);
                    break;
                }
                Some(b'\\') => self.pos += 2.min(self.bytes.len() - self.pos),
                Some(c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        if quote == b'"' {
            TokenKind::StringLiteral
        } else {
            TokenKind::CharLiteral
        }
    }
}

/// Recognize `include "path"` / `include <path>` in a directive body.
fn parse_include(line: &str) -> Option<(&str, bool)> {
    let rest = line.trim_start().strip_prefix("include")?.trim_start();
    let (close, quoted) = match rest.as_bytes().first()? {
        b'"' => ('"', true),
        b'<' => ('>', false),
        _ => return None,
    };
    let body = &rest[1..];
    let end = body.find(close)?;
    Some((&body[..end], quoted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source, StringInterner::new())
            .tokenize()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_scope_and_arrow_punctuators() {
        assert_eq!(
            kinds("a::b->c..."),
            vec![
                TokenKind::Identifier,
                TokenKind::ColonColon,
                TokenKind::Identifier,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_closing_angles_stay_separate() {
        assert_eq!(
            kinds("A<B<int>>"),
            vec![
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Int,
                TokenKind::Greater,
                TokenKind::Greater,
            ]
        );
    }

    #[test]
    fn test_parse_include() {
        assert_eq!(parse_include("include \"a/b.h\""), Some(("a/b.h", true)));
        assert_eq!(parse_include("  include <vector>"), Some(("vector", false)));
        assert_eq!(parse_include("define X 1"), None);
    }
}
