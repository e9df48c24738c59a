//! A recursive-descent driver for the supported C++ subset.
//!
//! The driver owns a [`TokenCursor`] and talks to the [`ParseSession`] only
//! through parser actions and disambiguation queries. Every construct is
//! announced with its begin callback, its parts, and its end callback, and
//! end callbacks are only issued for constructs whose begin succeeded, so
//! the builder stack stays balanced whatever the input.
//!
//! Errors returned by actions are collected on the session; a hard one
//! makes the driver resynchronize at the next `;` or `}`.

mod declarations;
mod expressions;
mod names;
mod statements;

use crate::action::TemplateArgumentList;
use crate::builders::Builder;
use crate::cursor::TokenCursor;
use crate::error::RecognitionError;
use crate::session::ParseSession;
use cxxm_diagnostics::{messages, DiagnosticMessage};
use cxxm_lexer::{Token, TokenKind};
use tracing::trace;

/// Where a declaration appears; decides what may follow a declarator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Namespace scope, the translation unit included.
    Namespace,
    Member,
    Block,
    /// The init-statement of a `for`.
    ForInit,
    /// Function and non-type template parameters.
    Parameter,
}

pub struct Grammar<'s> {
    session: &'s mut ParseSession,
    cursor: TokenCursor,
    recursion_depth: u32,
    max_recursion_depth: u32,
    /// Open parentheses and brackets inside expressions.
    paren_depth: u32,
    /// `paren_depth` at each open template argument or parameter list; a
    /// `>` at that depth closes the list.
    template_marks: Vec<u32>,
    /// A hard error asked for resynchronization.
    resync: bool,
}

impl<'s> Grammar<'s> {
    pub fn new(session: &'s mut ParseSession, cursor: TokenCursor) -> Self {
        let max_recursion_depth = session.options().max_recursion_depth;
        Self {
            session,
            cursor,
            recursion_depth: 0,
            max_recursion_depth,
            paren_depth: 0,
            template_marks: Vec::new(),
            resync: false,
        }
    }

    /// Parse declarations up to the end of the tokens.
    pub fn translation_unit(mut self) {
        self.sync();
        while !self.at(TokenKind::EndOfFile) {
            let before = self.cursor.index();
            self.declaration(Context::Namespace);
            self.recover(before);
        }
        self.sync();
    }

    /// Parse a function body whose declarator was already handled: an
    /// optional constructor initializer list and a compound statement. The
    /// function builder must be on top of the builder stack.
    pub fn function_body_after_declarator(mut self) {
        self.sync();
        self.function_body();
        if !self.at(TokenKind::EndOfFile) {
            let token = self.token();
            let text = self.session.interner().resolve(token.text).to_string();
            self.session.syntax_error(token, &messages::UNEXPECTED_TOKEN_0, &[&text]);
        }
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current(&self) -> TokenKind {
        self.cursor.la(1)
    }

    #[inline]
    fn peek(&self, i: usize) -> TokenKind {
        self.cursor.la(i)
    }

    #[inline]
    fn token(&self) -> Token {
        self.cursor.lt(1)
    }

    #[inline]
    fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// The last consumed token, or the current one before anything was
    /// consumed.
    fn previous(&self) -> Token {
        self.cursor.previous().unwrap_or_else(|| self.token())
    }

    /// Apply the file-context transitions the cursor moved past.
    fn sync(&mut self) {
        let events = self.cursor.sync_inclusions();
        if !events.is_empty() {
            self.session.apply_inclusions(events);
        }
    }

    /// Consume the current token. File-context transitions in front of it
    /// are applied first, so callbacks for the token run in its file.
    fn bump(&mut self) -> Token {
        self.sync();
        self.cursor.consume()
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        self.at(kind).then(|| self.bump())
    }

    /// Consume a token of `kind` or report `'{text}' expected`.
    fn expect(&mut self, kind: TokenKind, text: &str) -> Option<Token> {
        if self.at(kind) {
            return Some(self.bump());
        }
        self.error_at_current(&messages::_0_EXPECTED, &[text]);
        None
    }

    /// The statement or declaration ends here; a missing `;` is reported
    /// at the current token.
    fn expect_semicolon(&mut self) -> Token {
        self.expect(TokenKind::Semicolon, ";").unwrap_or_else(|| self.previous())
    }

    /// An identifier with contextual meaning: `final`, `override`, `throw`.
    fn at_word(&self, word: &str) -> bool {
        self.at(TokenKind::Identifier) && self.text(self.token()) == word
    }

    fn error_at_current(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let token = self.token();
        self.session.syntax_error(token, message, args);
    }

    fn text(&self, token: Token) -> &str {
        self.session.interner().resolve(token.text)
    }

    // ========================================================================
    // Actions and recovery
    // ========================================================================

    /// Run a parser action. Returns whether it succeeded; a hard error
    /// schedules resynchronization.
    fn action(&mut self, f: impl FnOnce(&mut ParseSession) -> Result<(), RecognitionError>) -> bool {
        match f(self.session) {
            Ok(()) => true,
            Err(error) => {
                if error.hard {
                    trace!(message = %error.message, offset = error.offset, "hard recognition error");
                    self.resync = true;
                }
                false
            }
        }
    }

    /// After one item of a sequence: resynchronize if an action asked for
    /// it, and never leave the cursor where the item started.
    fn recover(&mut self, before: usize) {
        if std::mem::take(&mut self.resync) {
            let finished = self.cursor.index() != before
                && matches!(
                    self.cursor.previous().map(|t| t.kind),
                    Some(TokenKind::Semicolon | TokenKind::RightBrace)
                );
            if !finished {
                self.skip_to_sync_point();
            }
            return;
        }
        if self.cursor.index() == before && !self.at(TokenKind::EndOfFile) {
            let token = self.bump();
            let text = self.text(token).to_string();
            self.session.syntax_error(token, &messages::UNEXPECTED_TOKEN_0, &[&text]);
        }
    }

    /// Skip to just after the next `;`, or to the next unmatched `}`.
    fn skip_to_sync_point(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.current() {
                TokenKind::EndOfFile => return,
                TokenKind::Semicolon if depth == 0 => {
                    self.bump();
                    return;
                }
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                _ => {}
            }
            self.bump();
        }
    }

    /// Skip a balanced `open ... close` group starting at the cursor.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) {
        let mut depth = 0u32;
        loop {
            let kind = self.current();
            if kind == TokenKind::EndOfFile {
                return;
            }
            self.bump();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Recursion guard. Pair every successful `enter` with `leave`.
    fn enter(&mut self) -> bool {
        if self.recursion_depth >= self.max_recursion_depth {
            self.error_at_current(&messages::MAXIMUM_NESTING_DEPTH_EXCEEDED, &[]);
            self.resync = true;
            return false;
        }
        self.recursion_depth += 1;
        true
    }

    fn leave(&mut self) {
        self.recursion_depth -= 1;
    }

    // ========================================================================
    // Template argument lists
    // ========================================================================

    /// Whether a `>` at the cursor closes the innermost template argument
    /// or parameter list rather than comparing. Inside parentheses opened
    /// after the list it is always a comparison.
    fn closes_template_list(&self) -> bool {
        self.at(TokenKind::Greater)
            && self.session.top_level_of_template_arguments()
            && self.template_marks.last() == Some(&self.paren_depth)
    }

    /// Enter a `<` list whose opening token was just consumed.
    fn open_template_list(&mut self, open: Token) {
        self.action(|s| s.template_arguments(TemplateArgumentList::Open, open));
        self.template_marks.push(self.paren_depth);
    }

    /// Leave the innermost list, expecting its `>`.
    fn close_template_list(&mut self) {
        self.template_marks.pop();
        let close = self.expect(TokenKind::Greater, ">").unwrap_or_else(|| self.previous());
        self.action(|s| s.template_arguments(TemplateArgumentList::Close, close));
    }

    // ========================================================================
    // Builder queries
    // ========================================================================

    /// The declaration being built already has its type.
    fn has_type_specifier(&self) -> bool {
        self.session
            .builders
            .decl_specs()
            .is_some_and(|specs| specs.has_type_specifier)
    }

    /// The declarator just handed to the simple declaration on top declares
    /// a function.
    fn declarator_is_function(&self) -> bool {
        match self.session.builders.top() {
            Some(Builder::SimpleDeclaration(decl)) => decl.declarator.as_ref().is_some_and(|d| d.is_function()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxm_core::intern::StringInterner;
    use cxxm_lexer::Scanner;
    use cxxm_options::ParserOptions;

    fn parse(source: &str) -> ParseSession {
        let mut session = ParseSession::new(ParserOptions::default(), StringInterner::new());
        session.parse_source("test.cpp", source);
        session
    }

    #[test]
    fn test_empty_input() {
        let session = parse("");
        assert!(session.recognition_errors().is_empty());
        assert_eq!(session.builder_depth(), 0);
    }

    #[test]
    fn test_unexpected_token_is_skipped() {
        let session = parse(") int a;");
        assert_eq!(session.recognition_errors().len(), 1);
        let file = session.store().file(session.current_file());
        assert_eq!(file.map(|f| f.declarations.len()), Some(1));
    }

    #[test]
    fn test_recursion_guard() {
        let mut options = ParserOptions::default();
        options.max_recursion_depth = 8;
        let mut session = ParseSession::new(options, StringInterner::new());
        let source = format!("int a = {}1{};", "(".repeat(20), ")".repeat(20));
        session.parse_source("deep.cpp", &source);
        assert!(session
            .recognition_errors()
            .iter()
            .any(|e| e.message.contains("nesting depth")));
        assert_eq!(session.builder_depth(), 0);
        assert_eq!(session.symtab().depth(), 1);
    }

    #[test]
    fn test_skip_balanced_stops_after_group() {
        let interner = StringInterner::new();
        let scan = Scanner::new("{ a { b } c } d", interner.clone()).tokenize();
        let cursor = TokenCursor::from_tokens(scan.tokens, &interner);
        let mut session = ParseSession::new(ParserOptions::default(), interner);
        let mut grammar = Grammar::new(&mut session, cursor);
        grammar.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace);
        assert_eq!(grammar.text(grammar.token()), "d");
    }
}
