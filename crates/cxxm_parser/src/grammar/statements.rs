//! Statements inside function bodies.

use super::{Context, Grammar};
use crate::action::{IterationPart, LabelKind, SelectionPart};
use crate::builders::JumpKind;
use crate::utilities::starts_block_declaration;
use cxxm_diagnostics::messages;
use cxxm_lexer::TokenKind;

impl Grammar<'_> {
    pub(super) fn statement(&mut self) {
        if !self.enter() {
            return;
        }
        match self.current() {
            TokenKind::LeftBrace => self.compound_statement(),
            TokenKind::If | TokenKind::Switch => self.selection_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Do => self.do_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Case => self.case_statement(),
            TokenKind::Default => {
                let token = self.bump();
                self.expect(TokenKind::Colon, ":");
                self.action(|s| s.labeled_statement(LabelKind::Default, token));
            }
            TokenKind::Identifier if self.peek(2) == TokenKind::Colon => {
                let label = self.bump();
                self.bump();
                self.action(|s| s.labeled_statement(LabelKind::Label, label));
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Return | TokenKind::Goto => self.jump_statement(),
            _ if self.looks_like_declaration() => self.declaration_statement(Context::Block),
            _ => self.expression_statement(),
        }
        self.leave();
    }

    pub(super) fn compound_statement(&mut self) {
        let open = self.bump();
        let opened = self.action(|s| s.compound_statement(open));
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::EndOfFile) {
            let before = self.cursor.index();
            self.statement();
            self.recover(before);
        }
        let close = self.expect(TokenKind::RightBrace, "}").unwrap_or_else(|| self.previous());
        if opened {
            self.action(|s| s.end_compound_statement(close));
        }
    }

    fn expression_statement(&mut self) {
        let start = self.token();
        if !self.action(|s| s.expression_statement(start)) {
            return;
        }
        if !self.at(TokenKind::Semicolon) {
            self.expression_root(true);
        }
        let end = self.expect_semicolon();
        self.action(|s| s.end_expression_statement(end));
    }

    fn declaration_statement(&mut self, context: Context) {
        let start = self.token();
        if !self.action(|s| s.declaration_statement(start)) {
            return;
        }
        self.declaration(context);
        let end = self.previous();
        self.action(|s| s.end_declaration_statement(end));
    }

    // ========================================================================
    // Selection and iteration
    // ========================================================================

    fn selection_statement(&mut self) {
        let keyword = self.bump();
        let part = if keyword.kind == TokenKind::If {
            SelectionPart::If
        } else {
            SelectionPart::Switch
        };
        if !self.action(|s| s.selection_statement(part, keyword)) {
            return;
        }
        self.eat(TokenKind::Constexpr);
        if self.expect(TokenKind::LeftParen, "(").is_some() {
            self.condition();
            self.expect(TokenKind::RightParen, ")");
        }
        self.statement();
        if part == SelectionPart::If && self.at(TokenKind::Else) {
            let token = self.bump();
            self.action(|s| s.selection_statement(SelectionPart::Else, token));
            self.statement();
        }
        let end = self.previous();
        self.action(|s| s.end_selection_statement(end));
    }

    fn while_statement(&mut self) {
        let keyword = self.bump();
        if !self.action(|s| s.iteration_statement(IterationPart::While, keyword)) {
            return;
        }
        if self.expect(TokenKind::LeftParen, "(").is_some() {
            self.condition();
        }
        let close = self.expect(TokenKind::RightParen, ")").unwrap_or_else(|| self.previous());
        self.action(|s| s.iteration_statement(IterationPart::Body, close));
        self.statement();
        let end = self.previous();
        self.action(|s| s.end_iteration_statement(end));
    }

    fn do_statement(&mut self) {
        let keyword = self.bump();
        if !self.action(|s| s.iteration_statement(IterationPart::Do, keyword)) {
            return;
        }
        self.statement();
        if let Some(token) = self.expect(TokenKind::While, "while") {
            self.action(|s| s.iteration_statement(IterationPart::DoCondition, token));
            if self.expect(TokenKind::LeftParen, "(").is_some() {
                self.expression_root(true);
                self.expect(TokenKind::RightParen, ")");
            }
        }
        let end = self.expect_semicolon();
        self.action(|s| s.end_iteration_statement(end));
    }

    /// `for (init; condition; step)` and `for (declaration : range)`. The
    /// init-statement brings its own `;`.
    fn for_statement(&mut self) {
        let keyword = self.bump();
        if !self.action(|s| s.iteration_statement(IterationPart::For, keyword)) {
            return;
        }
        if self.expect(TokenKind::LeftParen, "(").is_some() {
            if self.at(TokenKind::Semicolon) {
                self.bump();
            } else if self.looks_like_declaration() {
                self.declaration_statement(Context::ForInit);
            } else {
                self.expression_statement();
            }
            if self.at(TokenKind::Colon) {
                let colon = self.bump();
                self.action(|s| s.iteration_statement(IterationPart::ForCondition, colon));
                if self.at(TokenKind::LeftBrace) {
                    self.braced_range();
                } else {
                    self.expression_root(false);
                }
            } else {
                let semicolon = self.previous();
                self.action(|s| s.iteration_statement(IterationPart::ForCondition, semicolon));
                if !self.at(TokenKind::Semicolon) {
                    self.condition();
                }
                if let Some(token) = self.expect(TokenKind::Semicolon, ";") {
                    self.action(|s| s.iteration_statement(IterationPart::ForStep, token));
                }
                if !self.at(TokenKind::RightParen) {
                    self.expression_root(true);
                }
            }
        }
        let close = self.expect(TokenKind::RightParen, ")").unwrap_or_else(|| self.previous());
        self.action(|s| s.iteration_statement(IterationPart::Body, close));
        self.statement();
        let end = self.previous();
        self.action(|s| s.end_iteration_statement(end));
    }

    /// `for (x : {1, 2, 3})`
    fn braced_range(&mut self) {
        let start = self.token();
        if self.action(|s| s.expression(start)) {
            self.braced_init_list();
            let end = self.previous();
            self.action(|s| s.end_expression(end));
        }
    }

    /// The condition of an `if`, `switch`, `while` or `for`: an expression
    /// or a declaration with an initializer.
    fn condition(&mut self) {
        if !self.looks_like_declaration() {
            self.expression_root(true);
            return;
        }
        let start = self.token();
        if !self.action(|s| s.condition_declaration(start)) {
            return;
        }
        self.decl_specifier_seq(Context::Block);
        self.declarator();
        if matches!(self.current(), TokenKind::Assign | TokenKind::LeftBrace) {
            let token = self.token();
            self.eat(TokenKind::Assign);
            self.action(|s| s.initializer(token));
            self.expression_root(false);
        }
        let end = self.previous();
        self.action(|s| s.end_condition_declaration(end));
    }

    // ========================================================================
    // Labels and jumps
    // ========================================================================

    fn case_statement(&mut self) {
        let keyword = self.bump();
        if !self.action(|s| s.labeled_statement(LabelKind::Case, keyword)) {
            return;
        }
        self.expression_root(false);
        match self.eat(TokenKind::Colon) {
            Some(colon) => {
                self.action(|s| s.labeled_statement(LabelKind::CaseColon, colon));
            }
            None => self.error_at_current(&messages::_0_EXPECTED, &[":"]),
        }
        let end = self.previous();
        self.action(|s| s.end_labeled_statement(end));
    }

    fn jump_statement(&mut self) {
        let keyword = self.bump();
        let kind = match keyword.kind {
            TokenKind::Break => JumpKind::Break,
            TokenKind::Continue => JumpKind::Continue,
            TokenKind::Return => JumpKind::Return,
            _ => JumpKind::Goto,
        };
        let label = if kind == JumpKind::Goto {
            self.eat(TokenKind::Identifier)
        } else {
            None
        };
        if !self.action(|s| s.jump_statement(kind, keyword, label)) {
            return;
        }
        if kind == JumpKind::Return && !self.at(TokenKind::Semicolon) {
            self.expression_root(true);
        }
        let end = self.expect_semicolon();
        self.action(|s| s.end_jump_statement(end));
    }

    // ========================================================================
    // Disambiguation
    // ========================================================================

    /// Whether the statement at the cursor is a declaration. Known type names
    /// decide first; an unknown name declares when another name follows it.
    fn looks_like_declaration(&mut self) -> bool {
        let kind = self.current();
        if starts_block_declaration(kind) {
            return !(kind.is_builtin_type() && self.peek(2) == TokenKind::LeftParen);
        }
        if !matches!(kind, TokenKind::Identifier | TokenKind::ColonColon) || self.at_word("throw") {
            return false;
        }
        if self.session.starts_type_name(&mut self.cursor) {
            let n = self.name_length(1).unwrap_or(1);
            return match self.peek(n + 1) {
                TokenKind::LeftParen => self.parenthesized_declarator_at(n + 1),
                TokenKind::LeftBrace | TokenKind::Dot | TokenKind::Arrow | TokenKind::ColonColon => false,
                _ => true,
            };
        }
        self.unknown_type_ahead(Context::Block)
    }

    /// `(x)` or `(*x)` at lookahead `i` followed by what may end a
    /// declarator: `T(x);` declares `x`.
    fn parenthesized_declarator_at(&self, i: usize) -> bool {
        let mut j = i + 1;
        if matches!(self.peek(j), TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp) {
            j += 1;
        }
        self.peek(j) == TokenKind::Identifier
            && self.peek(j + 1) == TokenKind::RightParen
            && ends_declarator(self.peek(j + 2))
    }
}

fn ends_declarator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Semicolon | TokenKind::Assign | TokenKind::Comma | TokenKind::LeftBracket
    )
}
