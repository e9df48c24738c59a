//! Expressions.
//!
//! Expressions are kept in the model as spans plus the names they
//! reference, so the grammar checks their structure and reports
//! identifiers but builds no tree. Parentheses fold into the enclosing
//! expression builder.

use super::names::NameContext;
use super::Grammar;
use crate::precedence::{binary_operator_precedence, OperatorPrecedence};
use crate::utilities::can_start_expression;
use cxxm_diagnostics::messages;
use cxxm_lexer::TokenKind;

impl Grammar<'_> {
    /// A complete expression delivered to the builder on top. Commas
    /// separate operands only where the context allows it.
    pub(super) fn expression_root(&mut self, allow_comma: bool) {
        let start = self.token();
        if !self.action(|s| s.expression(start)) {
            return;
        }
        if allow_comma {
            self.comma_expression();
        } else {
            self.assignment_expression();
        }
        let end = self.previous();
        self.action(|s| s.end_expression(end));
    }

    fn comma_expression(&mut self) {
        loop {
            self.assignment_expression();
            if self.eat(TokenKind::Comma).is_none() {
                return;
            }
        }
    }

    fn assignment_expression(&mut self) {
        if !self.enter() {
            return;
        }
        if self.at_word("throw") {
            self.bump();
            if can_start_expression(self.current()) {
                self.assignment_expression();
            }
        } else {
            self.conditional_expression();
            if self.current().is_assignment_operator() {
                self.bump();
                if self.at(TokenKind::LeftBrace) {
                    self.braced_init_list();
                } else {
                    self.assignment_expression();
                }
            }
        }
        self.leave();
    }

    fn conditional_expression(&mut self) {
        self.binary_expression(OperatorPrecedence::LogicalOr as u8);
        if self.eat(TokenKind::Question).is_some() {
            self.assignment_expression();
            self.expect(TokenKind::Colon, ":");
            self.assignment_expression();
        }
    }

    /// Precedence climbing over the binary operators binding at least as
    /// tightly as `min`.
    fn binary_expression(&mut self, min: u8) {
        self.unary_expression();
        loop {
            if self.closes_template_list() {
                return;
            }
            let (precedence, width) = self.binary_operator();
            if precedence == OperatorPrecedence::Invalid || (precedence as u8) < min {
                return;
            }
            for _ in 0..width {
                self.bump();
            }
            self.binary_expression(precedence as u8 + 1);
        }
    }

    /// The binary operator at the cursor and its token count. Touching
    /// `>` `>` is a shift.
    fn binary_operator(&self) -> (OperatorPrecedence, usize) {
        if self.at(TokenKind::Greater) && self.peek(2) == TokenKind::Greater && self.adjacent(1) {
            return (OperatorPrecedence::Shift, 2);
        }
        (binary_operator_precedence(self.current()), 1)
    }

    fn unary_expression(&mut self) {
        if !self.enter() {
            return;
        }
        match self.current() {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Not
            | TokenKind::Tilde
            | TokenKind::Star
            | TokenKind::Amp
            | TokenKind::AmpAmp
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => {
                self.bump();
                self.unary_expression();
            }
            TokenKind::Sizeof => {
                self.bump();
                self.eat(TokenKind::Ellipsis);
                if self.at(TokenKind::LeftParen) && self.parenthesized_type_ahead() {
                    self.bump();
                    self.type_id_clause();
                    self.expect(TokenKind::RightParen, ")");
                } else {
                    self.unary_expression();
                }
            }
            TokenKind::ColonColon if matches!(self.peek(2), TokenKind::New | TokenKind::Delete) => {
                self.bump();
                self.unary_expression();
            }
            TokenKind::New => self.new_expression(),
            TokenKind::Delete => {
                self.bump();
                if self.at(TokenKind::LeftBracket) {
                    self.bump();
                    self.expect(TokenKind::RightBracket, "]");
                }
                self.unary_expression();
            }
            TokenKind::LeftParen if self.cast_ahead() => {
                self.bump();
                self.type_id_clause();
                self.expect(TokenKind::RightParen, ")");
                self.unary_expression();
            }
            _ => self.postfix_expression(),
        }
        self.leave();
    }

    fn new_expression(&mut self) {
        self.bump();
        if self.at(TokenKind::LeftParen) && !self.parenthesized_type_ahead() {
            // Placement arguments.
            self.argument_list();
        }
        if self.at(TokenKind::LeftParen) {
            self.bump();
            self.type_id_clause();
            self.expect(TokenKind::RightParen, ")");
        } else {
            self.new_type_id();
        }
        match self.current() {
            TokenKind::LeftParen => self.argument_list(),
            TokenKind::LeftBrace => self.braced_init_list(),
            _ => {}
        }
    }

    fn postfix_expression(&mut self) {
        self.primary_expression();
        loop {
            match self.current() {
                TokenKind::LeftParen => self.argument_list(),
                TokenKind::LeftBracket => {
                    self.bump();
                    self.paren_depth += 1;
                    self.comma_expression();
                    self.paren_depth -= 1;
                    self.expect(TokenKind::RightBracket, "]");
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    // Members are not resolved.
                    self.bump();
                    self.eat(TokenKind::Template);
                    self.eat(TokenKind::Tilde);
                    match self.current() {
                        TokenKind::Identifier => {
                            self.bump();
                            if self.at(TokenKind::Less) && self.member_template_ahead() {
                                self.skip_balanced(TokenKind::Less, TokenKind::Greater);
                            }
                        }
                        TokenKind::Operator => {
                            self.bump();
                            if matches!(self.current(), TokenKind::LeftParen | TokenKind::LeftBracket) {
                                self.bump();
                            }
                            self.bump();
                        }
                        _ => {
                            self.error_at_current(&messages::IDENTIFIER_EXPECTED, &[]);
                            return;
                        }
                    }
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    self.bump();
                }
                _ => return,
            }
        }
    }

    fn primary_expression(&mut self) {
        match self.current() {
            TokenKind::StringLiteral => {
                while self.at(TokenKind::StringLiteral) {
                    self.bump();
                }
            }
            kind if kind.is_literal() => {
                self.bump();
            }
            TokenKind::This => {
                self.bump();
            }
            TokenKind::Identifier if self.named_cast_ahead() => {
                self.bump();
                let open = self.bump();
                self.open_template_list(open);
                self.type_id_clause();
                self.close_template_list();
                if self.at(TokenKind::LeftParen) {
                    self.argument_list();
                } else {
                    self.error_at_current(&messages::_0_EXPECTED, &["("]);
                }
            }
            TokenKind::Typename => {
                self.bump();
                self.id_expression();
            }
            TokenKind::Identifier | TokenKind::ColonColon | TokenKind::Operator => self.id_expression(),
            kind if kind.is_builtin_type() => {
                // Functional cast: `int(x)`, `unsigned long{}`.
                while self.current().is_builtin_type() {
                    self.bump();
                }
                match self.current() {
                    TokenKind::LeftParen => self.argument_list(),
                    TokenKind::LeftBrace => self.braced_init_list(),
                    _ => self.error_at_current(&messages::_0_EXPECTED, &["("]),
                }
            }
            TokenKind::LeftParen => self.parenthesized_expression(),
            TokenKind::LeftBrace => self.braced_init_list(),
            TokenKind::LeftBracket => self.lambda_expression(),
            _ => self.error_at_current(&messages::EXPRESSION_EXPECTED, &[]),
        }
    }

    fn id_expression(&mut self) {
        let start = self.token();
        if self.action(|s| s.id_expression(start)) {
            self.name_parts(NameContext::Expression);
            let end = self.previous();
            self.action(|s| s.end_id_expression(end));
        }
    }

    fn parenthesized_expression(&mut self) {
        let open = self.bump();
        let opened = self.action(|s| s.expression(open));
        self.paren_depth += 1;
        self.comma_expression();
        self.paren_depth -= 1;
        let close = self.expect(TokenKind::RightParen, ")").unwrap_or_else(|| self.previous());
        if opened {
            self.action(|s| s.end_expression(close));
        }
    }

    /// `( arguments )` of a call, a functional cast or a member initializer.
    pub(super) fn argument_list(&mut self) {
        self.bump();
        self.paren_depth += 1;
        while !self.at(TokenKind::RightParen) && !self.at(TokenKind::EndOfFile) {
            let before = self.cursor.index();
            if self.at(TokenKind::LeftBrace) {
                self.braced_init_list();
            } else {
                self.assignment_expression();
            }
            self.eat(TokenKind::Ellipsis);
            if self.cursor.index() == before || self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.paren_depth -= 1;
        self.expect(TokenKind::RightParen, ")");
    }

    /// `{ a, b, .x = c }`
    pub(super) fn braced_init_list(&mut self) {
        if !self.enter() {
            return;
        }
        self.bump();
        self.paren_depth += 1;
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::EndOfFile) {
            let before = self.cursor.index();
            if self.at(TokenKind::Dot) && self.peek(2) == TokenKind::Identifier {
                self.bump();
                self.bump();
                self.eat(TokenKind::Assign);
            }
            if self.at(TokenKind::LeftBrace) {
                self.braced_init_list();
            } else {
                self.assignment_expression();
            }
            self.eat(TokenKind::Ellipsis);
            if self.cursor.index() == before || self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.paren_depth -= 1;
        self.expect(TokenKind::RightBrace, "}");
        self.leave();
    }

    /// Lambdas are skipped whole; their bodies declare nothing visible.
    fn lambda_expression(&mut self) {
        self.skip_balanced(TokenKind::LeftBracket, TokenKind::RightBracket);
        if self.at(TokenKind::LeftParen) {
            self.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen);
        }
        while self.at(TokenKind::Mutable) || self.at(TokenKind::Constexpr) || self.at_word("noexcept") {
            self.bump();
        }
        if self.eat(TokenKind::Arrow).is_some() {
            self.new_type_id();
        }
        if self.at(TokenKind::LeftBrace) {
            self.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace);
        } else {
            self.error_at_current(&messages::_0_EXPECTED, &["{"]);
        }
    }

    // ========================================================================
    // Disambiguation
    // ========================================================================

    /// `static_cast<`, `dynamic_cast<`, `const_cast<`, `reinterpret_cast<`.
    fn named_cast_ahead(&self) -> bool {
        self.peek(2) == TokenKind::Less
            && ["static_cast", "dynamic_cast", "const_cast", "reinterpret_cast"]
                .iter()
                .any(|word| self.at_word(word))
    }

    /// `x.f<int>()`: the angle group is followed by a call.
    fn member_template_ahead(&self) -> bool {
        crate::predicates::skip_angles_ahead(&self.cursor, 1).is_some_and(|next| self.peek(next) == TokenKind::LeftParen)
    }

    /// Whether the `(` at the cursor encloses a type id, as in `sizeof(T)`
    /// or `new (T)`.
    fn parenthesized_type_ahead(&mut self) -> bool {
        let next = self.peek(2);
        if next.is_builtin_type() {
            return self.peek(3) != TokenKind::LeftParen;
        }
        if next.is_cv_qualifier() || next.is_class_key() || matches!(next, TokenKind::Enum | TokenKind::Typename) {
            return true;
        }
        if !matches!(next, TokenKind::Identifier | TokenKind::ColonColon) {
            return false;
        }
        let Some(n) = self.name_length(2) else {
            return false;
        };
        let mut i = 2 + n;
        while matches!(self.peek(i), TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp | TokenKind::Const) {
            i += 1;
        }
        if self.peek(i) != TokenKind::RightParen {
            return false;
        }
        if i > 2 + n {
            return true;
        }
        let mark = self.cursor.mark();
        self.cursor.consume();
        let known = self.session.starts_type_name(&mut self.cursor);
        self.cursor.rewind(mark);
        known
    }

    /// A C-style cast: a parenthesized type followed by an operand. An
    /// unknown name in parentheses casts only when an operand that cannot
    /// continue a binary expression follows.
    fn cast_ahead(&mut self) -> bool {
        if !self.parenthesized_type_ahead() {
            let next = self.peek(2);
            if !matches!(next, TokenKind::Identifier | TokenKind::ColonColon) {
                return false;
            }
            let Some(n) = self.name_length(2) else {
                return false;
            };
            return self.peek(2 + n) == TokenKind::RightParen
                && matches!(
                    self.peek(3 + n),
                    TokenKind::Identifier
                        | TokenKind::IntLiteral
                        | TokenKind::FloatLiteral
                        | TokenKind::CharLiteral
                        | TokenKind::StringLiteral
                        | TokenKind::This
                        | TokenKind::True
                        | TokenKind::False
                        | TokenKind::Nullptr
                );
        }
        !matches!(
            self.peek(self.closing_paren_ahead() + 1),
            TokenKind::Semicolon
                | TokenKind::Comma
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::EndOfFile
        )
    }

    /// Lookahead index of the `)` matching the `(` at the cursor.
    fn closing_paren_ahead(&self) -> usize {
        let mut depth = 0usize;
        let mut i = 1;
        loop {
            match self.peek(i) {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                TokenKind::EndOfFile => return i,
                _ => {}
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::session::ParseSession;
    use cxxm_core::intern::StringInterner;
    use cxxm_model::{Declaration, Variable};
    use cxxm_options::ParserOptions;

    fn variable(source: &str) -> (ParseSession, Option<Variable>) {
        let mut session = ParseSession::new(ParserOptions::default(), StringInterner::new());
        session.parse_source("expr.cpp", source);
        let variable = session
            .store()
            .file(session.current_file())
            .and_then(|file| {
                file.declarations.iter().rev().find_map(|d| match d {
                    Declaration::Variable(v) => Some(v.clone()),
                    _ => None,
                })
            });
        (session, variable)
    }

    #[test]
    fn test_initializer_references() {
        let (session, variable) = variable("int a = 1; int b = 2; int c = (a + b) * sizeof(int) ? a : -b;");
        assert!(session.recognition_errors().is_empty(), "{:?}", session.recognition_errors());
        let initializer = variable.and_then(|v| v.initializer).expect("initializer");
        assert!(initializer.references_name("a").is_some());
        assert!(initializer.references_name("b").is_some());
    }

    #[test]
    fn test_casts_and_calls() {
        let (session, variable) = variable(
            "double d = 2.0; long x = static_cast<long>(d) + (long) d + compute(d, {1, 2}, new int[4]);",
        );
        assert!(session.recognition_errors().is_empty(), "{:?}", session.recognition_errors());
        let initializer = variable.and_then(|v| v.initializer).expect("initializer");
        assert!(initializer.references_name("compute").is_some());
    }

    #[test]
    fn test_shift_inside_parentheses_of_template_argument() {
        let (session, _) = variable("Bits<(1 >> 2)> bits; int y = 8 >> 1;");
        assert!(session.recognition_errors().is_empty(), "{:?}", session.recognition_errors());
        assert_eq!(session.builder_depth(), 0);
    }

    #[test]
    fn test_missing_operand_is_reported() {
        let (session, _) = variable("int x = ;");
        assert_eq!(session.recognition_errors().len(), 1);
        assert!(session.recognition_errors()[0].message.contains("Expression expected"));
    }
}
