//! Qualified names, operator function ids and template argument lists.

use super::Grammar;
use crate::builders::NamePart;
use crate::predicates::{skip_angles_ahead, IdentifierKind};
use crate::utilities::render_tokens;
use cxxm_diagnostics::messages;
use cxxm_lexer::TokenKind;

/// Where a name is parsed; decides whether `<` opens template arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum NameContext {
    /// Type names, base classes, using targets: `<` always opens.
    Type,
    /// Declarator ids: `<` opens, `X<int>::f`.
    Declarator,
    /// Identifiers in expressions: `<` opens only after a known template.
    Expression,
}

impl Grammar<'_> {
    /// Report the parts of a name to the name builder on top:
    /// `[::] [~]id [<args>] (:: [~]id [<args>])*`.
    pub(super) fn name_parts(&mut self, context: NameContext) {
        if self.at(TokenKind::ColonColon) {
            let token = self.bump();
            self.action(|s| s.name_part(NamePart::Global, token));
        }
        loop {
            self.eat(TokenKind::Template);
            if self.at(TokenKind::Tilde) {
                let token = self.bump();
                self.action(|s| s.name_part(NamePart::Tilde, token));
            }
            match self.current() {
                TokenKind::Identifier => {
                    let token = self.bump();
                    self.action(|s| s.name_part(NamePart::Identifier, token));
                    if self.at(TokenKind::Less) && self.opens_template_arguments(context, token) {
                        self.template_argument_list();
                    }
                }
                TokenKind::Operator => {
                    self.operator_function_id();
                    return;
                }
                _ => {
                    self.error_at_current(&messages::IDENTIFIER_EXPECTED, &[]);
                    return;
                }
            }
            let continues = matches!(
                self.peek(2),
                TokenKind::Identifier | TokenKind::Tilde | TokenKind::Operator | TokenKind::Template
            );
            if !self.at(TokenKind::ColonColon) || !continues {
                return;
            }
            let token = self.bump();
            self.action(|s| s.name_part(NamePart::Scope, token));
        }
    }

    fn opens_template_arguments(&mut self, context: NameContext, name: cxxm_lexer::Token) -> bool {
        match context {
            NameContext::Type | NameContext::Declarator => true,
            NameContext::Expression => {
                self.session.identifier_is(IdentifierKind::Template, name, &mut self.cursor)
                    || skip_angles_ahead(&self.cursor, 1)
                        .is_some_and(|next| matches!(self.peek(next), TokenKind::LeftParen | TokenKind::ColonColon))
            }
        }
    }

    /// `operator` followed by an operator symbol or a conversion type.
    fn operator_function_id(&mut self) {
        let keyword = self.bump();
        let mut last = keyword;
        let symbol = match self.current() {
            TokenKind::LeftParen | TokenKind::LeftBracket => {
                let open = self.bump();
                last = self.eat(closing(open.kind)).unwrap_or(open);
                let symbol = if open.kind == TokenKind::LeftParen { "()" } else { "[]" };
                symbol.to_string()
            }
            TokenKind::New | TokenKind::Delete => {
                last = self.bump();
                let mut symbol = format!(" {}", self.text(last));
                if self.at(TokenKind::LeftBracket) && self.peek(2) == TokenKind::RightBracket {
                    self.bump();
                    last = self.bump();
                    symbol.push_str("[]");
                }
                symbol
            }
            TokenKind::Greater if self.peek(2) == TokenKind::Greater && self.adjacent(1) => {
                self.bump();
                last = self.bump();
                ">>".to_string()
            }
            kind if is_overloadable(kind) => {
                last = self.bump();
                self.text(last).to_string()
            }
            _ => {
                // Conversion function: `operator const char*`.
                let start = self.cursor.index();
                while self.current().is_builtin_type()
                    || self.current().is_cv_qualifier()
                    || matches!(
                        self.current(),
                        TokenKind::Identifier | TokenKind::ColonColon | TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp
                    )
                {
                    last = self.bump();
                }
                if self.cursor.index() == start {
                    self.error_at_current(&messages::_0_EXPECTED, &["operator"]);
                }
                let tokens = self.cursor.tokens_between(start, self.cursor.index());
                format!(" {}", render_tokens(tokens, self.session.interner()))
            }
        };
        self.action(|s| s.operator_function_id(last, &symbol));
    }

    /// `< argument (, argument)* >`. Each argument is reported as written to
    /// the builder on top.
    pub(super) fn template_argument_list(&mut self) {
        let open = self.bump();
        self.open_template_list(open);
        while !self.closes_template_list() && !self.at(TokenKind::EndOfFile) {
            let start = self.cursor.index();
            if self.starts_type_id() {
                self.type_id_clause();
            } else {
                self.expression_root(false);
            }
            if self.cursor.index() == start {
                break;
            }
            let text = render_tokens(
                self.cursor.tokens_between(start, self.cursor.index()),
                self.session.interner(),
            );
            self.action(|s| s.template_argument(&text));
            self.eat(TokenKind::Ellipsis);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.close_template_list();
    }

    /// Whether a template argument at the cursor is a type rather than an
    /// expression. Unknown names followed by the end of the argument are
    /// taken as types.
    fn starts_type_id(&mut self) -> bool {
        let kind = self.current();
        if kind.is_builtin_type()
            || kind.is_cv_qualifier()
            || kind.is_class_key()
            || matches!(kind, TokenKind::Enum | TokenKind::Typename)
        {
            return !(kind.is_builtin_type() && self.peek(2) == TokenKind::LeftParen);
        }
        if !matches!(kind, TokenKind::Identifier | TokenKind::ColonColon) {
            return false;
        }
        if self.session.starts_type_name(&mut self.cursor) {
            return true;
        }
        match self.name_length(1) {
            Some(n) => matches!(
                self.peek(n + 1),
                TokenKind::Comma | TokenKind::Greater | TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp
            ),
            None => false,
        }
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    /// Number of tokens of the name starting at lookahead `from`:
    /// `[::] id [<...>] (:: id [<...>])*`. `None` when no name starts there.
    pub(super) fn name_length(&self, from: usize) -> Option<usize> {
        let mut i = from;
        if self.peek(i) == TokenKind::ColonColon {
            i += 1;
        }
        loop {
            if self.peek(i) == TokenKind::Template {
                i += 1;
            }
            if self.peek(i) != TokenKind::Identifier {
                return None;
            }
            i += 1;
            if self.peek(i) == TokenKind::Less {
                match skip_angles_ahead(&self.cursor, i) {
                    Some(next) => i = next,
                    None => return Some(i - from),
                }
            }
            if self.peek(i) == TokenKind::ColonColon && matches!(self.peek(i + 1), TokenKind::Identifier | TokenKind::Template) {
                i += 1;
                continue;
            }
            return Some(i - from);
        }
    }

    /// Lookahead tokens `i` and `i + 1` touch, as in a `>>` split in two.
    pub(super) fn adjacent(&self, i: usize) -> bool {
        self.cursor.lt(i).end == self.cursor.lt(i + 1).offset
    }
}

fn closing(open: TokenKind) -> TokenKind {
    match open {
        TokenKind::LeftParen => TokenKind::RightParen,
        _ => TokenKind::RightBracket,
    }
}

fn is_overloadable(kind: TokenKind) -> bool {
    use TokenKind::*;
    kind.is_assignment_operator()
        || matches!(
            kind,
            Plus | Minus
                | Star
                | Slash
                | Percent
                | Caret
                | Amp
                | Bar
                | Tilde
                | Not
                | Less
                | Greater
                | LessEqual
                | GreaterEqual
                | LessLess
                | EqualEqual
                | NotEqual
                | AmpAmp
                | BarBar
                | PlusPlus
                | MinusMinus
                | Comma
                | Arrow
        )
}

#[cfg(test)]
mod tests {
    use crate::builders::Builder;
    use crate::cursor::TokenCursor;
    use crate::grammar::Grammar;
    use crate::session::ParseSession;
    use cxxm_core::intern::StringInterner;
    use cxxm_lexer::Scanner;
    use cxxm_options::ParserOptions;

    fn with_grammar<T>(source: &str, f: impl FnOnce(&mut Grammar<'_>) -> T) -> T {
        let interner = StringInterner::new();
        let scan = Scanner::new(source, interner.clone()).tokenize();
        let cursor = TokenCursor::from_tokens(scan.tokens, &interner);
        let mut session = ParseSession::new(ParserOptions::default(), interner);
        let mut grammar = Grammar::new(&mut session, cursor);
        f(&mut grammar)
    }

    #[test]
    fn test_name_length() {
        with_grammar("std::vector<std::pair<int, int>> v;", |g| {
            assert_eq!(g.name_length(1), Some(13));
        });
        with_grammar("::A::B c", |g| assert_eq!(g.name_length(1), Some(4)));
        with_grammar("( x", |g| assert_eq!(g.name_length(1), None));
    }

    #[test]
    fn test_operator_names() {
        for (source, expected) in [
            ("operator==", "operator=="),
            ("operator()", "operator()"),
            ("operator new[]", "operator new[]"),
            ("operator const char*", "operator const char*"),
        ] {
            let name = with_grammar(source, |g| {
                let token = g.token();
                g.action(|s| s.id_expression(token));
                g.name_parts(super::NameContext::Declarator);
                match g.session.builders.top() {
                    Some(Builder::Name(name)) => name.name.display(g.session.interner()),
                    _ => String::new(),
                }
            });
            assert_eq!(name, expected);
        }
    }

    #[test]
    fn test_template_arguments_are_rendered() {
        let arguments = with_grammar("vector<const char*, 3 + 1> x", |g| {
            let token = g.token();
            g.action(|s| s.id_expression(token));
            g.name_parts(super::NameContext::Type);
            match g.session.builders.top() {
                Some(Builder::Name(name)) => name.name.arguments.clone(),
                _ => Vec::new(),
            }
        });
        assert_eq!(arguments, vec!["const char*".to_string(), "3+1".to_string()]);
    }
}
