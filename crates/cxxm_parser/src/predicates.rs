//! Semantic predicates consulted by the grammar to disambiguate.
//!
//! Predicates may look ahead and may activate scopes to resolve qualified
//! names, but every scan runs under a [`SpeculativeScan`] guard that
//! restores the cursor position and the scope stack when dropped, whatever
//! path the scan leaves by.

use crate::builders::Builder;
use crate::cursor::TokenCursor;
use crate::session::ParseSession;
use cxxm_core::intern::InternedString;
use cxxm_lexer::{Token, TokenKind};
use cxxm_symtab::{ScopeId, SymTabStack};

/// Which attribute [`ParseSession::identifier_is`] checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Type,
    Template,
}

/// Restores the cursor and the scope stack on drop.
struct SpeculativeScan<'a> {
    symtab: &'a mut SymTabStack,
    cursor: &'a mut TokenCursor,
    mark: usize,
    pushed: usize,
}

impl<'a> SpeculativeScan<'a> {
    fn new(symtab: &'a mut SymTabStack, cursor: &'a mut TokenCursor) -> Self {
        let mark = cursor.mark();
        Self {
            symtab,
            cursor,
            mark,
            pushed: 0,
        }
    }

    fn push_scope(&mut self, scope: ScopeId) {
        self.symtab.push_scope(scope);
        self.pushed += 1;
    }

    /// Skip a balanced `<...>` at the cursor. Gives up at tokens that
    /// cannot appear inside template arguments.
    fn skip_template_arguments(&mut self) -> bool {
        let mut depth = 0usize;
        loop {
            match self.cursor.la(1) {
                TokenKind::Less => depth += 1,
                TokenKind::Greater => {
                    depth -= 1;
                    if depth == 0 {
                        self.cursor.consume();
                        return true;
                    }
                }
                TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace | TokenKind::EndOfFile => {
                    return false
                }
                _ => {}
            }
            self.cursor.consume();
        }
    }

    /// Whether the tokens at the cursor spell a (possibly qualified) type
    /// name known to the symbol table.
    fn type_name(&mut self) -> bool {
        if self.cursor.la(1) == TokenKind::ColonColon {
            self.cursor.consume();
            let global = self.symtab.global();
            self.push_scope(global);
        }
        loop {
            let token = self.cursor.lt(1);
            if token.kind != TokenKind::Identifier {
                return false;
            }
            let Some(entry) = self.symtab.lookup(token.text) else {
                return false;
            };
            let entry = self.symtab.entry(entry);
            let (is_type, nested) = (entry.is_type(), entry.nested_scope);
            if !is_type {
                return false;
            }
            self.cursor.consume();
            if self.cursor.la(1) == TokenKind::Less && !self.skip_template_arguments() {
                return false;
            }
            if self.cursor.la(1) != TokenKind::ColonColon {
                return true;
            }
            // A qualified name continues inside the scope just named.
            let Some(scope) = nested else {
                return false;
            };
            self.cursor.consume();
            self.push_scope(scope);
        }
    }
}

impl Drop for SpeculativeScan<'_> {
    fn drop(&mut self) {
        for _ in 0..self.pushed {
            if self.symtab.pop().is_err() {
                break;
            }
        }
        self.cursor.rewind(self.mark);
    }
}

impl ParseSession {
    /// Whether the next tokens start a type specifier of the declaration
    /// being built. A declaration that already has its type, or a typedef
    /// outside its specifier sequence, takes no second one; a typedef
    /// inside its specifier sequence must be naming a type.
    pub fn type_specifier_already_present(&mut self, cursor: &mut TokenCursor) -> bool {
        if let Some(specs) = self.builders.decl_specs() {
            if specs.has_type_specifier {
                return false;
            }
            if specs.has(crate::builders::Specifiers::TYPEDEF) {
                return specs.in_decl_specifiers;
            }
        }
        self.starts_type_name(cursor)
    }

    /// Whether the tokens at the cursor spell a known type name, judged by
    /// the symbol table alone. The scopes of a name being built are visible
    /// during the scan.
    pub fn starts_type_name(&mut self, cursor: &mut TokenCursor) -> bool {
        let prefix = self.name_prefix_scopes();
        let mut scan = SpeculativeScan::new(&mut self.symtab, cursor);
        for scope in prefix {
            scan.push_scope(scope);
        }
        scan.type_name()
    }

    /// Whether `token` names a type or a template where it stands.
    pub fn identifier_is(&mut self, kind: IdentifierKind, token: Token, cursor: &mut TokenCursor) -> bool {
        let prefix = self.name_prefix_scopes();
        let mut scan = SpeculativeScan::new(&mut self.symtab, cursor);
        for scope in prefix {
            scan.push_scope(scope);
        }
        let Some(entry) = scan.symtab.lookup(token.text) else {
            return false;
        };
        let entry = scan.symtab.entry(entry);
        match kind {
            IdentifierKind::Type => entry.is_type(),
            IdentifierKind::Template => entry.is_template(),
        }
    }

    /// Whether a `>` met now may close a template argument list rather than
    /// compare.
    pub fn top_level_of_template_arguments(&self) -> bool {
        self.template_depth != 0
    }

    /// Whether the tokens at the cursor name a constructor or destructor
    /// followed by its parameter list: `~X(`, `X::X(`, `X<T>::~X(`, or `X(`
    /// inside class `X`. Such a name is a declarator, never a type.
    pub fn starts_special_member(&self, cursor: &TokenCursor) -> bool {
        let mut i = 1;
        if cursor.la(i) == TokenKind::ColonColon {
            i += 1;
        }
        let mut previous: Option<InternedString> = None;
        loop {
            let tilde = cursor.la(i) == TokenKind::Tilde;
            if tilde {
                i += 1;
            }
            let token = cursor.lt(i);
            if token.kind != TokenKind::Identifier {
                return false;
            }
            i += 1;
            if cursor.la(i) == TokenKind::Less {
                match skip_angles_ahead(cursor, i) {
                    Some(next) => i = next,
                    None => return false,
                }
            }
            if cursor.la(i) == TokenKind::ColonColon {
                if tilde {
                    return false;
                }
                previous = Some(token.text);
                i += 1;
                continue;
            }
            if cursor.la(i) != TokenKind::LeftParen {
                return false;
            }
            if tilde {
                return true;
            }
            return match previous {
                Some(owner) => owner == token.text,
                None => {
                    self.builders.kind_at(1) == Some(crate::builders::BuilderKind::Class)
                        && self.enclosing_class_name() == Some(token.text)
                }
            };
        }
    }

    pub fn is_type(&self, name: InternedString) -> bool {
        self.symtab.is_type(name)
    }

    /// Scopes named by the qualifiers already collected in the name on top
    /// of the builder stack (`A::B::` in `A::B::c`).
    fn name_prefix_scopes(&self) -> Vec<ScopeId> {
        let Some(Builder::Name(name)) = self.builders.top() else {
            return Vec::new();
        };
        let parts = name.name.lookup_parts(&self.interner);
        match self.symtab.lookup_qualified(&parts) {
            Some(entry) if !name.name.is_empty() => self.symtab.entry(entry).nested_scope.into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// Index just past a balanced `<...>` starting at lookahead `i`, or `None`
/// when a token that cannot appear in template arguments comes first.
/// Angles inside parentheses are operators.
pub(crate) fn skip_angles_ahead(cursor: &TokenCursor, mut i: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut parens = 0usize;
    loop {
        match cursor.la(i) {
            TokenKind::LeftParen => parens += 1,
            TokenKind::RightParen => parens = parens.checked_sub(1)?,
            TokenKind::Less if parens == 0 => depth += 1,
            TokenKind::Greater if parens == 0 => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace | TokenKind::EndOfFile => return None,
            _ => {}
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxm_core::intern::StringInterner;
    use cxxm_lexer::Scanner;
    use cxxm_options::ParserOptions;

    fn session_and_cursor(text: &str) -> (ParseSession, TokenCursor) {
        let interner = StringInterner::new();
        let scan = Scanner::new(text, interner.clone()).tokenize();
        let cursor = TokenCursor::from_tokens(scan.tokens, &interner);
        (ParseSession::new(ParserOptions::default(), interner), cursor)
    }

    #[test]
    fn test_std_seed_qualified_name_needs_known_member() {
        let (mut session, mut cursor) = session_and_cursor("std::vector<int> v;");
        assert!(!session.starts_type_name(&mut cursor));
        assert_eq!(cursor.index(), 0);
        assert_eq!(session.symtab().depth(), 1);
    }

    #[test]
    fn test_known_type_is_recognized_and_scan_is_undone() {
        let (mut session, mut cursor) = session_and_cursor("std x;");
        assert!(session.starts_type_name(&mut cursor));
        assert_eq!(cursor.index(), 0);
        assert_eq!(session.symtab().depth(), 1);
    }

    #[test]
    fn test_unknown_identifier_is_not_a_type() {
        let (mut session, mut cursor) = session_and_cursor("foo x;");
        assert!(!session.starts_type_name(&mut cursor));
        let token = cursor.lt(1);
        assert!(!session.identifier_is(IdentifierKind::Type, token, &mut cursor));
        assert!(!session.top_level_of_template_arguments());
    }

    #[test]
    fn test_special_member_names() {
        let (session, cursor) = session_and_cursor("A::A(int a);");
        assert!(session.starts_special_member(&cursor));
        let (session, cursor) = session_and_cursor("~A();");
        assert!(session.starts_special_member(&cursor));
        let (session, cursor) = session_and_cursor("B<T>::~B() {}");
        assert!(session.starts_special_member(&cursor));
        let (session, cursor) = session_and_cursor("A::f(int a);");
        assert!(!session.starts_special_member(&cursor));
        let (session, cursor) = session_and_cursor("A(3);");
        assert!(!session.starts_special_member(&cursor));
    }
}
