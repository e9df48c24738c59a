//! Declarations: namespaces, using, templates, simple declarations with
//! their specifiers and declarators, class and enum specifiers, and
//! function definitions.

use super::names::NameContext;
use super::{Context, Grammar};
use crate::action::{
    BaseModifier, CvQualifier, DeclarationDelimiter, ParameterListPart, PtrOperator, TemplateKind,
    TypeParameterKind,
};
use crate::builders::TypeKey;
use crate::predicates::skip_angles_ahead;
use crate::utilities::{class_kind_for, is_statement_keyword, specifier_for, visibility_for};
use cxxm_diagnostics::messages;
use cxxm_lexer::{Token, TokenKind};
use cxxm_model::ClassKind;

impl Grammar<'_> {
    // ========================================================================
    // Declaration dispatch
    // ========================================================================

    pub(super) fn declaration(&mut self, context: Context) {
        if !self.enter() {
            return;
        }
        match self.current() {
            TokenKind::Semicolon => {
                self.bump();
            }
            TokenKind::Namespace => {
                if self.peek(2) == TokenKind::Identifier && self.peek(3) == TokenKind::Assign {
                    self.namespace_alias_definition();
                } else {
                    self.namespace_definition();
                }
            }
            TokenKind::Inline if self.peek(2) == TokenKind::Namespace => {
                self.bump();
                self.namespace_definition();
            }
            TokenKind::Using => self.using_declaration(),
            TokenKind::Template => self.template_declaration(context),
            TokenKind::Extern if self.peek(2) == TokenKind::StringLiteral => self.linkage_specification(context),
            TokenKind::Identifier if self.at_word("static_assert") => {
                self.bump();
                self.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen);
                self.expect(TokenKind::Semicolon, ";");
            }
            kind if context == Context::Namespace && (is_statement_keyword(kind) || kind == TokenKind::LeftBrace) => {
                self.statement();
            }
            _ => self.simple_declaration(context),
        }
        self.leave();
    }

    /// Declarations up to a closing brace.
    fn declaration_sequence(&mut self, context: Context) {
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::EndOfFile) {
            let before = self.cursor.index();
            self.declaration(context);
            self.recover(before);
        }
    }

    fn linkage_specification(&mut self, context: Context) {
        self.bump();
        self.bump();
        if self.eat(TokenKind::LeftBrace).is_some() {
            self.declaration_sequence(context);
            self.expect(TokenKind::RightBrace, "}");
        } else {
            self.declaration(context);
        }
    }

    // ========================================================================
    // Namespaces and using
    // ========================================================================

    fn namespace_definition(&mut self) {
        let keyword = self.bump();
        if !self.action(|s| s.namespace_declaration(keyword)) {
            return;
        }
        if self.at(TokenKind::Identifier) {
            let name = self.bump();
            self.action(|s| s.namespace_name(name));
        }
        if let Some(open) = self.expect(TokenKind::LeftBrace, "{") {
            let opened = self.action(|s| s.namespace_body(open));
            self.declaration_sequence(Context::Namespace);
            let close = self.expect(TokenKind::RightBrace, "}").unwrap_or_else(|| self.previous());
            if opened {
                self.action(|s| s.end_namespace_body(close));
            }
        }
        let end = self.previous();
        self.action(|s| s.end_namespace_declaration(end));
    }

    fn namespace_alias_definition(&mut self) {
        let keyword = self.bump();
        let alias = self.bump();
        self.bump();
        if self.action(|s| s.namespace_alias_definition(keyword, alias)) {
            self.nested_name();
            let end = self.expect_semicolon();
            self.action(|s| s.end_namespace_alias_definition(end));
        }
    }

    /// `using namespace N;`, `using alias = type;` or `using N::name;`.
    fn using_declaration(&mut self) {
        let keyword = self.bump();
        if self.eat(TokenKind::Namespace).is_some() {
            if self.action(|s| s.using_directive(keyword)) {
                self.nested_name();
                let end = self.expect_semicolon();
                self.action(|s| s.end_using_directive(end));
            }
        } else if self.at(TokenKind::Identifier) && self.peek(2) == TokenKind::Assign {
            let alias = self.bump();
            self.bump();
            if self.action(|s| s.alias_declaration(keyword, alias)) {
                self.type_id_clause();
                let end = self.expect_semicolon();
                self.action(|s| s.end_alias_declaration(end));
            }
        } else {
            self.eat(TokenKind::Typename);
            if self.action(|s| s.using_declaration(keyword)) {
                self.nested_name();
                let end = self.expect_semicolon();
                self.action(|s| s.end_using_declaration(end));
            }
        }
    }

    /// A name delivered to the builder on top: a type, a base, a using
    /// target.
    pub(super) fn nested_name(&mut self) {
        let start = self.token();
        if self.action(|s| s.nested_name(start)) {
            self.name_parts(NameContext::Type);
            let end = self.previous();
            self.action(|s| s.end_nested_name(end));
        }
    }

    // ========================================================================
    // Templates
    // ========================================================================

    fn template_declaration(&mut self, context: Context) {
        let keyword = self.bump();
        if !self.at(TokenKind::Less) {
            if self.action(|s| s.template_declaration(TemplateKind::Instantiation, keyword)) {
                self.declaration(context);
                let end = self.previous();
                self.action(|s| s.end_template_declaration(end));
            }
            return;
        }
        let open = self.bump();
        if !self.action(|s| s.template_declaration(TemplateKind::Template, keyword)) {
            return;
        }
        if self.at(TokenKind::Greater) {
            let close = self.bump();
            self.action(|s| s.template_declaration(TemplateKind::Specialization, close));
        } else {
            self.template_parameter_list(open);
        }
        self.declaration(context);
        let end = self.previous();
        self.action(|s| s.end_template_declaration(end));
    }

    fn template_parameter_list(&mut self, open: Token) {
        self.open_template_list(open);
        loop {
            let before = self.cursor.index();
            match self.current() {
                TokenKind::Class | TokenKind::Typename if !self.typename_starts_value_parameter() => {
                    let keyword = self.bump();
                    let kind = if keyword.kind == TokenKind::Class {
                        TypeParameterKind::Class
                    } else {
                        TypeParameterKind::Typename
                    };
                    self.eat(TokenKind::Ellipsis);
                    let name = self.eat(TokenKind::Identifier);
                    self.action(|s| s.type_parameter(kind, keyword, name));
                    if self.eat(TokenKind::Assign).is_some() {
                        self.type_id_clause();
                    }
                }
                TokenKind::Template => {
                    let keyword = self.bump();
                    if self.at(TokenKind::Less) {
                        self.skip_balanced(TokenKind::Less, TokenKind::Greater);
                    }
                    if matches!(self.current(), TokenKind::Class | TokenKind::Typename) {
                        self.bump();
                    }
                    self.eat(TokenKind::Ellipsis);
                    let name = self.eat(TokenKind::Identifier);
                    self.action(|s| s.type_parameter(TypeParameterKind::Template, keyword, name));
                    if self.eat(TokenKind::Assign).is_some() {
                        self.type_id_clause();
                    }
                }
                _ => self.parameter(),
            }
            if self.cursor.index() == before || self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.close_template_list();
    }

    /// `typename T::type N`: a value parameter of a dependent type.
    fn typename_starts_value_parameter(&self) -> bool {
        self.at(TokenKind::Typename) && self.peek(2) == TokenKind::Identifier && self.peek(3) == TokenKind::ColonColon
    }

    // ========================================================================
    // Simple declarations
    // ========================================================================

    pub(super) fn simple_declaration(&mut self, context: Context) {
        let start = self.token();
        let start_index = self.cursor.index();
        if !self.action(|s| s.simple_declaration(start)) {
            return;
        }
        self.decl_specifier_seq(context);
        if self.at(TokenKind::Semicolon) {
            let end = self.bump();
            self.action(|s| s.simple_declaration_delimiter(DeclarationDelimiter::Semicolon, end));
            self.action(|s| s.end_simple_declaration(end));
            return;
        }
        if self.cursor.index() == start_index && !self.starts_declarator() {
            self.action(|s| s.end_simple_declaration(start));
            return;
        }
        loop {
            self.declarator();
            let definition_context = matches!(context, Context::Namespace | Context::Member);
            if definition_context
                && self.declarator_is_function()
                && matches!(self.current(), TokenKind::LeftBrace | TokenKind::Colon)
            {
                self.function_definition();
                let end = self.previous();
                self.action(|s| s.end_simple_declaration(end));
                return;
            }
            self.init_declarator_tail(context);
            match self.current() {
                TokenKind::Comma => {
                    let token = self.bump();
                    self.action(|s| s.simple_declaration_delimiter(DeclarationDelimiter::Comma, token));
                }
                TokenKind::Semicolon => {
                    let end = self.bump();
                    self.action(|s| s.simple_declaration_delimiter(DeclarationDelimiter::Semicolon, end));
                    self.action(|s| s.end_simple_declaration(end));
                    return;
                }
                TokenKind::Colon if context == Context::ForInit => {
                    let end = self.previous();
                    self.action(|s| s.simple_declaration_delimiter(DeclarationDelimiter::Semicolon, end));
                    self.action(|s| s.end_simple_declaration(end));
                    return;
                }
                _ => {
                    self.error_at_current(&messages::_0_EXPECTED, &[";"]);
                    self.resync = true;
                    let end = self.previous();
                    self.action(|s| s.simple_declaration_delimiter(DeclarationDelimiter::Semicolon, end));
                    self.action(|s| s.end_simple_declaration(end));
                    return;
                }
            }
        }
    }

    fn starts_declarator(&self) -> bool {
        matches!(
            self.current(),
            TokenKind::Identifier
                | TokenKind::ColonColon
                | TokenKind::Tilde
                | TokenKind::Operator
                | TokenKind::Star
                | TokenKind::Amp
                | TokenKind::AmpAmp
                | TokenKind::LeftParen
        )
    }

    /// Initializer, bit-field width or pure/defaulted marker after a
    /// declarator.
    fn init_declarator_tail(&mut self, context: Context) {
        if self.declarator_is_function() {
            // `= 0`, `= default`, `= delete`
            if self.eat(TokenKind::Assign).is_some() && !self.at(TokenKind::Semicolon) {
                self.bump();
            }
            return;
        }
        match self.current() {
            TokenKind::Assign => {
                let token = self.bump();
                self.action(|s| s.initializer(token));
                self.expression_root(false);
            }
            TokenKind::LeftParen | TokenKind::LeftBrace => {
                let token = self.token();
                self.action(|s| s.initializer(token));
                self.expression_root(false);
            }
            TokenKind::Colon if context == Context::Member => {
                let token = self.bump();
                self.action(|s| s.member_bitfield_declarator(token));
                self.expression_root(false);
            }
            _ => {}
        }
    }

    // ========================================================================
    // Declaration specifiers
    // ========================================================================

    pub(super) fn decl_specifier_seq(&mut self, context: Context) {
        let first = self.token();
        self.action(|s| s.decl_specifiers(first));
        loop {
            let kind = self.current();
            if let Some(specifier) = specifier_for(kind) {
                let token = self.bump();
                self.action(|s| s.decl_specifier(specifier, token));
            } else if let Some(qualifier) = cv_qualifier_for(kind) {
                let token = self.bump();
                self.action(|s| s.cv_qualifier(qualifier, token));
            } else if kind.is_builtin_type() {
                self.builtin_type_specifier();
            } else if let Some(class_kind) = class_kind_for(kind) {
                self.class_specifier(class_kind);
            } else if kind == TokenKind::Enum {
                self.enum_specifier();
            } else if kind == TokenKind::Typename {
                self.bump();
                self.named_type_specifier();
            } else if matches!(kind, TokenKind::Identifier | TokenKind::ColonColon) && self.starts_named_type(context) {
                self.named_type_specifier();
            } else {
                break;
            }
        }
        let end = self.previous();
        self.action(|s| s.end_decl_specifiers(end));
    }

    /// Whether the name at the cursor is the type of the declaration being
    /// built rather than its declarator.
    fn starts_named_type(&mut self, context: Context) -> bool {
        if self.has_type_specifier() || self.session.starts_special_member(&self.cursor) {
            return false;
        }
        if self.session.type_specifier_already_present(&mut self.cursor) {
            return true;
        }
        self.unknown_type_ahead(context)
    }

    /// A name the symbol table does not know, in a position where only a
    /// type can stand: `Foo x`, `Foo* p` outside blocks, `(Foo)` as a
    /// parameter.
    pub(super) fn unknown_type_ahead(&self, context: Context) -> bool {
        let Some(n) = self.name_length(1) else {
            return false;
        };
        match self.peek(n + 1) {
            TokenKind::Identifier | TokenKind::Operator => true,
            TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp => match context {
                Context::Block | Context::ForInit => {
                    self.peek(n + 2) == TokenKind::Identifier
                        && matches!(
                            self.peek(n + 3),
                            TokenKind::Assign | TokenKind::Semicolon | TokenKind::Comma | TokenKind::LeftBracket
                        )
                }
                _ => true,
            },
            TokenKind::Comma | TokenKind::RightParen | TokenKind::LeftBracket | TokenKind::Ellipsis => {
                context == Context::Parameter
            }
            _ => false,
        }
    }

    fn builtin_type_specifier(&mut self) {
        let start = self.token();
        if !self.action(|s| s.type_specifier(start)) {
            return;
        }
        while self.current().is_builtin_type() || self.current().is_cv_qualifier() {
            let token = self.bump();
            match cv_qualifier_for(token.kind) {
                Some(qualifier) => self.action(|s| s.cv_qualifier(qualifier, token)),
                None => self.action(|s| s.simple_type_specifier(token)),
            };
        }
        let end = self.previous();
        self.action(|s| s.end_type_specifier(end));
    }

    fn named_type_specifier(&mut self) {
        let start = self.token();
        if !self.action(|s| s.type_specifier(start)) {
            return;
        }
        self.nested_name();
        let end = self.previous();
        self.action(|s| s.end_type_specifier(end));
    }

    /// `class X`, `struct A::B`, `enum E` without a body.
    fn elaborated_type_specifier(&mut self, key: TypeKey) {
        let keyword = self.bump();
        if !self.action(|s| s.type_specifier(keyword)) {
            return;
        }
        self.action(|s| s.elaborated_type_specifier(key, keyword));
        if key == TypeKey::Enum && matches!(self.current(), TokenKind::Class | TokenKind::Struct) {
            self.bump();
        }
        if matches!(self.current(), TokenKind::Identifier | TokenKind::ColonColon) {
            self.nested_name();
        }
        if key == TypeKey::Enum && self.eat(TokenKind::Colon).is_some() {
            self.type_id_clause();
        }
        let end = self.previous();
        self.action(|s| s.end_type_specifier(end));
    }

    // ========================================================================
    // Classes
    // ========================================================================

    fn class_specifier(&mut self, class_kind: ClassKind) {
        if !self.class_definition_ahead() {
            self.elaborated_type_specifier(TypeKey::Class(class_kind));
            return;
        }
        let keyword = self.token();
        if !self.action(|s| s.type_specifier(keyword)) {
            return;
        }
        if self.action(|s| s.class_declaration(keyword)) {
            self.bump();
            self.action(|s| s.class_kind(class_kind, keyword));
            self.class_head_name();
            if self.at_word("final") {
                self.bump();
            }
            if self.at(TokenKind::Colon) {
                self.base_clause();
            }
            if self.at(TokenKind::LeftBrace) {
                self.class_body();
            } else {
                self.error_at_current(&messages::_0_EXPECTED, &["{"]);
            }
            let end = self.previous();
            self.action(|s| s.end_class_declaration(end));
        }
        let end = self.previous();
        self.action(|s| s.end_type_specifier(end));
    }

    /// After the class key: `[name [<args>] [:: name ...]] [final]` followed
    /// by `{` or a base clause.
    fn class_definition_ahead(&self) -> bool {
        let mut i = 2;
        while self.peek(i) == TokenKind::Identifier {
            i += 1;
            if self.peek(i) == TokenKind::Less {
                match skip_angles_ahead(&self.cursor, i) {
                    Some(next) => i = next,
                    None => return false,
                }
            }
            if self.peek(i) != TokenKind::ColonColon {
                break;
            }
            i += 1;
        }
        if self.peek(i) == TokenKind::Identifier && self.text(self.cursor.lt(i)) == "final" {
            i += 1;
        }
        matches!(self.peek(i), TokenKind::LeftBrace | TokenKind::Colon)
    }

    /// The class name is the last part of the head; qualifiers of a nested
    /// class defined out of line are skipped.
    fn class_head_name(&mut self) {
        while self.at(TokenKind::Identifier) {
            let name = self.bump();
            if self.at(TokenKind::Less) {
                let qualified = skip_angles_ahead(&self.cursor, 1).is_some_and(|next| self.peek(next) == TokenKind::ColonColon);
                if qualified {
                    self.skip_balanced(TokenKind::Less, TokenKind::Greater);
                }
            }
            if self.at(TokenKind::ColonColon) {
                self.bump();
                continue;
            }
            self.action(|s| s.class_name(name));
            if self.at(TokenKind::Less) {
                self.template_argument_list();
            }
            return;
        }
    }

    fn base_clause(&mut self) {
        self.bump();
        loop {
            let start = self.token();
            if !self.action(|s| s.base_specifier(start)) {
                break;
            }
            loop {
                let modifier = match self.current() {
                    TokenKind::Virtual => BaseModifier::Virtual,
                    kind => match visibility_for(kind) {
                        Some(visibility) => BaseModifier::Access(visibility),
                        None => break,
                    },
                };
                let token = self.bump();
                self.action(|s| s.base_specifier_modifier(modifier, token));
            }
            self.nested_name();
            self.eat(TokenKind::Ellipsis);
            let end = self.previous();
            self.action(|s| s.end_base_specifier(end));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
    }

    fn class_body(&mut self) {
        let open = self.bump();
        let opened = self.action(|s| s.class_body(open));
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::EndOfFile) {
            if let Some(visibility) = visibility_for(self.current()) {
                if self.peek(2) == TokenKind::Colon {
                    let token = self.bump();
                    self.bump();
                    self.action(|s| s.access_specifier(visibility, token));
                    continue;
                }
            }
            let before = self.cursor.index();
            self.declaration(Context::Member);
            self.recover(before);
        }
        let close = self.expect(TokenKind::RightBrace, "}").unwrap_or_else(|| self.previous());
        if opened {
            self.action(|s| s.end_class_body(close));
        }
    }

    // ========================================================================
    // Enums
    // ========================================================================

    fn enum_specifier(&mut self) {
        if !self.enum_definition_ahead() {
            self.elaborated_type_specifier(TypeKey::Enum);
            return;
        }
        let keyword = self.token();
        if !self.action(|s| s.type_specifier(keyword)) {
            return;
        }
        if self.action(|s| s.enum_declaration(keyword)) {
            self.bump();
            if matches!(self.current(), TokenKind::Class | TokenKind::Struct) {
                let token = self.bump();
                self.action(|s| s.enum_strongly_typed(token));
            }
            if self.at(TokenKind::Identifier) {
                let name = self.bump();
                self.action(|s| s.enum_name(name));
            }
            if self.eat(TokenKind::Colon).is_some() {
                self.type_id_clause();
            }
            if let Some(open) = self.expect(TokenKind::LeftBrace, "{") {
                let opened = self.action(|s| s.enum_body(open));
                while self.at(TokenKind::Identifier) {
                    let name = self.bump();
                    self.action(|s| s.enumerator(name));
                    if self.eat(TokenKind::Assign).is_some() {
                        self.expression_root(false);
                    }
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                let close = self.expect(TokenKind::RightBrace, "}").unwrap_or_else(|| self.previous());
                if opened {
                    self.action(|s| s.end_enum_body(close));
                }
            }
            let end = self.previous();
            self.action(|s| s.end_enum_declaration(end));
        }
        let end = self.previous();
        self.action(|s| s.end_type_specifier(end));
    }

    fn enum_definition_ahead(&self) -> bool {
        let mut i = 2;
        if matches!(self.peek(i), TokenKind::Class | TokenKind::Struct) {
            i += 1;
        }
        if self.peek(i) == TokenKind::Identifier {
            i += 1;
        }
        match self.peek(i) {
            TokenKind::LeftBrace => true,
            TokenKind::Colon => loop {
                i += 1;
                match self.peek(i) {
                    TokenKind::LeftBrace => return true,
                    TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::EndOfFile => return false,
                    _ => {}
                }
            },
            _ => false,
        }
    }

    // ========================================================================
    // Declarators
    // ========================================================================

    pub(super) fn declarator(&mut self) {
        if !self.enter() {
            return;
        }
        let start = self.token();
        if self.action(|s| s.declarator(start)) {
            self.ptr_operators(true);
            if self.at(TokenKind::LeftParen) && self.nested_declarator_ahead() {
                self.bump();
                self.declarator();
                self.expect(TokenKind::RightParen, ")");
            } else if matches!(
                self.current(),
                TokenKind::Identifier | TokenKind::ColonColon | TokenKind::Tilde | TokenKind::Operator
            ) {
                self.declarator_id();
            }
            self.declarator_suffixes();
            let end = self.previous();
            self.action(|s| s.end_declarator(end));
        }
        self.leave();
    }

    /// `*`, `&` and `&&`. Qualifiers after a pointer qualify the pointer.
    fn ptr_operators(&mut self, in_declarator: bool) {
        loop {
            let op = match self.current() {
                TokenKind::Star => PtrOperator::Pointer,
                TokenKind::Amp => PtrOperator::Reference,
                TokenKind::AmpAmp => PtrOperator::RvalueReference,
                _ => return,
            };
            let token = self.bump();
            self.action(|s| s.ptr_operator(op, token));
            while let Some(qualifier) = cv_qualifier_for(self.current()) {
                let token = self.bump();
                if in_declarator {
                    self.action(|s| s.cv_qualifier(qualifier, token));
                }
            }
        }
    }

    /// `(*name)`, `(&name)` or `(name)` followed by a suffix or by the end
    /// of the declarator.
    fn nested_declarator_ahead(&self) -> bool {
        matches!(self.peek(2), TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp)
            || (self.peek(2) == TokenKind::Identifier
                && self.peek(3) == TokenKind::RightParen
                && matches!(
                    self.peek(4),
                    TokenKind::LeftParen
                        | TokenKind::LeftBracket
                        | TokenKind::Semicolon
                        | TokenKind::Assign
                        | TokenKind::Comma
                ))
    }

    fn declarator_id(&mut self) {
        let start = self.token();
        if self.action(|s| s.declarator_id(start)) {
            self.name_parts(NameContext::Declarator);
            let end = self.previous();
            self.action(|s| s.end_declarator_id(end));
        }
    }

    fn declarator_suffixes(&mut self) {
        loop {
            match self.current() {
                TokenKind::LeftParen if self.starts_parameter_clause() => self.parameters_and_qualifiers(),
                TokenKind::LeftBracket => {
                    let open = self.bump();
                    self.action(|s| s.array_declarator(open));
                    if !self.at(TokenKind::RightBracket) {
                        self.paren_depth += 1;
                        self.expression_root(true);
                        self.paren_depth -= 1;
                    }
                    self.expect(TokenKind::RightBracket, "]");
                }
                _ => return,
            }
        }
    }

    /// Whether the `(` at the cursor opens a parameter list rather than a
    /// direct initializer. A lone name the symbol table knows as a value
    /// is an initializer argument.
    fn starts_parameter_clause(&mut self) -> bool {
        let next = self.peek(2);
        if matches!(next, TokenKind::RightParen | TokenKind::Ellipsis | TokenKind::Enum | TokenKind::Typename)
            || next.is_builtin_type()
            || next.is_cv_qualifier()
            || next.is_decl_specifier()
            || next.is_class_key()
        {
            return true;
        }
        if !matches!(next, TokenKind::Identifier | TokenKind::ColonColon) {
            return false;
        }
        let mark = self.cursor.mark();
        self.cursor.consume();
        let known_type = self.session.starts_type_name(&mut self.cursor);
        let unknown_type = !known_type && self.unknown_type_ahead(Context::Parameter);
        self.cursor.rewind(mark);
        if known_type {
            return true;
        }
        let name = self.cursor.lt(2);
        let lone = matches!(self.peek(3), TokenKind::Comma | TokenKind::RightParen);
        let known_value = lone
            && name.kind == TokenKind::Identifier
            && self.session.symtab().lookup(name.text).is_some()
            && !self.session.is_type(name.text);
        unknown_type && !known_value
    }

    fn parameters_and_qualifiers(&mut self) {
        let open = self.bump();
        let opened = self.action(|s| s.parameters_and_qualifiers(ParameterListPart::Open, open));
        self.paren_depth += 1;
        if self.at(TokenKind::Void) && self.peek(2) == TokenKind::RightParen {
            self.bump();
        }
        while !self.at(TokenKind::RightParen) && !self.at(TokenKind::EndOfFile) {
            let before = self.cursor.index();
            if self.at(TokenKind::Ellipsis) {
                let token = self.bump();
                if opened {
                    self.action(|s| s.parameters_and_qualifiers(ParameterListPart::Ellipsis, token));
                }
            } else {
                self.parameter();
            }
            if self.cursor.index() == before || self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.paren_depth -= 1;
        let close = self.expect(TokenKind::RightParen, ")").unwrap_or_else(|| self.previous());
        if opened {
            self.action(|s| s.parameters_and_qualifiers(ParameterListPart::Close, close));
        }
        self.function_qualifiers();
    }

    /// `const`, ref-qualifiers, `override`, `noexcept(...)` and a trailing
    /// return type after a parameter list.
    fn function_qualifiers(&mut self) {
        loop {
            match self.current() {
                TokenKind::Const => {
                    let token = self.bump();
                    self.action(|s| s.parameters_and_qualifiers(ParameterListPart::Const, token));
                }
                TokenKind::Volatile => {
                    self.bump();
                }
                TokenKind::Amp | TokenKind::AmpAmp
                    if matches!(
                        self.peek(2),
                        TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::Assign | TokenKind::Identifier
                    ) =>
                {
                    self.bump();
                }
                TokenKind::Arrow => {
                    self.bump();
                    self.type_id_clause();
                }
                TokenKind::Identifier if self.at_word("override") || self.at_word("final") => {
                    self.bump();
                }
                TokenKind::Identifier if self.at_word("noexcept") || self.at_word("throw") => {
                    self.bump();
                    if self.at(TokenKind::LeftParen) {
                        self.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen);
                    }
                }
                _ => return,
            }
        }
    }

    /// A function parameter or a non-type template parameter.
    fn parameter(&mut self) {
        let start = self.token();
        if !self.action(|s| s.parameter_declaration(start)) {
            return;
        }
        self.decl_specifier_seq(Context::Parameter);
        self.declarator();
        self.eat(TokenKind::Ellipsis);
        if self.eat(TokenKind::Assign).is_some() {
            self.expression_root(false);
        }
        let end = self.previous();
        self.action(|s| s.end_parameter_declaration(end));
    }

    // ========================================================================
    // Type ids
    // ========================================================================

    /// A type without a name: template arguments, casts, alias targets.
    pub(super) fn type_id_clause(&mut self) {
        self.type_id(true);
    }

    /// The type of a `new` expression; a following `(` is its initializer.
    pub(super) fn new_type_id(&mut self) {
        self.type_id(false);
    }

    fn type_id(&mut self, function_types: bool) {
        let start = self.token();
        if !self.action(|s| s.type_id(start)) {
            return;
        }
        let mut named = false;
        loop {
            let kind = self.current();
            if let Some(qualifier) = cv_qualifier_for(kind) {
                let token = self.bump();
                self.action(|s| s.cv_qualifier(qualifier, token));
            } else if kind.is_builtin_type() {
                let token = self.bump();
                self.action(|s| s.simple_type_specifier(token));
                named = true;
            } else if let Some(key) = class_kind_for(kind).map(TypeKey::Class).or((kind == TokenKind::Enum).then_some(TypeKey::Enum)) {
                let token = self.bump();
                self.action(|s| s.elaborated_type_specifier(key, token));
            } else if kind == TokenKind::Typename {
                self.bump();
            } else if !named && matches!(kind, TokenKind::Identifier | TokenKind::ColonColon) {
                self.nested_name();
                named = true;
            } else {
                break;
            }
        }
        self.ptr_operators(false);
        loop {
            match self.current() {
                TokenKind::LeftParen if function_types => self.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen),
                TokenKind::LeftBracket => self.skip_balanced(TokenKind::LeftBracket, TokenKind::RightBracket),
                TokenKind::Ellipsis => {
                    self.bump();
                }
                _ => break,
            }
        }
        let end = self.previous();
        self.action(|s| s.end_type_id(end));
    }

    // ========================================================================
    // Function definitions
    // ========================================================================

    fn function_definition(&mut self) {
        let start = self.token();
        if !self.action(|s| s.function_definition_after_declarator(start)) {
            self.skip_function_body();
            return;
        }
        if self.session.should_defer_body() {
            let from = self.cursor.index();
            self.skip_function_body();
            let tokens = self.cursor.tokens_between(from, self.cursor.index()).to_vec();
            self.action(|s| s.defer_function_body(tokens));
        } else {
            self.function_body();
        }
        let end = self.previous();
        self.action(|s| s.end_function_definition_after_declarator(end));
    }

    /// Skip an optional ctor-initializer and the body block.
    fn skip_function_body(&mut self) {
        if self.eat(TokenKind::Colon).is_some() {
            loop {
                let mut named = false;
                while matches!(self.current(), TokenKind::Identifier | TokenKind::ColonColon | TokenKind::Less) {
                    if self.at(TokenKind::Less) {
                        self.skip_balanced(TokenKind::Less, TokenKind::Greater);
                    } else {
                        self.bump();
                    }
                    named = true;
                }
                if self.at(TokenKind::LeftParen) {
                    self.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen);
                } else if named && self.at(TokenKind::LeftBrace) {
                    self.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace);
                }
                self.eat(TokenKind::Ellipsis);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        if self.at(TokenKind::LeftBrace) {
            self.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace);
        }
    }

    /// Ctor-initializer and body of the function builder on top.
    pub(super) fn function_body(&mut self) {
        if self.at(TokenKind::Colon) {
            self.ctor_initializer();
        }
        if self.at(TokenKind::LeftBrace) {
            self.compound_statement();
        } else {
            self.error_at_current(&messages::_0_EXPECTED, &["{"]);
        }
    }

    fn ctor_initializer(&mut self) {
        let colon = self.bump();
        self.action(|s| s.ctor_initializer(colon));
        while matches!(self.current(), TokenKind::Identifier | TokenKind::ColonColon) {
            let name = self.token();
            if !self.action(|s| s.mem_initializer(name)) {
                break;
            }
            if self.action(|s| s.id_expression(name)) {
                self.name_parts(NameContext::Type);
                let end = self.previous();
                self.action(|s| s.end_id_expression(end));
            }
            match self.current() {
                TokenKind::LeftParen => self.argument_list(),
                TokenKind::LeftBrace => self.braced_init_list(),
                _ => self.error_at_current(&messages::_0_EXPECTED, &["("]),
            }
            self.eat(TokenKind::Ellipsis);
            let end = self.previous();
            self.action(|s| s.end_mem_initializer(end));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
    }
}

fn cv_qualifier_for(kind: TokenKind) -> Option<CvQualifier> {
    match kind {
        TokenKind::Const => Some(CvQualifier::Const),
        TokenKind::Volatile => Some(CvQualifier::Volatile),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::session::ParseSession;
    use cxxm_core::intern::StringInterner;
    use cxxm_model::{Declaration, FileContent, FunctionKind, TemplateParameter};
    use cxxm_options::ParserOptions;

    fn parse(source: &str) -> ParseSession {
        let mut session = ParseSession::new(ParserOptions::default(), StringInterner::new());
        session.parse_source("decl.cpp", source);
        session
    }

    fn file(session: &ParseSession) -> &FileContent {
        session.store().file(session.current_file()).expect("main file")
    }

    #[test]
    fn test_variables_share_specifiers() {
        let session = parse("static const unsigned int a = 1, *b;");
        assert!(session.recognition_errors().is_empty());
        let file = file(&session);
        assert_eq!(file.declarations.len(), 2);
        match &file.declarations[1] {
            Declaration::Variable(variable) => {
                assert_eq!(variable.name, "b");
                assert!(variable.is_static);
            }
            other => panic!("expected a variable, got {other:?}"),
        }
    }

    #[test]
    fn test_function_pointer_is_a_variable() {
        let session = parse("int (*handler)(int, char*);");
        assert!(session.recognition_errors().is_empty());
        assert!(matches!(file(&session).declarations[0], Declaration::Variable(_)));
    }

    #[test]
    fn test_direct_initializer_is_not_a_parameter_list() {
        let session = parse("int x = 1; int y(x); int f(int);");
        let file = file(&session);
        assert!(matches!(file.declarations[1], Declaration::Variable(_)));
        assert!(matches!(file.declarations[2], Declaration::Function(_)));
    }

    #[test]
    fn test_unknown_type_names_are_types() {
        let session = parse("std::string name; Widget* make(Widget& w);");
        assert!(session.recognition_errors().is_empty());
        let file = file(&session);
        assert_eq!(file.declarations.len(), 2);
        match &file.declarations[1] {
            Declaration::Function(function) => {
                assert_eq!(function.name, "make");
                assert_eq!(function.parameters.len(), 1);
            }
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn test_template_function_and_parameters() {
        let session = parse("template <typename T, int N = 4> T pick(T a, T b) { return a; }");
        assert!(session.recognition_errors().is_empty());
        match &file(&session).declarations[0] {
            Declaration::Function(function) => {
                assert_eq!(function.function_kind, FunctionKind::Function);
                let template = function.template.as_ref().expect("template");
                assert_eq!(template.parameters.len(), 2);
                assert!(matches!(template.parameters[1], TemplateParameter::NonType { .. }));
                assert!(function.body.is_some());
            }
            other => panic!("expected a function, got {other:?}"),
        }
        assert_eq!(session.symtab().depth(), 1);
    }

    #[test]
    fn test_extern_c_block() {
        let session = parse("extern \"C\" { int puts(const char* s); }");
        assert!(session.recognition_errors().is_empty());
        assert_eq!(file(&session).declarations.len(), 1);
    }
}
