//! Simple declarations: specifiers, types, names, declarators, parameters,
//! function definitions and template headers.

use crate::builders::*;
use crate::error::{ActionFault, RecognitionError, RecognitionFault};
use crate::session::ParseSession;
use cxxm_core::text::TextSpan;
use cxxm_lexer::Token;
use cxxm_model::{
    DeclKind, DeclRef, Declaration, ForwardClass, Friend, FunctionKind, TemplateParameter, Typedef,
    Variable,
};
use cxxm_symtab::{EntryFlags, ScopeId, SymTabError};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvQualifier {
    Const,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtrOperator {
    Pointer,
    Reference,
    RvalueReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterListPart {
    Open,
    Close,
    /// `const` after the parameter list.
    Const,
    Ellipsis,
}

/// What ends one init-declarator of a simple declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationDelimiter {
    Comma,
    Semicolon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// `template <`
    Template,
    /// The empty parameter list of `template<>`.
    Specialization,
    /// `template` without a parameter list.
    Instantiation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParameterKind {
    Class,
    Typename,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateArgumentList {
    Open,
    Close,
}

impl ParseSession {
    // ========================================================================
    // Simple declarations
    // ========================================================================

    /// Enter a simple declaration, taking over a pending template header.
    pub fn simple_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let mut decl = SimpleDeclarationBuilder::new(token.offset);
            decl.template = s.take_template();
            s.builders.push(Builder::SimpleDeclaration(decl));
            Ok(())
        })
    }

    /// End of one init-declarator: classify what it declared and hand the
    /// result to the enclosing container.
    pub fn simple_declaration_delimiter(
        &mut self,
        delimiter: DeclarationDelimiter,
        token: Token,
    ) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            trace!(?delimiter, "declaration delimiter");
            s.classify_declaration(token)
        })
    }

    pub fn end_simple_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let decl = s.builders.pop_simple_declaration()?;
            s.pop_scopes(&decl.pushed_scopes)
        })
    }

    fn classify_declaration(&mut self, token: Token) -> Result<(), ActionFault> {
        let in_class = self.builders.kind_at(1) == Some(BuilderKind::Class);
        let decl = self.builders.simple_declaration_mut()?;
        let declarator = decl.declarator.take();
        let first = decl.declarators == 0;
        decl.declarators += 1;
        let decl = self.builders.simple_declaration()?.clone();
        match declarator {
            Some(declarator) => {
                let start = if first { decl.start } else { declarator.start };
                let span = TextSpan::from_bounds(start, token.end);
                let Some(name) = declarator.name.clone() else {
                    return Ok(());
                };
                if decl.specs.has(Specifiers::TYPEDEF) {
                    self.declare_typedef(&decl, &declarator, name, span)
                } else if declarator.is_function() {
                    self.declare_function(&decl, &declarator, name, span, in_class)
                } else {
                    self.declare_variable(&decl, declarator, name, span)
                }
            }
            None => self.declare_without_declarator(&decl, token, in_class),
        }
    }

    fn declare_typedef(
        &mut self,
        decl: &SimpleDeclarationBuilder,
        declarator: &DeclaratorBuilder,
        name: QualifiedName,
        span: TextSpan,
    ) -> Result<(), ActionFault> {
        let last = name.last().ok_or(ActionFault::Incomplete("typedef"))?;
        let declaration = Declaration::Typedef(Typedef {
            name: name.simple_name(&self.interner),
            span,
            ty: decl.specs.resolved_type(Some(declarator)).unwrap_or_default(),
        });
        let entry = self.declare(last, EntryFlags::IS_TYPE);
        let file = self.current_file();
        self.define(entry, declaration.decl_ref(file));
        self.attach_declaration(declaration);
        Ok(())
    }

    fn declare_function(
        &mut self,
        decl: &SimpleDeclarationBuilder,
        declarator: &DeclaratorBuilder,
        name: QualifiedName,
        span: TextSpan,
        in_class: bool,
    ) -> Result<(), ActionFault> {
        let kind = self.classify_function(&name, &decl.specs, in_class);
        let function = self
            .function_builder(decl, declarator, &name, kind, span.start)
            .create(span.end());
        let declaration = Declaration::Function(function);
        if is_plain_function(kind) && !name.is_qualified() {
            if let Some(last) = name.last() {
                let flags = template_flags(decl.template.is_some());
                let entry = self.declare(last, flags);
                let file = self.current_file();
                self.define(entry, declaration.decl_ref(file));
            }
        }
        if kind == FunctionKind::Friend {
            if let (Some(Builder::Class(class)), Declaration::Function(function)) =
                (self.builders.top_n_mut(1), declaration)
            {
                class.friends.push(Friend::Function(function));
            }
            return Ok(());
        }
        self.attach_declaration(declaration);
        Ok(())
    }

    fn declare_variable(
        &mut self,
        decl: &SimpleDeclarationBuilder,
        declarator: DeclaratorBuilder,
        name: QualifiedName,
        span: TextSpan,
    ) -> Result<(), ActionFault> {
        let ty = decl.specs.resolved_type(Some(&declarator)).unwrap_or_default();
        let declaration = Declaration::Variable(Variable {
            name: name.display(&self.interner),
            span,
            ty,
            is_static: decl.specs.has(Specifiers::STATIC),
            is_extern: decl.specs.has(Specifiers::EXTERN),
            initializer: declarator.initializer,
            bit_width: declarator.bit_width,
            template: decl.template.clone(),
        });
        if !name.is_qualified() {
            if let Some(last) = name.last() {
                let entry = self.declare(last, template_flags(decl.template.is_some()));
                let file = self.current_file();
                self.define(entry, declaration.decl_ref(file));
            }
        }
        self.attach_declaration(declaration);
        Ok(())
    }

    /// `class X;`, `friend class X;` and plain `int;`.
    fn declare_without_declarator(
        &mut self,
        decl: &SimpleDeclarationBuilder,
        token: Token,
        in_class: bool,
    ) -> Result<(), ActionFault> {
        let specs = &decl.specs;
        let span = TextSpan::from_bounds(decl.start, token.end);
        if specs.has(Specifiers::FRIEND) && in_class {
            let name = specs.ty.as_ref().map(|ty| ty.name.clone()).unwrap_or_default();
            if let Some(Builder::Class(class)) = self.builders.top_n_mut(1) {
                class.friends.push(Friend::Class { name, span });
            }
            return Ok(());
        }
        if specs.defines_type {
            return Ok(());
        }
        let Some(TypeKey::Class(class_kind)) = specs.elaborated else {
            return Ok(());
        };
        let name = specs
            .ty
            .as_ref()
            .map(|ty| ty.name.clone())
            .filter(|name| !name.is_empty())
            .ok_or(ActionFault::Incomplete("forward declaration"))?;
        let declaration = Declaration::ForwardClass(ForwardClass {
            class_kind,
            name: name.clone(),
            span,
            template: decl.template.clone(),
        });
        if !name.contains("::") {
            let name = self.interner.intern(&name);
            let flags = EntryFlags::IS_TYPE | template_flags(decl.template.is_some());
            self.declare(name, flags);
        }
        self.attach_declaration(declaration);
        Ok(())
    }

    fn classify_function(&self, name: &QualifiedName, specs: &DeclSpecs, in_class: bool) -> FunctionKind {
        if in_class && specs.has(Specifiers::FRIEND) {
            return FunctionKind::Friend;
        }
        if let Some(kind) = self.special_member_kind(name, in_class) {
            return kind;
        }
        if in_class || name.is_qualified() {
            FunctionKind::Method
        } else {
            FunctionKind::Function
        }
    }

    /// Constructor or destructor: `~X`, `X` inside class `X`, or `X::X`.
    pub(crate) fn special_member_kind(&self, name: &QualifiedName, in_class: bool) -> Option<FunctionKind> {
        let last = name.last()?;
        if name.destructor {
            return Some(FunctionKind::Destructor);
        }
        let owner = if name.is_qualified() {
            name.qualifiers().last().copied()
        } else if in_class {
            self.enclosing_class_name()
        } else {
            None
        };
        (owner == Some(last)).then_some(FunctionKind::Constructor)
    }

    fn function_builder(
        &self,
        decl: &SimpleDeclarationBuilder,
        declarator: &DeclaratorBuilder,
        name: &QualifiedName,
        kind: FunctionKind,
        start: cxxm_core::text::TextPos,
    ) -> FunctionBuilder {
        let specs = &decl.specs;
        let mut function = FunctionBuilder::new(start, kind, name.display(&self.interner));
        if !matches!(kind, FunctionKind::Constructor | FunctionKind::Destructor) {
            function.return_type = specs.resolved_type(Some(declarator));
        }
        function.parameters = declarator.parameters.clone().unwrap_or_default();
        function.template = decl.template.clone();
        function.is_static = specs.has(Specifiers::STATIC);
        function.is_const = declarator.is_const;
        function.is_virtual = specs.has(Specifiers::VIRTUAL);
        function.is_inline = specs.has(Specifiers::INLINE);
        function
    }

    /// Pop qualifier scopes pushed for declarator ids, innermost first.
    pub(crate) fn pop_scopes(&mut self, scopes: &[ScopeId]) -> Result<(), ActionFault> {
        for &scope in scopes.iter().rev() {
            match self.symtab.scope(scope).name {
                Some(name) => self.symtab.pop_named(name)?,
                None => self.symtab.pop()?,
            };
        }
        Ok(())
    }

    // ========================================================================
    // Declaration specifiers and types
    // ========================================================================

    pub fn decl_specifiers(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.specs_mut()?.in_decl_specifiers = true;
            Ok(())
        })
    }

    pub fn end_decl_specifiers(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.specs_mut()?.in_decl_specifiers = false;
            Ok(())
        })
    }

    /// A specifier keyword (`typedef`, `static`, `friend`, ...).
    pub fn decl_specifier(&mut self, specifier: Specifiers, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.specs_mut()?.specifiers |= specifier;
            Ok(())
        })
    }

    /// `const` / `volatile` inside a type or a specifier sequence. A
    /// qualifier after a pointer operator qualifies the pointer and is not
    /// recorded.
    pub fn cv_qualifier(&mut self, qualifier: CvQualifier, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match s.builders.kind_at(0) {
                Some(BuilderKind::Type) => {
                    let ty = s.builders.type_mut()?;
                    match qualifier {
                        CvQualifier::Const => ty.is_const = true,
                        CvQualifier::Volatile => ty.is_volatile = true,
                    }
                }
                Some(BuilderKind::SimpleDeclaration | BuilderKind::Parameter) => {
                    s.specs_mut()?.specifiers |= match qualifier {
                        CvQualifier::Const => Specifiers::CONST,
                        CvQualifier::Volatile => Specifiers::VOLATILE,
                    };
                }
                _ => {}
            }
            Ok(())
        })
    }

    pub fn type_specifier(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.push(Builder::Type(TypeBuilder::new(token.offset)));
            Ok(())
        })
    }

    /// A builtin type keyword.
    pub fn simple_type_specifier(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let word = s.interner.resolve(token.text).to_string();
            s.builders.type_mut()?.words.push(word);
            Ok(())
        })
    }

    pub fn elaborated_type_specifier(&mut self, key: TypeKey, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.type_mut()?.elaborated = Some(key);
            Ok(())
        })
    }

    pub fn end_type_specifier(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let ty = s.builders.pop_type()?;
            let elaborated = ty.elaborated;
            let ty = ty.create(&s.interner);
            match s.builders.decl_specs_mut() {
                Some(specs) => {
                    specs.ty = Some(ty);
                    specs.has_type_specifier = true;
                    specs.elaborated = elaborated.or(specs.elaborated);
                }
                None => trace!(ty = %ty, "type specifier outside a declaration"),
            }
            Ok(())
        })
    }

    /// A type-id: alias targets, casts, `sizeof`, template arguments.
    pub fn type_id(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.push(Builder::Type(TypeBuilder::new(token.offset)));
            Ok(())
        })
    }

    pub fn end_type_id(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let ty = s.builders.pop_type()?.create(&s.interner);
            if let Some(Builder::Using(using)) = s.builders.top_mut() {
                using.ty = Some(ty);
            }
            Ok(())
        })
    }

    fn specs_mut(&mut self) -> Result<&mut DeclSpecs, ActionFault> {
        let found = self.builders.top().map(Builder::kind);
        self.builders
            .decl_specs_mut()
            .ok_or(ActionFault::unexpected(BuilderKind::SimpleDeclaration, found))
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// A nested-name used as a type, a base class or a using target.
    pub fn nested_name(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.push(Builder::Name(NameBuilder::new(token.offset)));
            Ok(())
        })
    }

    pub fn end_nested_name(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let name = s.builders.pop_name()?.create();
            match s.builders.top_mut() {
                Some(Builder::Type(ty)) => ty.name = Some(name),
                Some(Builder::Using(using)) => using.name = Some(name),
                Some(Builder::Inheritance(base)) => base.name = Some(name),
                _ => trace!("nested name without a consumer"),
            }
            Ok(())
        })
    }

    pub fn name_part(&mut self, part: NamePart, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.name_mut()?.add_part(part, &token);
            Ok(())
        })
    }

    /// `operator ==` and friends; `symbol` is the operator as written.
    pub fn operator_function_id(&mut self, token: Token, symbol: &str) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let id = s.interner.intern(&format!("operator{symbol}"));
            let name = s.builders.name_mut()?;
            name.add_identifier(id);
            name.name.end = token.end;
            Ok(())
        })
    }

    pub fn template_arguments(&mut self, list: TemplateArgumentList, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.template_depth = match list {
                TemplateArgumentList::Open => s.template_depth + 1,
                TemplateArgumentList::Close => s.template_depth.saturating_sub(1),
            };
            Ok(())
        })
    }

    /// One template argument as written. Goes to the name being built, or
    /// to the class whose head is being specialized.
    pub fn template_argument(&mut self, text: &str) -> Result<(), RecognitionError> {
        self.dispatch_unlocated(|s| {
            match s.builders.top_mut() {
                Some(Builder::Name(name)) => name.name.arguments.push(text.to_string()),
                Some(Builder::Class(class)) => class.specialization.push(text.to_string()),
                _ => {}
            }
            Ok(())
        })
    }

    // ========================================================================
    // Declarators
    // ========================================================================

    /// Enter a declarator. A parenthesized declarator nests in the current
    /// one instead of pushing a new builder.
    pub fn declarator(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match s.builders.top_mut() {
                Some(Builder::Declarator(declarator)) => declarator.level += 1,
                _ => s
                    .builders
                    .push(Builder::Declarator(DeclaratorBuilder::new(token.offset))),
            }
            Ok(())
        })
    }

    pub fn ptr_operator(&mut self, op: PtrOperator, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match s.builders.top_mut() {
                Some(Builder::Declarator(declarator)) => {
                    match op {
                        PtrOperator::Pointer => {
                            declarator.pointer_depth = declarator.pointer_depth.saturating_add(1);
                            if declarator.level > 0 {
                                declarator.nested_pointer = true;
                            }
                        }
                        PtrOperator::Reference => declarator.reference = true,
                        PtrOperator::RvalueReference => declarator.rvalue_reference = true,
                    }
                    Ok(())
                }
                Some(Builder::Type(ty)) => {
                    match op {
                        PtrOperator::Pointer => ty.pointer_depth = ty.pointer_depth.saturating_add(1),
                        PtrOperator::Reference => ty.reference = true,
                        PtrOperator::RvalueReference => ty.rvalue_reference = true,
                    }
                    Ok(())
                }
                _ => Err(RecognitionFault::UnexpectedPtrOperator.into()),
            }
        })
    }

    pub fn declarator_id(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.declarator()?;
            s.builders.push(Builder::Name(NameBuilder::new(token.offset)));
            Ok(())
        })
    }

    /// Finish the declarator id. The scopes named by its qualifiers are
    /// activated so the rest of the declaration sees class members.
    pub fn end_declarator_id(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let name = s.builders.pop_name()?.create();
            s.builders.declarator()?;
            let mut pushed = Vec::new();
            if name.is_qualified() {
                let parts = name.lookup_parts(&s.interner);
                let first = if name.global { 2 } else { 1 };
                for end in first..parts.len() {
                    let Some(entry) = s.symtab.lookup_qualified(&parts[..end]) else {
                        break;
                    };
                    let Some(scope) = s.symtab.entry(entry).nested_scope else {
                        break;
                    };
                    s.symtab.push_scope(scope);
                    pushed.push(scope);
                }
            }
            let declarator = s.builders.declarator_mut()?;
            declarator.name = Some(name);
            declarator.pushed_scopes.extend(pushed);
            Ok(())
        })
    }

    pub fn parameters_and_qualifiers(&mut self, part: ParameterListPart, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match part {
                ParameterListPart::Open => {
                    s.builders.declarator()?;
                    s.builders
                        .push(Builder::ParameterList(ParameterListBuilder::default()));
                }
                ParameterListPart::Close => {
                    let list = s.builders.pop_parameter_list()?;
                    let declarator = s.builders.declarator_mut()?;
                    if declarator.parameters.is_none() {
                        declarator.parameters = Some(list.parameters);
                    }
                }
                ParameterListPart::Const => s.builders.declarator_mut()?.is_const = true,
                ParameterListPart::Ellipsis => s.builders.parameter_list_mut()?.add_ellipsis(),
            }
            Ok(())
        })
    }

    /// `[` of an array declarator; the bound expression is not kept.
    pub fn array_declarator(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.declarator_mut()?.slot = DeclaratorSlot::ArrayBound;
            Ok(())
        })
    }

    /// `=` or `(` / `{` starting the initializer of the last declarator.
    pub fn initializer(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            if let Some(Builder::SimpleDeclaration(decl)) = s.builders.top_mut() {
                if let Some(declarator) = decl.declarator.as_mut() {
                    declarator.slot = DeclaratorSlot::Initializer;
                }
            }
            Ok(())
        })
    }

    /// `:` of a bit-field member.
    pub fn member_bitfield_declarator(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let decl = s.builders.simple_declaration_mut()?;
            if let Some(declarator) = decl.declarator.as_mut() {
                declarator.slot = DeclaratorSlot::BitWidth;
            }
            Ok(())
        })
    }

    /// Finish a declarator and hand it to its declaration or parameter.
    pub fn end_declarator(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            if let Some(Builder::Declarator(declarator)) = s.builders.top_mut() {
                if declarator.level > 0 {
                    declarator.level -= 1;
                    return Ok(());
                }
            }
            let declarator = s.builders.pop_declarator()?;
            match s.builders.kind_at(0) {
                Some(BuilderKind::SimpleDeclaration) => {
                    let in_class = s.builders.kind_at(1) == Some(BuilderKind::Class);
                    if s.builders.simple_declaration()?.template.is_some() {
                        s.declare_template_name(&declarator, in_class)?;
                    }
                    let decl = s.builders.simple_declaration_mut()?;
                    decl.pushed_scopes.extend_from_slice(&declarator.pushed_scopes);
                    decl.declarator = Some(declarator);
                }
                Some(BuilderKind::Parameter) => {
                    s.pop_scopes(&declarator.pushed_scopes)?;
                    s.builders.parameter_mut()?.declarator = Some(declarator);
                }
                _ => s.pop_scopes(&declarator.pushed_scopes)?,
            }
            Ok(())
        })
    }

    /// A templated declarator enters its name as a template. Constructors
    /// and destructors are exempt; a nameless declarator is malformed.
    fn declare_template_name(&mut self, declarator: &DeclaratorBuilder, in_class: bool) -> Result<(), ActionFault> {
        let name = declarator
            .name
            .as_ref()
            .filter(|name| !name.is_empty())
            .ok_or(RecognitionFault::EmptyDeclaratorName)?;
        if self.special_member_kind(name, in_class).is_some() || name.is_qualified() {
            return Ok(());
        }
        if let Some(last) = name.last() {
            self.declare(last, EntryFlags::IS_TEMPLATE);
        }
        Ok(())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    pub fn parameter_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders
                .push(Builder::Parameter(ParameterBuilder::new(token.offset)));
            Ok(())
        })
    }

    /// Finish a parameter: a function parameter, or a non-type template
    /// parameter whose name goes into the template parameter scope.
    pub fn end_parameter_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let parameter = s.builders.pop_parameter()?;
            let name = parameter
                .declarator
                .as_ref()
                .and_then(|d| d.name.as_ref())
                .and_then(QualifiedName::last);
            let parameter = parameter.create(&s.interner);
            match s.builders.top_mut() {
                Some(Builder::ParameterList(list)) => list.parameters.push(parameter),
                Some(Builder::TemplateDescriptor(template)) => {
                    template.parameters.push(TemplateParameter::NonType {
                        name: parameter.name,
                        ty: parameter.ty,
                    });
                    if let Some(name) = name {
                        s.symtab.enter_local(name);
                    }
                }
                _ => trace!("parameter outside a parameter list"),
            }
            Ok(())
        })
    }

    // ========================================================================
    // Function definitions
    // ========================================================================

    /// The declarator just finished starts a function definition.
    pub fn function_definition_after_declarator(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let in_class = s.builders.kind_at(1) == Some(BuilderKind::Class);
            let decl = s.builders.simple_declaration()?.clone();
            let declarator = decl
                .declarator
                .as_ref()
                .filter(|d| d.is_function())
                .ok_or(RecognitionFault::UnclassifiedFunctionBody)?;
            let name = declarator
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .ok_or(RecognitionFault::EmptyFunctionName)?;
            let kind = s.classify_function(&name, &decl.specs, in_class);
            let mut function = s.function_builder(&decl, declarator, &name, kind, decl.start);
            function.is_inline |= in_class;
            if is_plain_function(kind) && !name.is_qualified() {
                if let Some(last) = name.last() {
                    let entry = s.declare(last, template_flags(decl.template.is_some()));
                    let definition = DeclRef {
                        file: s.current_file(),
                        offset: function.start,
                        kind: DeclKind::Function,
                        name: function.name.clone(),
                    };
                    s.define(entry, definition);
                }
            }
            debug!(name = %function.name, kind = ?kind, "function definition");
            s.builders.push(Builder::Function(function));
            Ok(())
        })
    }

    /// Whether the body about to be parsed belongs to a member function
    /// defined inside its class and should wait for the class to close.
    pub fn should_defer_body(&self) -> bool {
        self.options.defer_member_bodies
            && self.builders.kind_at(0) == Some(BuilderKind::Function)
            && self.builders.kind_at(1) == Some(BuilderKind::SimpleDeclaration)
            && self.builders.kind_at(2) == Some(BuilderKind::Class)
    }

    /// Queue the captured body tokens (ctor-initializer included) on the
    /// enclosing class, remembering where the member goes.
    pub fn defer_function_body(&mut self, tokens: Vec<Token>) -> Result<(), RecognitionError> {
        self.dispatch_unlocated(|s| {
            if s.builders.kind_at(2) != Some(BuilderKind::Class) {
                return Err(ActionFault::unexpected(BuilderKind::Class, s.builders.kind_at(2)));
            }
            let function = s.builders.pop_function()?;
            if let Some(Builder::Class(class)) = s.builders.top_n_mut(1) {
                let slot = match function.kind {
                    FunctionKind::Friend => MemberSlot::Friend {
                        index: class.friends.len(),
                    },
                    _ => MemberSlot::Member {
                        index: class.members.len(),
                        visibility: class.visibility,
                    },
                };
                trace!(name = %function.name, tokens = tokens.len(), "defer body");
                class.deferred.push(DeferredBody { slot, function, tokens });
            }
            Ok(())
        })
    }

    /// `}` closing a function body parsed in place. A deferred body left a
    /// simple declaration on top and there is nothing to do.
    pub fn end_function_definition_after_declarator(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match s.builders.kind_at(0) {
                Some(BuilderKind::Function) => {}
                Some(BuilderKind::SimpleDeclaration) => return Ok(()),
                _ => return Err(RecognitionFault::UnclassifiedFunctionBody.into()),
            }
            let function = s.builders.pop_function()?.create(token.end);
            if function.function_kind == FunctionKind::Friend {
                if let Some(Builder::Class(class)) = s.builders.top_n_mut(1) {
                    class.friends.push(Friend::Function(function));
                    return Ok(());
                }
            }
            s.attach_declaration(Declaration::Function(function));
            Ok(())
        })
    }

    pub fn ctor_initializer(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| s.builders.function().map(|_| ()))
    }

    /// One `member(args)` of a ctor-initializer; the member name and the
    /// arguments are reported as an expression.
    pub fn mem_initializer(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.function()?;
            s.builders
                .push(Builder::Expression(ExpressionBuilder::new(token.offset)));
            Ok(())
        })
    }

    pub fn end_mem_initializer(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let expression = s.builders.pop_expression()?.create(token.end);
            s.builders.function_mut()?.initializers.push(expression);
            Ok(())
        })
    }

    // ========================================================================
    // Templates
    // ========================================================================

    pub fn template_declaration(&mut self, kind: TemplateKind, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            match kind {
                TemplateKind::Template => {
                    let scope = s.symtab.push();
                    s.template_frames.push(Some(scope));
                    s.builders
                        .push(Builder::TemplateDescriptor(TemplateDescriptorBuilder {
                            start: token.offset,
                            scope: Some(scope),
                            ..Default::default()
                        }));
                }
                TemplateKind::Specialization => {
                    s.builders.template_descriptor_mut()?.specialization = true;
                }
                TemplateKind::Instantiation => {
                    s.template_frames.push(None);
                    s.builders
                        .push(Builder::TemplateDescriptor(TemplateDescriptorBuilder {
                            start: token.offset,
                            instantiation: true,
                            ..Default::default()
                        }));
                }
            }
            Ok(())
        })
    }

    /// `class T`, `typename T` or `template<...> class T`. The name is a
    /// type inside the template.
    pub fn type_parameter(
        &mut self,
        kind: TypeParameterKind,
        token: Token,
        name: Option<Token>,
    ) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let text = name.map(|n| s.interner.resolve(n.text).to_string());
            let template = s.builders.template_descriptor_mut()?;
            template.parameters.push(match kind {
                TypeParameterKind::Class | TypeParameterKind::Typename => TemplateParameter::Type { name: text },
                TypeParameterKind::Template => TemplateParameter::Template { name: text },
            });
            if let Some(name) = name {
                let entry = s.symtab.enter_local(name.text);
                let flags = match kind {
                    TypeParameterKind::Template => EntryFlags::IS_TYPE | EntryFlags::IS_TEMPLATE,
                    _ => EntryFlags::IS_TYPE,
                };
                s.symtab.entry_mut(entry).flags |= flags;
            }
            Ok(())
        })
    }

    /// End of the templated declaration: leave the parameter scope.
    pub fn end_template_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            if s.builders.kind_at(0) == Some(BuilderKind::TemplateDescriptor) {
                s.builders.pop_template_descriptor()?;
            }
            if let Some(Some(scope)) = s.template_frames.pop() {
                let current = s.symtab.current();
                if current != scope {
                    let found = s
                        .symtab
                        .scope(current)
                        .name
                        .map(|n| s.interner.resolve(n).to_string())
                        .unwrap_or_else(|| "<anonymous>".to_string());
                    return Err(SymTabError::ScopeMismatch {
                        expected: "<template parameters>".to_string(),
                        found,
                    }
                    .into());
                }
                s.symtab.pop()?;
            }
            Ok(())
        })
    }
}

fn is_plain_function(kind: FunctionKind) -> bool {
    matches!(kind, FunctionKind::Function | FunctionKind::Method)
}

fn template_flags(templated: bool) -> EntryFlags {
    if templated {
        EntryFlags::IS_TEMPLATE
    } else {
        EntryFlags::empty()
    }
}
