//! In-progress semantic objects.
//!
//! Each builder accumulates the state of one construct while the grammar is
//! inside it and is finalized with `create`, which yields the immutable
//! value of `cxxm_model`. Builders live on the [`BuilderContext`] stack as
//! variants of the closed [`Builder`] enum.
//!
//! [`BuilderContext`]: crate::context::BuilderContext

use bitflags::bitflags;
use cxxm_core::intern::{InternedString, StringInterner};
use cxxm_core::text::{TextPos, TextSpan};
use cxxm_lexer::Token;
use cxxm_model::{
    BaseSpecifier, Class, ClassKind, Condition, Declaration, DeclRef, Enum, Enumerator, Expression,
    Friend, Function, FunctionKind, Member, NamespaceDefinition, Parameter, Reference, Statement,
    TemplateDescriptor, TemplateParameter, TypeRef, Variable, Visibility,
};
use cxxm_symtab::{EntryId, ScopeId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    Namespace,
    Class,
    Enum,
    Function,
    SimpleDeclaration,
    Parameter,
    ParameterList,
    Declarator,
    Name,
    Type,
    TemplateDescriptor,
    Inheritance,
    Using,
    Expression,
    Statement,
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BuilderKind::Namespace => "namespace",
            BuilderKind::Class => "class",
            BuilderKind::Enum => "enum",
            BuilderKind::Function => "function",
            BuilderKind::SimpleDeclaration => "simple declaration",
            BuilderKind::Parameter => "parameter",
            BuilderKind::ParameterList => "parameter list",
            BuilderKind::Declarator => "declarator",
            BuilderKind::Name => "name",
            BuilderKind::Type => "type",
            BuilderKind::TemplateDescriptor => "template descriptor",
            BuilderKind::Inheritance => "base specifier",
            BuilderKind::Using => "using",
            BuilderKind::Expression => "expression",
            BuilderKind::Statement => "statement",
        };
        f.write_str(text)
    }
}

/// One frame of the builder context stack.
#[derive(Debug, Clone)]
pub enum Builder {
    Namespace(NamespaceBuilder),
    Class(ClassBuilder),
    Enum(EnumBuilder),
    Function(FunctionBuilder),
    SimpleDeclaration(SimpleDeclarationBuilder),
    Parameter(ParameterBuilder),
    ParameterList(ParameterListBuilder),
    Declarator(DeclaratorBuilder),
    Name(NameBuilder),
    Type(TypeBuilder),
    TemplateDescriptor(TemplateDescriptorBuilder),
    Inheritance(InheritanceBuilder),
    Using(UsingBuilder),
    Expression(ExpressionBuilder),
    Statement(StatementBuilder),
}

impl Builder {
    pub fn kind(&self) -> BuilderKind {
        match self {
            Builder::Namespace(_) => BuilderKind::Namespace,
            Builder::Class(_) => BuilderKind::Class,
            Builder::Enum(_) => BuilderKind::Enum,
            Builder::Function(_) => BuilderKind::Function,
            Builder::SimpleDeclaration(_) => BuilderKind::SimpleDeclaration,
            Builder::Parameter(_) => BuilderKind::Parameter,
            Builder::ParameterList(_) => BuilderKind::ParameterList,
            Builder::Declarator(_) => BuilderKind::Declarator,
            Builder::Name(_) => BuilderKind::Name,
            Builder::Type(_) => BuilderKind::Type,
            Builder::TemplateDescriptor(_) => BuilderKind::TemplateDescriptor,
            Builder::Inheritance(_) => BuilderKind::Inheritance,
            Builder::Using(_) => BuilderKind::Using,
            Builder::Expression(_) => BuilderKind::Expression,
            Builder::Statement(_) => BuilderKind::Statement,
        }
    }
}

// ============================================================================
// Names
// ============================================================================

/// A possibly qualified name as written: `::A::B<int>::~C`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualifiedName {
    pub parts: Vec<InternedString>,
    /// Written with a leading `::`.
    pub global: bool,
    /// The last part was preceded by `~`.
    pub destructor: bool,
    /// Template arguments of the last part, as written.
    pub arguments: Vec<String>,
    pub start: TextPos,
    pub end: TextPos,
}

impl QualifiedName {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn last(&self) -> Option<InternedString> {
        self.parts.last().copied()
    }

    /// Every part but the last.
    pub fn qualifiers(&self) -> &[InternedString] {
        match self.parts.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }

    /// The parts for a symbol-table lookup; a leading empty part marks a
    /// global lookup.
    pub fn lookup_parts(&self, interner: &StringInterner) -> Vec<InternedString> {
        let mut parts = Vec::with_capacity(self.parts.len() + 1);
        if self.global {
            parts.push(interner.intern(""));
        }
        parts.extend_from_slice(&self.parts);
        parts
    }

    pub fn display(&self, interner: &StringInterner) -> String {
        let mut text = String::new();
        if self.global {
            text.push_str("::");
        }
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                text.push_str("::");
            }
            if self.destructor && i + 1 == self.parts.len() {
                text.push('~');
            }
            text.push_str(interner.resolve(*part));
        }
        text
    }

    /// The last part as written, `~` included.
    pub fn simple_name(&self, interner: &StringInterner) -> String {
        match self.last() {
            Some(last) if self.destructor => format!("~{}", interner.resolve(last)),
            Some(last) => interner.resolve(last).to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    /// A leading `::`.
    Global,
    Identifier,
    /// `~` before a destructor name.
    Tilde,
    /// A `::` between two parts.
    Scope,
}

#[derive(Debug, Clone)]
pub struct NameBuilder {
    pub name: QualifiedName,
    pending_tilde: bool,
}

impl NameBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            name: QualifiedName {
                start,
                end: start,
                ..Default::default()
            },
            pending_tilde: false,
        }
    }

    pub fn add_part(&mut self, kind: NamePart, token: &Token) {
        match kind {
            NamePart::Global => self.name.global = true,
            NamePart::Tilde => self.pending_tilde = true,
            NamePart::Scope => {
                // Template arguments only stay attached to the last part.
                self.name.arguments.clear();
            }
            NamePart::Identifier => self.add_identifier(token.text),
        }
        self.name.end = token.end;
    }

    pub fn add_identifier(&mut self, text: InternedString) {
        self.name.parts.push(text);
        self.name.destructor = std::mem::take(&mut self.pending_tilde);
    }

    pub fn create(self) -> QualifiedName {
        self.name
    }
}

// ============================================================================
// Types and declaration specifiers
// ============================================================================

bitflags! {
    /// Declaration specifier keywords seen so far.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Specifiers: u16 {
        const TYPEDEF = 1 << 0;
        const FRIEND = 1 << 1;
        const STATIC = 1 << 2;
        const EXTERN = 1 << 3;
        const INLINE = 1 << 4;
        const VIRTUAL = 1 << 5;
        const EXPLICIT = 1 << 6;
        const MUTABLE = 1 << 7;
        const CONSTEXPR = 1 << 8;
        const CONST = 1 << 9;
        const VOLATILE = 1 << 10;
    }
}

/// The keyword of an elaborated type specifier (`class X`, `enum E`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKey {
    Class(ClassKind),
    Enum,
}

#[derive(Debug, Clone, Default)]
pub struct DeclSpecs {
    pub specifiers: Specifiers,
    /// Between `decl_specifiers` and `end_decl_specifiers`.
    pub in_decl_specifiers: bool,
    pub has_type_specifier: bool,
    pub ty: Option<TypeRef>,
    pub elaborated: Option<TypeKey>,
    /// The class or enum defined by the type specifier.
    pub defines_type: bool,
}

impl DeclSpecs {
    pub fn has(&self, specifier: Specifiers) -> bool {
        self.specifiers.contains(specifier)
    }

    /// The declared type: the specifier type with cv-qualifiers from the
    /// specifier sequence and the declarator's pointer operators applied.
    pub fn resolved_type(&self, declarator: Option<&DeclaratorBuilder>) -> Option<TypeRef> {
        let mut ty = self.ty.clone()?;
        ty.is_const |= self.has(Specifiers::CONST);
        ty.is_volatile |= self.has(Specifiers::VOLATILE);
        if let Some(declarator) = declarator {
            ty.pointer_depth = ty.pointer_depth.saturating_add(declarator.pointer_depth);
            ty.reference |= declarator.reference;
            ty.rvalue_reference |= declarator.rvalue_reference;
        }
        Some(ty)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeBuilder {
    pub start: TextPos,
    /// Builtin keywords in order of appearance.
    pub words: Vec<String>,
    pub name: Option<QualifiedName>,
    pub is_const: bool,
    pub is_volatile: bool,
    pub pointer_depth: u8,
    pub reference: bool,
    pub rvalue_reference: bool,
    pub classifier: Option<DeclRef>,
    pub elaborated: Option<TypeKey>,
}

impl TypeBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    pub fn create(self, interner: &StringInterner) -> TypeRef {
        let (name, builtin, arguments) = match self.name {
            Some(name) => (name.display(interner), false, name.arguments),
            None if !self.words.is_empty() => (self.words.join(" "), true, Vec::new()),
            None => (
                self.classifier.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
                false,
                Vec::new(),
            ),
        };
        TypeRef {
            name,
            builtin,
            arguments,
            is_const: self.is_const,
            is_volatile: self.is_volatile,
            pointer_depth: self.pointer_depth,
            reference: self.reference,
            rvalue_reference: self.rvalue_reference,
            classifier: self.classifier,
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// Which expression a declarator is currently waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclaratorSlot {
    #[default]
    None,
    Initializer,
    BitWidth,
    ArrayBound,
}

#[derive(Debug, Clone, Default)]
pub struct DeclaratorBuilder {
    pub start: TextPos,
    pub name: Option<QualifiedName>,
    pub pointer_depth: u8,
    pub reference: bool,
    pub rvalue_reference: bool,
    /// Nesting of parenthesized declarators (`(*fp)`).
    pub level: u32,
    /// A pointer operator appeared inside a parenthesized declarator, so a
    /// following parameter list belongs to a pointer to function.
    pub nested_pointer: bool,
    pub parameters: Option<Vec<Parameter>>,
    pub is_const: bool,
    pub initializer: Option<Expression>,
    pub bit_width: Option<Expression>,
    pub slot: DeclaratorSlot,
    /// Qualifier scopes pushed by the declarator id, outermost first.
    pub pushed_scopes: Vec<ScopeId>,
}

impl DeclaratorBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    pub fn is_function(&self) -> bool {
        self.parameters.is_some() && !self.nested_pointer
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimpleDeclarationBuilder {
    pub start: TextPos,
    pub specs: DeclSpecs,
    pub template: Option<TemplateDescriptor>,
    pub declarator: Option<DeclaratorBuilder>,
    /// Declarators already classified (`int a, b;` has two).
    pub declarators: usize,
    /// Declared in the condition of a selection or iteration statement.
    pub condition: bool,
    /// Qualifier scopes of every declarator, popped in reverse when the
    /// declaration ends.
    pub pushed_scopes: Vec<ScopeId>,
}

impl SimpleDeclarationBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterBuilder {
    pub start: TextPos,
    pub specs: DeclSpecs,
    pub declarator: Option<DeclaratorBuilder>,
    pub default_value: Option<Expression>,
}

impl ParameterBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    pub fn create(self, interner: &StringInterner) -> Parameter {
        let name = self
            .declarator
            .as_ref()
            .and_then(|d| d.name.as_ref())
            .map(|n| n.simple_name(interner));
        let ty = self
            .specs
            .resolved_type(self.declarator.as_ref())
            .unwrap_or_default();
        Parameter {
            name,
            ty,
            default_value: self.default_value,
            ellipsis: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterListBuilder {
    pub parameters: Vec<Parameter>,
}

impl ParameterListBuilder {
    pub fn add_ellipsis(&mut self) {
        self.parameters.push(Parameter {
            name: None,
            ty: TypeRef::default(),
            default_value: None,
            ellipsis: true,
        });
    }
}

#[derive(Debug, Clone)]
pub struct NamespaceBuilder {
    pub start: TextPos,
    /// `None` for an anonymous namespace.
    pub name: Option<InternedString>,
    pub qualified_name: String,
    pub members: Vec<Declaration>,
    pub scope: Option<ScopeId>,
}

impl NamespaceBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            start,
            name: None,
            qualified_name: String::new(),
            members: Vec::new(),
            scope: None,
        }
    }

    pub fn create(self, end: TextPos, interner: &StringInterner) -> NamespaceDefinition {
        NamespaceDefinition {
            name: self.name.map(|n| interner.resolve(n).to_string()).unwrap_or_default(),
            qualified_name: self.qualified_name,
            span: TextSpan::from_bounds(self.start, end),
            members: self.members,
        }
    }
}

/// Where a deferred member function goes once its body is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSlot {
    /// Index into the member list at the time the body was captured.
    Member { index: usize, visibility: Visibility },
    Friend { index: usize },
}

/// A member function whose body is parsed after the class body closes.
#[derive(Debug, Clone)]
pub struct DeferredBody {
    pub slot: MemberSlot,
    pub function: FunctionBuilder,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone)]
pub struct ClassBuilder {
    pub start: TextPos,
    pub class_kind: ClassKind,
    pub name: Option<InternedString>,
    pub entry: Option<EntryId>,
    pub template: Option<TemplateDescriptor>,
    pub specialization: Vec<String>,
    pub bases: Vec<BaseSpecifier>,
    pub base_scopes: Vec<ScopeId>,
    pub visibility: Visibility,
    pub members: Vec<Member>,
    pub friends: Vec<Friend>,
    pub deferred: Vec<DeferredBody>,
}

impl ClassBuilder {
    pub fn new(start: TextPos, template: Option<TemplateDescriptor>) -> Self {
        Self {
            start,
            class_kind: ClassKind::Class,
            name: None,
            entry: None,
            template,
            specialization: Vec::new(),
            bases: Vec::new(),
            base_scopes: Vec::new(),
            visibility: ClassKind::Class.default_visibility(),
            members: Vec::new(),
            friends: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn set_kind(&mut self, kind: ClassKind) {
        self.class_kind = kind;
        self.visibility = kind.default_visibility();
    }

    pub fn add_member(&mut self, declaration: Declaration) {
        self.members.push(Member {
            visibility: self.visibility,
            declaration,
        });
    }

    /// Put finished deferred functions back where their bodies appeared.
    /// `finished` is in capture order.
    pub fn restore_deferred(&mut self, finished: Vec<(MemberSlot, Function)>) {
        for (slot, function) in finished.into_iter().rev() {
            match slot {
                MemberSlot::Member { index, visibility } => {
                    let index = index.min(self.members.len());
                    self.members.insert(
                        index,
                        Member {
                            visibility,
                            declaration: Declaration::Function(function),
                        },
                    );
                }
                MemberSlot::Friend { index } => {
                    let index = index.min(self.friends.len());
                    self.friends.insert(index, Friend::Function(function));
                }
            }
        }
    }

    pub fn create(self, end: TextPos, interner: &StringInterner) -> Class {
        Class {
            class_kind: self.class_kind,
            name: self.name.map(|n| interner.resolve(n).to_string()).unwrap_or_default(),
            span: TextSpan::from_bounds(self.start, end),
            template: self.template,
            specialization: self.specialization,
            bases: self.bases,
            members: self.members,
            friends: self.friends,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumBuilder {
    pub start: TextPos,
    pub name: Option<InternedString>,
    pub entry: Option<EntryId>,
    pub scoped: bool,
    pub scope: Option<ScopeId>,
    pub enumerators: Vec<Enumerator>,
}

impl EnumBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            start,
            name: None,
            entry: None,
            scoped: false,
            scope: None,
            enumerators: Vec::new(),
        }
    }

    pub fn create(self, end: TextPos, interner: &StringInterner) -> Enum {
        Enum {
            name: self.name.map(|n| interner.resolve(n).to_string()).unwrap_or_default(),
            span: TextSpan::from_bounds(self.start, end),
            scoped: self.scoped,
            enumerators: self.enumerators,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    pub start: TextPos,
    pub kind: FunctionKind,
    pub name: String,
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<Parameter>,
    pub template: Option<TemplateDescriptor>,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_inline: bool,
    pub initializers: Vec<Expression>,
    pub body: Option<Statement>,
}

impl FunctionBuilder {
    pub fn new(start: TextPos, kind: FunctionKind, name: String) -> Self {
        Self {
            start,
            kind,
            name,
            return_type: None,
            parameters: Vec::new(),
            template: None,
            is_static: false,
            is_const: false,
            is_virtual: false,
            is_inline: false,
            initializers: Vec::new(),
            body: None,
        }
    }

    pub fn create(self, end: TextPos) -> Function {
        Function {
            function_kind: self.kind,
            name: self.name,
            span: TextSpan::from_bounds(self.start, end),
            return_type: self.return_type,
            parameters: self.parameters,
            template: self.template,
            is_static: self.is_static,
            is_const: self.is_const,
            is_virtual: self.is_virtual,
            is_inline: self.is_inline,
            initializers: self.initializers,
            body: self.body,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateDescriptorBuilder {
    pub start: TextPos,
    pub parameters: Vec<TemplateParameter>,
    /// `template<>`.
    pub specialization: bool,
    /// `template class X<int>;`: the descriptor is discarded.
    pub instantiation: bool,
    /// Scope holding the parameter names.
    pub scope: Option<ScopeId>,
}

impl TemplateDescriptorBuilder {
    pub fn create(&self) -> TemplateDescriptor {
        TemplateDescriptor {
            parameters: self.parameters.clone(),
            specialization: self.specialization,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InheritanceBuilder {
    pub start: TextPos,
    pub name: Option<QualifiedName>,
    pub visibility: Option<Visibility>,
    pub is_virtual: bool,
}

impl InheritanceBuilder {
    pub fn create(self, end: TextPos, interner: &StringInterner) -> BaseSpecifier {
        BaseSpecifier {
            name: self.name.map(|n| n.display(interner)).unwrap_or_default(),
            visibility: self.visibility,
            is_virtual: self.is_virtual,
            span: TextSpan::from_bounds(self.start, end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsingKind {
    Directive,
    Declaration,
    /// `namespace alias = target;`
    NamespaceAlias(InternedString),
    /// `using alias = type;`
    AliasDeclaration(InternedString),
}

#[derive(Debug, Clone)]
pub struct UsingBuilder {
    pub start: TextPos,
    pub kind: UsingKind,
    pub name: Option<QualifiedName>,
    pub ty: Option<TypeRef>,
    /// An alias template.
    pub template: bool,
}

impl UsingBuilder {
    pub fn new(start: TextPos, kind: UsingKind) -> Self {
        Self {
            start,
            kind,
            name: None,
            ty: None,
            template: false,
        }
    }
}

// ============================================================================
// Expressions and statements
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExpressionBuilder {
    pub start: TextPos,
    /// Nested `expression` callbacks fold into the outermost builder.
    pub depth: u32,
    pub references: Vec<Reference>,
}

impl ExpressionBuilder {
    pub fn new(start: TextPos) -> Self {
        Self {
            start,
            depth: 0,
            references: Vec::new(),
        }
    }

    pub fn create(self, end: TextPos) -> Expression {
        Expression {
            span: TextSpan::from_bounds(self.start, end.max(self.start)),
            references: self.references,
        }
    }
}

/// Which part of a loop the grammar is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPart {
    Init,
    Condition,
    Step,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Break,
    Continue,
    Return,
    Goto,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Compound {
        statements: Vec<Statement>,
    },
    Expression {
        expression: Option<Expression>,
    },
    Declaration {
        declarations: Vec<Declaration>,
    },
    If {
        condition: Option<Condition>,
        then_branch: Option<Statement>,
        else_branch: Option<Statement>,
        in_else: bool,
    },
    Switch {
        condition: Option<Condition>,
        body: Option<Statement>,
    },
    Loop {
        post_check: bool,
        condition: Option<Condition>,
        body: Option<Statement>,
        part: LoopPart,
    },
    For {
        init: Option<Statement>,
        condition: Option<Condition>,
        step: Option<Expression>,
        body: Option<Statement>,
        part: LoopPart,
    },
    Case {
        value: Option<Expression>,
    },
    Jump {
        kind: JumpKind,
        value: Option<Expression>,
        label: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct StatementBuilder {
    pub start: TextPos,
    pub kind: StatementKind,
    /// A symbol-table scope was pushed for this statement.
    pub scoped: bool,
}

impl StatementBuilder {
    pub fn new(start: TextPos, kind: StatementKind) -> Self {
        Self {
            start,
            kind,
            scoped: false,
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.kind, StatementKind::Switch { .. })
    }

    pub fn is_case(&self) -> bool {
        matches!(self.kind, StatementKind::Case { .. })
    }

    /// Take a finished expression. Returns `false` when this statement has
    /// no place for one.
    pub fn accept_expression(&mut self, expression: Expression) -> bool {
        match &mut self.kind {
            StatementKind::Expression { expression: slot }
            | StatementKind::Case { value: slot }
            | StatementKind::Jump { value: slot, .. } => {
                *slot = Some(expression);
                true
            }
            StatementKind::If { condition, .. } | StatementKind::Switch { condition, .. } => {
                *condition = Some(Condition::Expression(expression));
                true
            }
            StatementKind::Loop {
                condition,
                part: LoopPart::Condition,
                ..
            }
            | StatementKind::For {
                condition,
                part: LoopPart::Condition,
                ..
            } => {
                *condition = Some(Condition::Expression(expression));
                true
            }
            StatementKind::For {
                step,
                part: LoopPart::Step,
                ..
            } => {
                *step = Some(expression);
                true
            }
            _ => false,
        }
    }

    /// Take a variable declared in a condition.
    pub fn accept_condition(&mut self, variable: Variable) -> bool {
        match &mut self.kind {
            StatementKind::If { condition, .. }
            | StatementKind::Switch { condition, .. }
            | StatementKind::Loop { condition, .. }
            | StatementKind::For { condition, .. } => {
                *condition = Some(Condition::Declaration(variable));
                true
            }
            _ => false,
        }
    }

    /// Take a finished nested statement.
    pub fn accept_statement(&mut self, statement: Statement) -> bool {
        let slot = match &mut self.kind {
            StatementKind::Compound { statements } => {
                statements.push(statement);
                return true;
            }
            StatementKind::If {
                then_branch,
                else_branch,
                in_else,
                ..
            } => {
                if *in_else {
                    else_branch
                } else {
                    then_branch
                }
            }
            StatementKind::Switch { body, .. } => body,
            StatementKind::Loop {
                body,
                part: LoopPart::Body,
                ..
            } => body,
            StatementKind::For {
                init,
                part: LoopPart::Init,
                ..
            } => init,
            StatementKind::For {
                body,
                part: LoopPart::Body,
                ..
            } => body,
            _ => return false,
        };
        *slot = Some(statement);
        true
    }

    pub fn create(self, end: TextPos) -> Statement {
        let span = TextSpan::from_bounds(self.start, end.max(self.start));
        match self.kind {
            StatementKind::Compound { statements } => Statement::Compound { span, statements },
            StatementKind::Expression { expression } => Statement::Expression { span, expression },
            StatementKind::Declaration { declarations } => Statement::Declaration { span, declarations },
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => Statement::If {
                span,
                condition,
                then_branch: then_branch.map(Box::new),
                else_branch: else_branch.map(Box::new),
            },
            StatementKind::Switch { condition, body } => Statement::Switch {
                span,
                condition,
                body: body.map(Box::new),
            },
            StatementKind::Loop {
                post_check,
                condition,
                body,
                ..
            } => Statement::Loop {
                span,
                post_check,
                condition,
                body: body.map(Box::new),
            },
            StatementKind::For {
                init,
                condition,
                step,
                body,
                ..
            } => Statement::For {
                span,
                init: init.map(Box::new),
                condition,
                step,
                body: body.map(Box::new),
            },
            StatementKind::Case { value } => Statement::Case { span, value },
            StatementKind::Jump { kind, value, label } => match kind {
                JumpKind::Break => Statement::Break { span },
                JumpKind::Continue => Statement::Continue { span },
                JumpKind::Return => Statement::Return { span, value },
                JumpKind::Goto => Statement::Goto {
                    span,
                    label: label.unwrap_or_default(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxm_lexer::TokenKind;

    fn ident(interner: &StringInterner, text: &str, offset: u32) -> Token {
        Token::new(
            TokenKind::Identifier,
            interner.intern(text),
            offset,
            offset + text.len() as u32,
        )
    }

    #[test]
    fn test_qualified_destructor_name() {
        let interner = StringInterner::new();
        let colons = Token::new(TokenKind::ColonColon, interner.intern("::"), 1, 3);
        let tilde = Token::new(TokenKind::Tilde, interner.intern("~"), 3, 4);
        let mut name = NameBuilder::new(0);
        name.add_part(NamePart::Identifier, &ident(&interner, "A", 0));
        name.add_part(NamePart::Scope, &colons);
        name.add_part(NamePart::Tilde, &tilde);
        name.add_part(NamePart::Identifier, &ident(&interner, "A", 4));
        let name = name.create();
        assert!(name.destructor);
        assert!(name.is_qualified());
        assert_eq!(name.display(&interner), "A::~A");
        assert_eq!(name.simple_name(&interner), "~A");
        assert_eq!(name.qualifiers().len(), 1);
        assert_eq!(name.end, 5);
    }

    #[test]
    fn test_resolved_type_combines_specifiers_and_declarator() {
        let specs = DeclSpecs {
            specifiers: Specifiers::CONST,
            ty: Some(TypeRef::builtin("char")),
            has_type_specifier: true,
            ..Default::default()
        };
        let declarator = DeclaratorBuilder {
            pointer_depth: 1,
            ..Default::default()
        };
        let ty = specs.resolved_type(Some(&declarator)).expect("type");
        assert_eq!(ty.to_string(), "const char*");
    }

    #[test]
    fn test_function_pointer_declarator_is_not_a_function() {
        let mut declarator = DeclaratorBuilder::new(0);
        declarator.parameters = Some(Vec::new());
        assert!(declarator.is_function());
        declarator.nested_pointer = true;
        assert!(!declarator.is_function());
    }

    #[test]
    fn test_restore_deferred_keeps_source_order() {
        let interner = StringInterner::new();
        let mut class = ClassBuilder::new(0, None);
        class.set_kind(ClassKind::Struct);
        let function = |name: &str, at: u32| FunctionBuilder::new(at, FunctionKind::Method, name.into()).create(at + 1);
        class.add_member(Declaration::Function(function("a", 10)));
        let g = MemberSlot::Member {
            index: 1,
            visibility: Visibility::Public,
        };
        let h = MemberSlot::Member {
            index: 1,
            visibility: Visibility::Public,
        };
        class.add_member(Declaration::Function(function("z", 40)));
        class.restore_deferred(vec![(g, function("g", 20)), (h, function("h", 30))]);
        let class = class.create(50, &interner);
        let names: Vec<_> = class.members.iter().map(|m| m.declaration.name()).collect();
        assert_eq!(names, vec!["a", "g", "h", "z"]);
    }

    #[test]
    fn test_if_statement_fills_branches() {
        let mut statement = StatementBuilder::new(
            0,
            StatementKind::If {
                condition: None,
                then_branch: None,
                else_branch: None,
                in_else: false,
            },
        );
        let brk = Statement::Break {
            span: TextSpan::new(5, 6),
        };
        assert!(statement.accept_statement(brk.clone()));
        if let StatementKind::If { in_else, .. } = &mut statement.kind {
            *in_else = true;
        }
        assert!(statement.accept_statement(brk));
        match statement.create(20) {
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(then_branch.is_some());
                assert!(else_branch.is_some());
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_case_accepts_only_expressions() {
        let mut case = StatementBuilder::new(0, StatementKind::Case { value: None });
        assert!(case.is_case());
        assert!(!case.accept_statement(Statement::Break {
            span: TextSpan::new(0, 1)
        }));
        let value = ExpressionBuilder::new(5).create(6);
        assert!(case.accept_expression(value));
    }
}
