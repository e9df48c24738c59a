//! Declarations.

use crate::stmt::{Expression, Statement};
use crate::types::{ClassKind, TypeRef, Visibility};
use cxxm_core::text::{TextPos, TextSpan};
use serde::Serialize;
use std::fmt;

/// Index of a file in the [`ModelStore`](crate::ModelStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Namespace,
    Class,
    Enum,
    Enumerator,
    Function,
    Variable,
    Typedef,
    ForwardClass,
    UsingDirective,
    UsingDeclaration,
    NamespaceAlias,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeclKind::Namespace => "namespace",
            DeclKind::Class => "class",
            DeclKind::Enum => "enum",
            DeclKind::Enumerator => "enumerator",
            DeclKind::Function => "function",
            DeclKind::Variable => "variable",
            DeclKind::Typedef => "typedef",
            DeclKind::ForwardClass => "forward declaration",
            DeclKind::UsingDirective => "using directive",
            DeclKind::UsingDeclaration => "using declaration",
            DeclKind::NamespaceAlias => "namespace alias",
        };
        f.write_str(text)
    }
}

/// A lightweight handle to a finalized declaration: the file it lives in
/// and its start offset there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeclRef {
    pub file: FileId,
    pub offset: TextPos,
    pub kind: DeclKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Namespace(NamespaceDefinition),
    Class(Class),
    Enum(Enum),
    Function(Function),
    Variable(Variable),
    Typedef(Typedef),
    ForwardClass(ForwardClass),
    UsingDirective(UsingDirective),
    UsingDeclaration(UsingDeclaration),
    NamespaceAlias(NamespaceAlias),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Namespace(d) => &d.name,
            Declaration::Class(d) => &d.name,
            Declaration::Enum(d) => &d.name,
            Declaration::Function(d) => &d.name,
            Declaration::Variable(d) => &d.name,
            Declaration::Typedef(d) => &d.name,
            Declaration::ForwardClass(d) => &d.name,
            Declaration::UsingDirective(d) => &d.namespace,
            Declaration::UsingDeclaration(d) => &d.name,
            Declaration::NamespaceAlias(d) => &d.alias,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            Declaration::Namespace(d) => d.span,
            Declaration::Class(d) => d.span,
            Declaration::Enum(d) => d.span,
            Declaration::Function(d) => d.span,
            Declaration::Variable(d) => d.span,
            Declaration::Typedef(d) => d.span,
            Declaration::ForwardClass(d) => d.span,
            Declaration::UsingDirective(d) => d.span,
            Declaration::UsingDeclaration(d) => d.span,
            Declaration::NamespaceAlias(d) => d.span,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Declaration::Namespace(_) => DeclKind::Namespace,
            Declaration::Class(_) => DeclKind::Class,
            Declaration::Enum(_) => DeclKind::Enum,
            Declaration::Function(_) => DeclKind::Function,
            Declaration::Variable(_) => DeclKind::Variable,
            Declaration::Typedef(_) => DeclKind::Typedef,
            Declaration::ForwardClass(_) => DeclKind::ForwardClass,
            Declaration::UsingDirective(_) => DeclKind::UsingDirective,
            Declaration::UsingDeclaration(_) => DeclKind::UsingDeclaration,
            Declaration::NamespaceAlias(_) => DeclKind::NamespaceAlias,
        }
    }

    pub fn decl_ref(&self, file: FileId) -> DeclRef {
        DeclRef {
            file,
            offset: self.span().start,
            kind: self.kind(),
            name: self.name().to_string(),
        }
    }

    /// Declarations directly contained in this one (namespace and class
    /// members). Empty for leaf declarations.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Declaration> + '_> {
        match self {
            Declaration::Namespace(ns) => Box::new(ns.members.iter()),
            Declaration::Class(class) => Box::new(class.members.iter().map(|m| &m.declaration)),
            _ => Box::new(std::iter::empty()),
        }
    }
}

/// One `namespace N { ... }` block. Blocks sharing a qualified name form one
/// [`LogicalNamespace`](crate::LogicalNamespace).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceDefinition {
    /// Empty for an anonymous namespace.
    pub name: String,
    pub qualified_name: String,
    pub span: TextSpan,
    pub members: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub class_kind: ClassKind,
    /// Empty for an anonymous class.
    pub name: String,
    pub span: TextSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateDescriptor>,
    /// Arguments of a specialization (`template<> class X<int>`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specialization: Vec<String>,
    pub bases: Vec<BaseSpecifier>,
    pub members: Vec<Member>,
    pub friends: Vec<Friend>,
}

impl Class {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.declaration.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseSpecifier {
    pub name: String,
    pub visibility: Option<Visibility>,
    pub is_virtual: bool,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub visibility: Visibility,
    pub declaration: Declaration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Friend {
    Class { name: String, span: TextSpan },
    Function(Function),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enum {
    pub name: String,
    pub span: TextSpan,
    /// `enum class` / `enum struct`.
    pub scoped: bool,
    pub enumerators: Vec<Enumerator>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enumerator {
    pub name: String,
    pub span: TextSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Function,
    Method,
    Constructor,
    Destructor,
    Friend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub function_kind: FunctionKind,
    /// The name as written, qualified for out-of-line definitions.
    pub name: String,
    pub span: TextSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateDescriptor>,
    pub is_static: bool,
    pub is_const: bool,
    pub is_virtual: bool,
    pub is_inline: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub initializers: Vec<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Statement>,
}

impl Function {
    pub fn is_definition(&self) -> bool {
        self.body.is_some()
    }

    /// Declared outside its class or namespace (`void A::f() {}`).
    pub fn is_out_of_line(&self) -> bool {
        self.name.contains("::")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ty: TypeRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Expression>,
    /// The C-style `...` parameter.
    pub ellipsis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub span: TextSpan,
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_extern: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_width: Option<Expression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Typedef {
    pub name: String,
    pub span: TextSpan,
    pub ty: TypeRef,
}

/// `class Foo;`, or a friend class declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardClass {
    pub class_kind: ClassKind,
    pub name: String,
    pub span: TextSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsingDirective {
    pub namespace: String,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsingDeclaration {
    pub name: String,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceAlias {
    pub alias: String,
    pub target: String,
    pub span: TextSpan,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateDescriptor {
    pub parameters: Vec<TemplateParameter>,
    /// `template<>`: an explicit specialization.
    pub specialization: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateParameter {
    Type { name: Option<String> },
    NonType { name: Option<String>, ty: TypeRef },
    Template { name: Option<String> },
}

impl TemplateParameter {
    pub fn name(&self) -> Option<&str> {
        match self {
            TemplateParameter::Type { name }
            | TemplateParameter::NonType { name, .. }
            | TemplateParameter::Template { name } => name.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str) -> Function {
        Function {
            function_kind: FunctionKind::Method,
            name: name.to_string(),
            span: TextSpan::new(10, 5),
            return_type: Some(TypeRef::builtin("int")),
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

    #[test]
    fn test_decl_ref() {
        let decl = Declaration::Function(function("f"));
        let r = decl.decl_ref(FileId(2));
        assert_eq!(r.file, FileId(2));
        assert_eq!(r.offset, 10);
        assert_eq!(r.kind, DeclKind::Function);
        assert_eq!(r.name, "f");
    }

    #[test]
    fn test_out_of_line() {
        assert!(function("A::f").is_out_of_line());
        assert!(!function("f").is_out_of_line());
        assert!(!function("f").is_definition());
    }

    #[test]
    fn test_class_children() {
        let class = Class {
            class_kind: ClassKind::Struct,
            name: "S".into(),
            span: TextSpan::new(0, 20),
            template: None,
            specialization: Vec::new(),
            bases: Vec::new(),
            members: vec![Member {
                visibility: Visibility::Public,
                declaration: Declaration::Function(function("g")),
            }],
            friends: Vec::new(),
        };
        assert!(class.member("g").is_some());
        let decl = Declaration::Class(class);
        let names: Vec<_> = decl.children().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["g"]);
    }
}
