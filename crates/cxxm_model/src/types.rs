//! Type references and small enums shared by declarations.

use crate::decl::DeclRef;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Struct,
    Union,
}

impl ClassKind {
    /// Visibility of members declared before any access specifier.
    pub fn default_visibility(self) -> Visibility {
        match self {
            ClassKind::Class => Visibility::Private,
            ClassKind::Struct | ClassKind::Union => Visibility::Public,
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Class => write!(f, "class"),
            ClassKind::Struct => write!(f, "struct"),
            ClassKind::Union => write!(f, "union"),
        }
    }
}

/// A reference to a type as written in a declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeRef {
    /// Builtin keywords joined by spaces (`unsigned long`) or a possibly
    /// qualified type name (`std::vector`).
    pub name: String,
    pub builtin: bool,
    /// Template arguments as written, one entry per argument.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    pub is_const: bool,
    pub is_volatile: bool,
    pub pointer_depth: u8,
    pub reference: bool,
    pub rvalue_reference: bool,
    /// The class or enum defined inline by this type specifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<DeclRef>,
}

impl TypeRef {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin: true,
            ..Default::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        if self.is_volatile {
            write!(f, "volatile ")?;
        }
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, "<{}>", self.arguments.join(", "))?;
        }
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        if self.reference {
            write!(f, "&")?;
        }
        if self.rvalue_reference {
            write!(f, "&&")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut ty = TypeRef::named("std::map");
        ty.arguments = vec!["int".into(), "Foo*".into()];
        ty.is_const = true;
        ty.reference = true;
        assert_eq!(ty.to_string(), "const std::map<int, Foo*>&");

        let mut ptr = TypeRef::builtin("unsigned char");
        ptr.pointer_depth = 2;
        assert_eq!(ptr.to_string(), "unsigned char**");
    }

    #[test]
    fn test_default_visibility() {
        assert_eq!(ClassKind::Class.default_visibility(), Visibility::Private);
        assert_eq!(ClassKind::Struct.default_visibility(), Visibility::Public);
        assert_eq!(ClassKind::Union.default_visibility(), Visibility::Public);
    }
}
