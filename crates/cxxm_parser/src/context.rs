//! The builder context stack.
//!
//! Mirrors the grammar's nesting: every "enter construct" callback pushes a
//! builder, every "exit construct" callback pops it. Typed accessors check
//! the variant on top and report an [`ActionFault`] instead of guessing.

use crate::builders::*;
use crate::error::ActionFault;
use tracing::trace;

#[derive(Debug, Default)]
pub struct BuilderContext {
    stack: Vec<Builder>,
}

macro_rules! typed_access {
    ($($variant:ident($ty:ty) => $get:ident, $get_mut:ident, $pop:ident;)*) => {
        $(
            pub fn $get(&self) -> Result<&$ty, ActionFault> {
                match self.stack.last() {
                    Some(Builder::$variant(b)) => Ok(b),
                    other => Err(ActionFault::unexpected(BuilderKind::$variant, other.map(Builder::kind))),
                }
            }

            pub fn $get_mut(&mut self) -> Result<&mut $ty, ActionFault> {
                match self.stack.last_mut() {
                    Some(Builder::$variant(b)) => Ok(b),
                    other => Err(ActionFault::unexpected(BuilderKind::$variant, other.map(|b| b.kind()))),
                }
            }

            /// Pop the top builder if it has the expected kind; otherwise
            /// leave the stack untouched.
            pub fn $pop(&mut self) -> Result<$ty, ActionFault> {
                match self.stack.last() {
                    Some(Builder::$variant(_)) => {}
                    other => return Err(ActionFault::unexpected(BuilderKind::$variant, other.map(Builder::kind))),
                }
                match self.pop()? {
                    Builder::$variant(b) => Ok(b),
                    other => Err(ActionFault::unexpected(BuilderKind::$variant, Some(other.kind()))),
                }
            }
        )*
    };
}

impl BuilderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, builder: Builder) {
        trace!(kind = %builder.kind(), depth = self.stack.len() + 1, "push builder");
        self.stack.push(builder);
    }

    pub fn pop(&mut self) -> Result<Builder, ActionFault> {
        let builder = self.stack.pop().ok_or(ActionFault::EmptyBuilderStack)?;
        trace!(kind = %builder.kind(), depth = self.stack.len(), "pop builder");
        Ok(builder)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drop builders above `depth`. Used to restore balance after a
    /// malformed nested parse.
    pub fn truncate(&mut self, depth: usize) -> usize {
        let dropped = self.stack.len().saturating_sub(depth);
        self.stack.truncate(depth);
        dropped
    }

    pub fn top(&self) -> Option<&Builder> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Builder> {
        self.stack.last_mut()
    }

    /// The builder `n` frames below the top (`top_n(0)` is the top).
    /// Underflow yields `None`.
    pub fn top_n(&self, n: usize) -> Option<&Builder> {
        let index = self.stack.len().checked_sub(n + 1)?;
        self.stack.get(index)
    }

    pub fn top_n_mut(&mut self, n: usize) -> Option<&mut Builder> {
        let index = self.stack.len().checked_sub(n + 1)?;
        self.stack.get_mut(index)
    }

    pub fn kind_at(&self, n: usize) -> Option<BuilderKind> {
        self.top_n(n).map(Builder::kind)
    }

    /// Builders from the top down.
    pub fn iter_from_top(&self) -> impl Iterator<Item = &Builder> {
        self.stack.iter().rev()
    }

    pub fn iter_from_top_mut(&mut self) -> impl Iterator<Item = &mut Builder> {
        self.stack.iter_mut().rev()
    }

    typed_access! {
        Namespace(NamespaceBuilder) => namespace, namespace_mut, pop_namespace;
        Class(ClassBuilder) => class, class_mut, pop_class;
        Enum(EnumBuilder) => enum_builder, enum_mut, pop_enum;
        Function(FunctionBuilder) => function, function_mut, pop_function;
        SimpleDeclaration(SimpleDeclarationBuilder) => simple_declaration, simple_declaration_mut, pop_simple_declaration;
        Parameter(ParameterBuilder) => parameter, parameter_mut, pop_parameter;
        ParameterList(ParameterListBuilder) => parameter_list, parameter_list_mut, pop_parameter_list;
        Declarator(DeclaratorBuilder) => declarator, declarator_mut, pop_declarator;
        Name(NameBuilder) => name, name_mut, pop_name;
        Type(TypeBuilder) => type_builder, type_mut, pop_type;
        TemplateDescriptor(TemplateDescriptorBuilder) => template_descriptor, template_descriptor_mut, pop_template_descriptor;
        Inheritance(InheritanceBuilder) => inheritance, inheritance_mut, pop_inheritance;
        Using(UsingBuilder) => using, using_mut, pop_using;
        Expression(ExpressionBuilder) => expression, expression_mut, pop_expression;
        Statement(StatementBuilder) => statement, statement_mut, pop_statement;
    }

    /// The nearest simple declaration or parameter specifier sequence at
    /// the top, or right below a type builder.
    pub fn decl_specs(&self) -> Option<&DeclSpecs> {
        let top = match self.top()? {
            Builder::Type(_) => self.top_n(1)?,
            other => other,
        };
        match top {
            Builder::SimpleDeclaration(decl) => Some(&decl.specs),
            Builder::Parameter(param) => Some(&param.specs),
            _ => None,
        }
    }

    pub fn decl_specs_mut(&mut self) -> Option<&mut DeclSpecs> {
        let n = usize::from(matches!(self.top(), Some(Builder::Type(_))));
        match self.top_n_mut(n)? {
            Builder::SimpleDeclaration(decl) => Some(&mut decl.specs),
            Builder::Parameter(param) => Some(&mut param.specs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_depth() {
        let mut context = BuilderContext::new();
        assert!(context.is_empty());
        context.push(Builder::Namespace(NamespaceBuilder::new(0)));
        context.push(Builder::Class(ClassBuilder::new(4, None)));
        assert_eq!(context.depth(), 2);
        assert_eq!(context.kind_at(0), Some(BuilderKind::Class));
        assert_eq!(context.kind_at(1), Some(BuilderKind::Namespace));
        assert_eq!(context.kind_at(2), None);
        assert!(context.pop().is_ok());
        assert!(context.pop().is_ok());
        assert_eq!(context.pop().unwrap_err(), ActionFault::EmptyBuilderStack);
    }

    #[test]
    fn test_typed_pop_leaves_stack_on_mismatch() {
        let mut context = BuilderContext::new();
        context.push(Builder::Namespace(NamespaceBuilder::new(0)));
        let err = context.pop_class().unwrap_err();
        assert_eq!(
            err,
            ActionFault::unexpected(BuilderKind::Class, Some(BuilderKind::Namespace))
        );
        assert_eq!(context.depth(), 1);
        assert!(context.pop_namespace().is_ok());
        assert!(context.is_empty());
    }

    #[test]
    fn test_decl_specs_below_type() {
        let mut context = BuilderContext::new();
        context.push(Builder::SimpleDeclaration(SimpleDeclarationBuilder::new(0)));
        context.push(Builder::Type(TypeBuilder::new(0)));
        assert!(context.decl_specs().is_some());
        if let Some(specs) = context.decl_specs_mut() {
            specs.has_type_specifier = true;
        }
        let _ = context.pop();
        assert!(context.simple_declaration().map(|d| d.specs.has_type_specifier).unwrap_or(false));
    }

    #[test]
    fn test_kind_at_and_truncate() {
        let mut context = BuilderContext::new();
        context.push(Builder::Class(ClassBuilder::new(0, None)));
        context.push(Builder::SimpleDeclaration(SimpleDeclarationBuilder::new(2)));
        context.push(Builder::Type(TypeBuilder::new(2)));
        assert_eq!(context.kind_at(2), Some(BuilderKind::Class));
        assert_eq!(context.kind_at(3), None);
        assert_eq!(context.truncate(1), 2);
        assert_eq!(context.depth(), 1);
    }
}
