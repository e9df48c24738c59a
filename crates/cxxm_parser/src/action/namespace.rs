//! Namespaces, using-directives, using-declarations and aliases.

use crate::builders::{Builder, NamespaceBuilder, UsingBuilder, UsingKind};
use crate::error::{ActionFault, RecognitionError};
use crate::session::ParseSession;
use cxxm_core::text::TextSpan;
use cxxm_lexer::Token;
use cxxm_model::{Declaration, NamespaceAlias, Typedef, UsingDeclaration, UsingDirective};
use cxxm_symtab::EntryFlags;
use tracing::debug;

const ANONYMOUS: &str = "(anonymous)";

impl ParseSession {
    // ========================================================================
    // Namespaces
    // ========================================================================

    pub fn namespace_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let mut namespace = NamespaceBuilder::new(token.offset);
            // Until a name arrives the qualified name holds the parent's.
            if let Some(Builder::Namespace(parent)) = s.builders.top() {
                namespace.qualified_name = parent.qualified_name.clone();
            }
            s.builders.push(Builder::Namespace(namespace));
            Ok(())
        })
    }

    pub fn namespace_name(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let name = s.interner.resolve(token.text).to_string();
            let namespace = s.builders.namespace_mut()?;
            namespace.name = Some(token.text);
            namespace.qualified_name = qualify(&namespace.qualified_name, &name);
            Ok(())
        })
    }

    pub fn namespace_body(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let name = s.builders.namespace()?.name;
            let scope = match name {
                Some(name) => {
                    let entry = s.symtab.enter_local(name);
                    s.symtab.entry_mut(entry).flags |= EntryFlags::IS_TYPE;
                    match s.symtab.entry(entry).nested_scope {
                        Some(scope) => {
                            s.symtab.push_scope(scope);
                            scope
                        }
                        None => {
                            let scope = s.symtab.push_named(name);
                            s.symtab.entry_mut(entry).nested_scope = Some(scope);
                            scope
                        }
                    }
                }
                None => s.symtab.push(),
            };
            let namespace = s.builders.namespace_mut()?;
            if namespace.name.is_none() {
                namespace.qualified_name = qualify(&namespace.qualified_name, ANONYMOUS);
            }
            namespace.scope = Some(scope);
            Ok(())
        })
    }

    pub fn end_namespace_body(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let namespace = s.builders.namespace()?;
            let (name, scope) = (namespace.name, namespace.scope);
            match name {
                Some(name) => {
                    s.symtab.pop_named(name)?;
                }
                None => {
                    s.symtab.pop()?;
                    if let Some(scope) = scope {
                        s.symtab.import_to_local(scope);
                    }
                }
            }
            Ok(())
        })
    }

    pub fn end_namespace_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let namespace = s.builders.pop_namespace()?;
            let name = namespace.name;
            let definition = namespace.create(token.end, &s.interner);
            let file = s.current_file();
            debug!(name = %definition.qualified_name, members = definition.members.len(), "namespace block");
            s.store.register_namespace(file, &definition);
            let declaration = Declaration::Namespace(definition);
            if let Some(name) = name {
                let entry = s.symtab.enter_local(name);
                s.define(entry, declaration.decl_ref(file));
            }
            s.attach_declaration(declaration);
            Ok(())
        })
    }

    // ========================================================================
    // Using
    // ========================================================================

    pub fn using_directive(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders
                .push(Builder::Using(UsingBuilder::new(token.offset, UsingKind::Directive)));
            Ok(())
        })
    }

    /// `using namespace N;`: the entries of N become visible in the current
    /// scope.
    pub fn end_using_directive(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let using = s.builders.pop_using()?;
            let name = using.name.ok_or(ActionFault::Incomplete("using directive"))?;
            let target = s.symtab.lookup_qualified(&name.lookup_parts(&s.interner));
            match target.and_then(|entry| s.symtab.entry(entry).nested_scope) {
                Some(scope) => s.symtab.import_to_local(scope),
                None => debug!(namespace = %name.display(&s.interner), "using directive of unknown namespace"),
            }
            let declaration = Declaration::UsingDirective(UsingDirective {
                namespace: name.display(&s.interner),
                span: TextSpan::from_bounds(using.start, token.end),
            });
            s.attach_declaration(declaration);
            Ok(())
        })
    }

    pub fn using_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders
                .push(Builder::Using(UsingBuilder::new(token.offset, UsingKind::Declaration)));
            Ok(())
        })
    }

    /// `using A::b;`: `b` becomes a local type name unless the scope already
    /// has it. A target the table knows lends its scope and definition.
    pub fn end_using_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let using = s.builders.pop_using()?;
            let name = using.name.ok_or(ActionFault::Incomplete("using declaration"))?;
            let last = name.last().ok_or(ActionFault::Incomplete("using declaration"))?;
            if s.symtab.lookup_local(last).is_none() {
                let target = s
                    .symtab
                    .lookup_qualified(&name.lookup_parts(&s.interner))
                    .map(|target| s.symtab.entry(target).clone());
                let local = s.symtab.enter_local(last);
                let local = s.symtab.entry_mut(local);
                local.flags |= EntryFlags::IS_TYPE;
                if let Some(target) = target {
                    local.flags |= target.flags;
                    local.nested_scope = target.nested_scope;
                    local.definition = target.definition;
                }
            }
            let declaration = Declaration::UsingDeclaration(UsingDeclaration {
                name: name.display(&s.interner),
                span: TextSpan::from_bounds(using.start, token.end),
            });
            s.attach_declaration(declaration);
            Ok(())
        })
    }

    /// `namespace alias = target;`, entered at the `namespace` keyword.
    pub fn namespace_alias_definition(&mut self, token: Token, alias: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.push(Builder::Using(UsingBuilder::new(
                token.offset,
                UsingKind::NamespaceAlias(alias.text),
            )));
            Ok(())
        })
    }

    pub fn end_namespace_alias_definition(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let using = s.builders.pop_using()?;
            let UsingKind::NamespaceAlias(alias) = using.kind else {
                return Err(ActionFault::Incomplete("namespace alias"));
            };
            let target = using.name.ok_or(ActionFault::Incomplete("namespace alias"))?;
            let nested = s
                .symtab
                .lookup_qualified(&target.lookup_parts(&s.interner))
                .and_then(|entry| s.symtab.entry(entry).nested_scope);
            let entry = s.symtab.enter_local(alias);
            let entry = s.symtab.entry_mut(entry);
            entry.flags |= EntryFlags::IS_TYPE;
            if entry.nested_scope.is_none() {
                entry.nested_scope = nested;
            }
            let declaration = Declaration::NamespaceAlias(NamespaceAlias {
                alias: s.interner.resolve(alias).to_string(),
                target: target.display(&s.interner),
                span: TextSpan::from_bounds(using.start, token.end),
            });
            s.attach_declaration(declaration);
            Ok(())
        })
    }

    /// `using alias = type;`, entered at the `using` keyword.
    pub fn alias_declaration(&mut self, token: Token, alias: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let template = s.take_template().is_some();
            let mut using = UsingBuilder::new(token.offset, UsingKind::AliasDeclaration(alias.text));
            using.template = template;
            s.builders.push(Builder::Using(using));
            Ok(())
        })
    }

    pub fn end_alias_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let using = s.builders.pop_using()?;
            let UsingKind::AliasDeclaration(alias) = using.kind else {
                return Err(ActionFault::Incomplete("alias declaration"));
            };
            let mut flags = EntryFlags::IS_TYPE;
            if using.template {
                flags |= EntryFlags::IS_TEMPLATE;
            }
            let entry = s.declare(alias, flags);
            let declaration = Declaration::Typedef(Typedef {
                name: s.interner.resolve(alias).to_string(),
                span: TextSpan::from_bounds(using.start, token.end),
                ty: using.ty.unwrap_or_default(),
            });
            let file = s.current_file();
            s.define(entry, declaration.decl_ref(file));
            s.attach_declaration(declaration);
            Ok(())
        })
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}::{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::qualify;

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("", "N"), "N");
        assert_eq!(qualify("A::B", "N"), "A::B::N");
    }
}
