//! Classes, base specifiers, access specifiers and enums.

use crate::builders::{Builder, ClassBuilder, EnumBuilder, InheritanceBuilder};
use crate::error::RecognitionError;
use crate::session::ParseSession;
use cxxm_lexer::Token;
use cxxm_model::{ClassKind, DeclKind, DeclRef, Declaration, Enumerator, Visibility};
use cxxm_symtab::EntryFlags;
use tracing::debug;

/// A keyword in a base specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseModifier {
    Virtual,
    Access(Visibility),
}

impl ParseSession {
    // ========================================================================
    // Classes
    // ========================================================================

    /// Enter a class specifier. Runs inside the type specifier of a simple
    /// declaration and takes over its template descriptor.
    pub fn class_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let template = match s.builders.top_n_mut(1) {
                Some(Builder::SimpleDeclaration(decl)) => decl.template.take(),
                _ => None,
            };
            if let Some(specs) = s.builders.decl_specs_mut() {
                specs.defines_type = true;
                specs.has_type_specifier = true;
            }
            s.builders
                .push(Builder::Class(ClassBuilder::new(token.offset, template)));
            Ok(())
        })
    }

    pub fn class_kind(&mut self, kind: ClassKind, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.class_mut()?.set_kind(kind);
            Ok(())
        })
    }

    /// The class head name. Entered as a type in the declaring scope.
    pub fn class_name(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let templated = s.builders.class()?.template.is_some();
            let mut flags = EntryFlags::IS_TYPE;
            if templated {
                flags |= EntryFlags::IS_TEMPLATE;
            }
            let entry = s.declare(token.text, flags);
            let class = s.builders.class_mut()?;
            class.name = Some(token.text);
            class.entry = Some(entry);
            Ok(())
        })
    }

    pub fn base_specifier(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.class()?;
            s.builders.push(Builder::Inheritance(InheritanceBuilder {
                start: token.offset,
                ..Default::default()
            }));
            Ok(())
        })
    }

    pub fn base_specifier_modifier(&mut self, modifier: BaseModifier, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let base = s.builders.inheritance_mut()?;
            match modifier {
                BaseModifier::Virtual => base.is_virtual = true,
                BaseModifier::Access(visibility) => base.visibility = Some(visibility),
            }
            Ok(())
        })
    }

    /// Finish a base specifier. The base's scope is remembered so the class
    /// body can see inherited names.
    pub fn end_base_specifier(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let base = s.builders.pop_inheritance()?;
            let scope = base.name.as_ref().and_then(|name| {
                let entry = s.symtab.lookup_qualified(&name.lookup_parts(&s.interner))?;
                s.symtab.entry(entry).nested_scope
            });
            let base = base.create(token.end, &s.interner);
            let class = s.builders.class_mut()?;
            class.bases.push(base);
            class.base_scopes.extend(scope);
            Ok(())
        })
    }

    /// `{` of a class body: activate the class scope and import the scopes
    /// of its bases.
    pub fn class_body(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let class = s.builders.class()?;
            let (name, entry, specialization) = (class.name, class.entry, !class.specialization.is_empty());
            let bases = class.base_scopes.clone();
            let scope = match name {
                Some(name) => s.symtab.push_named(name),
                None => s.symtab.push(),
            };
            if let Some(entry) = entry {
                let entry = s.symtab.entry_mut(entry);
                // A specialization does not replace the primary template's scope.
                if entry.nested_scope.is_none() || !specialization {
                    entry.nested_scope = Some(scope);
                }
            }
            for base in bases {
                s.symtab.import_to_local(base);
            }
            Ok(())
        })
    }

    pub fn access_specifier(&mut self, visibility: Visibility, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.class_mut()?.visibility = visibility;
            Ok(())
        })
    }

    /// `}` of a class body: parse the deferred member bodies while the class
    /// scope is still active, then leave it.
    pub fn end_class_body(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.parse_deferred_bodies()?;
            match s.builders.class()?.name {
                Some(name) => s.symtab.pop_named(name)?,
                None => s.symtab.pop()?,
            };
            Ok(())
        })
    }

    pub fn end_class_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let class = s.builders.pop_class()?;
            let entry = class.entry;
            let declaration = Declaration::Class(class.create(token.end, &s.interner));
            let definition = declaration.decl_ref(s.current_file());
            debug!(name = %definition.name, offset = definition.offset, "class");
            if let Some(entry) = entry {
                s.define(entry, definition.clone());
            }
            if let Some(Builder::Type(ty)) = s.builders.top_mut() {
                ty.classifier = Some(definition);
            }
            s.attach_declaration(declaration);
            Ok(())
        })
    }

    // ========================================================================
    // Enums
    // ========================================================================

    pub fn enum_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            if let Some(specs) = s.builders.decl_specs_mut() {
                specs.defines_type = true;
                specs.has_type_specifier = true;
            }
            s.builders.push(Builder::Enum(EnumBuilder::new(token.offset)));
            Ok(())
        })
    }

    /// `enum class` / `enum struct`.
    pub fn enum_strongly_typed(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.enum_mut()?.scoped = true;
            Ok(())
        })
    }

    pub fn enum_name(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.enum_builder()?;
            let entry = s.declare(token.text, EntryFlags::IS_TYPE);
            let builder = s.builders.enum_mut()?;
            builder.name = Some(token.text);
            builder.entry = Some(entry);
            Ok(())
        })
    }

    pub fn enum_body(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let (name, entry) = {
                let builder = s.builders.enum_builder()?;
                (builder.name, builder.entry)
            };
            let scope = match name {
                Some(name) => s.symtab.push_named(name),
                None => s.symtab.push(),
            };
            if let Some(entry) = entry {
                s.symtab.entry_mut(entry).nested_scope = Some(scope);
            }
            s.builders.enum_mut()?.scope = Some(scope);
            Ok(())
        })
    }

    pub fn enumerator(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            s.builders.enum_builder()?;
            let name = s.interner.resolve(token.text).to_string();
            let file = s.current_file();
            let entry = s.symtab.enter_local(token.text);
            s.symtab.entry_mut(entry).definition = Some(DeclRef {
                file,
                offset: token.offset,
                kind: DeclKind::Enumerator,
                name: name.clone(),
            });
            s.builders.enum_mut()?.enumerators.push(Enumerator {
                name,
                span: token.span(),
                value: None,
            });
            Ok(())
        })
    }

    /// `}` of an enum body. Enumerators of an unscoped enum become visible
    /// in the enclosing scope.
    pub fn end_enum_body(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let builder = s.builders.enum_builder()?;
            let (name, scope, scoped) = (builder.name, builder.scope, builder.scoped);
            match name {
                Some(name) => s.symtab.pop_named(name)?,
                None => s.symtab.pop()?,
            };
            if let (Some(scope), false) = (scope, scoped) {
                s.symtab.import_to_local(scope);
            }
            Ok(())
        })
    }

    pub fn end_enum_declaration(&mut self, token: Token) -> Result<(), RecognitionError> {
        self.dispatch(token, |s| {
            let builder = s.builders.pop_enum()?;
            let entry = builder.entry;
            let declaration = Declaration::Enum(builder.create(token.end, &s.interner));
            let definition = declaration.decl_ref(s.current_file());
            if let Some(entry) = entry {
                s.define(entry, definition.clone());
            }
            if let Some(Builder::Type(ty)) = s.builders.top_mut() {
                ty.classifier = Some(definition);
            }
            s.attach_declaration(declaration);
            Ok(())
        })
    }
}
