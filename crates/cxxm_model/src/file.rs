//! Per-file parse content.

use crate::decl::{DeclRef, Declaration, FileId};
use crate::stmt::Reference;
use cxxm_core::text::TextPos;
use cxxm_diagnostics::{Diagnostic, DiagnosticCollection};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the parser produced for one file: its top-level declarations,
/// the offset-indexed object map, references and parse errors.
#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub id: FileId,
    pub path: String,
    pub declarations: Vec<Declaration>,
    /// Start offset to every declaration registered while this file was the
    /// current parsing context, at any nesting depth.
    pub objects: BTreeMap<TextPos, DeclRef>,
    pub references: Vec<Reference>,
    pub diagnostics: DiagnosticCollection,
    /// Files included (directly) from this one, in inclusion order.
    pub includes: Vec<FileId>,
}

impl FileContent {
    pub fn new(id: FileId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            declarations: Vec::new(),
            objects: BTreeMap::new(),
            references: Vec::new(),
            diagnostics: DiagnosticCollection::new(),
            includes: Vec::new(),
        }
    }

    pub fn add_declaration(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    pub fn add_error(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }

    pub fn add_include(&mut self, file: FileId) {
        if !self.includes.contains(&file) {
            self.includes.push(file);
        }
    }

    /// Find a declaration of this file by start offset, searching namespace
    /// and class members.
    pub fn find_declaration(&self, offset: TextPos) -> Option<&Declaration> {
        fn search<'a>(decls: impl Iterator<Item = &'a Declaration>, offset: TextPos) -> Option<&'a Declaration> {
            for decl in decls {
                if decl.span().start == offset {
                    return Some(decl);
                }
                if decl.span().contains(offset) {
                    if let Some(found) = search(decl.children(), offset) {
                        return Some(found);
                    }
                }
            }
            None
        }
        search(self.declarations.iter(), offset)
    }

    /// Find a declaration by (possibly `::`-qualified) name, descending
    /// through namespaces and classes.
    pub fn find_by_name(&self, qualified: &str) -> Option<&Declaration> {
        let mut parts = qualified.split("::").peekable();
        let mut candidates: Vec<&Declaration> = self.declarations.iter().collect();
        while let Some(part) = parts.next() {
            let found = candidates.iter().copied().find(|d| d.name() == part)?;
            if parts.peek().is_none() {
                return Some(found);
            }
            candidates = found.children().collect();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{NamespaceDefinition, Typedef};
    use crate::types::TypeRef;
    use cxxm_core::text::TextSpan;

    fn sample() -> FileContent {
        let mut file = FileContent::new(FileId(0), "a.cpp");
        file.add_declaration(Declaration::Namespace(NamespaceDefinition {
            name: "N".into(),
            qualified_name: "N".into(),
            span: TextSpan::from_bounds(0, 40),
            members: vec![Declaration::Typedef(Typedef {
                name: "T".into(),
                span: TextSpan::from_bounds(14, 28),
                ty: TypeRef::builtin("int"),
            })],
        }));
        file
    }

    #[test]
    fn test_find_declaration_by_offset() {
        let file = sample();
        assert_eq!(file.find_declaration(0).map(|d| d.name()), Some("N"));
        assert_eq!(file.find_declaration(14).map(|d| d.name()), Some("T"));
        assert!(file.find_declaration(20).is_none());
    }

    #[test]
    fn test_find_by_name() {
        let file = sample();
        assert!(file.find_by_name("N::T").is_some());
        assert!(file.find_by_name("T").is_none());
        assert!(file.find_by_name("N::X").is_none());
    }

    #[test]
    fn test_includes_are_deduplicated() {
        let mut file = sample();
        file.add_include(FileId(1));
        file.add_include(FileId(1));
        assert_eq!(file.includes, vec![FileId(1)]);
    }
}
