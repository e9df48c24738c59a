//! The model store: all parsed files and the logical namespace index.

use crate::decl::{DeclRef, Declaration, FileId, NamespaceDefinition};
use crate::file::FileContent;
use cxxm_core::collections::{FxHashMap, FxIndexMap};
use serde::Serialize;

/// All `namespace X { ... }` blocks sharing one qualified name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogicalNamespace {
    pub qualified_name: String,
    /// One entry per namespace block.
    pub definitions: Vec<DeclRef>,
    /// Members of every block, in registration order.
    pub members: Vec<DeclRef>,
}

impl LogicalNamespace {
    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ModelStore {
    files: Vec<FileContent>,
    #[serde(skip)]
    by_path: FxHashMap<String, FileId>,
    namespaces: FxIndexMap<String, LogicalNamespace>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of the file at `path`, creating its content on first use.
    pub fn file_id(&mut self, path: &str) -> FileId {
        if let Some(&id) = self.by_path.get(path) {
            return id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(FileContent::new(id, path));
        self.by_path.insert(path.to_string(), id);
        id
    }

    pub fn lookup_file(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn file(&self, id: FileId) -> Option<&FileContent> {
        self.files.get(id.0 as usize)
    }

    pub fn file_mut(&mut self, id: FileId) -> Option<&mut FileContent> {
        self.files.get_mut(id.0 as usize)
    }

    pub fn files(&self) -> &[FileContent] {
        &self.files
    }

    /// Record one finished namespace block in the logical namespace index.
    pub fn register_namespace(&mut self, file: FileId, definition: &NamespaceDefinition) {
        let namespace = self
            .namespaces
            .entry(definition.qualified_name.clone())
            .or_insert_with(|| LogicalNamespace {
                qualified_name: definition.qualified_name.clone(),
                ..Default::default()
            });
        namespace.definitions.push(DeclRef {
            file,
            offset: definition.span.start,
            kind: crate::decl::DeclKind::Namespace,
            name: definition.name.clone(),
        });
        namespace
            .members
            .extend(definition.members.iter().map(|m| m.decl_ref(file)));
    }

    pub fn namespace(&self, qualified_name: &str) -> Option<&LogicalNamespace> {
        self.namespaces.get(qualified_name)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &LogicalNamespace> {
        self.namespaces.values()
    }

    /// Resolve a reference to the declaration it points at.
    pub fn resolve(&self, decl: &DeclRef) -> Option<&Declaration> {
        self.file(decl.file)?.find_declaration(decl.offset)
    }

    /// Total number of recorded parse errors across files.
    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.error_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Typedef;
    use crate::types::TypeRef;
    use cxxm_core::text::TextSpan;

    fn block(start: u32, member: &str) -> NamespaceDefinition {
        NamespaceDefinition {
            name: "N".into(),
            qualified_name: "N".into(),
            span: TextSpan::new(start, 30),
            members: vec![Declaration::Typedef(Typedef {
                name: member.into(),
                span: TextSpan::new(start + 14, 10),
                ty: TypeRef::builtin("int"),
            })],
        }
    }

    #[test]
    fn test_file_ids_are_stable() {
        let mut store = ModelStore::new();
        let a = store.file_id("a.cpp");
        let b = store.file_id("b.h");
        assert_ne!(a, b);
        assert_eq!(store.file_id("a.cpp"), a);
        assert_eq!(store.lookup_file("b.h"), Some(b));
        assert_eq!(store.file(b).map(|f| f.path.as_str()), Some("b.h"));
    }

    #[test]
    fn test_reopened_namespace_blocks_merge() {
        let mut store = ModelStore::new();
        let file = store.file_id("a.cpp");
        store.register_namespace(file, &block(0, "A"));
        store.register_namespace(file, &block(40, "B"));

        let ns = store.namespace("N").expect("namespace N");
        assert_eq!(ns.definitions.len(), 2);
        assert!(ns.has_member("A"));
        assert!(ns.has_member("B"));
        assert_eq!(store.namespaces().count(), 1);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut store = ModelStore::new();
        let file = store.file_id("a.cpp");
        store.register_namespace(file, &block(0, "A"));
        let json = serde_json::to_value(&store).expect("serializable");
        assert_eq!(json["files"][0]["path"], "a.cpp");
        assert_eq!(json["namespaces"]["N"]["members"][0]["name"], "A");
    }
}
