//! Scope frames.

use crate::entry::EntryId;
use cxxm_core::collections::{FxHashMap, FxIndexMap};
use cxxm_core::intern::InternedString;

/// Index of a scope in its [`SymTabStack`](crate::SymTabStack).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u32);

/// A named or anonymous container of entries.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub name: Option<InternedString>,
    /// The scope that was innermost when this one was created.
    pub parent: Option<ScopeId>,
    pub(crate) entries: FxIndexMap<InternedString, EntryId>,
    /// Scopes whose entries are visible here without being owned here.
    pub(crate) imports: Vec<ScopeId>,
    /// Named scopes created while this one was innermost, for reopening.
    pub(crate) children: FxHashMap<InternedString, ScopeId>,
}

impl Scope {
    pub(crate) fn new(id: ScopeId, name: Option<InternedString>, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            name,
            parent,
            entries: FxIndexMap::default(),
            imports: Vec::new(),
            children: FxHashMap::default(),
        }
    }

    /// Entries owned by this scope, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (InternedString, EntryId)> + '_ {
        self.entries.iter().map(|(name, id)| (*name, *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn imports(&self) -> &[ScopeId] {
        &self.imports
    }
}
