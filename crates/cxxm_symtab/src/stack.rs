//! The scope stack.

use crate::entry::{EntryFlags, EntryId, SymTabEntry};
use crate::scope::{Scope, ScopeId};
use cxxm_core::intern::{InternedString, StringInterner};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymTabError {
    #[error("cannot pop the global scope")]
    PopGlobal,
    #[error("scope mismatch: expected to pop '{expected}', top scope is '{found}'")]
    ScopeMismatch { expected: String, found: String },
}

/// The active chain of scopes plus every scope and entry ever created.
#[derive(Debug, Clone)]
pub struct SymTabStack {
    scopes: Vec<Scope>,
    entries: Vec<SymTabEntry>,
    active: Vec<ScopeId>,
    interner: StringInterner,
}

impl SymTabStack {
    /// Maximum import chain traversal depth to guard against import cycles.
    const MAX_IMPORT_DEPTH: u32 = 64;

    /// A table holding only the global scope.
    pub fn new(interner: StringInterner) -> Self {
        let global = Scope::new(ScopeId(0), None, None);
        Self {
            scopes: vec![global],
            entries: Vec::new(),
            active: vec![ScopeId(0)],
            interner,
        }
    }

    /// A table whose global scope carries the `std` seed entry: a type name
    /// with its own (empty) nested scope.
    pub fn with_std_seed(interner: StringInterner) -> Self {
        let mut table = Self::new(interner);
        let std_name = table.interner.intern_static("std");
        let entry = table.enter_local(std_name);
        let std_scope = table.push_named(std_name);
        // Only the global scope sits below, so this cannot fail.
        let _ = table.pop();
        let entry = table.entry_mut(entry);
        entry.flags |= EntryFlags::IS_TYPE;
        entry.nested_scope = Some(std_scope);
        table
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    // ========================================================================
    // Scope activation
    // ========================================================================

    /// Number of active scopes, the global scope included.
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current(&self) -> ScopeId {
        self.active.last().copied().unwrap_or(ScopeId(0))
    }

    /// Activate a new anonymous scope.
    pub fn push(&mut self) -> ScopeId {
        let id = self.new_scope(None);
        self.activate(id);
        id
    }

    /// Activate the scope named `name` under the current scope, reopening
    /// it if it was created there before.
    pub fn push_named(&mut self, name: InternedString) -> ScopeId {
        let current = self.current();
        let existing = self.scope(current).children.get(&name).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.new_scope(Some(name));
                self.scope_mut(current).children.insert(name, id);
                id
            }
        };
        self.activate(id);
        id
    }

    /// Reactivate an existing scope, e.g. the nested scope of a class entry.
    pub fn push_scope(&mut self, id: ScopeId) {
        self.activate(id);
    }

    /// Deactivate the innermost scope and return it.
    pub fn pop(&mut self) -> Result<ScopeId, SymTabError> {
        if self.active.len() <= 1 {
            return Err(SymTabError::PopGlobal);
        }
        let id = self.current();
        self.active.pop();
        trace!(scope = id.0, depth = self.active.len(), "pop scope");
        Ok(id)
    }

    /// Pop the innermost scope if it is the one named `name`. On mismatch
    /// nothing is popped.
    pub fn pop_named(&mut self, name: InternedString) -> Result<ScopeId, SymTabError> {
        let top = self.scope(self.current());
        if top.name != Some(name) {
            let found = top
                .name
                .map(|n| self.interner.resolve(n).to_string())
                .unwrap_or_else(|| "<anonymous>".to_string());
            return Err(SymTabError::ScopeMismatch {
                expected: self.interner.resolve(name).to_string(),
                found,
            });
        }
        self.pop()
    }

    fn new_scope(&mut self, name: Option<InternedString>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, name, Some(self.current())));
        id
    }

    fn activate(&mut self, id: ScopeId) {
        self.active.push(id);
        trace!(scope = id.0, depth = self.active.len(), "push scope");
    }

    // ========================================================================
    // Entries
    // ========================================================================

    /// Enter `name` into the current scope, reusing the entry if the scope
    /// already owns one with that name.
    pub fn enter_local(&mut self, name: InternedString) -> EntryId {
        self.enter_in(self.current(), name)
    }

    /// Enter `name` into `scope`, which need not be the innermost one (names
    /// declared under a template header belong to the scope enclosing the
    /// template parameters).
    pub fn enter_in(&mut self, scope: ScopeId, name: InternedString) -> EntryId {
        if let Some(&existing) = self.scope(scope).entries.get(&name) {
            return existing;
        }
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(SymTabEntry::new(name, scope));
        self.scope_mut(scope).entries.insert(name, id);
        trace!(name = self.interner.resolve(name), scope = scope.0, "enter local");
        id
    }

    /// Look `name` up from the innermost active scope outward.
    pub fn lookup(&self, name: InternedString) -> Option<EntryId> {
        self.active
            .iter()
            .rev()
            .find_map(|&scope| self.lookup_in(scope, name))
    }

    /// Look `name` up in the innermost active scope only (its own entries
    /// and the scopes imported into it).
    pub fn lookup_local(&self, name: InternedString) -> Option<EntryId> {
        self.lookup_in(self.current(), name)
    }

    /// Look `name` up in one scope: its own entries first, then imports.
    pub fn lookup_in(&self, scope: ScopeId, name: InternedString) -> Option<EntryId> {
        self.lookup_in_depth(scope, name, 0)
    }

    fn lookup_in_depth(&self, scope: ScopeId, name: InternedString, depth: u32) -> Option<EntryId> {
        let scope = self.scopes.get(scope.0 as usize)?;
        if let Some(&id) = scope.entries.get(&name) {
            return Some(id);
        }
        if depth >= Self::MAX_IMPORT_DEPTH {
            return None;
        }
        scope
            .imports
            .iter()
            .find_map(|&imported| self.lookup_in_depth(imported, name, depth + 1))
    }

    /// Resolve a qualified name part by part. A leading empty part (`::x`)
    /// starts from the global scope.
    pub fn lookup_qualified(&self, parts: &[InternedString]) -> Option<EntryId> {
        let empty = self.interner.get("");
        let (mut entry, rest) = match parts.split_first()? {
            (first, rest) if Some(*first) == empty => {
                let (second, rest) = rest.split_first()?;
                (self.lookup_in(self.global(), *second)?, rest)
            }
            (first, rest) => (self.lookup(*first)?, rest),
        };
        for part in rest {
            let scope = self.entry(entry).nested_scope?;
            entry = self.lookup_in(scope, *part)?;
        }
        Some(entry)
    }

    /// Make every entry of `other` visible in the current scope.
    pub fn import_to_local(&mut self, other: ScopeId) {
        let current = self.current();
        if other == current {
            return;
        }
        let scope = self.scope_mut(current);
        if !scope.imports.contains(&other) {
            scope.imports.push(other);
            trace!(from = other.0, into = current.0, "import scope");
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn entry(&self, id: EntryId) -> &SymTabEntry {
        &self.entries[id.0 as usize]
    }

    pub fn entry_mut(&mut self, id: EntryId) -> &mut SymTabEntry {
        &mut self.entries[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// The active scopes, outermost first.
    pub fn active_scopes(&self) -> &[ScopeId] {
        &self.active
    }

    /// Convenience: whether `name` currently resolves to a type.
    pub fn is_type(&self, name: InternedString) -> bool {
        self.lookup(name).is_some_and(|e| self.entry(e).is_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (SymTabStack, StringInterner) {
        let interner = StringInterner::new();
        (SymTabStack::new(interner.clone()), interner)
    }

    #[test]
    fn test_scope_management() {
        let (mut table, _) = table();
        assert_eq!(table.depth(), 1);
        table.push();
        assert_eq!(table.depth(), 2);
        table.push();
        assert_eq!(table.depth(), 3);
        assert!(table.pop().is_ok());
        assert!(table.pop().is_ok());
        assert_eq!(table.depth(), 1);
        assert_eq!(table.pop(), Err(SymTabError::PopGlobal));
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn test_std_seed() {
        let interner = StringInterner::new();
        let table = SymTabStack::with_std_seed(interner.clone());
        let entry = table.lookup(interner.intern("std")).expect("std entry");
        assert!(table.entry(entry).is_type());
        assert!(table.entry(entry).nested_scope.is_some());
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn test_pop_named_mismatch_keeps_scope() {
        let (mut table, interner) = table();
        let a = interner.intern("A");
        let b = interner.intern("B");
        table.push_named(a);
        let err = table.pop_named(b).unwrap_err();
        assert!(matches!(err, SymTabError::ScopeMismatch { .. }));
        assert_eq!(table.depth(), 2);
        assert!(table.pop_named(a).is_ok());
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn test_lookup_local_ignores_outer_scopes() {
        let (mut table, interner) = table();
        let x = interner.intern("x");
        table.enter_local(x);
        table.push();
        assert!(table.lookup(x).is_some());
        assert!(table.lookup_local(x).is_none());
    }

    #[test]
    fn test_inner_entry_shadows_outer() {
        let (mut table, interner) = table();
        let x = interner.intern("x");
        let outer = table.enter_local(x);
        table.push();
        let inner = table.enter_local(x);
        assert_ne!(outer, inner);
        assert_eq!(table.lookup(x), Some(inner));
        let _ = table.pop();
        assert_eq!(table.lookup(x), Some(outer));
    }

    #[test]
    fn test_import_cycle_terminates() {
        let (mut table, interner) = table();
        let a = interner.intern("A");
        let b = interner.intern("B");
        let sa = table.push_named(a);
        let _ = table.pop();
        let sb = table.push_named(b);
        table.import_to_local(sa);
        let _ = table.pop();
        table.push_scope(sa);
        table.import_to_local(sb);
        assert!(table.lookup_local(interner.intern("missing")).is_none());
    }

    #[test]
    fn test_lookup_qualified() {
        let (mut table, interner) = table();
        let outer = interner.intern("Outer");
        let inner = interner.intern("Inner");
        let leaf = interner.intern("leaf");
        let outer_entry = table.enter_local(outer);
        let outer_scope = table.push_named(outer);
        let inner_entry = table.enter_local(inner);
        let inner_scope = table.push_named(inner);
        let leaf_entry = table.enter_local(leaf);
        let _ = table.pop();
        let _ = table.pop();
        table.entry_mut(outer_entry).nested_scope = Some(outer_scope);
        table.entry_mut(inner_entry).nested_scope = Some(inner_scope);

        assert_eq!(table.lookup_qualified(&[outer, inner, leaf]), Some(leaf_entry));
        let global = interner.intern("");
        assert_eq!(table.lookup_qualified(&[global, outer]), Some(outer_entry));
        assert_eq!(table.lookup_qualified(&[inner]), None);
    }
}
