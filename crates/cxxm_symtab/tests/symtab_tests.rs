//! Symbol table integration tests.
//!
//! Exercises scope activation, reopening, lookup order and imports through
//! the public API only.

use cxxm_core::intern::{InternedString, StringInterner};
use cxxm_symtab::{EntryFlags, ScopeId, SymTabError, SymTabStack};

/// Helper: a fresh table without the `std` seed, and its interner.
fn empty_table() -> (SymTabStack, StringInterner) {
    let interner = StringInterner::new();
    (SymTabStack::new(interner.clone()), interner)
}

// ============================================================================
// Entering names
// ============================================================================

#[test]
fn test_enter_local_is_idempotent() {
    let (mut table, interner) = empty_table();
    let foo = interner.intern("Foo");
    let first = table.enter_local(foo);
    table.entry_mut(first).flags |= EntryFlags::IS_TYPE;
    let second = table.enter_local(foo);
    assert_eq!(first, second);
    assert!(table.entry(second).is_type());
    assert_eq!(table.scope(table.global()).len(), 1);
}

#[test]
fn test_entry_records_owner_scope() {
    let (mut table, interner) = empty_table();
    let inner = table.push();
    let x = table.enter_local(interner.intern("x"));
    assert_eq!(table.entry(x).owner, inner);
}

#[test]
fn test_entries_keep_insertion_order() {
    let (mut table, interner) = empty_table();
    for name in ["c", "a", "b"] {
        table.enter_local(interner.intern(name));
    }
    let names: Vec<&str> = table
        .scope(table.global())
        .entries()
        .map(|(name, _)| interner.resolve(name))
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

// ============================================================================
// Scope reopening
// ============================================================================

#[test]
fn test_reopened_scope_has_same_identity() {
    let (mut table, interner) = empty_table();
    let n = interner.intern("N");
    let first = table.push_named(n);
    let x = table.enter_local(interner.intern("x"));
    table.pop_named(n).unwrap();

    let second = table.push_named(n);
    assert_eq!(first, second);
    assert_eq!(table.lookup_local(interner.intern("x")), Some(x));
}

#[test]
fn test_same_name_under_other_parent_is_independent() {
    let (mut table, interner) = empty_table();
    let n = interner.intern("N");
    let outer = table.push_named(n);
    let nested = table.push_named(n);
    assert_ne!(outer, nested);
    assert_eq!(table.scope(nested).parent, Some(outer));
    table.pop().unwrap();
    table.pop().unwrap();
    assert_eq!(table.depth(), 1);
}

#[test]
fn test_push_scope_reactivates_nested_scope() {
    let (mut table, interner) = empty_table();
    let a = interner.intern("A");
    let f = interner.intern("f");
    let class_entry = table.enter_local(a);
    let class_scope = table.push_named(a);
    let member = table.enter_local(f);
    table.pop().unwrap();
    table.entry_mut(class_entry).nested_scope = Some(class_scope);

    assert!(table.lookup(f).is_none());
    let scope = table.entry(class_entry).nested_scope.unwrap();
    table.push_scope(scope);
    assert_eq!(table.lookup(f), Some(member));
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_lookup_searches_innermost_first() {
    let (mut table, interner) = empty_table();
    let t = interner.intern("T");
    let global_t = table.enter_local(t);
    table.push();
    table.push();
    let inner_t = table.enter_local(t);
    assert_eq!(table.lookup(t), Some(inner_t));
    table.pop().unwrap();
    assert_eq!(table.lookup(t), Some(global_t));
}

#[test]
fn test_lookup_of_unknown_name_is_none() {
    let (table, interner) = empty_table();
    assert!(table.lookup(interner.intern("nothing")).is_none());
    assert!(!table.is_type(interner.intern("nothing")));
}

#[test]
fn test_is_type_follows_flags() {
    let (mut table, interner) = empty_table();
    let t = interner.intern("T");
    let v = interner.intern("v");
    let entry = table.enter_local(t);
    table.entry_mut(entry).flags |= EntryFlags::IS_TYPE;
    table.enter_local(v);
    assert!(table.is_type(t));
    assert!(!table.is_type(v));
}

// ============================================================================
// Imports
// ============================================================================

#[test]
fn test_imported_entries_are_visible_locally() {
    let (mut table, interner) = empty_table();
    let base = interner.intern("Base");
    let derived = interner.intern("Derived");
    let g = interner.intern("g");

    let base_scope = table.push_named(base);
    let base_g = table.enter_local(g);
    table.pop().unwrap();

    table.push_named(derived);
    table.import_to_local(base_scope);
    assert_eq!(table.lookup_local(g), Some(base_g));
}

#[test]
fn test_own_entry_shadows_imported_entry() {
    let (mut table, interner) = empty_table();
    let base = interner.intern("Base");
    let g = interner.intern("g");

    let base_scope = table.push_named(base);
    let base_g = table.enter_local(g);
    table.pop().unwrap();

    table.push();
    table.import_to_local(base_scope);
    let own_g = table.enter_local(g);
    assert_ne!(own_g, base_g);
    assert_eq!(table.lookup_local(g), Some(own_g));
}

#[test]
fn test_import_is_not_duplicated() {
    let (mut table, interner) = empty_table();
    let a = table.push_named(interner.intern("A"));
    table.pop().unwrap();
    let b = table.push();
    table.import_to_local(a);
    table.import_to_local(a);
    table.import_to_local(b);
    assert_eq!(table.scope(b).imports(), &[a]);
}

// ============================================================================
// Errors and seeding
// ============================================================================

#[test]
fn test_pop_global_is_an_error() {
    let (mut table, _) = empty_table();
    assert_eq!(table.pop(), Err(SymTabError::PopGlobal));
}

#[test]
fn test_pop_named_reports_mismatch() {
    let (mut table, interner) = empty_table();
    table.push_named(interner.intern("A"));
    let err = table.pop_named(interner.intern("B")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "scope mismatch: expected to pop 'B', top scope is 'A'"
    );
    assert_eq!(table.depth(), 2);
}

#[test]
fn test_std_is_seeded_as_type_with_scope() {
    let interner = StringInterner::new();
    let table = SymTabStack::with_std_seed(interner.clone());
    let std_name = interner.intern("std");
    assert!(table.is_type(std_name));
    let entry = table.lookup(std_name).unwrap();
    let scope = table.entry(entry).nested_scope.unwrap();
    assert!(table.scope(scope).is_empty());
    assert_eq!(table.depth(), 1);
}

// ============================================================================
// Generated scope sequences
// ============================================================================

/// Helper: xorshift step, so every run walks the same sequences.
fn next(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

#[test]
fn test_generated_nesting_restores_depth_and_reopens_by_parent() {
    let (mut table, interner) = empty_table();
    let names: Vec<_> = ["A", "B", "N"].iter().map(|n| interner.intern(n)).collect();
    let mut created: Vec<(ScopeId, InternedString, ScopeId)> = Vec::new();
    let mut state = 0x2545_f491_4f6c_dd1d_u64;

    for round in 0..200 {
        let depth = table.depth();
        let current = table.current();
        let mut opened = Vec::new();
        for step in 0..40 {
            match next(&mut state) % 4 {
                0 => opened.push((table.push(), None)),
                1 => {
                    let name = names[(next(&mut state) % 3) as usize];
                    let parent = table.current();
                    let scope = table.push_named(name);
                    match created.iter().find(|(p, n, _)| *p == parent && *n == name) {
                        Some(&(_, _, earlier)) => assert_eq!(scope, earlier, "round {round} step {step}"),
                        None => created.push((parent, name, scope)),
                    }
                    opened.push((scope, Some(name)));
                }
                2 => {
                    let x = interner.intern(&format!("x{}", step % 5));
                    let first = table.enter_local(x);
                    assert_eq!(table.enter_local(x), first);
                }
                _ => {
                    if let Some((scope, name)) = opened.pop() {
                        let popped = match name {
                            Some(name) => table.pop_named(name),
                            None => table.pop(),
                        };
                        assert_eq!(popped, Ok(scope));
                    }
                }
            }
        }
        while let Some((scope, _)) = opened.pop() {
            assert_eq!(table.pop(), Ok(scope));
        }
        assert_eq!(table.depth(), depth);
        assert_eq!(table.current(), current);
    }
    assert_eq!(table.pop(), Err(SymTabError::PopGlobal));
}
