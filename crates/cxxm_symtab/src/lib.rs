//! cxxm_symtab: The scoped symbol table consulted during parsing.
//!
//! A stack of scope frames over an arena of scopes and entries. Scopes are
//! never freed while the table lives: a popped scope can be reactivated
//! through the entry that introduced it (`NESTED_SCOPE`) or reopened by name
//! under the same enclosing scope. Entries are never deleted.
//!
//! Lookups never fail loudly; absence is `None` and callers treat it as
//! "not a type".

mod entry;
mod scope;
mod stack;

pub use entry::{EntryFlags, EntryId, SymTabEntry};
pub use scope::{Scope, ScopeId};
pub use stack::{SymTabError, SymTabStack};
