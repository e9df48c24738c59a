//! Symbol table entries.

use crate::scope::ScopeId;
use bitflags::bitflags;
use cxxm_core::intern::InternedString;
use cxxm_model::DeclRef;

/// Index of an entry in its [`SymTabStack`](crate::SymTabStack).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) u32);

bitflags! {
    /// Boolean attributes of an entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntryFlags: u8 {
        /// The name denotes a type (class, enum, typedef, namespace, type
        /// template parameter).
        const IS_TYPE = 1 << 0;
        /// The name denotes a template.
        const IS_TEMPLATE = 1 << 1;
    }
}

/// A name in one scope and the attributes gathered for it so far.
#[derive(Debug, Clone)]
pub struct SymTabEntry {
    pub name: InternedString,
    /// The scope this entry was entered into.
    pub owner: ScopeId,
    pub flags: EntryFlags,
    /// The finalized model object, once known.
    pub definition: Option<DeclRef>,
    /// The scope this name introduces (class, namespace, enum).
    pub nested_scope: Option<ScopeId>,
}

impl SymTabEntry {
    pub(crate) fn new(name: InternedString, owner: ScopeId) -> Self {
        Self {
            name,
            owner,
            flags: EntryFlags::empty(),
            definition: None,
            nested_scope: None,
        }
    }

    #[inline]
    pub fn is_type(&self) -> bool {
        self.flags.contains(EntryFlags::IS_TYPE)
    }

    #[inline]
    pub fn is_template(&self) -> bool {
        self.flags.contains(EntryFlags::IS_TEMPLATE)
    }
}
