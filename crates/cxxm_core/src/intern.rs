//! Identifier interning.
//!
//! Every identifier the tokenizer produces is interned once so that symbol
//! table keys and name comparisons are integer comparisons.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned identifier. A `u32`-sized handle into a [`StringInterner`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct InternedString(Spur);

impl InternedString {
    #[inline]
    pub fn from_spur(spur: Spur) -> Self {
        Self(spur)
    }

    #[inline]
    pub fn as_spur(self) -> Spur {
        self.0
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternedString({:?})", self.0)
    }
}

/// Thread-safe string interner.
///
/// Cloning is cheap: clones share the same underlying table, so a parse
/// session, its nested body parsers and the tokenizer all agree on handles.
#[derive(Clone)]
pub struct StringInterner {
    rodeo: Arc<ThreadedRodeo>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern a string, returning the existing handle if already present.
    #[inline]
    pub fn intern(&self, s: &str) -> InternedString {
        InternedString::from_spur(self.rodeo.get_or_intern(s))
    }

    #[inline]
    pub fn intern_static(&self, s: &'static str) -> InternedString {
        InternedString::from_spur(self.rodeo.get_or_intern_static(s))
    }

    /// Look up an already-interned string without interning it if absent.
    #[inline]
    pub fn get(&self, s: &str) -> Option<InternedString> {
        self.rodeo.get(s).map(InternedString::from_spur)
    }

    #[inline]
    pub fn resolve(&self, key: InternedString) -> &str {
        self.rodeo.resolve(&key.as_spur())
    }

    /// Join interned parts with a separator, e.g. name parts with `::`.
    pub fn join(&self, parts: &[InternedString], separator: &str) -> String {
        let mut out = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            out.push_str(self.resolve(*part));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let interner = StringInterner::new();
        let a = interner.intern("vector");
        let b = interner.intern("vector");
        let c = interner.intern("map");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "vector");
        assert_eq!(interner.resolve(c), "map");
    }

    #[test]
    fn test_get_does_not_intern() {
        let interner = StringInterner::new();
        assert!(interner.get("std").is_none());
        let a = interner.intern("std");
        assert_eq!(interner.get("std"), Some(a));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_clones_share_table() {
        let interner = StringInterner::new();
        let other = interner.clone();
        let a = interner.intern_static("Foo");
        assert_eq!(other.get("Foo"), Some(a));
    }

    #[test]
    fn test_join() {
        let interner = StringInterner::new();
        let parts = [interner.intern("A"), interner.intern("B"), interner.intern("f")];
        assert_eq!(interner.join(&parts, "::"), "A::B::f");
        assert_eq!(interner.join(&[], "::"), "");
    }
}
