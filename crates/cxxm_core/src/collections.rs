//! Hash collections used by the symbol table and the model store.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

pub use rustc_hash::{FxHashMap, FxHashSet};

/// Insertion-ordered map with the Fx hasher. Used wherever iteration order
/// must follow declaration order (scope entries, logical namespaces).
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Insertion-ordered set with the Fx hasher.
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;
