//! cxxm_model: The immutable semantic model produced by the parser actions.
//!
//! Builders in `cxxm_parser` accumulate state while the grammar runs and
//! finalize into the values defined here. Finalized values are owned by
//! their parent (namespace members, class members, statement lists) or by
//! the [`FileContent`] of the file they were declared in. Cross references
//! (symbol-table definitions, resolved references) use [`DeclRef`].

mod decl;
mod file;
mod stmt;
mod store;
mod types;

pub use decl::*;
pub use file::FileContent;
pub use stmt::{Condition, Expression, Reference, Statement};
pub use store::{LogicalNamespace, ModelStore};
pub use types::{ClassKind, TypeRef, Visibility};
