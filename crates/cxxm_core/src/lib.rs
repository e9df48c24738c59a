//! cxxm_core: Core utilities shared by the C++ model builder.
//!
//! Provides string interning for identifiers, source spans and line maps,
//! and the hash collections used by the symbol table and the model store.

pub mod collections;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use intern::{InternedString, StringInterner};
pub use text::{LineMap, TextPos, TextSpan};
