//! cxxm_parser: parser actions and a recursive-descent driver for a C++
//! subset.
//!
//! The grammar in [`grammar`] recognizes constructs and reports their
//! boundaries to a [`ParseSession`]. The session's actions keep a scoped
//! symbol table and a stack of builders, and attach finished declarations
//! to the file model. Member function bodies defined inside a class are
//! parsed once the class is complete.

pub mod action;
mod builders;
mod context;
mod cursor;
mod deferred;
mod error;
pub mod grammar;
mod precedence;
mod predicates;
mod session;
mod utilities;

pub use builders::{Builder, BuilderKind, NamePart, QualifiedName, Specifiers, TypeKey};
pub use context::BuilderContext;
pub use cursor::{InclusionEvent, TokenCursor};
pub use error::{ActionFault, RecognitionError, RecognitionFault};
pub use grammar::Grammar;
pub use predicates::IdentifierKind;
pub use session::{LeftoverFrames, ParseSession};
