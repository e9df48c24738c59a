//! cxxm_lexer: Tokenizer and inclusion-aware token stream for C++ sources.
//!
//! The scanner covers the C++ subset the model builder understands:
//! - identifiers, keywords and all punctuators (including `::`, `->`, `...`)
//! - integer, floating, character and string literals
//! - comments and preprocessor lines (only `#include "..."` is reported)
//!
//! [`TokenStream`] is the raw stream the parser's token cursor adapts: it
//! interleaves tokens with markers for entering and leaving included files.

mod scanner;
mod stream;
mod token;

pub use scanner::{IncludeDirective, ScanResult, Scanner};
pub use stream::{Inclusion, StreamItem, TokenStream};
pub use token::{Token, TokenKind};
