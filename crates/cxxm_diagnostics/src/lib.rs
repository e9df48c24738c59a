//! cxxm_diagnostics: Diagnostic messages and error records.
//!
//! Every anomaly the tokenizer, the grammar driver or the parser actions
//! report ends up as a [`Diagnostic`] persisted on the parse content of the
//! file it occurred in. Messages are kept in one catalogue ([`messages`]) so
//! codes stay stable.

use cxxm_core::text::TextSpan;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Message => write!(f, "message"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// The file path where this diagnostic occurred, if any.
    pub file: Option<String>,
    /// The offending token's span, if any.
    pub span: Option<TextSpan>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    pub fn with_location(
        file: impl Into<String>,
        span: TextSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file.into()),
            span: Some(span),
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    /// Attach a span to a diagnostic created without one.
    pub fn at(mut self, span: TextSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.start)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} CXX{}: {}", self.category, self.code, self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Diagnostics accumulated for one file or one phase.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort diagnostics by file and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.file.cmp(&b.file).then_with(|| {
                let a_pos = a.span.map(|s| s.start).unwrap_or(0);
                let b_pos = b.span.map(|s| s.start).unwrap_or(0);
                a_pos.cmp(&b_pos)
            })
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
        ($code:expr, Message, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Message, message: $msg }
        };
    }

    // ========================================================================
    // Tokenizer (1000-1099)
    // ========================================================================
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1002, Error, "Unterminated string literal.");
    pub const UNTERMINATED_CHARACTER_LITERAL: DiagnosticMessage = diag!(1003, Error, "Unterminated character literal.");
    pub const UNTERMINATED_COMMENT: DiagnosticMessage = diag!(1004, Error, "'*/' expected.");
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!(1005, Error, "Invalid character '{0}'.");

    // ========================================================================
    // Grammar driver (1100-1199)
    // ========================================================================
    pub const _0_EXPECTED: DiagnosticMessage = diag!(1100, Error, "'{0}' expected.");
    pub const DECLARATION_EXPECTED: DiagnosticMessage = diag!(1101, Error, "Declaration expected.");
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = diag!(1102, Error, "Expression expected.");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(1103, Error, "Identifier expected.");
    pub const UNEXPECTED_TOKEN_0: DiagnosticMessage = diag!(1104, Error, "Unexpected token '{0}'.");
    pub const MAXIMUM_NESTING_DEPTH_EXCEEDED: DiagnosticMessage = diag!(1105, Error, "Maximum nesting depth exceeded.");

    // ========================================================================
    // Parser actions, hard recognition errors (2000-2099)
    // ========================================================================
    pub const EXPECTED_NOT_EMPTY_DECLARATOR_NAME: DiagnosticMessage = diag!(2000, Error, "Expected not empty declarator name.");
    pub const CASE_LABEL_OUTSIDE_SWITCH: DiagnosticMessage = diag!(2001, Error, "Case label is not within a switch statement.");
    pub const UNFINISHED_CASE: DiagnosticMessage = diag!(2002, Error, "Unfinished case.");
    pub const UNRECOGNIZED_FUNCTION_DEFINITION: DiagnosticMessage = diag!(2003, Error, "Unrecognized function definition.");
    pub const EMPTY_FUNCTION_NAME: DiagnosticMessage = diag!(2004, Error, "Function definition has an empty name.");
    pub const UNEXPECTED_PTR_OPERATOR: DiagnosticMessage = diag!(2005, Error, "Unexpected pointer operator.");

    // ========================================================================
    // Parser actions, converted internal faults (2100-2199)
    // ========================================================================
    pub const ACTION_FAULT_0_AT_1: DiagnosticMessage = diag!(2100, Error, "{0} at '{1}'");
    pub const ACTION_FAULT_0: DiagnosticMessage = diag!(2101, Error, "{0}");

    // ========================================================================
    // Inclusion (3000-3099)
    // ========================================================================
    pub const CANNOT_OPEN_INCLUDE_0: DiagnosticMessage = diag!(3000, Warning, "Cannot open include file '{0}'.");
    pub const INCLUDE_CYCLE_0: DiagnosticMessage = diag!(3001, Warning, "Include of '{0}' skipped: already being included.");
    pub const PARSED_0_DEFERRED_BODIES: DiagnosticMessage = diag!(3002, Message, "Parsed {0} deferred member bodies.");
}
