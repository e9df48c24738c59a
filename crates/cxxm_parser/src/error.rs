//! Faults raised by parser actions and the errors handed back to the grammar.

use crate::builders::BuilderKind;
use cxxm_core::text::TextPos;
use cxxm_diagnostics::{messages, DiagnosticMessage};
use cxxm_lexer::TokenKind;
use cxxm_symtab::SymTabError;
use thiserror::Error;

/// Malformed constructs the grammar is told about so it can recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecognitionFault {
    #[error("expected not empty declarator name")]
    EmptyDeclaratorName,
    #[error("case label is not within a switch statement")]
    DanglingCase,
    #[error("unfinished case")]
    UnfinishedCase,
    #[error("unrecognized function definition")]
    UnclassifiedFunctionBody,
    #[error("function definition has an empty name")]
    EmptyFunctionName,
    #[error("unexpected pointer operator")]
    UnexpectedPtrOperator,
}

impl RecognitionFault {
    pub fn message(self) -> &'static DiagnosticMessage {
        match self {
            RecognitionFault::EmptyDeclaratorName => &messages::EXPECTED_NOT_EMPTY_DECLARATOR_NAME,
            RecognitionFault::DanglingCase => &messages::CASE_LABEL_OUTSIDE_SWITCH,
            RecognitionFault::UnfinishedCase => &messages::UNFINISHED_CASE,
            RecognitionFault::UnclassifiedFunctionBody => &messages::UNRECOGNIZED_FUNCTION_DEFINITION,
            RecognitionFault::EmptyFunctionName => &messages::EMPTY_FUNCTION_NAME,
            RecognitionFault::UnexpectedPtrOperator => &messages::UNEXPECTED_PTR_OPERATOR,
        }
    }
}

/// Everything that can go wrong inside a callback implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionFault {
    #[error(transparent)]
    Recognition(#[from] RecognitionFault),
    #[error("expected {expected} builder on top, found {}", describe(.found))]
    UnexpectedBuilder {
        expected: BuilderKind,
        found: Option<BuilderKind>,
    },
    #[error(transparent)]
    SymTab(#[from] SymTabError),
    #[error("builder stack is empty")]
    EmptyBuilderStack,
    #[error("failed to create {0}")]
    Incomplete(&'static str),
}

impl ActionFault {
    pub fn unexpected(expected: BuilderKind, found: Option<BuilderKind>) -> Self {
        ActionFault::UnexpectedBuilder { expected, found }
    }

    /// Hard faults steer the grammar's error recovery; the rest are only
    /// recorded.
    pub fn is_hard(&self) -> bool {
        matches!(self, ActionFault::Recognition(_))
    }
}

fn describe(found: &Option<BuilderKind>) -> String {
    found.map_or_else(|| "nothing".to_string(), |kind| kind.to_string())
}

/// A fault converted at the dispatch boundary, as the grammar sees it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RecognitionError {
    /// Kind of the token the failing callback was invoked with.
    pub kind: Option<TokenKind>,
    pub offset: TextPos,
    pub text: String,
    pub message: String,
    pub hard: bool,
}
