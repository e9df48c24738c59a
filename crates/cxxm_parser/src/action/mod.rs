//! Parser actions.
//!
//! The grammar reports every construct boundary to the session through one
//! method per construct: an "enter" callback that pushes a builder and an
//! "exit" callback that pops and finalizes it, with refinement callbacks in
//! between. Each public callback runs its body through
//! [`ParseSession::dispatch`], the single point where an [`ActionFault`]
//! becomes a persisted diagnostic and a [`RecognitionError`] for the grammar.
//! No fault escapes as a panic.

mod class;
mod declaration;
mod namespace;
mod statement;

pub use class::BaseModifier;
pub use declaration::{
    CvQualifier, DeclarationDelimiter, ParameterListPart, PtrOperator, TemplateArgumentList,
    TemplateKind, TypeParameterKind,
};
pub use statement::{IterationPart, LabelKind, SelectionPart};

use crate::builders::{Builder, StatementKind};
use crate::error::{ActionFault, RecognitionError};
use crate::session::ParseSession;
use cxxm_core::intern::InternedString;
use cxxm_diagnostics::{messages, Diagnostic};
use cxxm_lexer::Token;
use cxxm_model::{DeclRef, Declaration, FileId, Statement};
use cxxm_symtab::{EntryFlags, EntryId, ScopeId};
use tracing::{trace, warn};

impl ParseSession {
    // ========================================================================
    // Dispatch boundary
    // ========================================================================

    /// Run one callback body. A fault is persisted on the current file,
    /// queued on the grammar's error channel and returned.
    pub(crate) fn dispatch(
        &mut self,
        token: Token,
        action: impl FnOnce(&mut Self) -> Result<(), ActionFault>,
    ) -> Result<(), RecognitionError> {
        action(self).map_err(|fault| self.relay(Some(token), fault))
    }

    /// Like [`dispatch`](Self::dispatch) for callbacks that carry no token.
    pub(crate) fn dispatch_unlocated(
        &mut self,
        action: impl FnOnce(&mut Self) -> Result<(), ActionFault>,
    ) -> Result<(), RecognitionError> {
        action(self).map_err(|fault| self.relay(None, fault))
    }

    fn relay(&mut self, token: Option<Token>, fault: ActionFault) -> RecognitionError {
        let text = token
            .map(|t| self.interner.resolve(t.text).to_string())
            .unwrap_or_default();
        let hard = fault.is_hard();
        let diagnostic = match (&fault, token) {
            (ActionFault::Recognition(kind), _) => Diagnostic::new(kind.message(), &[]),
            (other, Some(_)) => {
                warn!(fault = %other, token = %text, "parser action fault");
                Diagnostic::new(&messages::ACTION_FAULT_0_AT_1, &[&other.to_string(), &text])
            }
            (other, None) => {
                warn!(fault = %other, "parser action fault");
                Diagnostic::new(&messages::ACTION_FAULT_0, &[&other.to_string()])
            }
        };
        let message = diagnostic.message_text.clone();
        match token {
            Some(token) => self.report(diagnostic.at(token.span())),
            None => self.report(diagnostic),
        }
        let error = RecognitionError {
            kind: token.map(|t| t.kind),
            offset: token.map_or(0, |t| t.offset),
            text,
            message,
            hard,
        };
        self.errors.push(error.clone());
        error
    }

    // ========================================================================
    // Symbol table helpers
    // ========================================================================

    /// The scope names of the current declaration go into: the innermost
    /// active scope that does not hold template parameters.
    pub(crate) fn declaring_scope(&self) -> ScopeId {
        self.symtab
            .active_scopes()
            .iter()
            .rev()
            .copied()
            .find(|scope| !self.template_frames.contains(&Some(*scope)))
            .unwrap_or_else(|| self.symtab.global())
    }

    /// Enter `name` into the declaring scope and add `flags`.
    pub(crate) fn declare(&mut self, name: InternedString, flags: EntryFlags) -> EntryId {
        let scope = self.declaring_scope();
        let entry = self.symtab.enter_in(scope, name);
        self.symtab.entry_mut(entry).flags |= flags;
        entry
    }

    /// Record the finalized object of an entry. The first definition wins.
    pub(crate) fn define(&mut self, entry: EntryId, definition: DeclRef) {
        let entry = self.symtab.entry_mut(entry);
        if entry.definition.is_none() {
            entry.definition = Some(definition);
        }
    }

    // ========================================================================
    // Builder helpers
    // ========================================================================

    /// Take the template descriptor sitting on top of the stack, if any. An
    /// explicit instantiation yields no descriptor.
    pub(crate) fn take_template(&mut self) -> Option<cxxm_model::TemplateDescriptor> {
        match self.builders.top() {
            Some(Builder::TemplateDescriptor(_)) => {}
            _ => return None,
        }
        let descriptor = self.builders.pop_template_descriptor().ok()?;
        (!descriptor.instantiation).then(|| descriptor.create())
    }

    /// Name of the innermost class being built.
    pub(crate) fn enclosing_class_name(&self) -> Option<InternedString> {
        self.builders.iter_from_top().find_map(|builder| match builder {
            Builder::Class(class) => Some(class.name),
            _ => None,
        })?
    }

    /// Hand a finished declaration to its container: the nearest class,
    /// namespace or declaration statement, or the current file when there
    /// is none. Declaration-level frames in between are skipped.
    pub(crate) fn attach_declaration(&mut self, declaration: Declaration) {
        let file = self.current_file();
        for builder in self.builders.iter_from_top_mut() {
            match builder {
                Builder::Class(class) => {
                    class.add_member(declaration);
                    return;
                }
                Builder::Namespace(namespace) => {
                    register_object(&mut self.store, file, &declaration);
                    namespace.members.push(declaration);
                    return;
                }
                Builder::Statement(statement) => {
                    if let StatementKind::Declaration { declarations } = &mut statement.kind {
                        declarations.push(declaration);
                    } else {
                        trace!(name = declaration.name(), "declaration outside a container dropped");
                    }
                    return;
                }
                Builder::SimpleDeclaration(_) | Builder::Type(_) | Builder::TemplateDescriptor(_) => {}
                other => {
                    trace!(
                        name = declaration.name(),
                        container = %other.kind(),
                        "declaration outside a container dropped"
                    );
                    return;
                }
            }
        }
        register_object(&mut self.store, file, &declaration);
        if let Some(content) = self.store.file_mut(file) {
            content.add_declaration(declaration);
        }
    }

    /// Hand a finished statement to the function or statement on top.
    pub(crate) fn attach_statement(&mut self, statement: Statement) {
        match self.builders.top_mut() {
            Some(Builder::Function(function)) => function.body = Some(statement),
            Some(Builder::Statement(parent)) => {
                if !parent.accept_statement(statement) {
                    trace!("statement without a slot dropped");
                }
            }
            _ => trace!("statement outside a function dropped"),
        }
    }
}

fn register_object(store: &mut cxxm_model::ModelStore, file: FileId, declaration: &Declaration) {
    if let Some(content) = store.file_mut(file) {
        let object = declaration.decl_ref(file);
        trace!(name = %object.name, kind = %object.kind, offset = object.offset, "register object");
        content.objects.insert(object.offset, object);
    }
}
