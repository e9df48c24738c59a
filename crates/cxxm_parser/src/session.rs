//! The parse session: everything one translation unit's parse mutates.

use crate::context::BuilderContext;
use crate::cursor::{InclusionEvent, TokenCursor};
use crate::error::RecognitionError;
use crate::grammar::Grammar;
use cxxm_core::intern::StringInterner;
use cxxm_diagnostics::{messages, Diagnostic, DiagnosticMessage};
use cxxm_lexer::{Scanner, Token, TokenStream};
use cxxm_model::{FileId, ModelStore};
use cxxm_options::ParserOptions;
use cxxm_symtab::{ScopeId, SymTabStack};
use tracing::{debug, warn};

/// Frames the grammar left open and the session discarded: builders and
/// scopes still pushed when a deferred body or the translation unit ended.
/// Zero after any well-nested input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeftoverFrames {
    pub builders: usize,
    pub scopes: usize,
}

impl LeftoverFrames {
    pub fn is_empty(&self) -> bool {
        self.builders == 0 && self.scopes == 0
    }
}

/// Owns the symbol table, the builder stack, the file-context stack and the
/// model being built. Every parser action is a method on the session, so
/// nested parsers (deferred bodies) reenter the same state explicitly.
pub struct ParseSession {
    pub(crate) interner: StringInterner,
    pub(crate) options: ParserOptions,
    pub(crate) symtab: SymTabStack,
    pub(crate) builders: BuilderContext,
    /// Open files, the main file at the bottom.
    pub(crate) files: Vec<FileId>,
    pub(crate) store: ModelStore,
    /// Open template argument lists.
    pub(crate) template_depth: u32,
    /// One frame per open template declaration; `Some` holds the scope of
    /// its parameters.
    pub(crate) template_frames: Vec<Option<ScopeId>>,
    /// The grammar's error channel, shared by nested parsers.
    pub(crate) errors: Vec<RecognitionError>,
    pub(crate) deferred_parsed: usize,
    pub(crate) leftover: LeftoverFrames,
}

impl ParseSession {
    pub fn new(options: ParserOptions, interner: StringInterner) -> Self {
        let symtab = if options.seed_std_namespace {
            SymTabStack::with_std_seed(interner.clone())
        } else {
            SymTabStack::new(interner.clone())
        };
        Self {
            interner,
            options,
            symtab,
            builders: BuilderContext::new(),
            files: Vec::new(),
            store: ModelStore::new(),
            template_depth: 0,
            template_frames: Vec::new(),
            errors: Vec::new(),
            deferred_parsed: 0,
            leftover: LeftoverFrames::default(),
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Parse one translation unit whose tokens (inclusions already spliced)
    /// are in `stream`.
    #[tracing::instrument(skip_all, fields(path = %path))]
    pub fn parse_translation_unit(&mut self, path: &str, stream: TokenStream) -> FileId {
        let file = self.store.file_id(path);
        self.files.clear();
        self.files.push(file);
        self.leftover = LeftoverFrames::default();
        let cursor = TokenCursor::new(stream, &self.interner);
        Grammar::new(self, cursor).translation_unit();
        self.finish(file);
        file
    }

    /// Scan and parse `text`. Include directives are not expanded.
    pub fn parse_source(&mut self, path: &str, text: &str) -> FileId {
        let scan = Scanner::new(text, self.interner.clone()).tokenize();
        let file = self.store.file_id(path);
        if let Some(content) = self.store.file_mut(file) {
            for mut diagnostic in scan.diagnostics.into_diagnostics() {
                diagnostic.file = Some(path.to_string());
                content.add_error(diagnostic);
            }
        }
        self.parse_translation_unit(path, TokenStream::from_tokens(scan.tokens))
    }

    /// Restore the stacks to their idle state after the grammar returned.
    fn finish(&mut self, file: FileId) {
        let dropped = self.builders.truncate(0);
        if dropped > 0 {
            warn!(dropped, "builders left open at end of translation unit");
        }
        self.leftover.builders += dropped;
        while self.symtab.depth() > 1 {
            if self.symtab.pop().is_err() {
                break;
            }
            self.leftover.scopes += 1;
        }
        self.files.truncate(1);
        self.template_frames.clear();
        self.template_depth = 0;
        if self.deferred_parsed > 0 {
            let count = self.deferred_parsed.to_string();
            self.report(Diagnostic::new(&messages::PARSED_0_DEFERRED_BODIES, &[&count]));
        }
        debug!(file = file.0, errors = self.errors.len(), "translation unit parsed");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn symtab(&self) -> &SymTabStack {
        &self.symtab
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn into_store(self) -> ModelStore {
        self.store
    }

    /// Depth of the builder context stack.
    pub fn builder_depth(&self) -> usize {
        self.builders.depth()
    }

    /// Frames discarded while parsing the last translation unit.
    pub fn leftover_frames(&self) -> LeftoverFrames {
        self.leftover
    }

    /// Recognition errors reported to the grammar so far.
    pub fn recognition_errors(&self) -> &[RecognitionError] {
        &self.errors
    }

    pub fn current_file(&self) -> FileId {
        self.files.last().copied().unwrap_or(FileId(0))
    }

    /// Number of open files; 1 while only the main file is open.
    pub fn inclusion_depth(&self) -> usize {
        self.files.len()
    }

    // ========================================================================
    // File context
    // ========================================================================

    /// Enter an included file. Declarations finalized from now on are
    /// registered in its content.
    pub fn push_file(&mut self, path: &str) {
        let included = self.store.file_id(path);
        let includer = self.current_file();
        if let Some(content) = self.store.file_mut(includer) {
            content.add_include(included);
        }
        self.files.push(included);
        debug!(path, depth = self.files.len(), "push file");
    }

    /// Leave the innermost included file. The main file is never popped.
    pub fn pop_file(&mut self) {
        if self.files.len() > 1 {
            self.files.pop();
            debug!(depth = self.files.len(), "pop file");
        } else {
            warn!("unbalanced end of included file");
        }
    }

    pub(crate) fn apply_inclusions(&mut self, events: Vec<InclusionEvent>) {
        for event in events {
            match event {
                InclusionEvent::Enter(path) => self.push_file(&path),
                InclusionEvent::Exit(_) => self.pop_file(),
            }
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Persist a diagnostic on the current file.
    pub(crate) fn report(&mut self, mut diagnostic: Diagnostic) {
        let file = self.current_file();
        if let Some(content) = self.store.file_mut(file) {
            if diagnostic.file.is_none() {
                diagnostic.file = Some(content.path.clone());
            }
            content.add_error(diagnostic);
        }
    }

    /// A syntax error found by the grammar itself.
    pub fn syntax_error(&mut self, token: Token, message: &DiagnosticMessage, args: &[&str]) {
        self.report(Diagnostic::new(message, args).at(token.span()));
        self.errors.push(RecognitionError {
            kind: Some(token.kind),
            offset: token.offset,
            text: self.interner.resolve(token.text).to_string(),
            message: cxxm_diagnostics::format_message(message.message, args),
            hard: false,
        });
    }
}
