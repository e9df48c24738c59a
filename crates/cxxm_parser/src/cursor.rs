//! The token cursor adapter.
//!
//! Flattens a [`TokenStream`] into an inclusion-free token vector. The
//! inclusion markers are kept aside, keyed by the index of the first token
//! that follows them, and are handed out by [`TokenCursor::sync_inclusions`]
//! once the cursor has moved past them. Lookahead, `mark` and `rewind` never
//! report markers, so speculative scans see a flat sequence and fire no
//! file-context side effects.

use cxxm_core::intern::StringInterner;
use cxxm_lexer::{StreamItem, Token, TokenKind, TokenStream};

/// A file-context transition the caller must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionEvent {
    Enter(String),
    Exit(String),
}

impl InclusionEvent {
    fn inverse(&self) -> InclusionEvent {
        match self {
            InclusionEvent::Enter(path) => InclusionEvent::Exit(path.clone()),
            InclusionEvent::Exit(path) => InclusionEvent::Enter(path.clone()),
        }
    }
}

#[derive(Debug, Clone)]
struct Marker {
    /// Index of the first token after the marker.
    index: usize,
    event: InclusionEvent,
}

#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    markers: Vec<Marker>,
    pos: usize,
    /// Number of markers already reported.
    synced: usize,
    eof: Token,
}

impl TokenCursor {
    pub fn new(stream: TokenStream, interner: &StringInterner) -> Self {
        let mut tokens = Vec::with_capacity(stream.token_count());
        let mut markers = Vec::new();
        let mut open: Vec<String> = Vec::new();
        for item in stream.into_items() {
            match item {
                StreamItem::Token(token) => tokens.push(token),
                StreamItem::EnterFile(path) => {
                    open.push(path.clone());
                    markers.push(Marker {
                        index: tokens.len(),
                        event: InclusionEvent::Enter(path),
                    });
                }
                StreamItem::ExitFile => {
                    let path = open.pop().unwrap_or_default();
                    markers.push(Marker {
                        index: tokens.len(),
                        event: InclusionEvent::Exit(path),
                    });
                }
            }
        }
        Self::build(tokens, markers, interner)
    }

    /// A cursor over plain tokens, e.g. a captured function body.
    pub fn from_tokens(tokens: Vec<Token>, interner: &StringInterner) -> Self {
        Self::build(tokens, Vec::new(), interner)
    }

    fn build(tokens: Vec<Token>, markers: Vec<Marker>, interner: &StringInterner) -> Self {
        let end = tokens.last().map_or(0, |t| t.end);
        let eof = Token::new(TokenKind::EndOfFile, interner.intern(""), end, end);
        Self {
            tokens,
            markers,
            pos: 0,
            synced: 0,
            eof,
        }
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    /// The `i`-th token ahead, 1-based. Past the end this is end-of-file.
    #[inline]
    pub fn lt(&self, i: usize) -> Token {
        debug_assert!(i >= 1);
        self.tokens
            .get(self.pos + i.saturating_sub(1))
            .copied()
            .unwrap_or(self.eof)
    }

    #[inline]
    pub fn la(&self, i: usize) -> TokenKind {
        self.lt(i).kind
    }

    /// The last consumed token.
    pub fn previous(&self) -> Option<Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)).copied()
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Consume and return the current token. At the end this returns the
    /// end-of-file token and does not move.
    pub fn consume(&mut self) -> Token {
        let token = self.lt(1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn rewind(&mut self, mark: usize) {
        self.pos = mark.min(self.tokens.len());
    }

    pub fn tokens_between(&self, start: usize, end: usize) -> &[Token] {
        let end = end.min(self.tokens.len());
        &self.tokens[start.min(end)..end]
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// File-context transitions between the last sync point and the current
    /// position, in the order they must be applied. Moving backwards yields
    /// the inverse transitions in reverse order.
    pub fn sync_inclusions(&mut self) -> Vec<InclusionEvent> {
        let mut events = Vec::new();
        while let Some(marker) = self.markers.get(self.synced) {
            if marker.index > self.pos {
                break;
            }
            events.push(marker.event.clone());
            self.synced += 1;
        }
        while self.synced > 0 && self.markers[self.synced - 1].index > self.pos {
            self.synced -= 1;
            events.push(self.markers[self.synced].event.inverse());
        }
        events
    }
}
