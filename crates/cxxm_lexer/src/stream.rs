//! The raw token stream with file-inclusion markers.

use crate::token::Token;

/// One element of a raw token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Token(Token),
    /// Tokens up to the matching [`StreamItem::ExitFile`] come from `path`.
    EnterFile(String),
    ExitFile,
}

/// An included file's tokens, to be spliced before the top-level token at
/// `position`.
#[derive(Debug, Clone)]
pub struct Inclusion {
    pub position: usize,
    pub path: String,
    pub stream: TokenStream,
}

/// A flat sequence of tokens interleaved with balanced inclusion markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    items: Vec<StreamItem>,
}

impl TokenStream {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            items: tokens.into_iter().map(StreamItem::Token).collect(),
        }
    }

    /// Build a stream from a file's own tokens and the inclusions found in
    /// it. Inclusion positions count the file's own tokens only.
    pub fn assemble(tokens: Vec<Token>, mut inclusions: Vec<Inclusion>) -> Self {
        let mut stream = Self::from_tokens(tokens);
        // Splice from the back so earlier positions stay valid.
        inclusions.sort_by(|a, b| b.position.cmp(&a.position));
        for inclusion in inclusions {
            stream.splice_include(inclusion.position, inclusion.path, inclusion.stream);
        }
        stream
    }

    /// Insert `included` wrapped in boundary markers before the
    /// `position`-th token of this stream (or at the end).
    pub fn splice_include(&mut self, position: usize, path: String, included: TokenStream) {
        let at = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| matches!(item, StreamItem::Token(_)))
            .nth(position)
            .map(|(index, _)| index)
            .unwrap_or(self.items.len());
        let mut spliced = Vec::with_capacity(included.items.len() + 2);
        spliced.push(StreamItem::EnterFile(path));
        spliced.extend(included.items);
        spliced.push(StreamItem::ExitFile);
        self.items.splice(at..at, spliced);
    }

    pub fn items(&self) -> &[StreamItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<StreamItem> {
        self.items
    }

    /// Number of real tokens, markers excluded.
    pub fn token_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, StreamItem::Token(_)))
            .count()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.items.iter().filter_map(|item| match item {
            StreamItem::Token(token) => Some(token),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;
    use cxxm_core::intern::StringInterner;

    fn tokens(interner: &StringInterner, names: &[&str]) -> Vec<Token> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Token::new(TokenKind::Identifier, interner.intern(n), i as u32, i as u32 + 1))
            .collect()
    }

    #[test]
    fn test_splice_places_markers_around_included_tokens() {
        let interner = StringInterner::new();
        let mut stream = TokenStream::from_tokens(tokens(&interner, &["a", "b"]));
        let header = TokenStream::from_tokens(tokens(&interner, &["h"]));
        stream.splice_include(1, "h.h".to_string(), header);

        let items = stream.items();
        assert_eq!(items.len(), 5);
        assert!(matches!(items[0], StreamItem::Token(_)));
        assert_eq!(items[1], StreamItem::EnterFile("h.h".to_string()));
        assert!(matches!(items[2], StreamItem::Token(_)));
        assert_eq!(items[3], StreamItem::ExitFile);
        assert_eq!(stream.token_count(), 3);
    }

    #[test]
    fn test_assemble_keeps_original_positions() {
        let interner = StringInterner::new();
        let inclusions = vec![
            Inclusion {
                position: 0,
                path: "first.h".to_string(),
                stream: TokenStream::from_tokens(tokens(&interner, &["x"])),
            },
            Inclusion {
                position: 2,
                path: "last.h".to_string(),
                stream: TokenStream::from_tokens(tokens(&interner, &["y"])),
            },
        ];
        let stream = TokenStream::assemble(tokens(&interner, &["a", "b"]), inclusions);
        let names: Vec<_> = stream.tokens().map(|t| interner.resolve(t.text).to_string()).collect();
        assert_eq!(names, vec!["x", "a", "b", "y"]);
        assert_eq!(stream.items()[0], StreamItem::EnterFile("first.h".to_string()));
        assert_eq!(stream.items().last(), Some(&StreamItem::ExitFile));
    }
}
