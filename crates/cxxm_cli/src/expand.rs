//! Include expansion: read a source file, scan it and splice the tokens of
//! every quoted include it names, recursively.

use cxxm_core::intern::StringInterner;
use cxxm_diagnostics::Diagnostic;
use cxxm_lexer::{Inclusion, Scanner, TokenStream};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The raw token stream of a translation unit and every text it was
/// assembled from.
pub struct Expanded {
    pub stream: TokenStream,
    /// Path and text of every file read, the main file first.
    pub sources: Vec<(String, String)>,
    /// Tokenizer diagnostics of every file read.
    pub scan_diagnostics: Vec<Diagnostic>,
    /// Includes that were skipped, as printable messages.
    pub warnings: Vec<String>,
}

impl Expanded {
    pub fn text_of(&self, path: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, text)| text.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },
}

pub fn read_source(path: &Path) -> Result<String, ExpandError> {
    let bytes = std::fs::read(path).map_err(|source| ExpandError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let text = simdutf8::basic::from_utf8(&bytes).map_err(|_| ExpandError::Encoding {
        path: path.display().to_string(),
    })?;
    Ok(text.to_string())
}

struct Expander<'a> {
    interner: &'a StringInterner,
    include_paths: &'a [PathBuf],
    /// Files currently being expanded, innermost last.
    active: Vec<PathBuf>,
    sources: Vec<(String, String)>,
    scan_diagnostics: Vec<Diagnostic>,
    warnings: Vec<String>,
}

/// Expand `main`. The main file's own text must be readable; included
/// files that are missing or would recurse are skipped with a warning.
pub fn expand(main: &Path, include_paths: &[PathBuf], interner: &StringInterner) -> Result<Expanded, ExpandError> {
    let text = read_source(main)?;
    let mut expander = Expander {
        interner,
        include_paths,
        active: Vec::new(),
        sources: Vec::new(),
        scan_diagnostics: Vec::new(),
        warnings: Vec::new(),
    };
    let stream = expander.expand_text(main, text);
    Ok(Expanded {
        stream,
        sources: expander.sources,
        scan_diagnostics: expander.scan_diagnostics,
        warnings: expander.warnings,
    })
}

impl Expander<'_> {
    fn expand_text(&mut self, path: &Path, text: String) -> TokenStream {
        let scan = Scanner::new(&text, self.interner.clone()).tokenize();
        let display = path.display().to_string();
        self.sources.push((display.clone(), text));
        self.active.push(path.to_path_buf());

        let mut inclusions = Vec::new();
        for directive in scan.includes.iter().filter(|d| d.quoted) {
            let Some(target) = self.resolve(path, &directive.path) else {
                let from = display.as_str();
                warn!(include = %directive.path, from = %from, "include not found");
                self.warnings
                    .push(format!("{display}: cannot find include \"{}\"", directive.path));
                continue;
            };
            if self.active.contains(&target) {
                self.warnings
                    .push(format!("{display}: recursive include \"{}\" skipped", directive.path));
                continue;
            }
            let text = match read_source(&target) {
                Ok(text) => text,
                Err(error) => {
                    self.warnings.push(format!("{display}: {error}"));
                    continue;
                }
            };
            debug!(include = %target.display(), position = directive.position, "expand include");
            let stream = self.expand_text(&target, text);
            inclusions.push(Inclusion {
                position: directive.position,
                path: target.display().to_string(),
                stream,
            });
        }

        self.active.pop();
        self.scan_diagnostics
            .extend(scan.diagnostics.into_diagnostics().into_iter().map(|mut d| {
                d.file = Some(display.clone());
                d
            }));
        TokenStream::assemble(scan.tokens, inclusions)
    }

    /// Look `name` up next to the including file, then in the include
    /// paths.
    fn resolve(&self, from: &Path, name: &str) -> Option<PathBuf> {
        let local = from.parent().map(|dir| dir.join(name));
        local
            .into_iter()
            .chain(self.include_paths.iter().map(|dir| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxm_lexer::StreamItem;
    use std::fs;

    fn entered(expanded: &Expanded) -> Vec<String> {
        expanded
            .stream
            .items()
            .iter()
            .filter_map(|item| match item {
                StreamItem::EnterFile(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_nested_includes_are_spliced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.cpp"), "#include \"a.h\"\nint m;\n").unwrap();
        fs::write(dir.path().join("a.h"), "#include \"b.h\"\nint a;\n").unwrap();
        fs::write(dir.path().join("b.h"), "int b;\n").unwrap();

        let interner = StringInterner::new();
        let expanded = expand(&dir.path().join("main.cpp"), &[], &interner).unwrap();
        assert!(expanded.warnings.is_empty(), "{:?}", expanded.warnings);
        assert_eq!(expanded.sources.len(), 3);
        let entered = entered(&expanded);
        assert_eq!(entered.len(), 2);
        assert!(entered[0].ends_with("a.h"));
        assert!(entered[1].ends_with("b.h"));
        assert_eq!(expanded.stream.token_count(), 9);
    }

    #[test]
    fn test_include_paths_are_searched() {
        let dir = tempfile::tempdir().unwrap();
        let include = dir.path().join("include");
        fs::create_dir(&include).unwrap();
        fs::write(dir.path().join("main.cpp"), "#include \"lib.h\"\n").unwrap();
        fs::write(include.join("lib.h"), "int lib;\n").unwrap();

        let interner = StringInterner::new();
        let expanded = expand(&dir.path().join("main.cpp"), &[include], &interner).unwrap();
        assert!(expanded.warnings.is_empty());
        assert_eq!(entered(&expanded).len(), 1);
    }

    #[test]
    fn test_missing_and_recursive_includes_warn() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.cpp"),
            "#include \"self.h\"\n#include \"missing.h\"\nint m;\n",
        )
        .unwrap();
        fs::write(dir.path().join("self.h"), "#include \"self.h\"\nint s;\n").unwrap();

        let interner = StringInterner::new();
        let expanded = expand(&dir.path().join("main.cpp"), &[], &interner).unwrap();
        assert_eq!(expanded.warnings.len(), 2);
        assert!(expanded.warnings.iter().any(|w| w.contains("recursive include")));
        assert!(expanded.warnings.iter().any(|w| w.contains("missing.h")));
        assert_eq!(entered(&expanded).len(), 1);
    }

    #[test]
    fn test_unreadable_main_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let interner = StringInterner::new();
        assert!(matches!(
            expand(&dir.path().join("absent.cpp"), &[], &interner),
            Err(ExpandError::Io { .. })
        ));
    }
}
