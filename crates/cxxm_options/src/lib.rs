//! cxxm_options: parser options and `cxxmodel.json` loading.
//!
//! Every field of the JSON file is optional; missing fields take the
//! defaults documented on [`ParserOptions`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up next to the sources.
pub const CONFIG_FILE_NAME: &str = "cxxmodel.json";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options controlling one parse session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOptions {
    /// Parse member function bodies after the enclosing class is complete.
    /// Default `true`.
    pub defer_member_bodies: bool,
    /// Install the `std` entry in the global scope. Default `true`.
    pub seed_std_namespace: bool,
    /// Recursion guard of the grammar driver. Default 200.
    pub max_recursion_depth: u32,
    /// Record identifier references found in expressions. Default `true`.
    pub record_references: bool,
    /// Directories searched for quoted includes.
    pub include_paths: Vec<PathBuf>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            defer_member_bodies: true,
            seed_std_namespace: true,
            max_recursion_depth: 200,
            record_references: true,
            include_paths: Vec::new(),
        }
    }
}

impl ParserOptions {
    /// Options with bodies parsed inline.
    pub fn inline_bodies() -> Self {
        Self {
            defer_member_bodies: false,
            ..Self::default()
        }
    }
}

/// Parse options from JSON text.
pub fn parse_options(content: &str) -> Result<ParserOptions, OptionsError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse options from a file.
pub fn parse_options_file(path: &Path) -> Result<ParserOptions, OptionsError> {
    let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_options(&content)
}

/// Walk up from `start` looking for a [`CONFIG_FILE_NAME`].
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParserOptions::default();
        assert!(options.defer_member_bodies);
        assert!(options.seed_std_namespace);
        assert_eq!(options.max_recursion_depth, 200);
        assert!(options.record_references);
        assert!(options.include_paths.is_empty());
    }

    #[test]
    fn test_empty_object_yields_defaults() {
        assert_eq!(parse_options("{}").unwrap(), ParserOptions::default());
    }

    #[test]
    fn test_camel_case_fields() {
        let options = parse_options(
            r#"{ "deferMemberBodies": false, "maxRecursionDepth": 50, "includePaths": ["inc"] }"#,
        )
        .unwrap();
        assert!(!options.defer_member_bodies);
        assert_eq!(options.max_recursion_depth, 50);
        assert_eq!(options.include_paths, vec![PathBuf::from("inc")]);
        assert!(options.seed_std_namespace);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = parse_options("{ deferMemberBodies: }").unwrap_err();
        assert!(matches!(err, OptionsError::Json(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_options_file(Path::new("/nonexistent/cxxmodel.json")).unwrap_err();
        assert!(matches!(err, OptionsError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/cxxmodel.json"));
    }

    #[test]
    fn test_inline_bodies() {
        let options = ParserOptions::inline_bodies();
        assert!(!options.defer_member_bodies);
        assert!(options.seed_std_namespace);
    }
}
