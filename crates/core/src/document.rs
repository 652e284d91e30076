//! Loading `mise.toml` into a [`RawDocument`].

use crate::error::{Error, Result};
use crate::value::{Mapping, Value};
use miette::NamedSource;
use std::path::Path;

/// A parsed task file.
///
/// The root table in declaration order. The normalizer only reads from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    origin: String,
    root: Mapping,
}

impl RawDocument {
    /// Wrap an already-built root table.
    #[must_use]
    pub fn new(origin: impl Into<String>, root: Mapping) -> Self {
        Self {
            origin: origin.into(),
            root,
        }
    }

    /// Where the document came from (usually a file path).
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The root table.
    #[must_use]
    pub const fn root(&self) -> &Mapping {
        &self.root
    }

    /// Look up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }
}

/// Parse TOML bytes into a [`RawDocument`].
///
/// `origin` names the source in diagnostics.
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] for non UTF-8 input and
/// [`Error::MalformedInput`] when the text is not TOML or its root is not a
/// table.
pub fn parse_document(bytes: &[u8], origin: &str) -> Result<RawDocument> {
    let text = std::str::from_utf8(bytes).map_err(|source| Error::InvalidEncoding {
        origin: origin.to_string(),
        source,
    })?;

    let parsed: toml::Value = toml::from_str(text).map_err(|e| Error::MalformedInput {
        message: e.message().to_string(),
        src: NamedSource::new(origin, text.to_string()),
        span: e.span().map(Into::into),
    })?;

    match Value::from(parsed) {
        Value::Mapping(root) => {
            tracing::debug!(origin, keys = root.len(), "Parsed task file");
            Ok(RawDocument::new(origin, root))
        }
        other => Err(Error::MalformedInput {
            message: format!("document root must be a table, found {}", other.type_name()),
            src: NamedSource::new(origin, text.to_string()),
            span: None,
        }),
    }
}

/// Read and parse the task file at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read, otherwise the errors
/// of [`parse_document`].
pub fn load_document(path: &Path) -> Result<RawDocument> {
    let bytes = std::fs::read(path).map_err(|e| Error::io("read", path, e))?;
    parse_document(&bytes, &path.display().to_string())
}
