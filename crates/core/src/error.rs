//! Error types for pipeline generation.

#![allow(unused_assignments)] // False positives from miette derive macro

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for mise-en-gitlab operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, normalizing or emitting a pipeline.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The document has no task carrying a non-empty CI annotation.
    #[error("No CI-annotated tasks found: {reason}")]
    #[diagnostic(
        code(mise_en_gitlab::no_ci_tasks),
        help("Add [tasks.<name>.ci] sections to mark tasks for the pipeline")
    )]
    NoCiTasks {
        /// Why the selection came up empty
        reason: String,
    },

    /// The input is not a TOML document with a table at its root.
    #[error("Failed to parse TOML: {message}")]
    #[diagnostic(code(mise_en_gitlab::malformed_input))]
    MalformedInput {
        /// Parser message
        message: String,
        /// The document text, named after its origin
        #[source_code]
        src: NamedSource<String>,
        /// Location reported by the parser, if any
        #[label("here")]
        span: Option<SourceSpan>,
    },

    /// The input bytes are not valid UTF-8.
    #[error("Failed to parse TOML: {origin} is not valid UTF-8")]
    #[diagnostic(code(mise_en_gitlab::malformed_input))]
    InvalidEncoding {
        /// Where the bytes came from
        origin: String,
        /// The underlying decoding error
        #[source]
        source: std::str::Utf8Error,
    },

    /// A value does not match the shape the pipeline schema expects.
    #[error("Invalid value at `{path}`: {message}")]
    #[diagnostic(code(mise_en_gitlab::schema_violation))]
    SchemaViolation {
        /// Dotted path of the offending value (e.g. `tasks.build.ci.stage`)
        path: String,
        /// What was expected
        message: String,
    },

    /// Reading the input or writing the output failed.
    #[error("Failed to {operation} {}: {source}", path.display())]
    #[diagnostic(
        code(mise_en_gitlab::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// What was being attempted (e.g. "read", "write")
        operation: &'static str,
        /// The path involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The pipeline document could not be rendered.
    #[error("YAML serialization failed: {message}")]
    #[diagnostic(code(mise_en_gitlab::serialization))]
    Serialization {
        /// Serializer message
        message: String,
    },
}

/// Coarse classification of an [`Error`], used to pick an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing to generate
    NoCiTasks,
    /// Malformed input or a schema mismatch
    SchemaViolation,
    /// Filesystem or serialization failure
    Io,
}

impl Error {
    /// Create a [`Error::NoCiTasks`] error.
    #[must_use]
    pub fn no_ci_tasks(reason: impl Into<String>) -> Self {
        Self::NoCiTasks {
            reason: reason.into(),
        }
    }

    /// Create a [`Error::SchemaViolation`] error for the value at `path`.
    #[must_use]
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a [`Error::Io`] error.
    #[must_use]
    pub fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classify this error.
    ///
    /// Parse failures are reported as schema violations: a document that
    /// cannot be parsed into a table is the degenerate case of a schema
    /// mismatch.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoCiTasks { .. } => ErrorKind::NoCiTasks,
            Self::MalformedInput { .. }
            | Self::InvalidEncoding { .. }
            | Self::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            Self::Io { .. } | Self::Serialization { .. } => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::no_ci_tasks("none").kind(), ErrorKind::NoCiTasks);
        assert_eq!(
            Error::schema("tasks.a.ci.stage", "missing").kind(),
            ErrorKind::SchemaViolation
        );
        let malformed = Error::MalformedInput {
            message: "expected `]`".to_string(),
            src: NamedSource::new("mise.toml", "[tasks.a".to_string()),
            span: Some((0, 8).into()),
        };
        assert_eq!(malformed.kind(), ErrorKind::SchemaViolation);
        let io = Error::io(
            "write",
            Path::new("out/ci.yml"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(io.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_schema_message_names_path() {
        let err = Error::schema("tasks.deploy.ci.needs", "expected a list of strings");
        assert_eq!(
            err.to_string(),
            "Invalid value at `tasks.deploy.ci.needs`: expected a list of strings"
        );
    }
}
