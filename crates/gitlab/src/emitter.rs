//! CI Pipeline Emitter
//!
//! Serializes a [`PipelineDocument`] and writes it to disk. Keys are emitted
//! in document order at every level; nothing is sorted.

use crate::schema::PipelineDocument;
use mise_en_gitlab_core::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Trait for CI configuration emitters.
pub trait Emitter {
    /// Render the pipeline as configuration text.
    ///
    /// # Errors
    /// Returns [`Error::Serialization`] if the pipeline cannot be serialized.
    fn emit(&self, pipeline: &PipelineDocument) -> Result<String>;

    /// Format identifier (e.g. "gitlab").
    fn format_name(&self) -> &'static str;

    /// Extension for output files.
    fn file_extension(&self) -> &'static str;

    /// Human-readable description of this emitter.
    fn description(&self) -> &'static str {
        "CI configuration emitter"
    }
}

/// GitLab CI YAML emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabEmitter;

impl GitLabEmitter {
    /// Create a new GitLab emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Emitter for GitLabEmitter {
    fn emit(&self, pipeline: &PipelineDocument) -> Result<String> {
        serde_yaml::to_string(pipeline).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })
    }

    fn format_name(&self) -> &'static str {
        "gitlab"
    }

    fn file_extension(&self) -> &'static str {
        "yml"
    }

    fn description(&self) -> &'static str {
        "GitLab CI pipeline YAML emitter"
    }
}

/// Write `contents` to `path`, creating missing parent directories.
///
/// The text goes to a temporary file next to `path` that is then renamed
/// over it, so `path` either holds the complete output or is left as it was.
///
/// # Errors
/// Returns [`Error::Io`] if a directory, the temporary file, or the final
/// rename fails.
pub fn write_pipeline(contents: &str, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".mise-en-gitlab-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }
    let mut file = builder
        .tempfile_in(parent)
        .map_err(|e| Error::io("create temporary file in", parent, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| Error::io("write", path, e))?;
    file.persist(path)
        .map_err(|e| Error::io("write", path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "Wrote pipeline");
    Ok(())
}
