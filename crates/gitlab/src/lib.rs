//! GitLab CI pipeline generation for mise-en-gitlab.
//!
//! This crate turns a parsed task file into a GitLab CI pipeline:
//!
//! - [`annotation`] finds CI-enabled tasks and pipeline defaults
//! - [`normalize`] validates each annotation and builds the [`PipelineDocument`]
//! - [`emitter`] serializes the document to YAML and writes it atomically
//!
//! # Task file to GitLab Mapping
//!
//! | Task file | GitLab YAML |
//! |-----------|-------------|
//! | `tasks.<name>` | job `<name>` (or `ci.name`) |
//! | `tasks.<name>.run` | `script` |
//! | `tasks.<name>.dir` | leading `cd <dir>` in `script` |
//! | `ci.stage` | `stage`, collected into `stages` |
//! | `ci.image` / `gitlab-ci.defaults.image` | `image` |
//! | `ci.rules` | `rules` |
//! | `ci.artifacts` | `artifacts` |
//! | `ci.needs` | `needs` |
//! | any other `ci` key | copied as-is |

pub mod annotation;
pub mod emitter;
pub mod normalize;
pub mod schema;

pub use emitter::{Emitter, GitLabEmitter, write_pipeline};
pub use normalize::normalize;
pub use schema::{Job, PipelineDocument, Rule};

use mise_en_gitlab_core::{RawDocument, Result};

/// Output of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// The rendered pipeline
    pub yaml: String,
    /// Stage list, in pipeline order
    pub stages: Vec<String>,
    /// Emitted job keys, in pipeline order
    pub jobs: Vec<String>,
}

/// Normalize `doc` and render it with `emitter`.
///
/// # Errors
///
/// Returns the normalizer's errors, or a serialization error from the
/// emitter.
pub fn render(doc: &RawDocument, emitter: &dyn Emitter) -> Result<GenerationResult> {
    let pipeline = normalize(doc)?;
    let yaml = emitter.emit(&pipeline)?;
    tracing::debug!(
        format = emitter.format_name(),
        bytes = yaml.len(),
        "Rendered pipeline"
    );
    Ok(GenerationResult {
        jobs: pipeline.job_names().map(str::to_string).collect(),
        stages: pipeline.stages,
        yaml,
    })
}
