//! GitLab CI Pipeline Schema Types
//!
//! Defines the canonical pipeline structure handed to the YAML emitter.
//! See: <https://docs.gitlab.com/ee/ci/yaml/>
//!
//! Field declaration order is the emitted key order, so do not reorder
//! fields without updating the emitter tests.

use indexmap::IndexMap;
use mise_en_gitlab_core::{Mapping, Value};
use serde::Serialize;

/// A normalized `rules:` entry (e.g. `{ if: "$CI_COMMIT_TAG" }`).
pub type Rule = Mapping;

/// A GitLab CI pipeline definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineDocument {
    /// Distinct stage names in first-seen order
    pub stages: Vec<String>,

    /// Jobs keyed by emitted name, in task declaration order
    #[serde(flatten)]
    pub jobs: IndexMap<String, Job>,
}

impl PipelineDocument {
    /// Look up a job by its emitted key.
    #[must_use]
    pub fn job(&self, key: &str) -> Option<&Job> {
        self.jobs.get(key)
    }

    /// Emitted job keys in output order.
    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }
}

/// A single GitLab CI job.
///
/// Empty optional collections are skipped, so an explicitly empty `rules`,
/// `artifacts` or `needs` never reaches the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    /// Stage this job runs in
    pub stage: String,

    /// Container image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Shell lines to run
    pub script: Vec<String>,

    /// Conditions controlling job creation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    /// Artifact configuration (`paths`, `when`, `reports`, ...)
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub artifacts: Mapping,

    /// Jobs this job depends on
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    /// Keys copied verbatim from the annotation
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Job {
    /// Create a job with only the required fields set.
    #[must_use]
    pub fn new(stage: impl Into<String>, script: Vec<String>) -> Self {
        Self {
            stage: stage.into(),
            image: None,
            script,
            rules: Vec::new(),
            artifacts: Mapping::new(),
            needs: Vec::new(),
            extra: Mapping::new(),
        }
    }

    /// Look up a pass-through key.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
