//! mise-en-gitlab: generate GitLab CI pipelines from `mise.toml` tasks.
//!
//! The binary is a thin layer over [`try_generate`]; [`generate`] is the
//! same operation reduced to an [`ExitStatus`].

pub mod cli;
pub mod logging;

use mise_en_gitlab_ci::{GitLabEmitter, render, write_pipeline};
use mise_en_gitlab_core::{Error, ErrorKind, load_document};
use std::path::Path;

pub use mise_en_gitlab_ci::GenerationResult;
pub use mise_en_gitlab_core::Result;

/// Outcome of a generation run, with its process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The pipeline was written
    Success = 0,
    /// No task is annotated for CI
    NoCiTasks = 1,
    /// Malformed input, a schema violation, or an I/O failure
    InvalidInput = 2,
}

impl ExitStatus {
    /// Numeric exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Exit status reported for `err`.
    #[must_use]
    pub const fn for_error(err: &Error) -> Self {
        match err.kind() {
            ErrorKind::NoCiTasks => Self::NoCiTasks,
            ErrorKind::SchemaViolation | ErrorKind::Io => Self::InvalidInput,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status.code())
    }
}

/// Read `input`, build the pipeline, and write it to `output`.
///
/// `output` is only touched once the whole pipeline has been rendered.
///
/// # Errors
///
/// Returns the first load, normalization, serialization or write error.
#[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn try_generate(input: &Path, output: &Path) -> Result<GenerationResult> {
    let doc = load_document(input)?;
    let result = render(&doc, &GitLabEmitter::new())?;
    write_pipeline(&result.yaml, output)?;
    tracing::info!(
        stages = ?result.stages,
        jobs = ?result.jobs,
        "Generated GitLab CI pipeline"
    );
    Ok(result)
}

/// [`try_generate`], reduced to its exit status.
///
/// Failures are logged at `error` level (or `warn` for [`ExitStatus::NoCiTasks`]).
pub fn generate(input: &Path, output: &Path) -> ExitStatus {
    match try_generate(input, output) {
        Ok(_) => ExitStatus::Success,
        Err(err) => {
            let status = ExitStatus::for_error(&err);
            if status == ExitStatus::NoCiTasks {
                tracing::warn!(error = %err, "Nothing to generate");
            } else {
                tracing::error!(error = %err, "Pipeline generation failed");
            }
            status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPELINE: &str = r#"
[tasks.build]
run = "pnpm build"

[tasks.build.ci]
stage = "build"
image = "node:20"
"#;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::NoCiTasks.code(), 1);
        assert_eq!(ExitStatus::InvalidInput.code(), 2);
    }

    #[test]
    fn test_exit_status_for_error() {
        assert_eq!(
            ExitStatus::for_error(&Error::no_ci_tasks("empty")),
            ExitStatus::NoCiTasks
        );
        assert_eq!(
            ExitStatus::for_error(&Error::schema("tasks.a.ci.stage", "missing")),
            ExitStatus::InvalidInput
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            ExitStatus::for_error(&Error::io("write", Path::new("ci.yml"), io)),
            ExitStatus::InvalidInput
        );
    }

    #[test]
    fn test_try_generate_reports_summary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("mise.toml");
        let output = dir.path().join("ci.yml");
        std::fs::write(&input, PIPELINE).unwrap();

        let result = try_generate(&input, &output).unwrap();
        assert_eq!(result.stages, ["build"]);
        assert_eq!(result.jobs, ["build"]);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), result.yaml);
    }

    #[test]
    fn test_generate_no_ci_tasks_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("mise.toml");
        let output = dir.path().join("ci.yml");
        std::fs::write(&input, "[tasks.lint]\nrun = \"ruff check .\"\n").unwrap();

        assert_eq!(generate(&input, &output), ExitStatus::NoCiTasks);
        assert!(!output.exists());
    }

    #[test]
    fn test_generate_failure_keeps_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("mise.toml");
        let output = dir.path().join("ci.yml");
        std::fs::write(&input, "[tasks.build\nrun = ").unwrap();
        std::fs::write(&output, "previous\n").unwrap();

        assert_eq!(generate(&input, &output), ExitStatus::InvalidInput);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous\n");
    }

    #[test]
    fn test_generate_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let status = generate(&dir.path().join("absent.toml"), &dir.path().join("ci.yml"));
        assert_eq!(status, ExitStatus::InvalidInput);
    }
}
