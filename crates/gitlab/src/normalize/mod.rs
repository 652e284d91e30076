//! Schema normalization: task file to [`PipelineDocument`].
//!
//! A single top-to-bottom pass over the CI-enabled tasks. The first violated
//! constraint aborts the pass; nothing partial is returned.

pub mod fields;

use crate::annotation::{self, AnnotatedTask, join_path};
use crate::schema::{Job, PipelineDocument};
use indexmap::IndexMap;
use indexmap::map::Entry;
use mise_en_gitlab_core::{Error, RawDocument, Result};
use std::collections::HashSet;

/// Annotation keys consumed by the normalizer. Everything else is copied
/// into the job verbatim.
pub const RESERVED_KEYS: [&str; 6] = ["stage", "image", "rules", "artifacts", "needs", "name"];

/// Top-level key holding the stage list; no job may use it.
const STAGES_KEY: &str = "stages";

/// Normalize a parsed task file into a GitLab pipeline.
///
/// # Errors
///
/// Returns [`Error::NoCiTasks`] when no task is annotated and
/// [`Error::SchemaViolation`] for the first value that does not fit the
/// schema, including two jobs resolving to the same key.
pub fn normalize(doc: &RawDocument) -> Result<PipelineDocument> {
    let default_image = annotation::default_image(doc)?;
    let selected = annotation::select_ci_tasks(doc)?;
    let stages = collect_stages(&selected)?;

    let mut jobs: IndexMap<String, Job> = IndexMap::with_capacity(selected.len());
    let mut owners: IndexMap<String, &str> = IndexMap::with_capacity(selected.len());
    for task in &selected {
        let (key, job) = build_job(task, default_image.as_deref())?;
        let key_path = if key == task.name {
            task.task_path.clone()
        } else {
            join_path(&task.ci_path, "name")
        };

        if key == STAGES_KEY {
            return Err(Error::schema(
                key_path,
                "job key `stages` collides with the pipeline stage list",
            ));
        }
        match owners.entry(key.clone()) {
            Entry::Occupied(owner) => {
                return Err(Error::schema(
                    key_path,
                    format!(
                        "job key `{key}` is already used by task `{}`",
                        owner.get()
                    ),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(task.name);
            }
        }
        jobs.insert(key, job);
    }

    warn_dangling_needs(&jobs);
    tracing::info!(
        stages = stages.len(),
        jobs = jobs.len(),
        "Normalized GitLab pipeline"
    );
    Ok(PipelineDocument { stages, jobs })
}

/// Distinct `stage` values in first-seen order.
fn collect_stages(tasks: &[AnnotatedTask<'_>]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut stages = Vec::new();
    for task in tasks {
        let stage = fields::stage(task.ci, &task.ci_path)?;
        if seen.insert(stage) {
            stages.push(stage.to_string());
        }
    }
    Ok(stages)
}

fn build_job(task: &AnnotatedTask<'_>, default_image: Option<&str>) -> Result<(String, Job)> {
    let ci = task.ci;
    let script = fields::script(task.task, &task.task_path)?;
    let stage = fields::stage(ci, &task.ci_path)?;

    let mut job = Job::new(stage, script);
    job.image = fields::image(ci, &task.ci_path, default_image)?;
    if let Some(rules) = ci.get("rules") {
        job.rules = fields::rules(rules, &join_path(&task.ci_path, "rules"))?;
    }
    if let Some(artifacts) = ci.get("artifacts") {
        job.artifacts = fields::artifacts(artifacts, &join_path(&task.ci_path, "artifacts"))?;
    }
    if let Some(needs) = ci.get("needs") {
        job.needs = fields::needs(needs, &join_path(&task.ci_path, "needs"))?;
    }

    for (key, value) in ci {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        if key == "script" {
            return Err(Error::schema(
                join_path(&task.ci_path, "script"),
                "`script` is generated from the task's `run`; set `run` instead",
            ));
        }
        job.extra.insert(key.clone(), value.clone());
    }

    let key = fields::emitted_name(ci, task.name).to_string();
    tracing::debug!(
        task = task.name,
        job = %key,
        stage,
        extra_keys = job.extra.len(),
        "Built job"
    );
    Ok((key, job))
}

fn warn_dangling_needs(jobs: &IndexMap<String, Job>) {
    for (key, job) in jobs {
        for need in job.needs.iter().filter(|need| !jobs.contains_key(*need)) {
            tracing::warn!(job = %key, need = %need, "`needs` entry does not match any generated job");
        }
    }
}
