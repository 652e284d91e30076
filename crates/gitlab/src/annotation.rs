//! Locating CI annotations in a task file.
//!
//! A task is CI-enabled when it carries a non-empty annotation table, either
//! inline as `[tasks.<name>.ci]` or under the top-level namespace as
//! `[gitlab-ci.jobs.<name>]`. Pipeline-wide settings live in
//! `[gitlab-ci.defaults]`.

use mise_en_gitlab_core::{Error, Mapping, RawDocument, Result, Value};

/// Top-level table holding GitLab-specific settings.
pub const CI_NAMESPACE: &str = "gitlab-ci";

/// A CI-enabled task together with its annotation table.
#[derive(Debug, Clone)]
pub struct AnnotatedTask<'a> {
    /// Key under `[tasks]`
    pub name: &'a str,
    /// The task table (`run`, `dir`, ...)
    pub task: &'a Mapping,
    /// The annotation table
    pub ci: &'a Mapping,
    /// Dotted path of the task table, for error messages
    pub task_path: String,
    /// Dotted path of the annotation table, for error messages
    pub ci_path: String,
}

/// Append `key` to a dotted path, quoting it when it is not a bare TOML key.
pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if bare {
        format!("{prefix}.{key}")
    } else {
        format!("{prefix}.\"{key}\"")
    }
}

fn expect_table<'a>(value: &'a Value, path: &str) -> Result<&'a Mapping> {
    value.as_mapping().ok_or_else(|| {
        Error::schema(
            path,
            format!("expected a table, found {}", value.type_name()),
        )
    })
}

fn namespace(doc: &RawDocument) -> Result<Option<&Mapping>> {
    doc.get(CI_NAMESPACE)
        .map(|value| expect_table(value, CI_NAMESPACE))
        .transpose()
}

/// Read `gitlab-ci.defaults.image`.
///
/// # Errors
///
/// Returns a schema violation when the namespace or `defaults` is not a table
/// or when `image` is not a string.
pub fn default_image(doc: &RawDocument) -> Result<Option<String>> {
    let Some(ns) = namespace(doc)? else {
        return Ok(None);
    };
    let defaults_path = join_path(CI_NAMESPACE, "defaults");
    let Some(defaults) = ns.get("defaults") else {
        return Ok(None);
    };
    let defaults = expect_table(defaults, &defaults_path)?;

    match defaults.get("image") {
        None => Ok(None),
        Some(Value::String(image)) => Ok(Some(image.clone())),
        Some(other) => Err(Error::schema(
            join_path(&defaults_path, "image"),
            format!("expected a string, found {}", other.type_name()),
        )),
    }
}

fn external_jobs(doc: &RawDocument) -> Result<Option<&Mapping>> {
    let Some(ns) = namespace(doc)? else {
        return Ok(None);
    };
    ns.get("jobs")
        .map(|jobs| expect_table(jobs, &join_path(CI_NAMESPACE, "jobs")))
        .transpose()
}

/// Non-empty `gitlab-ci.jobs.<name>` table, or `None` when absent or empty.
fn external_annotation<'a>(jobs: Option<&'a Mapping>, name: &str) -> Result<Option<&'a Mapping>> {
    let Some(value) = jobs.and_then(|jobs| jobs.get(name)) else {
        return Ok(None);
    };
    let path = join_path(&join_path(CI_NAMESPACE, "jobs"), name);
    let table = expect_table(value, &path)?;
    Ok((!table.is_empty()).then_some(table))
}

fn inline_annotation<'a>(task: &'a Mapping, task_path: &str) -> Option<&'a Mapping> {
    match task.get("ci") {
        Some(Value::Mapping(ci)) if !ci.is_empty() => Some(ci),
        Some(Value::Mapping(_)) | None => None,
        Some(other) => {
            tracing::warn!(
                task = task_path,
                found = other.type_name(),
                "Ignoring `ci` that is not a table"
            );
            None
        }
    }
}

/// Select CI-enabled tasks in declaration order.
///
/// # Errors
///
/// Returns [`Error::NoCiTasks`] when `tasks` is missing, empty, not a table,
/// or no task is annotated. Returns a schema violation when a task is
/// annotated twice, or a `gitlab-ci.jobs` entry names an undeclared or
/// non-table task.
pub fn select_ci_tasks(doc: &RawDocument) -> Result<Vec<AnnotatedTask<'_>>> {
    let tasks = match doc.get("tasks") {
        Some(Value::Mapping(tasks)) if !tasks.is_empty() => tasks,
        Some(Value::Mapping(_)) => return Err(Error::no_ci_tasks("the [tasks] table is empty")),
        Some(other) => {
            return Err(Error::no_ci_tasks(format!(
                "`tasks` is a {}, not a table",
                other.type_name()
            )));
        }
        None => return Err(Error::no_ci_tasks("no [tasks] table found")),
    };

    let jobs = external_jobs(doc)?;
    if let Some(jobs) = jobs {
        if let Some(unknown) = jobs.keys().find(|name| !tasks.contains_key(*name)) {
            return Err(Error::schema(
                join_path(&join_path(CI_NAMESPACE, "jobs"), unknown),
                format!("no task named `{unknown}` is declared under [tasks]"),
            ));
        }
    }

    let mut selected = Vec::new();
    for (name, body) in tasks {
        let task_path = join_path("tasks", name);
        let external = external_annotation(jobs, name)?;

        let Some(task) = body.as_mapping() else {
            if external.is_some() {
                return Err(Error::schema(
                    task_path,
                    format!(
                        "annotated task must be a table with `run`, found {}",
                        body.type_name()
                    ),
                ));
            }
            tracing::debug!(task = %name, "Skipping task without a table body");
            continue;
        };

        let inline = inline_annotation(task, &task_path);
        let (ci, ci_path) = match (inline, external) {
            (Some(_), Some(_)) => {
                return Err(Error::schema(
                    join_path(&task_path, "ci"),
                    format!(
                        "annotations declared in both [tasks.{name}.ci] and [{CI_NAMESPACE}.jobs.{name}]"
                    ),
                ));
            }
            (Some(ci), None) => (ci, join_path(&task_path, "ci")),
            (None, Some(ci)) => (ci, join_path(&join_path(CI_NAMESPACE, "jobs"), name)),
            (None, None) => {
                tracing::debug!(task = %name, "Skipping task without CI annotation");
                continue;
            }
        };

        selected.push(AnnotatedTask {
            name,
            task,
            ci,
            task_path,
            ci_path,
        });
    }

    if selected.is_empty() {
        return Err(Error::no_ci_tasks(
            "no [tasks.<name>.ci] or [gitlab-ci.jobs.<name>] sections",
        ));
    }
    Ok(selected)
}
