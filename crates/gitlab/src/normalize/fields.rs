//! Per-field normalization rules.
//!
//! Each function narrows one loosely-typed annotation value into the shape
//! the GitLab schema expects, or reports a schema violation naming `path`.

use crate::annotation::join_path;
use crate::schema::Rule;
use mise_en_gitlab_core::{Error, Mapping, Result, Value};

fn mismatch(path: &str, expected: &str, found: &Value) -> Error {
    Error::schema(
        path,
        format!("expected {expected}, found {}", found.type_name()),
    )
}

fn indexed(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// `stage`: required non-empty string.
pub fn stage<'a>(ci: &'a Mapping, ci_path: &str) -> Result<&'a str> {
    let path = join_path(ci_path, "stage");
    match ci.get("stage") {
        Some(Value::String(stage)) if !stage.is_empty() => Ok(stage.as_str()),
        Some(Value::String(_)) => Err(Error::schema(path, "stage must not be empty")),
        Some(other) => Err(mismatch(&path, "a non-empty string", other)),
        None => Err(Error::schema(
            path,
            "each CI annotation must include a non-empty `stage`",
        )),
    }
}

/// `script`: the task's `run` lines, preceded by `cd <dir>` when `dir` is set.
pub fn script(task: &Mapping, task_path: &str) -> Result<Vec<String>> {
    let run_path = join_path(task_path, "run");
    let run = match task.get("run") {
        None => return Err(Error::schema(run_path, "task missing required `run` field")),
        Some(Value::String(line)) => vec![line.clone()],
        Some(Value::Sequence(lines)) => lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                line.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| mismatch(&indexed(&run_path, i), "a string", line))
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => return Err(mismatch(&run_path, "a string or a list of strings", other)),
    };

    let dir = match task.get("dir") {
        None => None,
        Some(Value::String(dir)) => Some(dir.as_str()).filter(|d| !d.is_empty()),
        Some(other) => return Err(mismatch(&join_path(task_path, "dir"), "a string", other)),
    };

    Ok(match dir {
        Some(dir) => std::iter::once(format!("cd {dir}")).chain(run).collect(),
        None => run,
    })
}

/// `image`: own image, else the pipeline default.
pub fn image(ci: &Mapping, ci_path: &str, default: Option<&str>) -> Result<Option<String>> {
    match ci.get("image") {
        Some(Value::String(image)) => Ok(Some(image.clone())),
        Some(other) => Err(mismatch(&join_path(ci_path, "image"), "a string", other)),
        None => Ok(default.map(str::to_string)),
    }
}

/// Normalize one `rules` entry.
///
/// Tables pass through. `"key: value"` strings split on the first colon;
/// strings without a colon are taken as an `if:` expression.
pub fn rule(item: &Value, path: &str) -> Result<Rule> {
    match item {
        Value::Mapping(rule) => Ok(rule.clone()),
        Value::String(text) => {
            let mut rule = Rule::new();
            match text.split_once(':') {
                Some((key, value)) => {
                    rule.insert(key.trim().to_string(), Value::from(value.trim()));
                }
                None => {
                    rule.insert("if".to_string(), Value::from(text.as_str()));
                }
            }
            Ok(rule)
        }
        other => Err(mismatch(path, "a string or a table", other)),
    }
}

/// `rules`: list of strings or tables.
pub fn rules(value: &Value, path: &str) -> Result<Vec<Rule>> {
    let items = value
        .as_sequence()
        .ok_or_else(|| mismatch(path, "a list of strings or tables", value))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| rule(item, &indexed(path, i)))
        .collect()
}

/// `artifacts`: a table as-is, or a list of paths wrapped as `{ paths: [...] }`.
///
/// An empty list yields an empty table, which the emitter omits.
pub fn artifacts(value: &Value, path: &str) -> Result<Mapping> {
    match value {
        Value::Mapping(artifacts) => Ok(artifacts.clone()),
        Value::Sequence(paths) if paths.is_empty() => Ok(Mapping::new()),
        Value::Sequence(paths) => {
            let mut artifacts = Mapping::new();
            artifacts.insert("paths".to_string(), Value::Sequence(paths.clone()));
            Ok(artifacts)
        }
        other => Err(mismatch(path, "a table or a list of paths", other)),
    }
}

/// `needs`: list of job names. A bare string is rejected.
pub fn needs(value: &Value, path: &str) -> Result<Vec<String>> {
    let items = value
        .as_sequence()
        .ok_or_else(|| mismatch(path, "a list of job names (strings)", value))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| mismatch(&indexed(path, i), "a job name (string)", item))
        })
        .collect()
}

/// Emitted job key: a non-empty `name`, else the task name.
pub fn emitted_name<'a>(ci: &'a Mapping, task_name: &'a str) -> &'a str {
    match ci.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.as_str(),
        Some(other) => {
            tracing::warn!(
                task = task_name,
                found = other.type_name(),
                "Ignoring `name` that is not a non-empty string"
            );
            task_name
        }
        None => task_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mise_en_gitlab_core::parse_document;

    fn table(text: &str) -> Mapping {
        parse_document(text.as_bytes(), "test.toml")
            .unwrap()
            .root()
            .clone()
    }

    fn strings(items: &[&str]) -> Value {
        Value::Sequence(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn test_stage_required_and_non_empty() {
        assert_eq!(stage(&table("stage = \"build\""), "ci").unwrap(), "build");
        assert!(stage(&table("image = \"alpine\""), "ci").is_err());
        assert!(stage(&table("stage = \"\""), "ci").is_err());
        let err = stage(&table("stage = 1"), "tasks.a.ci").unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { ref path, .. } if path == "tasks.a.ci.stage"));
    }

    #[test]
    fn test_script_from_string() {
        assert_eq!(
            script(&table("run = \"pnpm build\""), "tasks.a").unwrap(),
            ["pnpm build"]
        );
    }

    #[test]
    fn test_script_from_list_is_verbatim() {
        assert_eq!(
            script(&table("run = [\"echo a\", \"echo b\"]"), "tasks.a").unwrap(),
            ["echo a", "echo b"]
        );
    }

    #[test]
    fn test_script_rejects_mixed_list_and_missing_run() {
        let err = script(&table("run = [\"echo a\", 2]"), "tasks.a").unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { ref path, .. } if path == "tasks.a.run[1]"));
        let err = script(&table("dir = \"x\""), "tasks.a").unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { ref path, .. } if path == "tasks.a.run"));
        assert!(script(&table("run = true"), "tasks.a").is_err());
    }

    #[test]
    fn test_script_dir_prepends_cd() {
        assert_eq!(
            script(&table("dir = \"a_dir\"\nrun = [\"make\", \"make test\"]"), "tasks.a").unwrap(),
            ["cd a_dir", "make", "make test"]
        );
        assert_eq!(
            script(&table("dir = \"\"\nrun = \"make\""), "tasks.a").unwrap(),
            ["make"]
        );
        assert!(script(&table("dir = 1\nrun = \"make\""), "tasks.a").is_err());
    }

    #[test]
    fn test_image_precedence() {
        let own = table("image = \"python:3.12\"");
        assert_eq!(
            image(&own, "ci", Some("alpine")).unwrap().as_deref(),
            Some("python:3.12")
        );
        let none = table("stage = \"x\"");
        assert_eq!(image(&none, "ci", Some("alpine")).unwrap().as_deref(), Some("alpine"));
        assert_eq!(image(&none, "ci", None).unwrap(), None);
        assert!(image(&table("image = [\"a\"]"), "ci", None).is_err());
    }

    #[test]
    fn test_rule_splits_on_first_colon_only() {
        let rule = rule(&Value::from("a: b: c"), "r").unwrap();
        assert_eq!(rule.len(), 1);
        assert_eq!(rule["a"], Value::from("b: c"));
    }

    #[test]
    fn test_rule_trims_key_and_value() {
        let rule = rule(&Value::from("  if :  '$CI_COMMIT_TAG'  "), "r").unwrap();
        assert_eq!(rule["if"], Value::from("'$CI_COMMIT_TAG'"));
    }

    #[test]
    fn test_rule_without_colon_becomes_if() {
        let rule = rule(&Value::from("$X"), "r").unwrap();
        assert_eq!(rule["if"], Value::from("$X"));
    }

    #[test]
    fn test_rule_table_passes_through() {
        let input = table("when = \"manual\"\nallow_failure = true");
        let rule = rule(&Value::Mapping(input.clone()), "r").unwrap();
        assert_eq!(rule, input);
    }

    #[test]
    fn test_rules_reject_other_shapes() {
        let err = rules(&Value::Sequence(vec![Value::Integer(1), Value::from("$X")]), "ci.rules")
            .unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { ref path, .. } if path == "ci.rules[0]"));
        assert!(rules(&Value::from("if: $X"), "ci.rules").is_err());
        assert!(rules(&Value::Sequence(vec![]), "ci.rules").unwrap().is_empty());
    }

    #[test]
    fn test_artifacts_list_wraps_paths() {
        let artifacts = artifacts(&strings(&["p1", "p2"]), "a").unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts["paths"], strings(&["p1", "p2"]));
    }

    #[test]
    fn test_artifacts_table_passes_through_nested() {
        let input = table("paths = [\"dist/\"]\nwhen = \"always\"\n[reports]\ndotenv = \".env\"");
        let artifacts = artifacts(&Value::Mapping(input.clone()), "a").unwrap();
        assert_eq!(artifacts, input);
        let keys: Vec<&str> = artifacts.keys().map(String::as_str).collect();
        assert_eq!(keys, ["paths", "when", "reports"]);
    }

    #[test]
    fn test_artifacts_empty_and_invalid() {
        assert!(artifacts(&Value::Sequence(vec![]), "a").unwrap().is_empty());
        assert!(artifacts(&Value::from("dist/"), "a").is_err());
    }

    #[test]
    fn test_needs_rejects_bare_string_and_mixed_list() {
        assert_eq!(needs(&strings(&["build", "test"]), "n").unwrap(), ["build", "test"]);
        assert!(needs(&Value::from("build"), "n").is_err());
        let mixed = Value::Sequence(vec![Value::from("build"), Value::Integer(1)]);
        let err = needs(&mixed, "n").unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { ref path, .. } if path == "n[1]"));
    }

    #[test]
    fn test_emitted_name() {
        assert_eq!(emitted_name(&table("name = \"build-js\""), "build"), "build-js");
        assert_eq!(emitted_name(&table("name = \"\""), "build"), "build");
        assert_eq!(emitted_name(&table("name = 3"), "build"), "build");
        assert_eq!(emitted_name(&table("stage = \"b\""), "build"), "build");
    }
}
