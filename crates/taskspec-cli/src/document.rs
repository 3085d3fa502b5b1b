use anyhow::{Context, Result};
use std::path::Path;
use taskspec::{Task, TaskSpec};

/// Read a task document from disk
pub fn load_document(path: &Path) -> Result<Task> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_document(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse a full task document or a bare spec, as JSON or YAML
pub fn parse_document(content: &str) -> Result<Task> {
    // Strategy 1: JSON
    if let Ok(val) = serde_json::from_str::<serde_json::Value>(content) {
        return document_from_value(val);
    }

    // Strategy 2: YAML (a superset of JSON, but with less precise errors)
    let val = serde_yaml::from_str::<serde_json::Value>(content)
        .context("Content is neither valid JSON nor valid YAML")?;
    document_from_value(val)
}

fn document_from_value(val: serde_json::Value) -> Result<Task> {
    if val.get("spec").is_some() {
        return serde_json::from_value(val).context("Invalid task document");
    }
    if val.get("steps").is_some() {
        let spec: TaskSpec = serde_json::from_value(val).context("Invalid task spec")?;
        return Ok(Task {
            spec,
            ..Default::default()
        });
    }
    Err(anyhow::anyhow!(
        "Unrecognized document. Content must either be:\n\
        1. A task with a 'spec' field\n\
        2. A bare task spec with a 'steps' field"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_task_yaml() {
        let task = parse_document(
            r#"
apiVersion: tekton.dev/v1alpha1
kind: Task
metadata:
  name: hello
spec:
  steps:
    - image: busybox
"#,
        )
        .expect("Should parse");
        assert_eq!(task.metadata.name, "hello");
        assert_eq!(task.spec.steps[0].image, "busybox");
    }

    #[test]
    fn test_parse_bare_spec_json() {
        let task = parse_document(r#"{"steps": [{"image": "busybox", "args": ["$(params.x)"]}]}"#)
            .expect("Should parse");
        assert!(task.metadata.name.is_empty());
        assert_eq!(task.spec.steps[0].args, vec!["$(params.x)"]);
    }

    #[test]
    fn test_reject_unrecognized() {
        let err = parse_document("name: not-a-task\n").unwrap_err();
        assert!(err.to_string().contains("Unrecognized document"));

        assert!(parse_document("steps: [").is_err());
    }
}
