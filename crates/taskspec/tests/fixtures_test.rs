//! Validates the task documents under `tests/fixtures`.

use std::path::PathBuf;
use taskspec::{ErrorKind, Task, Validator};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("taskspec=debug")
        .with_test_writer()
        .try_init();
}

fn load(name: &str) -> Task {
    init_tracing();
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_yaml::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse {name}: {e}"))
}

#[test]
fn test_valid_fixtures() {
    let validator = Validator::new();
    for name in ["build-push.yaml", "legacy-inputs.yaml"] {
        let task = load(name);
        if let Err(e) = validator.validate_task(&task) {
            panic!("{name} should be valid, got: {e}");
        }
    }
}

#[test]
fn test_invalid_fixtures() {
    let validator = Validator::new();
    let cases = [
        (
            "invalid-array-splice.yaml",
            ErrorKind::IllegalArraySplice,
            "taskspec.steps.command[0]",
        ),
        (
            "invalid-workspace-path.yaml",
            ErrorKind::PathConflict,
            "workspaces[0].mountPath",
        ),
        (
            "invalid-resource-type.yaml",
            ErrorKind::InvalidEnumValue,
            "taskspec.resources.inputs.source.Type",
        ),
    ];

    for (name, kind, path) in cases {
        let err = validator
            .validate_task(&load(name))
            .expect_err("fixture should be rejected");
        assert_eq!(err.kind, kind, "{name}: {err}");
        assert_eq!(err.paths, vec![path.to_string()], "{name}");
    }
}

#[test]
fn test_metadata_is_parsed() {
    let task = load("build-push.yaml");
    assert_eq!(task.api_version, "tekton.dev/v1alpha1");
    assert_eq!(task.kind, "Task");
    assert_eq!(task.metadata.name, "build-push");
    assert_eq!(task.spec.volumes[0].name, "docker-socket");
    assert!(task.spec.volumes[0].source.contains_key("hostPath"));
}
