use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

const VALID_TASK: &str = r#"
apiVersion: tekton.dev/v1alpha1
kind: Task
metadata:
  name: echo
spec:
  params:
    - name: arr
      type: array
  steps:
    - name: echo
      image: busybox
      command: ["echo", "$(params.arr)"]
"#;

const SPLICED_ARRAY: &str = r#"{
  "params": [{"name": "arr", "type": "array"}],
  "steps": [{"image": "busybox", "command": ["echo-$(params.arr)"]}]
}"#;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskspec"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("TASKSPEC_CONFIG")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run taskspec binary")
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write file");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_valid_file_exits_zero() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "task.yaml", VALID_TASK);

    let output = run(&["validate", &file]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("task.yaml"));
    assert!(stdout.contains("1 file(s) valid"));
}

#[test]
fn test_invalid_file_exits_one_with_json_report() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.yaml", VALID_TASK);
    let bad = write(&dir, "bad.json", SPLICED_ARRAY);

    let output = run(&["validate", &good, &bad, "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let reports: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(reports[0]["valid"], true);
    assert_eq!(reports[1]["valid"], false);
    assert_eq!(reports[1]["error"]["kind"], "illegal_array_splice");
    assert_eq!(reports[1]["error"]["paths"][0], "taskspec.steps.command[0]");
}

#[test]
fn test_unparseable_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "broken.yaml", "name: just-a-name\n");

    let output = run(&["validate", &file, "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(reports[0]["loadError"]
        .as_str()
        .is_some_and(|e| e.contains("Unrecognized document")));
}

#[test]
fn test_config_changes_workspace_root() {
    let dir = TempDir::new().unwrap();
    let task = write(
        &dir,
        "task.yaml",
        r#"
workspaces:
  - name: source
steps:
  - image: busybox
    volumeMounts:
      - name: src
        mountPath: /workspace/source
"#,
    );

    assert_eq!(run(&["validate", &task]).status.code(), Some(1));

    let config = write(&dir, "config.yaml", "workspaceRoot: /mnt/workspaces\n");
    let output = run(&["validate", &task, "--config", &config]);
    assert!(output.status.success());
}

#[test]
fn test_config_command_prints_effective_config() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "config.json", r#"{"reservedVolumeNamePrefix": "sys-"}"#);

    let output = run(&["config", "--config", &config]);
    assert!(output.status.success());

    let printed: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["reservedVolumeNamePrefix"].as_str(), Some("sys-"));
    assert_eq!(printed["workspaceRoot"].as_str(), Some("/workspace"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let task = write(&dir, "task.yaml", VALID_TASK);
    let missing = dir.path().join("nope.yaml");

    let output = run(&["validate", &task, "--config", &missing.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
}
