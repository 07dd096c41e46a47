//! Replaying serialized actions, through the library and the binary

use serde_json::{json, Value};
use std::fs;
use std::path::Path as FsPath;
use std::process::Command;
use tempfile::TempDir;
use treelens::replay::replay;
use treelens::{Node, Path, StoreError, StoreOptions, WireAction};

fn app_descriptor() -> Value {
    json!({"type": "object", "name": "App", "properties": {
        "items": {"type": "array", "items": "number"},
        "title": "string"
    }})
}

fn wire(actions: Value) -> Vec<WireAction> {
    serde_json::from_value(actions).unwrap()
}

fn write_json(dir: &FsPath, name: &str, value: &Value) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

#[test]
fn test_replay_from_initial_state() {
    let actions = wire(json!([
        {"path": ["items", "sort"], "args": []},
        {"path": ["items", "splice"], "args": [0, 1]}
    ]));
    let initial = Node::from(json!({"items": [3, 1, 2], "title": "t"}));

    let report = replay(
        &app_descriptor(),
        Some(initial),
        actions,
        Some(&Path::parse("items")),
        StoreOptions::default(),
    )
    .unwrap();

    assert_eq!(report.value, Node::from(json!([2, 3])));
    assert_eq!(report.applied, 2);
    assert_eq!(report.commits, 2);
}

#[test]
fn test_replay_stops_at_first_failure() {
    let actions = wire(json!([
        {"path": ["items", "push"], "args": [1]},
        {"path": ["items", "explode"], "args": []}
    ]));

    let err = replay(&app_descriptor(), None, actions, None, StoreOptions::default()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidOperation(_)));
}

#[test]
fn test_replay_validates_when_asked() {
    let actions = wire(json!([{"path": ["title"], "value": 5}]));
    let options = StoreOptions {
        validate: true,
        ..Default::default()
    };

    let err = replay(&app_descriptor(), None, actions, None, options).unwrap_err();
    assert!(matches!(err, StoreError::InvalidState(_)));
}

#[test]
fn test_replay_rejects_oversized_length() {
    let actions = wire(json!([
        {"path": ["items", "length"], "type": "ASSIGN_LENGTH_ITEMS", "value": 1e12}
    ]));

    let err = replay(&app_descriptor(), None, actions, None, StoreOptions::default()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[test]
fn test_cli_prints_replayed_state() {
    let temp_dir = TempDir::new().unwrap();
    let schema = write_json(temp_dir.path(), "schema.json", &app_descriptor());
    let actions = write_json(
        temp_dir.path(),
        "actions.json",
        &json!([
            {"path": ["items", "push"], "args": [4, 5]},
            {"path": ["items", "reverse"], "args": []}
        ]),
    );

    let bin = env!("CARGO_BIN_EXE_treelens");
    let output = Command::new(bin)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("replay")
        .arg("--schema")
        .arg(&schema)
        .arg("--actions")
        .arg(&actions)
        .arg("--path")
        .arg("items")
        .output()
        .expect("failed to run treelens");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed, json!([5, 4]));
}

#[test]
fn test_cli_reports_failures() {
    let temp_dir = TempDir::new().unwrap();
    let schema = write_json(temp_dir.path(), "schema.json", &app_descriptor());
    let actions = write_json(
        temp_dir.path(),
        "actions.json",
        &json!([{"path": ["missing", "push"], "args": [1]}]),
    );

    let bin = env!("CARGO_BIN_EXE_treelens");
    let output = Command::new(bin)
        .arg("--root")
        .arg(temp_dir.path())
        .arg("replay")
        .arg("--schema")
        .arg(&schema)
        .arg("--actions")
        .arg(&actions)
        .output()
        .expect("failed to run treelens");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Path \"missing\" not found in state."), "stderr: {}", stderr);
}
