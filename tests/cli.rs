use assert_cmd::Command;
use std::fs;
use std::path::Path;

const PIPELINE: &str = r#"{
    "name": "churn",
    "steps": [
        {"name": "preprocess", "step_type": "Processing", "role": "roleA"},
        {"name": "train", "step_type": "Training", "role": "roleA"}
    ]
}"#;

fn write_config(dir: &Path, file: &str, expected_role: &str) {
    fs::write(dir.join("pipeline.json"), PIPELINE).unwrap();
    fs::write(
        dir.join(file),
        format!(
            "pipeline = \"pipeline.json\"\n\n[[validations]]\nkind = \"role_name\"\nexpected = \"{}\"\n",
            expected_role
        ),
    )
    .unwrap();
}

fn steplint() -> Command {
    Command::new(env!("CARGO_BIN_EXE_steplint"))
}

#[test]
fn passing_configuration_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "steplint.toml", "roleA");

    let output = steplint()
        .arg("validate")
        .arg("--configuration")
        .arg(dir.path().join("steplint.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("validation_name"));
    assert!(text.contains("2 results: 2 passed, 0 failed"));
}

#[test]
fn failing_configuration_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "steplint.toml", "roleB");

    let output = steplint()
        .arg("validate")
        .arg("--configuration")
        .arg(dir.path().join("steplint.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn broken_configuration_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("steplint.toml");
    fs::write(&config, "pipeline = ").unwrap();

    let output = steplint()
        .arg("validate")
        .arg("--configuration")
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr).unwrap().contains("steplint.toml"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let output = steplint().arg("validate").arg("--bogus").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn working_dir_discovery_runs_every_configuration() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "a.toml", "roleA");
    fs::create_dir(dir.path().join("nested")).unwrap();
    write_config(&dir.path().join("nested"), "b.toml", "roleB");

    let output = steplint()
        .arg("validate")
        .arg("--working-dir")
        .arg(dir.path())
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let text = String::from_utf8(output.stdout).unwrap();
    let reports: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&text)
        .into_iter::<serde_json::Value>()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["summary"]["failed"], 0);
    assert_eq!(reports[1]["summary"]["failed"], 2);
}

#[test]
fn list_and_info() {
    let output = steplint().arg("list").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout).unwrap().contains("role_name"));

    let output = steplint().args(["info", "role_name"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .contains("StepRoleNameAsExpected"));

    let output = steplint().args(["info", "nope"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
