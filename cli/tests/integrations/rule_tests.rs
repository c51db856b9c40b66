use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn workspace_with(rules: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (file, json) in rules {
        fs::write(temp_dir.path().join(file), json).unwrap();
    }
    temp_dir
}

#[test]
fn test_cli_test_passing_rules() {
    let temp_dir = workspace_with(&[(
        "rules.json",
        r#"[{
            "id": "structure.max_file_lines",
            "logic": "forall f in files: f.lines <= 500",
            "self_validation": "metalogic.is_well_formed(rule.logic)",
            "unit_tests": [
                {"name": "short files", "test": "metalogic.evaluate(rule.logic, {files: [{lines: 10}]})"},
                {"name": "long files", "test": "not metalogic.evaluate(rule.logic, {files: [{lines: 900}]})"}
            ]
        }]"#,
    )]);

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("test").arg("--dir").arg(temp_dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("short files"))
        .stdout(predicate::str::contains("long files"))
        .stdout(predicate::str::contains("3 of 3 check(s) passed"));
}

#[test]
fn test_cli_test_failing_unit_test() {
    let temp_dir = workspace_with(&[(
        "rules.json",
        r#"{
            "id": "wrong.expectation",
            "logic": "forall f in files: f.lines <= 500",
            "unit_tests": [
                {"name": "expects long files to pass", "test": "metalogic.evaluate(rule.logic, {files: [{lines: 900}]})"}
            ]
        }"#,
    )]);

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("test").arg("--dir").arg(temp_dir.path());

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("expects long files to pass"))
        .stdout(predicate::str::contains("1 of 2 check(s) passed"));
}

#[test]
fn test_cli_test_reports_unknown_functions() {
    let temp_dir = workspace_with(&[(
        "plugin.json",
        r#"{"id": "uses.plugin", "logic": "plugin.check(files)"}"#,
    )]);

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("test").arg("uses.plugin").arg("--dir").arg(temp_dir.path());

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("unknown functions: plugin.check"));
}

#[test]
fn test_cli_test_invalid_rule_document() {
    let temp_dir = workspace_with(&[(
        "broken.json",
        r#"{"id": "broken", "logic": "forall f in files"}"#,
    )]);

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("test").arg("--dir").arg(temp_dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"))
        .stderr(predicate::str::contains("broken.logic"));
}
