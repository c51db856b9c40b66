use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MAX_LINES: &str = r#"{
    "id": "structure.max_file_lines",
    "severity": "warning",
    "philosophies": ["small-files"],
    "logic": "forall f in files: f.lines <= 500",
    "self_validation": "logic.all_functions_exist(rule.logic)",
    "unit_tests": [
        {"name": "short files pass", "test": "metalogic.evaluate(rule.logic, {files: [{lines: 10}]})"}
    ]
}"#;

const NO_TEMP_FILES: &str = r#"{
    "id": "naming.no_temp_files",
    "logic": "not (exists f in files: string.ends_with(f.name, \".tmp\"))"
}"#;

fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let rules = temp_dir.path().join("rules");
    fs::create_dir(&rules).unwrap();
    fs::write(rules.join("structure.json"), MAX_LINES).unwrap();
    fs::write(rules.join("naming.json"), NO_TEMP_FILES).unwrap();
    temp_dir
}

fn write_facts(dir: &Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("facts.json");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_cli_run_all_rules_hold() {
    let temp_dir = workspace();
    let facts = write_facts(
        temp_dir.path(),
        r#"{"files": [{"name": "main.rs", "lines": 120}]}"#,
    );

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run")
        .arg("--dir")
        .arg(temp_dir.path().join("rules"))
        .arg("--facts")
        .arg(&facts);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("structure.max_file_lines"))
        .stdout(predicate::str::contains("naming.no_temp_files"))
        .stdout(predicate::str::contains("2 of 2 rule(s) hold"));
}

#[test]
fn test_cli_run_violation_fails() {
    let temp_dir = workspace();
    let facts = write_facts(
        temp_dir.path(),
        r#"{"files": [{"name": "big.rs", "lines": 1200}, {"name": "x.tmp", "lines": 1}]}"#,
    );

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run")
        .arg("--dir")
        .arg(temp_dir.path().join("rules"))
        .arg("--facts")
        .arg(&facts);

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("fail"))
        .stdout(predicate::str::contains("0 of 2 rule(s) hold"));
}

#[test]
fn test_cli_run_single_rule() {
    let temp_dir = workspace();
    let facts = write_facts(temp_dir.path(), r#"{"files": [{"name": "big.rs", "lines": 1200}]}"#);

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run")
        .arg("naming.no_temp_files")
        .arg("--dir")
        .arg(temp_dir.path().join("rules"))
        .arg("--facts")
        .arg(&facts);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 rule(s) hold"))
        .stdout(predicate::str::contains("structure.max_file_lines").not());
}

#[test]
fn test_cli_run_philosophy_filter() {
    let temp_dir = workspace();
    let facts = write_facts(temp_dir.path(), r#"{"files": [{"name": "a.tmp", "lines": 3}]}"#);

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run")
        .arg("--dir")
        .arg(temp_dir.path().join("rules"))
        .arg("--facts")
        .arg(&facts)
        .arg("--philosophy")
        .arg("small-files");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("not eligible"))
        .stdout(predicate::str::contains("1 of 2 rule(s) hold"));
}

#[test]
fn test_cli_run_missing_facts_is_reported() {
    let temp_dir = workspace();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run").arg("--dir").arg(temp_dir.path().join("rules"));

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("unbound variable 'files'"));
}

#[test]
fn test_cli_run_nonexistent_rule() {
    let temp_dir = workspace();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run")
        .arg("nonexistent")
        .arg("--dir")
        .arg(temp_dir.path().join("rules"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown rule 'nonexistent'"));
}

#[test]
fn test_cli_run_duplicate_rule_ids() {
    let temp_dir = workspace();
    fs::write(temp_dir.path().join("rules").join("copy.json"), NO_TEMP_FILES).unwrap();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run").arg("--dir").arg(temp_dir.path().join("rules"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("duplicate rule id 'naming.no_temp_files'"));
}

#[test]
fn test_cli_run_missing_directory() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("run").arg("--dir").arg(temp_dir.path().join("absent"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_show_rule() {
    let temp_dir = workspace();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("show")
        .arg("structure.max_file_lines")
        .arg("--dir")
        .arg(temp_dir.path().join("rules"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Rule: structure.max_file_lines"))
        .stdout(predicate::str::contains("Severity: warning"))
        .stdout(predicate::str::contains("short files pass"))
        .stdout(predicate::str::contains("facts used: files"));
}
