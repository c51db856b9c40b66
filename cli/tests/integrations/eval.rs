use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_eval_simple_expression() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval").arg("1 + 2 * 3").arg("--raw");

    cmd.assert().success().stdout("7\n");
}

#[test]
fn test_cli_eval_with_bindings() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval")
        .arg("forall x in xs: x > floor")
        .arg("xs=[3, 4, 5]")
        .arg("floor=2")
        .arg("--raw");

    cmd.assert().success().stdout("true\n");
}

#[test]
fn test_cli_eval_unparseable_binding_is_a_string() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval")
        .arg("string.length(name)")
        .arg("name=hello world")
        .arg("--raw");

    cmd.assert().success().stdout("11\n");
}

#[test]
fn test_cli_eval_with_facts_file() {
    let temp_dir = TempDir::new().unwrap();
    let facts = temp_dir.path().join("facts.json");
    fs::write(&facts, r#"{"files": [{"lines": 10}, {"lines": 700}]}"#).unwrap();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval")
        .arg("exists f in files: f.lines > 500")
        .arg("--facts")
        .arg(&facts);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("true"))
        .stdout(predicate::str::contains("boolean"));
}

#[test]
fn test_cli_eval_trace() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval").arg("math.abs(-4) + 1").arg("--trace");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("operator"))
        .stdout(predicate::str::contains("5"));
}

#[test]
fn test_cli_eval_parse_error() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval").arg("forall x in xs x > 0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn test_cli_eval_unbound_variable() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval").arg("missing + 1");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unbound_variable"));
}

#[test]
fn test_cli_eval_limits() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("eval")
        .arg("fixpoint n from 0: n + 1")
        .arg("--limits")
        .arg(r#"{"max_fixpoint_iterations": 5}"#);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("did not converge after 5 iterations"));
}

#[test]
fn test_cli_functions_lists_builtins() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("functions");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("collection.union"))
        .stdout(predicate::str::contains("mucalculus.mu"));
}
