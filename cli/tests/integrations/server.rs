use assert_cmd::Command;

#[test]
fn test_server_command_available() {
    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("server"));
}

#[test]
fn test_server_rejects_missing_workspace() {
    let temp_dir = tempfile::TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("server")
        .arg("--dir")
        .arg(temp_dir.path().join("absent"));

    let result = cmd.output().unwrap();
    assert!(!result.status.success());
}

#[test]
fn test_server_rejects_invalid_limits() {
    let temp_dir = tempfile::TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("purelogic").unwrap();
    cmd.arg("server")
        .arg("--dir")
        .arg(temp_dir.path())
        .arg("--limits")
        .arg("not json");

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Invalid --limits JSON"));
}
