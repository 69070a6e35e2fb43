//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_loads_and_prints_spliced_document() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("part.yaml"), "- 1\n- !exclude 2\n- 3\n").unwrap();
    fs::write(dir.path().join("root.yaml"), "items: !include part.yaml\n").unwrap();

    Command::cargo_bin("yaml-splice")
        .unwrap()
        .arg(dir.path().join("root.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("items:"))
        .stdout(predicate::str::contains("- 1"))
        .stdout(predicate::str::contains("- 3"))
        .stdout(predicate::str::contains("- 2").not());
}

#[test]
fn test_missing_include_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("root.yaml"), "broken: !include gone.yaml\n").unwrap();

    Command::cargo_bin("yaml-splice")
        .unwrap()
        .arg(dir.path().join("root.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("gone.yaml"));
}
