//! End-to-end tests for the `diff` command
//!
//! These tests invoke the actual CLI binary and validate its behavior
//! from a user's perspective.

mod common;
use common::prelude::*;

/// Test that --help flag shows help information
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_diff_help() {
    let mut cmd = cargo_bin_cmd!("conflayer");

    cmd.arg("diff")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compare two configuration files"));
}

/// Equal files exit 0 with no output
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_diff_equal_files_exit_zero() {
    let temp = TempDir::new().unwrap();
    let a = temp.child("a.conf");
    let b = temp.child("b.conf");
    a.write_str("[s]\nk = v\n").unwrap();
    // Same content, different formatting and order.
    b.write_str("[s]\n# note\nk=v\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("diff")
        .arg(a.path())
        .arg(b.path())
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

/// Differing files exit 1 with +/- markers
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_diff_changed_files_exit_one() {
    let temp = TempDir::new().unwrap();
    let a = temp.child("a.conf");
    let b = temp.child("b.conf");
    a.write_str("[s]\nk = old\nsame = 1\n").unwrap();
    b.write_str("[s]\nk = new\nsame = 1\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("diff")
        .arg("--color")
        .arg("never")
        .arg(a.path())
        .arg(b.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("- k = old"))
        .stdout(predicate::str::contains("+ k = new"));
}

/// JSON format emits tagged operations
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_diff_json_format() {
    let temp = TempDir::new().unwrap();
    let a = temp.child("a.conf");
    let b = temp.child("b.conf");
    a.write_str("[s]\nk = old\nsame = 1\n").unwrap();
    b.write_str("[s]\nk = new\nsame = 1\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("diff")
        .arg("--format")
        .arg("json")
        .arg(a.path())
        .arg(b.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"replace\""));
}

/// A missing input file maps to exit code 22
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_diff_missing_file_exit_code() {
    let temp = TempDir::new().unwrap();
    let a = temp.child("a.conf");
    a.write_str("[s]\nk = v\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("diff")
        .arg(a.path())
        .arg(temp.path().join("nope.conf"))
        .assert()
        .code(22)
        .stderr(predicate::str::contains("File not found"));
}

/// Multi-line continuation values render as a line sub-diff
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_diff_multiline_subdiff() {
    let temp = TempDir::new().unwrap();
    let a = temp.child("a.conf");
    let b = temp.child("b.conf");
    a.write_str("[x]\nsearch = noop\n").unwrap();
    b.write_str("[x]\nsearch = a \\\n| stats count\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("diff")
        .arg("--color")
        .arg("never")
        .arg(a.path())
        .arg(b.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("- noop"))
        .stdout(predicate::str::contains("+ | stats count"));
}
