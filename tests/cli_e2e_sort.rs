//! End-to-end tests for the `sort` command
//!
//! These tests invoke the actual CLI binary and validate its behavior
//! from a user's perspective.

mod common;
use common::prelude::*;

use std::fs;

/// Sorted output goes to stdout by default
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_sort_stdout() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("app.conf");
    file.write_str("[zz]\nb = 2\na = 1\n\n[aa]\nk = v\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("sort")
        .arg(file.path())
        .assert()
        .code(0)
        .stdout(predicate::eq("[aa]\nk = v\n\n[zz]\na = 1\nb = 2\n"));
}

/// In-place sorting rewrites the file and exits 2
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_sort_in_place_exit_two_when_changed() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("app.conf");
    file.write_str("[zz]\nb = 2\na = 1\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("sort").arg("-i").arg(file.path()).assert().code(2);
    assert_eq!(
        fs::read_to_string(file.path()).unwrap(),
        "[zz]\na = 1\nb = 2\n"
    );
}

/// An already sorted file exits 0 and keeps its bytes
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_sort_in_place_idempotent() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("app.conf");
    file.write_str("[zz]\nb = 2\na = 1\n").unwrap();

    cargo_bin_cmd!("conflayer")
        .arg("sort")
        .arg("-i")
        .arg(file.path())
        .assert()
        .code(2);
    cargo_bin_cmd!("conflayer")
        .arg("sort")
        .arg("-i")
        .arg(file.path())
        .assert()
        .code(0);
}

/// A bad file does not stop the batch; the run exits 22
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_sort_continues_past_bad_files() {
    let temp = TempDir::new().unwrap();
    let good = temp.child("good.conf");
    good.write_str("[zz]\nb = 2\na = 1\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("sort")
        .arg("-i")
        .arg(temp.path().join("missing.conf"))
        .arg(good.path())
        .assert()
        .code(22);
    // The good file was still sorted.
    assert_eq!(
        fs::read_to_string(good.path()).unwrap(),
        "[zz]\na = 1\nb = 2\n"
    );
}

/// Comments stay attached to their stanza, ahead of the sorted keys
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_sort_keeps_comments_first() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("app.conf");
    file.write_str("[s]\nz = 1\n# note\na = 2\n").unwrap();

    let mut cmd = cargo_bin_cmd!("conflayer");
    cmd.arg("sort")
        .arg(file.path())
        .assert()
        .code(0)
        .stdout(predicate::eq("[s]\n# note\na = 2\nz = 1\n"));
}
