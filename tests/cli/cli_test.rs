use assert_cmd::Command;
use predicates::str::contains;

use crate::utils::{case_props, collection, feature, write_geojson};

fn cmd() -> Command {
    Command::cargo_bin("geo-sieve").unwrap()
}

/// Test the catalogue listing
#[test]
fn test_models_command() {
    cmd()
        .arg("models")
        .assert()
        .success()
        .stdout(contains("case"))
        .stdout(contains("fttb_search"));
}

/// Test detection output with the tie-break marker
#[test]
fn test_detect_command() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_geojson(
        dir.path(),
        "CASE_BARLAD.geojson",
        &collection(vec![feature(case_props("VSB0001", "Barlad", "Eroilor", "1"))]),
    );
    cmd().arg("detect").arg(&file).assert().success().stdout(contains("* case"));
}

/// Test a full run and its exit code
#[test]
fn test_process_command() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_geojson(
        input.path(),
        "CASE_BARLAD.geojson",
        &collection(vec![
            feature(case_props("VSB0001", "Barlad", "Eroilor", "1")),
            feature(case_props("VSB0001", "Barlad", "Eroilor", "1")),
        ]),
    );

    cmd()
        .arg("process")
        .arg(input.path())
        .arg(out.path())
        .args(["--model", "case", "--no-duplicates"])
        .assert()
        .success()
        .stdout(contains("Batch Summary (case)"));
    assert!(out.path().join("case/case_centralized.geojson").exists());
    assert!(out.path().join("case/manifest.json").exists());
}

/// Test that a failing file gives exit code 1
#[test]
fn test_process_failure_exit_code() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("CASE_BROKEN.geojson"), b"[1, 2").unwrap();

    cmd()
        .arg("process")
        .arg(input.path())
        .arg(out.path())
        .args(["--model", "case", "--no-manifest"])
        .assert()
        .code(1)
        .stdout(contains("FAILED CASE_BROKEN.geojson"));
}

/// Test rejection of an unknown model id
#[test]
fn test_unknown_model() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    cmd()
        .arg("process")
        .arg(input.path())
        .arg(out.path())
        .args(["--model", "nope"])
        .assert()
        .failure();
}
