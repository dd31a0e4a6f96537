//! CLI integration tests for the `walk` and `check` subcommands.
//!
//! Uses `assert_cmd` to spawn the `formwalk` binary and verify exit
//! codes, stdout content, and stderr content. Fixture files are written
//! into a per-test temp directory.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn formwalk() -> Command {
    cargo_bin_cmd!("formwalk")
}

fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> String {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn fixture_definition() -> serde_json::Value {
    serde_json::json!({
        "name": "Licence application",
        "pages": [
            {
                "path": "/age",
                "title": "Your age",
                "components": [
                    { "type": "NumberField", "name": "age", "title": "Age" }
                ],
                "next": [
                    { "path": "/licence", "condition": "isAdult" },
                    { "path": "/summary" }
                ]
            },
            {
                "path": "/licence",
                "title": "Licence",
                "components": [
                    { "type": "YesNoField", "name": "hasLicence", "title": "Has licence", "options": { "required": false } }
                ],
                "next": [ { "path": "/summary" } ]
            },
            { "path": "/summary", "title": "Summary", "components": [], "next": [] }
        ],
        "conditions": [
            {
                "name": "isAdult",
                "displayName": "Is adult",
                "value": {
                    "conditions": [
                        {
                            "field": { "name": "age", "type": "NumberField", "display": "Age" },
                            "operator": "is at least",
                            "value": { "type": "Value", "value": "18", "display": "18" }
                        }
                    ]
                }
            }
        ]
    })
}

// ──────────────────────────────────────────────
// Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    formwalk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Form journey engine toolchain"));
}

#[test]
fn version_exits_0() {
    formwalk()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("formwalk"));
}

// ──────────────────────────────────────────────
// check
// ──────────────────────────────────────────────

#[test]
fn check_reports_page_and_condition_counts() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());

    formwalk()
        .args(["check", &def])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 pages"))
        .stdout(predicate::str::contains("1 conditions"));
}

#[test]
fn check_json_output() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());

    formwalk()
        .args(["check", &def, "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"startPage\": \"/age\""));
}

#[test]
fn check_rejects_unknown_transition_condition() {
    let dir = TempDir::new().unwrap();
    let def = write_json(
        dir.path(),
        "broken.json",
        serde_json::json!({
            "name": "Broken",
            "pages": [
                {
                    "path": "/a",
                    "title": "A",
                    "components": [],
                    "next": [ { "path": "/b", "condition": "ghost" } ]
                },
                { "path": "/b", "title": "B", "components": [], "next": [] }
            ]
        }),
    );

    formwalk()
        .args(["check", &def])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn check_missing_file_exits_1() {
    formwalk()
        .args(["check", "/nonexistent/form.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error reading file"));
}

// ──────────────────────────────────────────────
// walk
// ──────────────────────────────────────────────

#[test]
fn walk_routes_through_guarded_page() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());
    let state = write_json(
        dir.path(),
        "state.json",
        serde_json::json!({ "referenceNumber": "REF-1", "age": 30, "hasLicence": true }),
    );

    formwalk()
        .args(["walk", &def, "--state", &state, "--page", "/summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/licence"))
        .stdout(predicate::str::contains("no validation errors"));
}

#[test]
fn walk_validation_failure_exits_2() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());
    // age is required but missing
    let state = write_json(
        dir.path(),
        "state.json",
        serde_json::json!({ "referenceNumber": "REF-1" }),
    );

    formwalk()
        .args(["walk", &def, "--state", &state, "--page", "/summary"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Age is required"));
}

#[test]
fn walk_without_reference_number_exits_1() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());
    let state = write_json(dir.path(), "state.json", serde_json::json!({ "age": 30 }));

    formwalk()
        .args(["walk", &def, "--state", &state])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("referenceNumber"));
}

#[test]
fn walk_json_output_carries_paths_and_errors() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());
    let state = write_json(
        dir.path(),
        "state.json",
        serde_json::json!({ "referenceNumber": "REF-1", "age": 15 }),
    );

    formwalk()
        .args([
            "walk", &def, "--state", &state, "--page", "/summary", "--output", "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"referenceNumber\": \"REF-1\""))
        .stdout(predicate::str::contains("/summary"))
        // Minors skip the licence page entirely
        .stdout(predicate::str::contains("/licence").not());
}

#[test]
fn walk_with_submission_payload() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());
    let state = write_json(
        dir.path(),
        "state.json",
        serde_json::json!({ "referenceNumber": "REF-1" }),
    );
    let payload = write_json(dir.path(), "payload.json", serde_json::json!({ "age": 21 }));

    formwalk()
        .args([
            "walk", &def, "--state", &state, "--page", "/age", "--payload", &payload,
            "--output", "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"age\": 21"));
}

#[test]
fn walk_rejects_non_object_state() {
    let dir = TempDir::new().unwrap();
    let def = write_json(dir.path(), "form.json", fixture_definition());
    let state = write_json(dir.path(), "state.json", serde_json::json!([1, 2, 3]));

    formwalk()
        .args(["walk", &def, "--state", &state])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("JSON object"));
}
