//! Smoke tests for the layoutlint CLI
//!
//! These run the real binary against recorded snapshots.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use layoutlint::{ElementSpec, LayoutSnapshot, SnapshotBuilder, Viewport};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command for the layoutlint binary
fn layoutlint() -> Command {
    Command::cargo_bin("layoutlint").expect("layoutlint binary should exist")
}

fn clipped_page() -> LayoutSnapshot {
    let mut doc = SnapshotBuilder::new(Viewport::default());
    doc.url("https://shop.test/cart");
    let body = doc.body();
    doc.push(
        body,
        ElementSpec::new("div")
            .id("total")
            .xywh(0.0, 0.0, 100.0, 20.0)
            .style("overflow-x", "hidden")
            .scroll_size(400.0, 20.0),
    );
    doc.build()
}

fn empty_page() -> LayoutSnapshot {
    let mut doc = SnapshotBuilder::new(Viewport::default());
    doc.url("https://shop.test/empty");
    doc.build()
}

fn write(dir: &Path, name: &str, snapshot: &LayoutSnapshot) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(snapshot).unwrap()).unwrap();
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help_flag() {
    layoutlint()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("rules"));
}

#[test]
fn test_no_args_shows_help() {
    layoutlint().assert().failure();
}

#[test]
fn test_rules_lists_builtin_rules() {
    let assert = layoutlint()
        .args(["--color", "never", "rules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clipped-content"))
        .stdout(predicate::str::contains("corner-radius-coherence"))
        .stdout(predicate::str::contains("hit-target-obscured"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 9);
}

// ============================================================================
// Check Tests
// ============================================================================

#[test]
fn test_check_reports_errors_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "cart.json", &clipped_page());
    layoutlint()
        .current_dir(dir.path())
        .args(["--color", "never", "check", "--snapshot"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("https://shop.test/cart"))
        .stdout(predicate::str::contains(
            "Content is clipped by overflow: ~300px horizontally",
        ))
        .stdout(predicate::str::contains("#total"));
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().unwrap();
    let cart = write(dir.path(), "cart.json", &clipped_page());
    let empty = write(dir.path(), "empty.json", &empty_page());
    let assert = layoutlint()
        .current_dir(dir.path())
        .args(["check", "--format", "json", "-s"])
        .arg(&empty)
        .arg("-s")
        .arg(&cart)
        .assert()
        .code(1);
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["url"], "https://shop.test/empty");
    assert_eq!(results[1]["url"], "https://shop.test/cart");
    assert_eq!(results[1]["messages"][0]["ruleId"], "clipped-content");
}

#[test]
fn test_check_clean_page_succeeds() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "empty.json", &empty_page());
    layoutlint()
        .current_dir(dir.path())
        .args(["--color", "never", "check", "-s"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No layout problems in 1 page(s)"));
}

#[test]
fn test_rule_override_turns_rule_off() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "cart.json", &clipped_page());
    layoutlint()
        .current_dir(dir.path())
        .args(["check", "--format", "json", "--rule", "clipped-content=off", "-s"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("clipped-content").not());
}

#[test]
fn test_config_file_in_working_directory() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "cart.json", &clipped_page());
    std::fs::write(
        dir.path().join(".layoutlint.yaml"),
        "rules:\n  clipped-content: warn\n",
    )
    .unwrap();
    layoutlint()
        .current_dir(dir.path())
        .args(["--color", "never", "check", "-s"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("warn   Content is clipped"));
}

#[test]
fn test_bad_rule_override_is_a_usage_error() {
    layoutlint()
        .args(["check", "--rule", "clipped-content", "-s", "cart.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ID=SEVERITY"));
}

#[test]
fn test_missing_snapshot_file_fails() {
    let dir = TempDir::new().unwrap();
    layoutlint()
        .current_dir(dir.path())
        .args(["check", "-s", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[cfg(not(feature = "browser"))]
#[test]
fn test_urls_need_browser_feature() {
    layoutlint()
        .args(["check", "https://shop.test/cart"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--features browser"));
}
