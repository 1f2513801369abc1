use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

use test_helpers::base_daybook_command;

fn entry_files(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_cli_list_empty() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries."));
}

#[test]
fn test_cli_creates_missing_directory() {
    let temp_dir = tempdir().unwrap();
    let entries_dir = temp_dir.path().join("diary");

    base_daybook_command(&entries_dir)
        .arg("list")
        .assert()
        .success();

    assert!(entries_dir.is_dir());
}

#[test]
fn test_cli_add_then_list_and_show() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["add", "Trip", "--content", "Day 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved: Trip"));

    let files = entry_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_Trip.txt"));

    base_daybook_command(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Trip ("));

    base_daybook_command(temp_dir.path())
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Trip\n"))
        .stdout(predicate::str::contains("Day 1"));
}

#[test]
fn test_cli_add_reads_stdin() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["add", "Letter"])
        .write_stdin("Dear diary,\n\nnothing happened.\n")
        .assert()
        .success();

    let files = entry_files(temp_dir.path());
    let text = fs::read_to_string(temp_dir.path().join(&files[0])).unwrap();
    let mut lines = text.splitn(3, '\n');
    assert_eq!(lines.next(), Some("Letter"));
    lines.next();
    assert_eq!(lines.next(), Some("Dear diary,\n\nnothing happened."));
}

#[test]
fn test_cli_add_rejects_empty_title() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["add", "", "--content", "orphan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Title cannot be empty."));

    assert!(entry_files(temp_dir.path()).is_empty());
}

#[test]
fn test_cli_edit_replaces_file() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["add", "Trip", "--content", "Day 1"])
        .assert()
        .success();
    let before = entry_files(temp_dir.path());

    base_daybook_command(temp_dir.path())
        .args(["edit", "1", "--content", "Day 1 edited"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved: Trip"));

    assert_eq!(entry_files(temp_dir.path()), before);
    let text = fs::read_to_string(temp_dir.path().join(&before[0])).unwrap();
    assert!(text.ends_with("\nDay 1 edited"));
}

#[test]
fn test_cli_edit_without_changes() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["add", "Trip", "--content", "Day 1"])
        .assert()
        .success();

    base_daybook_command(temp_dir.path())
        .args(["edit", "1", "--content", "Day 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to change."));
}

#[test]
fn test_cli_search() {
    let temp_dir = tempdir().unwrap();

    for (title, content) in [("Beach", "sand"), ("Work", "meetings")] {
        base_daybook_command(temp_dir.path())
            .args(["add", title, "--content", content])
            .assert()
            .success();
    }

    base_daybook_command(temp_dir.path())
        .args(["search", "SAND"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beach"))
        .stdout(predicate::str::contains("Work").not());
}

#[test]
fn test_cli_delete() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["add", "Trip", "--content", "Day 1"])
        .assert()
        .success();

    base_daybook_command(temp_dir.path())
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entry deleted"));

    assert!(entry_files(temp_dir.path()).is_empty());
}

#[test]
fn test_cli_position_out_of_range() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["show", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entry at position 5"));
}

#[test]
fn test_cli_write_from_stdin() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["write", "Journal"])
        .write_stdin("line one\nline two\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved: Journal"));

    let files = entry_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    let text = fs::read_to_string(temp_dir.path().join(&files[0])).unwrap();
    assert!(text.ends_with("\nline one\nline two"));
}

#[test]
fn test_cli_rejects_relative_dir() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .args(["list", "--dir", "relative/diary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absolute path"));
}

#[test]
fn test_cli_rejects_bad_autosave_interval() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .env("DAYBOOK_AUTOSAVE_SECS", "never")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DAYBOOK_AUTOSAVE_SECS"));
}

#[test]
fn test_cli_verbose_json_logging() {
    let temp_dir = tempdir().unwrap();

    base_daybook_command(temp_dir.path())
        .env_remove("RUST_LOG")
        .args(["list", "--verbose", "--log-format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"level\":\"DEBUG\""));
}
