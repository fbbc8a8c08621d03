//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bank_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../question-banks/cloud-practitioner.toml")
}

/// A `certprep` command isolated from the user's config and attempt store.
fn certprep(home: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("certprep").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("CERTPREP_USER", "tester")
        .env(
            "CERTPREP_STORE_PATH",
            home.path().join("data/attempts.json"),
        )
        .env_remove("RUST_LOG");
    cmd
}

fn take(home: &TempDir, input: &str) -> assert_cmd::assert::Assert {
    certprep(home)
        .arg("take")
        .arg("--bank")
        .arg(bank_path())
        .write_stdin(input)
        .assert()
}

fn attempt_id(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|l| l.strip_prefix("Attempt: "))
        .map(|s| s.trim().to_string())
        .expect("review should print the attempt id")
}

/// Answers every question correctly, then submits.
const PERFECT_RUN: &str = "2\nn\n1 2\nn\n2\nn\n1,2\nn\n2\ns\n";

#[test]
fn validate_sample_bank() {
    let home = TempDir::new().unwrap();
    certprep(&home)
        .arg("validate")
        .arg("--bank")
        .arg(bank_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("5 questions"))
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn validate_reports_broken_bank() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[assessment]
id = "broken"
title = "Broken"
passing_score = 120

[[questions]]
id = "q1"
prompt = "Pick"
options = ["A", "B"]
correct = ["A", "B"]
"#,
    )
    .unwrap();

    certprep(&home)
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("ERROR"))
        .stderr(predicate::str::contains("cannot be taken"));
}

#[test]
fn validate_nonexistent_file() {
    let home = TempDir::new().unwrap();
    certprep(&home)
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let home = TempDir::new().unwrap();

    certprep(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created certprep.toml"))
        .stdout(predicate::str::contains("Created question-banks/example.toml"));

    assert!(home.path().join("certprep.toml").exists());
    assert!(home.path().join("question-banks/example.toml").exists());

    certprep(&home)
        .arg("validate")
        .arg("--bank")
        .arg("question-banks")
        .assert()
        .success();
}

#[test]
fn init_skips_existing() {
    let home = TempDir::new().unwrap();

    certprep(&home).arg("init").assert().success();

    certprep(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn take_perfect_run_then_history_and_review() {
    let home = TempDir::new().unwrap();

    let output = take(&home, PERFECT_RUN)
        .success()
        .stdout(predicate::str::contains("No previous attempts."))
        .stdout(predicate::str::contains("Score: 100% (PASSED)"))
        .stdout(predicate::str::contains("(submitted)"))
        .get_output()
        .stdout
        .clone();
    let id = attempt_id(&output);

    certprep(&home)
        .arg("history")
        .arg("--assessment")
        .arg("cloud-practitioner")
        .assert()
        .success()
        .stdout(predicate::str::contains("History for cloud-practitioner (tester)"))
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains(id.as_str()));

    certprep(&home)
        .arg("review")
        .arg("--bank")
        .arg(bank_path())
        .arg("--attempt")
        .arg(&id)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("## Cloud Practitioner Practice Exam"))
        .stdout(predicate::str::contains("**Score:** 100% (passed)"));

    let json = certprep(&home)
        .arg("review")
        .arg("--bank")
        .arg(bank_path())
        .arg("--attempt")
        .arg(&id)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let review: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(review["score"], 100);
    assert_eq!(review["correct_count"], 5);
    assert_eq!(review["items"].as_array().unwrap().len(), 5);

    let saved = home.path().join("reviews/perfect.json");
    certprep(&home)
        .arg("review")
        .arg("--bank")
        .arg(bank_path())
        .arg("--attempt")
        .arg(&id)
        .arg("--out")
        .arg(&saved)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 100% (PASSED)"));
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(written["attempt_id"], id.as_str());
    assert_eq!(written["total_points"], 70);

    // A saved review renders without the attempt store or the bank.
    std::fs::remove_file(home.path().join("data/attempts.json")).unwrap();
    certprep(&home)
        .arg("review")
        .arg("--from")
        .arg(&saved)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("**Score:** 100% (passed)"));
}

#[test]
fn review_needs_attempt_or_saved_file() {
    let home = TempDir::new().unwrap();
    certprep(&home)
        .arg("review")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--attempt"));

    certprep(&home)
        .arg("review")
        .arg("--from")
        .arg("missing-review.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read review"));
}

#[test]
fn take_partial_run_is_not_passed() {
    let home = TempDir::new().unwrap();

    // Only the first question right (10 of 70 points), a wrong pick on the last.
    take(&home, "2\ng 5\n1\ns\n")
        .success()
        .stdout(predicate::str::contains("Score: 14% (NOT PASSED)"))
        .stdout(predicate::str::contains("Explanations:"));

    take(&home, "q\n")
        .success()
        .stdout(predicate::str::contains("Previous attempts: 1 (0 passed)"));
}

#[test]
fn take_quit_discards_attempt() {
    let home = TempDir::new().unwrap();

    take(&home, "2\nq\n")
        .success()
        .stdout(predicate::str::contains("Attempt discarded."));

    certprep(&home)
        .arg("history")
        .arg("--assessment")
        .arg("cloud-practitioner")
        .assert()
        .success()
        .stdout(predicate::str::contains("No attempts recorded"));
}

#[test]
fn take_closed_input_discards_attempt() {
    let home = TempDir::new().unwrap();
    take(&home, "")
        .success()
        .stdout(predicate::str::contains("Input closed, attempt discarded."));
    assert!(!home.path().join("data/attempts.json").exists());
}

#[test]
fn submit_only_from_answered_last_question() {
    let home = TempDir::new().unwrap();
    // Unanswered first, answered first, then unanswered last question.
    take(&home, "s\n2\ns\ng 5\ns\ng 9\n7\nq\n")
        .success()
        .stdout(predicate::str::contains(
            "Answer the last question before submitting.",
        ))
        .stdout(predicate::str::contains("No question 9."))
        .stdout(predicate::str::contains("No option 7."))
        .stdout(predicate::str::contains("Score:").not())
        .stdout(predicate::str::contains("Attempt discarded."));
}

#[test]
fn take_unknown_assessment() {
    let home = TempDir::new().unwrap();
    certprep(&home)
        .arg("take")
        .arg("--bank")
        .arg(bank_path())
        .arg("--assessment")
        .arg("missing")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn review_unknown_attempt() {
    let home = TempDir::new().unwrap();
    certprep(&home)
        .arg("review")
        .arg("--bank")
        .arg(bank_path())
        .arg("--attempt")
        .arg("00000000-0000-0000-0000-000000000000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    certprep(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Timed certification practice exams"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    certprep(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("certprep"));
}
