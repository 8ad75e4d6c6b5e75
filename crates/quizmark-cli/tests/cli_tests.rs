//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TOPIC: &str = "山居秋暝";

fn quizmark() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizmark").unwrap();
    cmd.env("QUIZMARK_API_KEY", "test-key")
        .env_remove("QUIZMARK_MODEL")
        .env("RUST_LOG", "off");
    cmd
}

/// A temp dir with `quizmark init` already run in it.
fn initialized() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
    let config = dir.path().join("quizmark.toml");
    (dir, config)
}

fn with_config(config: &Path) -> Command {
    let mut cmd = quizmark();
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizmark.toml"))
        .stdout(predicate::str::contains("shanjuqiuming.json"));

    assert!(dir.path().join("quizmark.toml").exists());
    assert!(dir.path().join("demo-data/data/shanjuqiuming.json").exists());
    assert!(dir.path().join("demo-data/data/source/shanjuqiuming.json").exists());
}

#[test]
fn init_skips_existing_files() {
    let (dir, _) = initialized();

    quizmark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizmark.toml already exists, skipping."));
}

#[test]
fn validate_demo_catalog() {
    let (dir, _) = initialized();

    quizmark()
        .arg("validate")
        .arg("--questions")
        .arg(dir.path().join("demo-data/data"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Topic: 山居秋暝 (3 questions)"))
        .stdout(predicate::str::contains("All 3 questions valid."));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"[
            {"QID": "X1", "question": [{"text": "甲"}], "score": 1, "type": "mc",
             "answer": [{"text": "解說", "label": "point", "score": 0}]},
            {"QID": "X1", "question": [{"text": "乙"}], "score": 1, "type": "copy",
             "answer": [{"text": "答", "label": "exact", "score": 3}]}
        ]"#,
    )
    .unwrap();

    quizmark()
        .arg("validate")
        .arg("--questions")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[X1] WARNING"))
        .stdout(predicate::str::contains("warning(s) found."));
}

#[test]
fn validate_nonexistent_file() {
    quizmark()
        .arg("validate")
        .arg("--questions")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn topics_lists_configured_topics() {
    let (_dir, config) = initialized();

    with_config(&config)
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains(TOPIC))
        .stdout(predicate::str::contains("3"));
}

#[test]
fn stats_without_attempts() {
    let (_dir, config) = initialized();

    with_config(&config)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("No data yet"));
}

#[test]
fn grade_multiple_choice_offline() {
    let (dir, config) = initialized();

    with_config(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-01", "--answer", "c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 2/2"))
        .stdout(predicate::str::contains("Added to your mistake list.").not());

    let progress = dir.path().join("quizmark-data/dse_progress.json");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(progress).unwrap()).unwrap();
    assert_eq!(saved["SJQM-DEMO-01"][0]["answer"], "C");

    with_config(&config)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Questions attempted:   1"))
        .stdout(predicate::str::contains("mc"));
}

#[test]
fn wrong_answer_lands_in_mistakes() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-01", "--answer", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0/2"))
        .stdout(predicate::str::contains("正確答案為「C」"))
        .stdout(predicate::str::contains("Added to your mistake list."));

    with_config(&config)
        .args(["mistakes", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SJQM-DEMO-01"))
        .stdout(predicate::str::contains("1 open, 1 ever flagged."));

    with_config(&config)
        .args(["mistakes", "clear", "SJQM-DEMO-01"])
        .assert()
        .success();

    with_config(&config)
        .arg("mistakes")
        .assert()
        .success()
        .stdout(predicate::str::contains("No open mistakes."));
}

#[test]
fn mistakes_can_be_added_by_hand() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["mistakes", "add", "SJQM-DEMO-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked SJQM-DEMO-03 as a mistake."));

    with_config(&config)
        .args(["mistakes", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SJQM-DEMO-03"));
}

#[test]
fn grade_unknown_question_fails() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "NOPE", "--answer", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("question 'NOPE' not found"));

    with_config(&config)
        .args(["grade", "--topic", "不存在", "--qid", "NOPE", "--answer", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no questions found"));
}

#[test]
fn quiz_session_over_stdin() {
    let (dir, config) = initialized();

    with_config(&config)
        .args(["quiz", "--topic", TOPIC])
        .write_stdin("C\n:next\n:status\n:bogus\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/3] SJQM-DEMO-01"))
        .stdout(predicate::str::contains("Score: 2/2"))
        .stdout(predicate::str::contains("[2/3] SJQM-DEMO-02"))
        .stdout(predicate::str::contains("Question 2/3; 1 attempted"))
        .stdout(predicate::str::contains("Unknown command ':bogus'."));

    let session = dir.path().join("quizmark-data/session.json");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(session).unwrap()).unwrap();
    assert_eq!(saved["topic"], TOPIC);
    assert_eq!(saved["index"], 1);

    // The next run resumes where the last one stopped, and the graded
    // question shows its stored result.
    with_config(&config)
        .args(["quiz", "--topic", TOPIC])
        .write_stdin(":prev\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[2/3] SJQM-DEMO-02"))
        .stdout(predicate::str::contains("Your answer: C"));
}

#[test]
fn quiz_start_out_of_range() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["quiz", "--topic", TOPIC, "--start", "9"])
        .write_stdin(":quit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--start must be between 1 and 3"));
}

#[test]
fn quiz_without_mistakes() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["quiz", "--mistakes"])
        .write_stdin(":quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No open mistakes to practice."));
}

#[test]
fn memorize_lists_key_points() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["memorize", "--topic", TOPIC])
        .assert()
        .success()
        .stdout(predicate::str::contains("SJQM-DEMO-03"))
        .stdout(predicate::str::contains("  - 流露詩人對山居純樸生活的喜愛"));
}

#[test]
fn original_text_modes() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["original", "--topic", TOPIC])
        .assert()
        .success()
        .stdout(predicate::str::contains("山居秋暝 (王維)"))
        .stdout(predicate::str::contains("明月在松林間照耀"));

    with_config(&config)
        .args(["original", "--topic", "shanjuqiuming", "--mode", "word"])
        .assert()
        .success()
        .stdout(predicate::str::contains("空山：空寂的山"))
        .stdout(predicate::str::contains("明月在松林間照耀").not());
}

#[test]
fn reset_requires_confirmation() {
    let (_dir, config) = initialized();

    with_config(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-01", "--answer", "C"])
        .assert()
        .success();

    with_config(&config)
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    with_config(&config)
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All progress cleared."));

    with_config(&config)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("No data yet"));
}

#[test]
fn analyze_without_mistakes() {
    let (_dir, config) = initialized();

    with_config(&config)
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("No mistakes recorded yet"));
}
