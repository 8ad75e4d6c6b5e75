//! End-to-end grading through the binary against a mock chat-completion
//! endpoint.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC: &str = "山居秋暝";

/// Run `init`, then point the oracle at `base_url`.
fn workspace(base_url: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    #[allow(deprecated)]
    Command::cargo_bin("quizmark")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    let config = dir.path().join("quizmark.toml");
    std::fs::write(
        &config,
        format!(
            r#"
data_dir = "state"

[oracle]
api_key = "sk-test"
base_url = "{base_url}"
model = "test/model"
timeout_secs = 5

[content]
local_dir = "demo-data"

[[content.topics]]
name = "{TOPIC}"
slug = "shanjuqiuming"
"#
        ),
    )
    .unwrap();
    (dir, config)
}

fn quizmark(config: &PathBuf) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizmark").unwrap();
    cmd.env_remove("QUIZMARK_API_KEY")
        .env_remove("QUIZMARK_MODEL")
        .env("RUST_LOG", "off")
        .arg("--config")
        .arg(config);
    cmd
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "test/model",
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn analysis_answer_is_graded_and_recorded() {
    let server = MockServer::start().await;
    let verdict = json!({
        "totalScore": 3,
        "maxScore": 4,
        "feedback": [
            {"pointIndex": 0, "awardedScore": 2, "hit": true, "comment": "能指出景物描寫"},
            {"pointIndex": 1, "awardedScore": 1, "hit": false, "comment": "情感說明不足"}
        ],
        "overallComment": "大致掌握借景抒情"
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(&verdict.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let (dir, config) = workspace(&server.uri());

    quizmark(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-03"])
        .args(["--answer", "詩人寫竹林喧鬧、浣女歸來，表現山居生活。"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 3/4"))
        .stdout(predicate::str::contains("[+] point 1 (2/2): 能指出景物描寫"))
        .stdout(predicate::str::contains("[-] point 2 (1/2): 情感說明不足"))
        .stdout(predicate::str::contains("Added to your mistake list."));

    let mistakes = std::fs::read_to_string(dir.path().join("state/dse_mistakes.json")).unwrap();
    assert!(mistakes.contains("SJQM-DEMO-03"));
}

#[tokio::test(flavor = "multi_thread")]
async fn help_request_shows_framework_without_recording() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("1. 先找出頸聯寫了哪些景物\n2. 再說明景物帶出的情感"))
        .mount(&server)
        .await;

    let (dir, config) = workspace(&server.uri());

    quizmark(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-03", "--answer", "唔識"])
        .assert()
        .success()
        .stdout(predicate::str::contains("答題框架"))
        .stdout(predicate::str::contains("先找出頸聯寫了哪些景物"));

    assert!(!dir.path().join("state/dse_progress.json").exists());
    assert!(!dir.path().join("state/dse_mistakes.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn help_phrase_on_vocabulary_in_quiz_is_not_graded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("1. 先判斷粗體字的詞性\n2. 再結合上下文解釋"))
        .expect(1)
        .mount(&server)
        .await;

    let (dir, config) = workspace(&server.uri());

    quizmark(&config)
        .args(["quiz", "--topic", TOPIC, "--start", "2"])
        .write_stdin("不知道\n:quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[2/3] SJQM-DEMO-02"))
        .stdout(predicate::str::contains("答題框架"))
        .stdout(predicate::str::contains("先判斷粗體字的詞性"))
        .stdout(predicate::str::contains("Score:").not());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("response_format").is_none());
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(!prompt.contains("竹喧歸浣女: 不知道"));

    assert!(!dir.path().join("state/dse_progress.json").exists());
    assert!(!dir.path().join("state/dse_mistakes.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn out_of_range_verdict_is_rejected() {
    let server = MockServer::start().await;
    let verdict = json!({
        "totalScore": 9,
        "maxScore": 4,
        "feedback": [],
        "overallComment": ""
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(&verdict.to_string()))
        .mount(&server)
        .await;

    let (dir, config) = workspace(&server.uri());

    quizmark(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-03", "--answer", "隨便作答"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid verdict"));

    assert!(!dir.path().join("state/dse_progress.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_key_prints_remediation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "No auth credentials found"}})),
        )
        .mount(&server)
        .await;

    let (_dir, config) = workspace(&server.uri());

    quizmark(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-03", "--answer", "作答"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("QUIZMARK_API_KEY"));
}

#[tokio::test(flavor = "multi_thread")]
async fn vocabulary_blanks_go_to_the_oracle() {
    let server = MockServer::start().await;
    let verdict = json!({
        "totalScore": 2,
        "maxScore": 2,
        "feedback": [
            {"pointIndex": 0, "awardedScore": 1, "hit": true, "comment": "正確"},
            {"pointIndex": 1, "awardedScore": 1, "hit": true, "comment": "正確"}
        ],
        "overallComment": "全對"
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(&verdict.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = workspace(&server.uri());

    quizmark(&config)
        .args(["grade", "--topic", TOPIC, "--qid", "SJQM-DEMO-02"])
        .args(["--blank", "1=洗衣", "--blank", "2=留下"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 2/2"))
        .stdout(predicate::str::contains("Added to your mistake list.").not());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("洗衣"));
    assert!(prompt.contains("留下"));
}
