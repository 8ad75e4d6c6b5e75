//! The `quizmark browse` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizmark_core::classifier;

use super::{render, App};

const BROWSE_EXCERPT_CHARS: usize = 40;

pub async fn execute(topic: String, qid: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path.as_deref())?;

    if let Some(qid) = qid {
        let question = app.find_question(&topic, &qid).await?;
        render::print_question(&question, None);
        let history = app.tracker.history(&qid);
        if history.is_empty() {
            println!("\nNot attempted yet.");
        }
        for (i, attempt) in history.iter().enumerate() {
            println!(
                "\nAttempt {} ({}): {}/{}",
                i + 1,
                render::format_timestamp(attempt.timestamp),
                attempt.result.total_score,
                attempt.result.max_score
            );
            println!("  {}", attempt.answer);
        }
        return Ok(());
    }

    let questions = app.topic_questions(&topic).await?;
    let mut table = Table::new();
    table.set_header(vec!["#", "QID", "Type", "Marks", "Question", "Attempts", "Latest", "Mistake"]);
    for (i, q) in questions.iter().enumerate() {
        let parsed = classifier::classify(q);
        let latest = app
            .tracker
            .latest(&q.qid)
            .map(|a| format!("{}/{}", a.result.total_score, a.result.max_score))
            .unwrap_or_else(|| "-".to_string());
        let mistake = if app.tracker.is_mistake(&q.qid) { "yes" } else { "" };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&q.qid),
            Cell::new(q.kind),
            Cell::new(q.score),
            Cell::new(parsed.header().chars().take(BROWSE_EXCERPT_CHARS).collect::<String>()),
            Cell::new(app.tracker.attempt_count(&q.qid)),
            Cell::new(latest),
            Cell::new(mistake),
        ]);
    }
    println!("{topic} ({} questions)", questions.len());
    println!("{table}");
    Ok(())
}
