//! The `quizmark analyze` command: weakness report over every question
//! ever flagged as a mistake.

use std::path::PathBuf;

use anyhow::Result;

use super::App;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let flagged = app.tracker.mistake_history_ids();
    if flagged.is_empty() {
        println!("No mistakes recorded yet, nothing to analyze.");
        return Ok(());
    }

    let questions: Vec<_> = app
        .catalog()
        .await
        .into_iter()
        .filter(|q| flagged.contains(&q.qid))
        .collect();
    if questions.is_empty() {
        println!("None of the flagged questions are in the current catalog.");
        return Ok(());
    }

    let engine = app.engine()?;
    println!("Analyzing {} question(s)...\n", questions.len());
    let report = engine
        .oracle()
        .analyze_weaknesses(&questions, &app.tracker.snapshot())
        .await;
    println!("{report}");
    Ok(())
}
