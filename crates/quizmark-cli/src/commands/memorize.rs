//! The `quizmark memorize` command: rubric key points for recitation.

use std::path::PathBuf;

use anyhow::Result;

use quizmark_core::catalog::key_points;

use super::App;

pub async fn execute(topic: String, config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let questions = app.topic_questions(&topic).await?;

    let points = key_points(&questions);
    if points.is_empty() {
        println!("No key points for {topic}.");
        return Ok(());
    }

    for kp in &points {
        println!("\n{} {}", kp.qid, kp.excerpt);
        for point in &kp.points {
            println!("  - {point}");
        }
    }
    Ok(())
}
