//! The `quizmark hint` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{render, App};

pub async fn execute(topic: String, qid: String, config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let question = app.find_question(&topic, &qid).await?;
    let engine = app.engine()?;

    render::print_question(&question, None);
    let hint = engine.oracle().hint(&question).await;
    println!("\nHint: {hint}");
    Ok(())
}
