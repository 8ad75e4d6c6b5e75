//! The `quizmark topics` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::App;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path.as_deref())?;

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Questions", "Attempted", "Mistakes"]);

    let mistakes = app.tracker.mistake_ids();
    for topic in app.content.topics() {
        let questions = app.content.questions(&topic).await;
        let attempted = questions
            .iter()
            .filter(|q| app.tracker.attempt_count(&q.qid) > 0)
            .count();
        let open = questions.iter().filter(|q| mistakes.contains(&q.qid)).count();
        table.add_row(vec![
            Cell::new(&topic),
            Cell::new(questions.len()),
            Cell::new(attempted),
            Cell::new(open),
        ]);
    }

    println!("{table}");
    Ok(())
}
