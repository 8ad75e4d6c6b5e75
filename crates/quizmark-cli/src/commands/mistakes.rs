//! The `quizmark mistakes` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::App;

pub enum Action {
    List,
    Add(String),
    Clear(String),
}

pub async fn execute(action: Action, config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path.as_deref())?;

    match action {
        Action::List => {
            let ids = app.tracker.mistake_ids();
            if ids.is_empty() {
                println!("No open mistakes.");
                return Ok(());
            }
            let catalog = app.catalog().await;
            let mut table = Table::new();
            table.set_header(vec!["QID", "Topic", "Question", "Attempts", "Latest"]);
            for qid in &ids {
                let question = catalog.iter().find(|q| &q.qid == qid);
                let latest = app
                    .tracker
                    .latest(qid)
                    .map(|a| format!("{}/{}", a.result.total_score, a.result.max_score))
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(qid),
                    Cell::new(question.map_or("-", |q| q.topic())),
                    Cell::new(question.map(|q| q.excerpt(30)).unwrap_or_default()),
                    Cell::new(app.tracker.attempt_count(qid)),
                    Cell::new(latest),
                ]);
            }
            println!("{table}");
            println!(
                "{} open, {} ever flagged.",
                ids.len(),
                app.tracker.mistake_history_ids().len()
            );
        }
        Action::Add(qid) => {
            app.tracker.toggle_mistake(&qid, true)?;
            println!("Marked {qid} as a mistake.");
        }
        Action::Clear(qid) => {
            app.tracker.toggle_mistake(&qid, false)?;
            println!("Cleared {qid} from the mistake list.");
        }
    }

    Ok(())
}
