//! The `quizmark validate` command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use quizmark_core::catalog;

pub fn execute(questions_path: PathBuf) -> Result<()> {
    let questions = catalog::load_questions(&questions_path)?;

    let mut per_topic: BTreeMap<&str, usize> = BTreeMap::new();
    for q in &questions {
        *per_topic.entry(q.topic()).or_default() += 1;
    }
    for (topic, count) in &per_topic {
        println!("Topic: {topic} ({count} questions)");
    }

    let warnings = catalog::validate_questions(&questions);
    for w in &warnings {
        let prefix = w
            .qid
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All {} questions valid.", questions.len());
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
