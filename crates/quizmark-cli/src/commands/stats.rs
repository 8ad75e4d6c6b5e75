//! The `quizmark stats` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizmark_core::statistics::{compute_stats, ProgressStats};

use super::{render, App};

pub async fn execute(config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let catalog = app.catalog().await;
    let progress = app.tracker.snapshot();

    let Some(stats) = compute_stats(&progress, &catalog, &app.config.policy()) else {
        println!("No data yet. Answer a few questions first.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_summary(&stats, app.tracker.mistake_ids().len());
    Ok(())
}

fn print_summary(stats: &ProgressStats, open_mistakes: usize) {
    println!("Questions attempted:   {}", stats.attempted_count);
    println!("Total attempts:        {}", stats.total_attempts);
    println!("Average attempts:      {:.1}", stats.average_attempts());
    println!("First-attempt pass:    {:.1}%", stats.first_attempt_pass_rate);
    println!("Open mistakes:         {open_mistakes}");

    let mut by_type = Table::new();
    by_type.set_header(vec!["Type", "Questions", "Score", "Mastery"]);
    for (kind, t) in &stats.by_type {
        by_type.add_row(vec![
            Cell::new(kind),
            Cell::new(t.count),
            Cell::new(format!("{}/{}", t.score, t.total)),
            Cell::new(format!("{:.1}%", t.percentage())),
        ]);
    }
    println!("\n{by_type}");

    let mut by_topic = Table::new();
    by_topic.set_header(vec!["Topic", "Attempted", "Passed", "Total"]);
    for t in &stats.by_topic {
        by_topic.add_row(vec![
            Cell::new(&t.topic),
            Cell::new(t.attempted),
            Cell::new(t.correct),
            Cell::new(t.total),
        ]);
    }
    println!("\n{by_topic}");

    let mut recent = Table::new();
    recent.set_header(vec!["When", "Question", "Topic", "Score"]);
    for r in &stats.recent {
        recent.add_row(vec![
            Cell::new(render::format_timestamp(r.attempt.timestamp)),
            Cell::new(&r.excerpt),
            Cell::new(&r.topic),
            Cell::new(format!(
                "{}/{}",
                r.attempt.result.total_score, r.attempt.result.max_score
            )),
        ]);
    }
    println!("\n{recent}");
}
