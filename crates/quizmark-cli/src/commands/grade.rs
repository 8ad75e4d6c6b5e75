//! The `quizmark grade` command: grade one answer and record it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use quizmark_core::grading::{GradeOutcome, Submission};

use super::{render, App};

pub async fn execute(
    topic: String,
    qid: String,
    answer: Option<String>,
    blanks: Vec<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let question = app.find_question(&topic, &qid).await?;
    let engine = app.engine()?;

    let submission = if blanks.is_empty() {
        Submission::Text(answer.context("either --answer or --blank is required")?)
    } else {
        Submission::Vocabulary(parse_blanks(&blanks)?)
    };

    render::print_question(&question, None);
    match engine.submit(&question, submission).await {
        Ok(GradeOutcome::Graded {
            result,
            flagged_mistake,
            ..
        }) => {
            render::print_result(&result, &question);
            if flagged_mistake {
                println!("Added to your mistake list.");
            }
            Ok(())
        }
        Ok(GradeOutcome::Framework {
            result, framework, ..
        }) => {
            println!("\n{}", result.overall_comment);
            render::print_framework(&framework);
            Ok(())
        }
        Err(e) => {
            if let Some(help) = e.remediation() {
                eprintln!("{help}");
            }
            Err(e.into())
        }
    }
}

/// `N=TEXT` pairs, with `N` the 1-based blank number.
fn parse_blanks(raw: &[String]) -> Result<BTreeMap<usize, String>> {
    raw.iter()
        .map(|pair| {
            let (n, text) = pair
                .split_once('=')
                .with_context(|| format!("invalid --blank '{pair}', expected N=TEXT"))?;
            let n: usize = n
                .trim()
                .parse()
                .with_context(|| format!("invalid blank number in '{pair}'"))?;
            anyhow::ensure!(n >= 1, "blank numbers start at 1");
            Ok((n - 1, text.to_string()))
        })
        .collect()
}
