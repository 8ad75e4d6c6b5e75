//! The `quizmark quiz` command: an interactive session on stdin.
//!
//! Lines starting with `:` are commands; anything else is an answer to the
//! current question. The position and draft are saved to `session.json` in
//! the data directory on exit and restored on the next run of the same
//! topic.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use quizmark_core::classifier::InteractionMode;
use quizmark_core::grading::is_help_request;
use quizmark_core::session::{Completion, QuestionState, QuizSession, SessionSnapshot};

use super::{render, App};

const SESSION_FILE: &str = "session.json";

const COMMANDS_HELP: &str =
    "Commands: :next :prev :jump N :random :hint :again :status :quit (anything else is an answer)";

#[derive(Debug, Serialize, Deserialize)]
struct SavedSession {
    topic: String,
    #[serde(flatten)]
    snapshot: SessionSnapshot,
}

pub struct QuizOptions {
    pub topic: Option<String>,
    pub random: bool,
    pub mistakes: bool,
    pub start: Option<usize>,
}

pub async fn execute(options: QuizOptions, config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path.as_deref())?;

    let (label, questions) = match (&options.topic, options.mistakes) {
        (Some(topic), false) => (topic.clone(), app.topic_questions(topic).await?),
        (topic, true) => {
            let open = app.tracker.mistake_ids();
            let pool = match topic {
                Some(t) => app.topic_questions(t).await?,
                None => app.catalog().await,
            };
            let questions: Vec<_> = pool.into_iter().filter(|q| open.contains(&q.qid)).collect();
            if questions.is_empty() {
                println!("No open mistakes to practice.");
                return Ok(());
            }
            (format!("mistakes:{}", topic.as_deref().unwrap_or("*")), questions)
        }
        (None, false) => bail!("either --topic or --mistakes is required"),
    };

    let engine = app.engine()?;
    let mut session = if options.random {
        QuizSession::shuffled(engine, questions, &mut rand::thread_rng())
    } else {
        QuizSession::new(engine, questions)
    };

    let session_path = app.config.data_dir.join(SESSION_FILE);
    match options.start {
        Some(n) => {
            if n == 0 || !session.jump_to(n - 1) {
                bail!("--start must be between 1 and {}", session.len());
            }
        }
        None if !options.random => {
            if let Some(saved) = load_saved(&session_path).filter(|s| s.topic == label) {
                session.restore(&saved.snapshot);
            }
        }
        None => {}
    }

    println!("{COMMANDS_HELP}");
    show_current(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix(':') {
            if !run_command(&mut session, command).await {
                break;
            }
        } else {
            answer(&mut session, line).await;
        }
    }

    save_session(&session_path, &label, &session);
    println!("Bye.");
    Ok(())
}

/// Handle one `:` command. Returns `false` to end the session.
async fn run_command(session: &mut QuizSession, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "next" | "n" => {
            if session.next() {
                show_current(session);
            } else {
                println!("This is the last question.");
            }
        }
        "prev" | "p" => {
            if session.previous() {
                show_current(session);
            } else {
                println!("This is the first question.");
            }
        }
        "jump" | "j" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n >= 1 && session.jump_to(n - 1) => show_current(session),
            _ => println!("Usage: :jump N (1-{})", session.len()),
        },
        "random" | "r" => {
            session.random();
            show_current(session);
        }
        "hint" | "h" => match session.request_hint().await {
            Some(hint) => println!("Hint: {hint}"),
            None => println!("Hints are not available once a question is graded."),
        },
        "again" | "a" => {
            if session.practice_again() {
                show_current(session);
            } else {
                println!("Nothing to retry yet.");
            }
        }
        "status" | "s" => print_status(session),
        "quit" | "q" | "exit" => return false,
        other => {
            println!("Unknown command ':{other}'.");
            println!("{COMMANDS_HELP}");
        }
    }
    true
}

async fn answer(session: &mut QuizSession, line: &str) {
    match session.mode() {
        Some(InteractionMode::VocabularyFill) if !is_help_request(line) => {
            for (i, part) in line.split('|').enumerate() {
                let part = part.trim();
                if !part.is_empty() {
                    session.set_blank(i, part);
                }
            }
        }
        _ => session.set_answer(line),
    }

    println!("Grading...");
    match session.submit().await {
        Ok(Completion::Shown) => show_state(session),
        Ok(Completion::Failed) => {
            if let Some(err) = session.last_error() {
                render::print_grading_error(err);
            }
        }
        Ok(Completion::Stale) => {}
        Err(e) => println!("{e}"),
    }
}

fn show_current(session: &QuizSession) {
    let Some(question) = session.current() else {
        return;
    };
    render::print_question(question, Some((session.index(), session.len())));
    match session.state() {
        QuestionState::Unanswered if !session.draft().is_empty() => {
            println!("(draft: {})", session.draft());
        }
        QuestionState::Graded { answer, .. } => {
            println!("\nYour answer: {answer}");
            show_state(session);
            println!("(:again to answer it again)");
        }
        _ => {}
    }
}

fn show_state(session: &QuizSession) {
    let Some(question) = session.current() else {
        return;
    };
    match session.state() {
        QuestionState::Graded { result, .. } => render::print_result(result, question),
        QuestionState::FrameworkShown {
            result, framework, ..
        } => {
            println!("\n{}", result.overall_comment);
            render::print_framework(framework);
        }
        _ => {}
    }
}

fn print_status(session: &QuizSession) {
    let tracker = session.engine().tracker();
    let answered = session
        .questions()
        .iter()
        .filter(|q| tracker.attempt_count(&q.qid) > 0)
        .count();
    println!(
        "Question {}/{}; {answered} attempted; {} open mistake(s).",
        session.index() + 1,
        session.len(),
        tracker.mistake_ids().len()
    );
}

fn load_saved(path: &Path) -> Option<SavedSession> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "ignoring unreadable session file"))
        .ok()
}

fn save_session(path: &Path, topic: &str, session: &QuizSession) {
    let saved = SavedSession {
        topic: topic.to_string(),
        snapshot: session.snapshot(),
    };
    let result = serde_json::to_string_pretty(&saved)
        .context("serializing session")
        .and_then(|json| {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json).context("writing session file")
        });
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "failed to save session");
    }
}
