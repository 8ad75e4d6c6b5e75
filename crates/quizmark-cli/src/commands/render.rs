//! Plain-text rendering shared by the interactive and one-shot commands.

use quizmark_core::classifier::{self, blank_label, option_label, InteractionMode};
use quizmark_core::error::GradingError;
use quizmark_core::model::{GradingResult, Question};

pub fn print_question(question: &Question, position: Option<(usize, usize)>) {
    let parsed = classifier::classify(question);
    let mode = classifier::interaction_mode(question, &parsed);

    match position {
        Some((index, len)) => println!(
            "\n[{}/{}] {} ({}, {} marks)",
            index + 1,
            len,
            question.qid,
            question.kind,
            question.score
        ),
        None => println!("\n{} ({}, {} marks)", question.qid, question.kind, question.score),
    }

    let header = parsed.header();
    if !header.is_empty() {
        println!("{header}");
    }

    match mode {
        InteractionMode::MultipleChoice => {
            for (i, line) in parsed.options.iter().flatten().enumerate() {
                // Lines without their own label still need a selectable one.
                if classifier::option_body(line) == line.trim() {
                    println!("  {}. {line}", option_label(line, i));
                } else {
                    println!("  {line}");
                }
            }
            println!("(answer with option labels, e.g. \"A\" or \"A C\")");
        }
        InteractionMode::VocabularyFill => {
            for (i, segment) in question.blank_segments().enumerate() {
                println!("  ({}) {}", i + 1, blank_label(segment));
            }
            println!("(separate the blanks with \"|\")");
        }
        InteractionMode::FreeText => {}
    }
}

pub fn print_result(result: &GradingResult, question: &Question) {
    println!("\nScore: {}/{}", result.total_score, result.max_score);
    for item in &result.feedback {
        let mark = if item.hit { "+" } else { "-" };
        let point = question
            .answers
            .get(item.point_index)
            .map(|a| a.score)
            .unwrap_or(result.max_score);
        println!(
            "  [{mark}] point {} ({}/{}): {}",
            item.point_index + 1,
            item.awarded_score,
            point,
            item.comment
        );
    }
    if !result.overall_comment.is_empty() {
        println!("{}", result.overall_comment);
    }
}

pub fn print_framework(framework: &str) {
    println!("\n{framework}");
}

pub fn print_grading_error(err: &GradingError) {
    eprintln!("Grading failed: {err}");
    if let Some(help) = err.remediation() {
        eprintln!("{help}");
    }
}

pub fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|d| {
            d.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}
