//! Question catalog loading and validation.
//!
//! Loads question arrays from JSON files and directories, checks them for
//! authoring mistakes, and builds the memorization summary.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::classifier;
use crate::model::{AnswerLabel, Question, QuestionType};

/// Characters of question text kept in a key-point excerpt.
pub const KEY_POINT_EXCERPT_CHARS: usize = 60;

/// Parse a single JSON file holding an array of questions.
pub fn parse_questions(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file: {}", path.display()))?;

    parse_questions_str(&content, path)
}

/// Parse a JSON string of questions (useful for testing).
pub fn parse_questions_str(content: &str, source_path: &Path) -> Result<Vec<Question>> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse questions: {}", source_path.display()))
}

/// Recursively load every `.json` question file under a directory. Files
/// that fail to parse are skipped with a warning.
pub fn load_question_directory(dir: &Path) -> Result<Vec<Question>> {
    let mut questions = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            questions.extend(load_question_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match parse_questions(&path) {
                Ok(qs) => questions.extend(qs),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(questions)
}

/// Load a file or a directory of files.
pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    if path.is_dir() {
        load_question_directory(path)
    } else {
        parse_questions(path)
    }
}

/// A warning from catalog validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub qid: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(qid: &str, message: impl Into<String>) -> Self {
        Self {
            qid: Some(qid.to_string()),
            message: message.into(),
        }
    }
}

/// Validate questions for common authoring issues. None of these stop a
/// question from being served.
pub fn validate_questions(questions: &[Question]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in questions {
        if !seen_ids.insert(&q.qid) {
            warnings.push(ValidationWarning::new(
                &q.qid,
                format!("duplicate question ID: {}", q.qid),
            ));
        }
    }

    for q in questions {
        if q.full_text().trim().is_empty() {
            warnings.push(ValidationWarning::new(&q.qid, "question text is empty"));
        }

        let rubric_sum: f64 = q.answers.iter().map(|a| a.score).sum();
        if rubric_sum > q.score + 1e-9 {
            warnings.push(ValidationWarning::new(
                &q.qid,
                format!("rubric scores sum to {rubric_sum}, above full marks {}", q.score),
            ));
        }

        let has_options = classifier::classify(q).options.is_some();
        if (q.kind == QuestionType::Mc || has_options)
            && q.answers.first().map_or(true, |a| a.text.trim().is_empty())
        {
            warnings.push(ValidationWarning::new(
                &q.qid,
                "multiple choice question has no answer key in answer[0]",
            ));
        }

        if q.kind == QuestionType::Vocabulary && q.blank_segments().next().is_none() {
            warnings.push(ValidationWarning::new(
                &q.qid,
                "vocabulary question has no score-referenced segments",
            ));
        }

        for segment in &q.segments {
            for &idx in segment.score_reference.iter().flatten() {
                if idx >= q.answers.len() {
                    warnings.push(ValidationWarning::new(
                        &q.qid,
                        format!(
                            "score-reference {idx} points past the {} rubric entries",
                            q.answers.len()
                        ),
                    ));
                }
            }
        }
    }

    warnings
}

/// Memorization summary for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPoint {
    pub qid: String,
    pub excerpt: String,
    pub points: Vec<String>,
}

/// Key points of every question with at least one `point` rubric line.
pub fn key_points(questions: &[Question]) -> Vec<KeyPoint> {
    questions
        .iter()
        .filter_map(|q| {
            let points: Vec<String> = q
                .answers
                .iter()
                .filter(|a| a.label == AnswerLabel::Point)
                .map(|a| a.text.clone())
                .collect();
            if points.is_empty() {
                return None;
            }
            let text = q.full_text();
            let excerpt = if text.chars().count() > KEY_POINT_EXCERPT_CHARS {
                format!("{}...", q.excerpt(KEY_POINT_EXCERPT_CHARS))
            } else {
                text
            };
            Some(KeyPoint {
                qid: q.qid.clone(),
                excerpt,
                points,
            })
        })
        .collect()
}
