//! Question classification.
//!
//! Splits a question's segments into prompt lines and option lines and
//! derives the interaction surface (multiple choice, vocabulary fill, free
//! text) from that split. Everything here is a pure function of the
//! question, so callers may recompute it freely instead of caching it.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Question, QuestionType, Segment};

/// `A.`, `b `, `C、` ...
static MAIN_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-D][\s.、]").expect("valid main option regex"));

/// `1.`, `2、`, `③ ` ...
static SUB_POINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-4①-④][\s.、]").expect("valid sub-point regex"));

static OPTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-D1-4①-④]").expect("valid option label regex"));

static OPTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-D1-4①-④][\s.、]*").expect("valid option prefix regex"));

/// How the user answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    /// Pick one or more labelled options.
    MultipleChoice,
    /// Fill one input per blank-tagged segment.
    VocabularyFill,
    /// Write free text.
    FreeText,
}

/// Result of classifying a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    /// Option lines, or `None` when the question has no option list.
    pub options: Option<Vec<String>>,
    /// Prompt lines to render above the input.
    pub header_lines: Vec<String>,
}

impl ParsedQuestion {
    pub fn header(&self) -> String {
        self.header_lines.join("\n").trim().to_string()
    }
}

fn is_main_option(line: &str) -> bool {
    MAIN_OPTION.is_match(line)
}

fn is_sub_point(line: &str) -> bool {
    SUB_POINT.is_match(line)
}

/// Split a question into header lines and option lines.
///
/// Numbered sub-points only count as options when no A-D option exists
/// anywhere in the question; otherwise they are numbered clauses of the
/// prose.
pub fn classify(question: &Question) -> ParsedQuestion {
    let has_main_options = question
        .segments
        .iter()
        .any(|s| is_main_option(s.text.trim()));

    let mut option_lines = Vec::new();
    let mut header_lines = Vec::new();

    for segment in &question.segments {
        let text = segment.text.as_str();
        let trimmed = text.trim();
        let is_option =
            is_main_option(trimmed) || (!has_main_options && is_sub_point(trimmed));

        if is_option {
            if text.contains('\n') {
                for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
                    if is_main_option(line) || is_sub_point(line) {
                        option_lines.push(line.to_string());
                    } else {
                        header_lines.push(line.to_string());
                    }
                }
            } else {
                option_lines.push(trimmed.to_string());
            }
        } else if !(question.kind == QuestionType::Vocabulary && segment.score_reference.is_some())
        {
            header_lines.push(text.to_string());
        }
    }

    ParsedQuestion {
        options: if option_lines.is_empty() {
            None
        } else {
            Some(option_lines)
        },
        header_lines,
    }
}

/// Interaction surface for an already-classified question.
pub fn interaction_mode(question: &Question, parsed: &ParsedQuestion) -> InteractionMode {
    if parsed.options.is_some() {
        InteractionMode::MultipleChoice
    } else if question.kind == QuestionType::Vocabulary {
        InteractionMode::VocabularyFill
    } else {
        InteractionMode::FreeText
    }
}

/// Selectable label of an option line: its leading letter or number,
/// upper-cased, or the 1-based position when the line has none.
pub fn option_label(line: &str, position: usize) -> String {
    match OPTION_LABEL.find(line) {
        Some(m) => m.as_str().to_uppercase(),
        None => (position + 1).to_string(),
    }
}

/// Option text with its label prefix removed.
pub fn option_body(line: &str) -> String {
    OPTION_PREFIX.replace(line, "").trim().to_string()
}

/// Prompt label of a blank: the segment text with `**` emphasis removed.
pub fn blank_label(segment: &Segment) -> String {
    segment.text.replace("**", "").trim().to_string()
}
