//! Core data model types for quizmark.
//!
//! These mirror the JSON documents served by the content store and the
//! blobs written to the local state store, so field names follow the wire
//! format rather than Rust conventions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Topic bucket used when a question has no `knowledge` requirement.
pub const OTHER_TOPIC: &str = "其他";

/// A single exam-style question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Globally unique question identifier.
    #[serde(rename = "QID")]
    pub qid: String,
    /// Knowledge and prerequisite tags.
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Ordered prose segments making up the prompt.
    #[serde(rename = "question", default)]
    pub segments: Vec<Segment>,
    /// Full marks for this question.
    pub score: f64,
    /// Question type.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Rubric lines.
    #[serde(rename = "answer", default)]
    pub answers: Vec<AnswerPoint>,
}

impl Question {
    /// All segment text joined without separators.
    pub fn full_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// The first `max_chars` characters of the question text.
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.full_text().chars().take(max_chars).collect()
    }

    /// Topic from the first `knowledge` requirement, or [`OTHER_TOPIC`].
    pub fn topic(&self) -> &str {
        self.requires
            .iter()
            .find(|r| r.kind == RequirementKind::Knowledge)
            .and_then(|r| r.topic.as_deref())
            .unwrap_or(OTHER_TOPIC)
    }

    /// Segments tagged with a score reference, in order. These are the
    /// fill-in-the-blank prompts of a vocabulary question.
    pub fn blank_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.score_reference.is_some())
    }
}

/// A prerequisite or topic tag on a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: RequirementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "QID", default, skip_serializing_if = "Option::is_none")]
    pub qid: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementKind {
    Knowledge,
    QuestionCompletion,
}

/// A chunk of question prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Indices into the question's rubric this segment corresponds to.
    #[serde(
        rename = "score-reference",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub score_reference: Option<Vec<usize>>,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            score_reference: None,
        }
    }

    pub fn with_reference(text: impl Into<String>, refs: Vec<usize>) -> Self {
        Self {
            text: text.into(),
            score_reference: Some(refs),
        }
    }
}

/// One rubric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPoint {
    pub text: String,
    pub label: AnswerLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub score: f64,
}

/// How strictly an answer point is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerLabel {
    /// Verbatim excerpt from the set text.
    Exact,
    /// Paraphrase accepted if the meaning holds.
    Point,
    /// Holistic judgement.
    Complete,
}

/// Supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Copy,
    Analysis,
    Mc,
    Vocabulary,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Copy => write!(f, "copy"),
            QuestionType::Analysis => write!(f, "analysis"),
            QuestionType::Mc => write!(f, "mc"),
            QuestionType::Vocabulary => write!(f, "vocabulary"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "copy" => Ok(QuestionType::Copy),
            "analysis" => Ok(QuestionType::Analysis),
            "mc" | "multiple-choice" => Ok(QuestionType::Mc),
            "vocabulary" | "vocab" => Ok(QuestionType::Vocabulary),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub total_score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub feedback: Vec<FeedbackItem>,
    #[serde(default)]
    pub overall_comment: String,
}

impl GradingResult {
    /// `total / max`, treating a non-positive max as zero.
    pub fn ratio(&self) -> f64 {
        if self.max_score > 0.0 {
            self.total_score / self.max_score
        } else {
            0.0
        }
    }
}

/// Verdict on a single rubric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    /// 0-based index into the question's rubric.
    pub point_index: usize,
    pub awarded_score: f64,
    pub hit: bool,
    #[serde(default)]
    pub comment: String,
}

/// One persisted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResult {
    pub answer: String,
    pub result: GradingResult,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// QID to chronological attempt history.
pub type ProgressMap = BTreeMap<String, Vec<SavedResult>>;

/// A set text with its line-by-line translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalText {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub content: Vec<OriginalLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalLine {
    pub source: String,
    pub translation: Translation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    /// Word-level glosses.
    #[serde(default)]
    pub word: Vec<String>,
    /// Sentence-level rendering.
    #[serde(default)]
    pub sentence: String,
}
