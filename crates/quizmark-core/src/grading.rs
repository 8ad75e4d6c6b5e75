//! Grading engine.
//!
//! One call to [`GradingEngine::submit`] grades exactly one attempt. Multiple
//! choice is graded locally; vocabulary and free-text answers go to the
//! rubric oracle. Successful gradings are recorded through the progress
//! tracker and low scores flag the question as a mistake. Failures record
//! nothing, so the same submission can simply be retried.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::classifier::{self, blank_label, InteractionMode};
use crate::error::GradingError;
use crate::model::{FeedbackItem, GradingResult, Question};
use crate::oracle::RubricOracle;
use crate::progress::{ProgressTracker, ScorePolicy};

/// Phrases meaning "I don't know", matched case-insensitively against the
/// whole trimmed answer.
pub const HELP_PHRASES: &[&str] = &[
    "不知道", "唔知", "唔識", "唔識填", "不會", "不會做", "不懂", "我唔識", "我不會", "我不知道",
    "求助", "help",
];

const HELP_COMMENT: &str =
    "我們明白這道題目可能有一定難度。系統已為您準備了答題框架，建議您可以根據指引嘗試重新組織答案。加油！";
const MC_HIT_COMMENT: &str = "答案正確。";
const MC_HIT_OVERALL: &str = "選擇正確，繼續保持！";
const MC_MISS_OVERALL: &str = "可惜選錯了，建議重溫相關範文內容。";

/// Raw user input for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Free text typed by the user.
    Text(String),
    /// Selected option labels.
    Choices(Vec<String>),
    /// Blank position (among score-referenced segments) to input.
    Vocabulary(BTreeMap<usize, String>),
}

impl Submission {
    /// `true` when nothing gradable was entered.
    pub fn is_empty(&self) -> bool {
        match self {
            Submission::Text(text) => text.trim().is_empty(),
            Submission::Choices(labels) => labels.iter().all(|l| l.trim().is_empty()),
            Submission::Vocabulary(inputs) => inputs.values().all(|v| v.trim().is_empty()),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Submission::Text(_) => "text",
            Submission::Choices(_) => "choice",
            Submission::Vocabulary(_) => "vocabulary",
        }
    }
}

/// Whether the submit action should be offered for `submission`.
pub fn can_submit(submission: &Submission) -> bool {
    !submission.is_empty()
}

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeOutcome {
    /// The answer was graded and recorded.
    Graded {
        answer: String,
        result: GradingResult,
        flagged_mistake: bool,
    },
    /// The user asked for help. Nothing was recorded.
    Framework {
        answer: String,
        result: GradingResult,
        framework: String,
    },
}

impl GradeOutcome {
    pub fn answer(&self) -> &str {
        match self {
            GradeOutcome::Graded { answer, .. } | GradeOutcome::Framework { answer, .. } => answer,
        }
    }

    pub fn result(&self) -> &GradingResult {
        match self {
            GradeOutcome::Graded { result, .. } | GradeOutcome::Framework { result, .. } => result,
        }
    }
}

pub struct GradingEngine {
    oracle: Arc<RubricOracle>,
    tracker: Arc<ProgressTracker>,
    policy: ScorePolicy,
}

impl GradingEngine {
    pub fn new(oracle: Arc<RubricOracle>, tracker: Arc<ProgressTracker>, policy: ScorePolicy) -> Self {
        Self {
            oracle,
            tracker,
            policy,
        }
    }

    pub fn oracle(&self) -> &Arc<RubricOracle> {
        &self.oracle
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    pub fn policy(&self) -> ScorePolicy {
        self.policy
    }

    /// Grade one attempt at `question`.
    #[instrument(skip(self, question, submission), fields(qid = %question.qid, kind = %question.kind))]
    pub async fn submit(
        &self,
        question: &Question,
        submission: Submission,
    ) -> Result<GradeOutcome, GradingError> {
        if submission.is_empty() {
            return Err(GradingError::EmptySubmission);
        }

        if let Submission::Text(text) = &submission {
            if is_help_request(text) {
                debug!("help request, fetching framework instead of grading");
                let framework = self.oracle.framework(question).await;
                return Ok(GradeOutcome::Framework {
                    answer: text.trim().to_string(),
                    result: help_result(question),
                    framework,
                });
            }
        }

        let parsed = classifier::classify(question);
        let mode = classifier::interaction_mode(question, &parsed);
        let unsupported = |expected: &'static str| GradingError::UnsupportedSubmission {
            submitted: submission.kind_name(),
            expected,
        };

        let (answer, result) = match mode {
            InteractionMode::MultipleChoice => {
                let answer = match &submission {
                    Submission::Choices(labels) => canonical_choices(labels),
                    Submission::Text(text) => canonical_choices(split_choice_text(text)),
                    Submission::Vocabulary(_) => return Err(unsupported("multiple choice")),
                };
                if answer.is_empty() {
                    return Err(GradingError::EmptySubmission);
                }
                let result = grade_choice(question, &answer);
                debug!(%answer, hit = result.total_score > 0.0, "graded locally");
                (answer, result)
            }
            InteractionMode::VocabularyFill => {
                let answer = match &submission {
                    Submission::Vocabulary(inputs) => vocabulary_composite(question, inputs),
                    Submission::Text(text) => text.trim().to_string(),
                    Submission::Choices(_) => return Err(unsupported("vocabulary")),
                };
                if answer.trim().is_empty() {
                    return Err(GradingError::EmptySubmission);
                }
                let result = self.oracle.grade(question, &answer).await?;
                (answer, result)
            }
            InteractionMode::FreeText => {
                let answer = match &submission {
                    Submission::Text(text) => text.trim().to_string(),
                    _ => return Err(unsupported("free text")),
                };
                let result = self.oracle.grade(question, &answer).await?;
                (answer, result)
            }
        };

        // Store failures are logged by the tracker; the in-memory history
        // still holds the attempt.
        if let Err(e) = self.tracker.record_attempt(&question.qid, &answer, result.clone()) {
            warn!("attempt kept in memory only: {e:#}");
        }
        // A question worth nothing cannot be failed.
        let flagged_mistake = result.max_score > 0.0 && !self.policy.passes(&result);
        if flagged_mistake {
            if let Err(e) = self.tracker.toggle_mistake(&question.qid, true) {
                warn!("mistake flag kept in memory only: {e:#}");
            }
        }

        Ok(GradeOutcome::Graded {
            answer,
            result,
            flagged_mistake,
        })
    }
}

/// Exact, case-insensitive match against [`HELP_PHRASES`].
pub fn is_help_request(text: &str) -> bool {
    let trimmed = text.trim().to_lowercase();
    HELP_PHRASES.iter().any(|p| *p == trimmed)
}

fn help_result(question: &Question) -> GradingResult {
    GradingResult {
        total_score: 0.0,
        max_score: question.score,
        feedback: vec![],
        overall_comment: HELP_COMMENT.to_string(),
    }
}

/// Trim, upper-case, de-duplicate and sort labels, joined with `、`.
pub fn canonical_choices<I, S>(labels: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|l| l.as_ref().trim().to_uppercase())
        .filter(|l| !l.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join("、")
}

fn split_choice_text(text: &str) -> Vec<&str> {
    text.split(|c: char| matches!(c, '、' | ',' | '，' | '/') || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Local multiple-choice verdict for a canonical answer.
pub fn grade_choice(question: &Question, answer: &str) -> GradingResult {
    let correct = question.answers.first().map_or("", |a| a.text.trim());
    let hit = answer == correct;
    let awarded = if hit { question.score } else { 0.0 };

    let comment = if hit {
        MC_HIT_COMMENT.to_string()
    } else {
        match question.answers.get(1) {
            Some(explanation) => format!("答案不正確。正確答案為「{correct}」。\n{}", explanation.text),
            None => format!("答案不正確。正確答案為「{correct}」。"),
        }
    };

    GradingResult {
        total_score: awarded,
        max_score: question.score,
        feedback: vec![FeedbackItem {
            point_index: 0,
            awarded_score: awarded,
            hit,
            comment,
        }],
        overall_comment: if hit { MC_HIT_OVERALL } else { MC_MISS_OVERALL }.to_string(),
    }
}

/// One `label: input` line per filled blank, in blank order.
pub fn vocabulary_composite(question: &Question, inputs: &BTreeMap<usize, String>) -> String {
    let blanks: Vec<_> = question.blank_segments().collect();
    inputs
        .iter()
        .filter_map(|(&idx, value)| match blanks.get(idx) {
            Some(segment) => Some(format!("{}: {}", blank_label(segment), value)),
            None => {
                warn!(qid = %question.qid, idx, blanks = blanks.len(), "ignoring input for missing blank");
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
