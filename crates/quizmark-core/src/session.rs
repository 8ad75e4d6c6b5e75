//! Quiz session controller.
//!
//! A session walks an ordered list of questions. Each visit to a question
//! starts with fresh input state; if the question has been graded before,
//! the latest stored attempt is shown instead of an empty answer.
//!
//! Grading is split in two so the caller can keep navigating while the
//! oracle works: [`QuizSession::begin_submit`] hands out an owned
//! [`PendingGrade`], and [`QuizSession::complete_submit`] applies its result
//! only if the user is still on the same visit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{self, InteractionMode, ParsedQuestion};
use crate::error::GradingError;
use crate::grading::{can_submit, is_help_request, GradeOutcome, GradingEngine, Submission};
use crate::model::{GradingResult, Question};

/// Display state of the current question.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionState {
    Unanswered,
    Grading,
    Graded {
        answer: String,
        result: GradingResult,
    },
    FrameworkShown {
        answer: String,
        result: GradingResult,
        framework: String,
    },
}

impl QuestionState {
    pub fn result(&self) -> Option<&GradingResult> {
        match self {
            QuestionState::Graded { result, .. } | QuestionState::FrameworkShown { result, .. } => {
                Some(result)
            }
            _ => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.result().is_some()
    }
}

/// Position and draft answer, restorable across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub index: usize,
    pub answer: String,
}

/// How a completed grading was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result is now displayed.
    Shown,
    /// Grading failed; see [`QuizSession::last_error`].
    Failed,
    /// The user moved on; the display was left alone.
    Stale,
}

/// An in-flight grading request, detached from the session.
pub struct PendingGrade {
    engine: Arc<GradingEngine>,
    question: Question,
    submission: Submission,
    visit: u64,
}

impl PendingGrade {
    pub fn qid(&self) -> &str {
        &self.question.qid
    }

    pub async fn run(self) -> GradeCompletion {
        let outcome = self.engine.submit(&self.question, self.submission).await;
        GradeCompletion {
            qid: self.question.qid,
            visit: self.visit,
            outcome,
        }
    }
}

/// The result of [`PendingGrade::run`], to be handed back to the session.
#[derive(Debug)]
pub struct GradeCompletion {
    pub qid: String,
    visit: u64,
    pub outcome: Result<GradeOutcome, GradingError>,
}

pub struct QuizSession {
    engine: Arc<GradingEngine>,
    questions: Vec<Question>,
    index: usize,
    visit: u64,
    state: QuestionState,
    draft: String,
    selections: BTreeSet<String>,
    vocabulary: BTreeMap<usize, String>,
    hint: Option<String>,
    last_error: Option<GradingError>,
}

impl QuizSession {
    pub fn new(engine: Arc<GradingEngine>, questions: Vec<Question>) -> Self {
        let mut session = Self {
            engine,
            questions,
            index: 0,
            visit: 0,
            state: QuestionState::Unanswered,
            draft: String::new(),
            selections: BTreeSet::new(),
            vocabulary: BTreeMap::new(),
            hint: None,
            last_error: None,
        };
        session.visit_current();
        session
    }

    /// Like [`QuizSession::new`] with the question order shuffled.
    pub fn shuffled<R: Rng + ?Sized>(
        engine: Arc<GradingEngine>,
        mut questions: Vec<Question>,
        rng: &mut R,
    ) -> Self {
        questions.shuffle(rng);
        Self::new(engine, questions)
    }

    pub fn engine(&self) -> &Arc<GradingEngine> {
        &self.engine
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn state(&self) -> &QuestionState {
        &self.state
    }

    pub fn parsed(&self) -> Option<ParsedQuestion> {
        self.current().map(classifier::classify)
    }

    pub fn mode(&self) -> Option<InteractionMode> {
        let question = self.current()?;
        let parsed = classifier::classify(question);
        Some(classifier::interaction_mode(question, &parsed))
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn selections(&self) -> &BTreeSet<String> {
        &self.selections
    }

    pub fn vocabulary(&self) -> &BTreeMap<usize, String> {
        &self.vocabulary
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn last_error(&self) -> Option<&GradingError> {
        self.last_error.as_ref()
    }

    // -- input ---------------------------------------------------------------

    pub fn set_answer(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Select or deselect an option label.
    pub fn toggle_choice(&mut self, label: &str) {
        let label = label.trim().to_uppercase();
        if !self.selections.remove(&label) {
            self.selections.insert(label);
        }
    }

    pub fn set_blank(&mut self, position: usize, value: impl Into<String>) {
        self.vocabulary.insert(position, value.into());
    }

    /// The submission the current inputs amount to.
    pub fn submission(&self) -> Submission {
        if is_help_request(&self.draft) {
            return Submission::Text(self.draft.clone());
        }
        match self.mode() {
            Some(InteractionMode::MultipleChoice) if !self.selections.is_empty() => {
                Submission::Choices(self.selections.iter().cloned().collect())
            }
            Some(InteractionMode::VocabularyFill) if !self.vocabulary.is_empty() => {
                Submission::Vocabulary(self.vocabulary.clone())
            }
            _ => Submission::Text(self.draft.clone()),
        }
    }

    pub fn can_submit(&self) -> bool {
        self.current().is_some()
            && self.state == QuestionState::Unanswered
            && can_submit(&self.submission())
    }

    // -- grading -------------------------------------------------------------

    /// Move to `Grading` and hand out the request to run.
    pub fn begin_submit(&mut self) -> Result<PendingGrade, GradingError> {
        let question = self.current().ok_or(GradingError::NoQuestion)?.clone();
        match self.state {
            QuestionState::Grading => return Err(GradingError::AlreadyGrading),
            QuestionState::Graded { .. } | QuestionState::FrameworkShown { .. } => {
                return Err(GradingError::AlreadyGraded)
            }
            QuestionState::Unanswered => {}
        }
        let submission = self.submission();
        if !can_submit(&submission) {
            return Err(GradingError::EmptySubmission);
        }

        self.state = QuestionState::Grading;
        self.last_error = None;
        debug!(qid = %question.qid, visit = self.visit, "grading started");
        Ok(PendingGrade {
            engine: self.engine.clone(),
            question,
            submission,
            visit: self.visit,
        })
    }

    /// Apply a finished grading.
    pub fn complete_submit(&mut self, completion: GradeCompletion) -> Completion {
        if completion.visit != self.visit {
            debug!(qid = %completion.qid, "grading finished after navigation");
            return Completion::Stale;
        }
        match completion.outcome {
            Ok(GradeOutcome::Graded { answer, result, .. }) => {
                self.state = QuestionState::Graded { answer, result };
                Completion::Shown
            }
            Ok(GradeOutcome::Framework {
                answer,
                result,
                framework,
            }) => {
                self.state = QuestionState::FrameworkShown {
                    answer,
                    result,
                    framework,
                };
                Completion::Shown
            }
            Err(e) => {
                self.state = QuestionState::Unanswered;
                self.last_error = Some(e);
                Completion::Failed
            }
        }
    }

    /// Submit and wait in one step.
    pub async fn submit(&mut self) -> Result<Completion, GradingError> {
        let pending = self.begin_submit()?;
        let completion = pending.run().await;
        Ok(self.complete_submit(completion))
    }

    /// Clear the displayed result so the question can be answered again.
    /// History is untouched.
    pub fn practice_again(&mut self) -> bool {
        if !self.state.is_answered() {
            return false;
        }
        self.visit += 1;
        self.clear_inputs();
        self.state = QuestionState::Unanswered;
        true
    }

    /// Fetch a hint once per visit. Not offered once the question is graded.
    pub async fn request_hint(&mut self) -> Option<&str> {
        if self.state.is_answered() {
            return None;
        }
        if self.hint.is_none() {
            let question = self.current()?.clone();
            let hint = self.engine.oracle().hint(&question).await;
            self.hint = Some(hint);
        }
        self.hint.as_deref()
    }

    // -- navigation ----------------------------------------------------------

    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.questions.len() {
            self.go_to(self.index + 1);
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.index > 0 && !self.questions.is_empty() {
            self.go_to(self.index - 1);
            true
        } else {
            false
        }
    }

    /// Jump to a 0-based index. Out-of-range targets are ignored.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.questions.len() {
            self.go_to(index);
            true
        } else {
            false
        }
    }

    /// Jump to a random question other than the current one.
    pub fn random(&mut self) -> bool {
        self.random_with(&mut rand::thread_rng())
    }

    pub fn random_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let len = self.questions.len();
        if len == 0 {
            return false;
        }
        if len == 1 {
            self.go_to(0);
            return true;
        }
        // Draw among the other questions, skipping over the current index.
        let mut target = rng.gen_range(0..len - 1);
        if target >= self.index {
            target += 1;
        }
        self.go_to(target);
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            index: self.index,
            answer: self.draft.clone(),
        }
    }

    /// Return to a snapshot's position. The draft is restored only when the
    /// question has no stored attempt to show.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> bool {
        if !self.jump_to(snapshot.index) {
            return false;
        }
        if self.state == QuestionState::Unanswered {
            self.draft = snapshot.answer.clone();
        }
        true
    }

    fn go_to(&mut self, index: usize) {
        self.index = index;
        self.visit_current();
    }

    fn clear_inputs(&mut self) {
        self.draft.clear();
        self.selections.clear();
        self.vocabulary.clear();
        self.hint = None;
        self.last_error = None;
    }

    fn visit_current(&mut self) {
        self.visit += 1;
        self.clear_inputs();
        self.state = QuestionState::Unanswered;

        let Some(question) = self.questions.get(self.index) else {
            return;
        };
        if let Some(latest) = self.engine.tracker().latest(&question.qid) {
            self.draft = latest.answer.clone();
            self.state = QuestionState::Graded {
                answer: latest.answer,
                result: latest.result,
            };
        }
    }
}
