//! Mastery statistics over the attempt history.
//!
//! First-attempt correctness uses the first stored attempt of each question;
//! per-type and per-topic figures use the latest. Questions missing from the
//! catalog still count toward the pass rate and the attempt total but are
//! left out of the type, topic and recent breakdowns.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::model::{ProgressMap, Question, QuestionType, SavedResult};
use crate::progress::ScorePolicy;

/// Number of entries in the recent-activity feed.
pub const RECENT_LIMIT: usize = 8;

/// Characters of question text shown per recent entry.
pub const RECENT_EXCERPT_CHARS: usize = 40;

/// Latest-attempt totals for one question type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeStats {
    /// Sum of max scores.
    pub total: f64,
    /// Sum of awarded scores.
    pub score: f64,
    /// Questions of this type attempted.
    pub count: usize,
}

impl TypeStats {
    pub fn percentage(&self) -> f64 {
        if self.total > 0.0 {
            self.score / self.total * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStats {
    pub topic: String,
    /// Questions in this topic with at least one attempt.
    pub attempted: usize,
    /// Attempted questions whose latest attempt passes.
    pub correct: usize,
    /// Questions in this topic in the catalog.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAttempt {
    pub qid: String,
    pub excerpt: String,
    pub topic: String,
    pub attempt: SavedResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressStats {
    pub attempted_count: usize,
    /// Percentage in `0..=100`.
    pub first_attempt_pass_rate: f64,
    pub total_attempts: usize,
    pub by_type: BTreeMap<QuestionType, TypeStats>,
    pub by_topic: Vec<TopicStats>,
    pub recent: Vec<RecentAttempt>,
}

impl ProgressStats {
    pub fn average_attempts(&self) -> f64 {
        if self.attempted_count == 0 {
            0.0
        } else {
            self.total_attempts as f64 / self.attempted_count as f64
        }
    }
}

/// Compute statistics, or `None` when nothing has been attempted.
pub fn compute_stats(
    progress: &ProgressMap,
    catalog: &[Question],
    policy: &ScorePolicy,
) -> Option<ProgressStats> {
    let attempted: Vec<(&String, &Vec<SavedResult>)> =
        progress.iter().filter(|(_, h)| !h.is_empty()).collect();
    if attempted.is_empty() {
        return None;
    }

    let by_qid: HashMap<&str, &Question> = catalog.iter().map(|q| (q.qid.as_str(), q)).collect();

    let mut first_passes = 0usize;
    let mut total_attempts = 0usize;
    let mut by_type: BTreeMap<QuestionType, TypeStats> = BTreeMap::new();
    let mut topics = TopicTable::default();
    let mut recent = Vec::new();

    for (qid, history) in &attempted {
        total_attempts += history.len();
        let (Some(first), Some(latest)) = (history.first(), history.last()) else {
            continue;
        };
        if policy.passes(&first.result) {
            first_passes += 1;
        }

        let Some(question) = by_qid.get(qid.as_str()) else {
            continue;
        };

        let entry = by_type.entry(question.kind).or_default();
        entry.total += latest.result.max_score;
        entry.score += latest.result.total_score;
        entry.count += 1;

        let topic = question.topic();
        let row = topics.row(topic);
        row.attempted += 1;
        if policy.passes(&latest.result) {
            row.correct += 1;
        }

        let excerpt = if question.full_text().chars().count() > RECENT_EXCERPT_CHARS {
            format!("{}...", question.excerpt(RECENT_EXCERPT_CHARS))
        } else {
            question.full_text()
        };
        recent.extend(history.iter().map(|attempt| RecentAttempt {
            qid: (*qid).clone(),
            excerpt: excerpt.clone(),
            topic: topic.to_string(),
            attempt: attempt.clone(),
        }));
    }

    for question in catalog {
        topics.row(question.topic()).total += 1;
    }

    recent.sort_by(|a, b| b.attempt.timestamp.cmp(&a.attempt.timestamp));
    recent.truncate(RECENT_LIMIT);

    Some(ProgressStats {
        attempted_count: attempted.len(),
        first_attempt_pass_rate: first_passes as f64 / attempted.len() as f64 * 100.0,
        total_attempts,
        by_type,
        by_topic: topics.rows,
        recent,
    })
}

/// Topic rows in first-seen order.
#[derive(Default)]
struct TopicTable {
    rows: Vec<TopicStats>,
}

impl TopicTable {
    fn row(&mut self, topic: &str) -> &mut TopicStats {
        let idx = match self.rows.iter().position(|r| r.topic == topic) {
            Some(idx) => idx,
            None => {
                self.rows.push(TopicStats {
                    topic: topic.to_string(),
                    attempted: 0,
                    correct: 0,
                    total: 0,
                });
                self.rows.len() - 1
            }
        };
        &mut self.rows[idx]
    }
}
