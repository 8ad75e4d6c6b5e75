//! Attempt history and mistake tracking.
//!
//! The tracker owns the in-memory [`PersistedState`] behind a mutex and
//! writes every mutation through to the backing store while the lock is
//! held, so the stored blob never goes backwards. The lock is never held
//! across an await point.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{GradingResult, ProgressMap, SavedResult};
use crate::store::{KeyValueStore, PersistedState};

/// Threshold deciding whether a score counts as a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePolicy {
    pub pass_ratio: f64,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self { pass_ratio: 0.8 }
    }
}

impl ScorePolicy {
    pub fn new(pass_ratio: f64) -> Self {
        Self { pass_ratio }
    }

    /// A zero max never passes.
    pub fn passes(&self, result: &GradingResult) -> bool {
        result.max_score > 0.0 && result.ratio() >= self.pass_ratio
    }
}

pub struct ProgressTracker {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<PersistedState>,
}

impl ProgressTracker {
    /// Load state from `store` (migrating if needed) and track it.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let state = PersistedState::load(store.as_ref());
        Self {
            store,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PersistedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an attempt stamped with the current time.
    pub fn record_attempt(&self, qid: &str, answer: &str, result: GradingResult) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.record_attempt_at(qid, answer, result, now)
    }

    /// Append an attempt with an explicit epoch-millisecond timestamp.
    pub fn record_attempt_at(
        &self,
        qid: &str,
        answer: &str,
        result: GradingResult,
        timestamp: i64,
    ) -> Result<()> {
        let mut state = self.lock();
        let history = state.progress.entry(qid.to_string()).or_default();
        history.push(SavedResult {
            answer: answer.to_string(),
            result,
            timestamp,
        });
        debug!(qid, attempts = history.len(), "recorded attempt");
        state
            .write_progress(self.store.as_ref())
            .inspect_err(|e| warn!(qid, "failed to persist attempt: {e:#}"))
    }

    /// Flag or clear a question as a mistake. Flagging also adds it to the
    /// history set, which is never cleared.
    pub fn toggle_mistake(&self, qid: &str, is_mistake: bool) -> Result<()> {
        let mut state = self.lock();
        let changed = if is_mistake {
            let added = state.mistakes.insert(qid.to_string());
            state.mistake_history.insert(qid.to_string()) || added
        } else {
            state.mistakes.remove(qid)
        };
        if !changed {
            return Ok(());
        }
        debug!(qid, is_mistake, "mistake set changed");
        state
            .write_mistakes(self.store.as_ref())
            .inspect_err(|e| warn!(qid, "failed to persist mistakes: {e:#}"))
    }

    pub fn history(&self, qid: &str) -> Vec<SavedResult> {
        self.lock().progress.get(qid).cloned().unwrap_or_default()
    }

    pub fn latest(&self, qid: &str) -> Option<SavedResult> {
        self.lock()
            .progress
            .get(qid)
            .and_then(|h| h.last().cloned())
    }

    pub fn attempt_count(&self, qid: &str) -> usize {
        self.lock().progress.get(qid).map_or(0, Vec::len)
    }

    pub fn is_mistake(&self, qid: &str) -> bool {
        self.lock().mistakes.contains(qid)
    }

    pub fn mistake_ids(&self) -> BTreeSet<String> {
        self.lock().mistakes.clone()
    }

    pub fn mistake_history_ids(&self) -> BTreeSet<String> {
        self.lock().mistake_history.clone()
    }

    /// A copy of the full attempt map.
    pub fn snapshot(&self) -> ProgressMap {
        self.lock().progress.clone()
    }

    /// Wipe all attempts and both mistake sets.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock();
        *state = PersistedState::default();
        state
            .write_all(self.store.as_ref())
            .inspect_err(|e| warn!("failed to persist reset: {e:#}"))
    }
}
