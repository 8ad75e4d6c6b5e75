//! Local persistent state.
//!
//! Three JSON blobs live under fixed keys in a string key-value store: the
//! mistake set, the mistake history set and the per-question attempt
//! history. A fourth key records the layout version so older layouts can be
//! upgraded once at load.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{ProgressMap, SavedResult};

pub const MISTAKES_KEY: &str = "dse_mistakes";
pub const MISTAKE_HISTORY_KEY: &str = "dse_mistake_history";
pub const PROGRESS_KEY: &str = "dse_progress";
pub const VERSION_KEY: &str = "dse_state_version";

/// Layout version written by this crate. Version 1 stored a bare
/// `SavedResult` per question instead of an attempt list.
pub const STATE_VERSION: u32 = 2;

/// Minimal string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// In-process store, used by tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?
            .remove(key);
        Ok(())
    }
}

/// Per-question history as it may appear on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredAttempts {
    Current(Vec<SavedResult>),
    Legacy(SavedResult),
}

impl StoredAttempts {
    pub fn into_attempts(self) -> Vec<SavedResult> {
        match self {
            StoredAttempts::Current(v) => v,
            StoredAttempts::Legacy(single) => vec![single],
        }
    }
}

/// Everything the progress tracker keeps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersistedState {
    pub mistakes: BTreeSet<String>,
    pub mistake_history: BTreeSet<String>,
    pub progress: ProgressMap,
}

impl PersistedState {
    /// Load and upgrade state. Never fails: unreadable or corrupt blobs are
    /// logged and treated as empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mistakes = read_blob::<BTreeSet<String>>(store, MISTAKES_KEY).unwrap_or_default();
        let mut mistake_history =
            read_blob::<BTreeSet<String>>(store, MISTAKE_HISTORY_KEY).unwrap_or_default();
        // Older layouts could leave the history set behind the mistake set.
        mistake_history.extend(mistakes.iter().cloned());

        let version = read_blob::<u32>(store, VERSION_KEY).unwrap_or(1);
        let raw = read_blob::<HashMap<String, serde_json::Value>>(store, PROGRESS_KEY)
            .unwrap_or_default();

        let mut upgraded = 0usize;
        let mut progress = ProgressMap::new();
        for (qid, value) in raw {
            match serde_json::from_value::<StoredAttempts>(value) {
                Ok(stored) => {
                    if matches!(stored, StoredAttempts::Legacy(_)) {
                        upgraded += 1;
                    }
                    progress.insert(qid, stored.into_attempts());
                }
                Err(e) => warn!(%qid, "dropping unreadable progress entry: {e}"),
            }
        }

        let state = Self {
            mistakes,
            mistake_history,
            progress,
        };

        if upgraded > 0 || (version < STATE_VERSION && !state.progress.is_empty()) {
            info!(from = version, to = STATE_VERSION, upgraded, "migrating stored progress");
            if let Err(e) = state.write_progress(store).and_then(|_| write_version(store)) {
                warn!("failed to write migrated state: {e:#}");
            }
        }

        debug!(
            questions = state.progress.len(),
            mistakes = state.mistakes.len(),
            "loaded persisted state"
        );
        state
    }

    pub fn write_progress(&self, store: &dyn KeyValueStore) -> Result<()> {
        write_blob(store, PROGRESS_KEY, &self.progress)
    }

    pub fn write_mistakes(&self, store: &dyn KeyValueStore) -> Result<()> {
        write_blob(store, MISTAKES_KEY, &self.mistakes)?;
        write_blob(store, MISTAKE_HISTORY_KEY, &self.mistake_history)
    }

    /// Write every blob plus the version marker.
    pub fn write_all(&self, store: &dyn KeyValueStore) -> Result<()> {
        self.write_progress(store)?;
        self.write_mistakes(store)?;
        write_version(store)
    }
}

fn write_version(store: &dyn KeyValueStore) -> Result<()> {
    write_blob(store, VERSION_KEY, &STATE_VERSION)
}

fn read_blob<T: for<'de> Deserialize<'de>>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, "failed to read stored state: {e:#}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, "stored state is corrupt, starting empty: {e}");
            None
        }
    }
}

fn write_blob<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).with_context(|| format!("failed to encode {key}"))?;
    store.set(key, &json)
}
