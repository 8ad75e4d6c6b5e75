//! Content sources: the question catalog and set texts, per topic.
//!
//! Each topic has a slug; its questions live at `data/<slug>.json` and its
//! original text at `data/source/<slug>.json`, relative to either a base URL
//! or a local directory. Fetch failures are logged and degrade to empty
//! results.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use quizmark_core::model::{OriginalText, Question};
use quizmark_core::traits::ContentSource;

use crate::error::ContentError;

pub const DEFAULT_CONTENT_BASE_URL: &str = "https://alphabrate.github.io/dse/chinese/";

/// A topic name and the slug its documents are stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub name: String,
    pub slug: String,
}

impl TopicEntry {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    pub fn questions_path(&self) -> String {
        format!("data/{}.json", self.slug)
    }

    pub fn source_path(&self) -> String {
        format!("data/source/{}.json", self.slug)
    }
}

/// The twelve HKDSE Chinese set texts.
pub fn default_topics() -> Vec<TopicEntry> {
    [
        ("山居秋暝", "shanjuqiuming"),
        ("月下獨酌", "yuexiaduzhuo"),
        ("登樓", "denglou"),
        ("念奴嬌・赤壁懷古", "niannujiao"),
        ("聲聲慢・秋情", "shengshengman"),
        ("青玉案・元夕", "qingyuan"),
        ("師說", "shishuo"),
        ("岳陽樓記", "yueyanglouji"),
        ("始得西山宴遊記", "shidexishanyanyouji"),
        ("六國論", "liuguolun"),
        ("論仁、論孝、論君子", "lunyu"),
        ("魚我所欲也", "yuwosuoyuye"),
    ]
    .into_iter()
    .map(|(name, slug)| TopicEntry::new(name, slug))
    .collect()
}

fn find_topic<'a>(topics: &'a [TopicEntry], name: &str) -> Option<&'a TopicEntry> {
    let found = topics.iter().find(|t| t.name == name || t.slug == name);
    if found.is_none() {
        warn!(topic = name, "unknown topic");
    }
    found
}

/// Static JSON documents served over HTTP.
pub struct HttpContentSource {
    base_url: String,
    topics: Vec<TopicEntry>,
    client: reqwest::Client,
}

impl HttpContentSource {
    pub fn new(
        base_url: Option<String>,
        topics: Vec<TopicEntry>,
        timeout_secs: u64,
    ) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_CONTENT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            base_url,
            topics,
            client,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ContentError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "fetching content");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    #[instrument(skip(self))]
    async fn questions(&self, topic: &str) -> Vec<Question> {
        let Some(entry) = find_topic(&self.topics, topic) else {
            return Vec::new();
        };
        self.fetch(&entry.questions_path())
            .await
            .unwrap_or_else(|e| {
                warn!(topic, "failed to fetch questions: {e}");
                Vec::new()
            })
    }

    #[instrument(skip(self))]
    async fn original_text(&self, topic: &str) -> Option<OriginalText> {
        let entry = find_topic(&self.topics, topic)?;
        self.fetch(&entry.source_path())
            .await
            .inspect_err(|e| warn!(topic, "failed to fetch original text: {e}"))
            .ok()
    }
}

/// The same documents read from a local directory.
pub struct FileContentSource {
    root: PathBuf,
    topics: Vec<TopicEntry>,
}

impl FileContentSource {
    pub fn new(root: impl Into<PathBuf>, topics: Vec<TopicEntry>) -> Self {
        Self {
            root: root.into(),
            topics,
        }
    }

    async fn read<T: DeserializeOwned>(&self, path: &str) -> Result<T, ContentError> {
        let full = self.root.join(path);
        debug!(path = %full.display(), "reading content");
        let body = tokio::fs::read_to_string(&full).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentSource for FileContentSource {
    fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    async fn questions(&self, topic: &str) -> Vec<Question> {
        let Some(entry) = find_topic(&self.topics, topic) else {
            return Vec::new();
        };
        self.read(&entry.questions_path()).await.unwrap_or_else(|e| {
            warn!(topic, "failed to read questions: {e}");
            Vec::new()
        })
    }

    async fn original_text(&self, topic: &str) -> Option<OriginalText> {
        let entry = find_topic(&self.topics, topic)?;
        self.read(&entry.source_path())
            .await
            .inspect_err(|e| warn!(topic, "failed to read original text: {e}"))
            .ok()
    }
}
