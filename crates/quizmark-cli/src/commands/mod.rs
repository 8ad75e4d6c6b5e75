pub mod analyze;
pub mod browse;
pub mod grade;
pub mod hint;
pub mod init;
pub mod memorize;
pub mod mistakes;
pub mod original;
pub mod quiz;
pub mod render;
pub mod reset;
pub mod stats;
pub mod topics;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use quizmark_core::grading::GradingEngine;
use quizmark_core::model::Question;
use quizmark_core::oracle::RubricOracle;
use quizmark_core::progress::ProgressTracker;
use quizmark_core::store::FileStore;
use quizmark_core::traits::{load_all_questions, ContentSource};
use quizmark_providers::{create_content_source, create_provider, load_config_from, QuizConfig};

/// Everything a command needs: configuration, content and progress.
pub struct App {
    pub config: QuizConfig,
    pub content: Arc<dyn ContentSource>,
    pub tracker: Arc<ProgressTracker>,
}

impl App {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let content = create_content_source(&config.content)?;
        let store = Arc::new(FileStore::new(config.data_dir.clone()));
        let tracker = Arc::new(ProgressTracker::open(store));
        Ok(Self {
            config,
            content,
            tracker,
        })
    }

    /// Build the grading engine. Only commands that may call the oracle
    /// need one.
    pub fn engine(&self) -> Result<Arc<GradingEngine>> {
        let provider = create_provider(&self.config.oracle)?;
        let oracle = Arc::new(RubricOracle::new(provider, self.config.oracle.settings()));
        Ok(Arc::new(GradingEngine::new(
            oracle,
            self.tracker.clone(),
            self.config.policy(),
        )))
    }

    /// Questions of one topic; an empty topic is an error.
    pub async fn topic_questions(&self, topic: &str) -> Result<Vec<Question>> {
        let questions = self.content.questions(topic).await;
        if questions.is_empty() {
            anyhow::bail!(
                "no questions found for topic '{topic}'. Run `quizmark topics` to list topics."
            );
        }
        Ok(questions)
    }

    pub async fn find_question(&self, topic: &str, qid: &str) -> Result<Question> {
        self.topic_questions(topic)
            .await?
            .into_iter()
            .find(|q| q.qid == qid)
            .with_context(|| format!("question '{qid}' not found in topic '{topic}'"))
    }

    /// Every question of every configured topic.
    pub async fn catalog(&self) -> Vec<Question> {
        load_all_questions(self.content.as_ref()).await
    }
}
