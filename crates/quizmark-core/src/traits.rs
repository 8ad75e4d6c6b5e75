//! Core trait definitions for LLM providers and content sources.
//!
//! These async traits are implemented by the `quizmark-providers` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::model::{OriginalText, Question};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for chat-completion backends used by the scoring oracle.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openrouter").
    fn name(&self) -> &str;

    /// Run one system + user exchange and return the assistant reply.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// A two-message chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g. "xiaomi/mimo-v2-flash:free").
    pub model: String,
    /// System instruction.
    pub system_prompt: String,
    /// User message.
    pub prompt: String,
    /// Ask the endpoint for a strict JSON object reply.
    #[serde(default)]
    pub json_response: bool,
}

/// Reply from a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The raw assistant message content.
    pub content: String,
    /// Model that actually answered.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Content source trait
// ---------------------------------------------------------------------------

/// Read-only catalog of questions and set texts, keyed by topic name.
///
/// Implementations never fail: a fetch problem is logged and degrades to an
/// empty list or `None`.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Topic names this source knows about, in display order.
    fn topics(&self) -> Vec<String>;

    /// All questions for a topic.
    async fn questions(&self, topic: &str) -> Vec<Question>;

    /// The original text for a topic.
    async fn original_text(&self, topic: &str) -> Option<OriginalText>;
}

/// Fetch every topic concurrently and flatten the questions.
pub async fn load_all_questions(source: &dyn ContentSource) -> Vec<Question> {
    let topics = source.topics();
    let fetches = topics.iter().map(|t| source.questions(t));
    futures::future::join_all(fetches)
        .await
        .into_iter()
        .flatten()
        .collect()
}
