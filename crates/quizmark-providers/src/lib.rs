//! quizmark-providers: Oracle, content and configuration integrations.
//!
//! Implements `LlmProvider` for OpenAI-compatible chat-completion endpoints
//! (OpenRouter by default) and `ContentSource` over HTTP or a local
//! directory, plus the TOML configuration that wires them up.

pub mod config;
pub mod content;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{
    create_content_source, create_provider, load_config, load_config_from, ContentConfig,
    OracleConfig, QuizConfig,
};
pub use content::{default_topics, FileContentSource, HttpContentSource, TopicEntry};
pub use error::{ContentError, ProviderError};
