//! Mock provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizmark_core::error::ProviderError;
use quizmark_core::traits::{ChatRequest, ChatResponse, LlmProvider};

/// A mock LLM provider for exercising grading without real API calls.
///
/// Returns configurable replies based on prompt content matching.
pub struct MockProvider {
    /// Map of prompt substring → reply.
    responses: HashMap<String, String>,
    /// Reply used when no prompt matches.
    default_response: String,
    /// When set, every call fails with an API error carrying this message.
    error: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockProvider {
    /// Create a mock with the given prompt→reply mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: String::new(),
            error: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    /// Create a mock whose every call fails.
    pub fn with_error(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::new(HashMap::new())
        }
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this provider.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(request.clone());

        if let Some(message) = &self.error {
            return Err(ProviderError::ApiError {
                status: 500,
                message: message.clone(),
            });
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        Ok(ChatResponse {
            content,
            model: request.model.clone(),
            latency_ms: 1,
        })
    }
}
