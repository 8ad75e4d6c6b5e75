//! Provider and content error types.
//!
//! `ProviderError` lives in `quizmark-core` so grading can classify oracle
//! failures; it is re-exported here for provider implementors.

use thiserror::Error;

pub use quizmark_core::error::ProviderError;

/// Errors that can occur while fetching catalog documents. Content sources
/// log these and degrade to empty results.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// A local file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The document was not valid JSON of the expected shape.
    #[error("invalid document: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ContentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ContentError::Timeout
        } else if let Some(status) = e.status() {
            ContentError::Status(status.as_u16())
        } else {
            ContentError::Network(e.to_string())
        }
    }
}
