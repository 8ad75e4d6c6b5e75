//! Provider and grading error types.
//!
//! `ProviderError` lives in `quizmark-core` so the grading engine can
//! classify oracle failures without string matching.

use thiserror::Error;

/// Model identifier used when none is configured.
pub const DEFAULT_MODEL: &str = "xiaomi/mimo-v2-flash:free";

/// Errors that can occur when talking to a chat-completion endpoint.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (missing or invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The configured model identifier was rejected by the endpoint.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::InvalidModel(_)
        )
    }
}

/// Broad class of a grading failure, used to pick the message shown to the
/// user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Nothing to submit, or the submission does not fit the question.
    Input,
    /// Network or HTTP failure talking to the oracle.
    Transport,
    /// The oracle answered but the verdict could not be trusted.
    Malformed,
    /// The oracle rejected our configuration (model id, API key).
    Configuration,
}

/// Errors produced while grading one submission.
#[derive(Debug, Error)]
pub enum GradingError {
    #[error("nothing to submit")]
    EmptySubmission,

    #[error("a {submitted} submission cannot answer a {expected} question")]
    UnsupportedSubmission {
        submitted: &'static str,
        expected: &'static str,
    },

    #[error("a submission is already being graded")]
    AlreadyGrading,

    #[error("this question is already graded; practice it again to resubmit")]
    AlreadyGraded,

    #[error("there is no current question")]
    NoQuestion,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("oracle returned an unparseable verdict: {0}")]
    MalformedVerdict(String),

    #[error("oracle verdict out of bounds: {0}")]
    VerdictOutOfBounds(String),
}

impl GradingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GradingError::EmptySubmission
            | GradingError::UnsupportedSubmission { .. }
            | GradingError::AlreadyGrading
            | GradingError::AlreadyGraded
            | GradingError::NoQuestion => ErrorCategory::Input,
            GradingError::Provider(e) if e.is_permanent() => ErrorCategory::Configuration,
            GradingError::Provider(_) => ErrorCategory::Transport,
            GradingError::MalformedVerdict(_) | GradingError::VerdictOutOfBounds(_) => {
                ErrorCategory::Malformed
            }
        }
    }

    /// Actionable follow-up text for the user, if there is one.
    pub fn remediation(&self) -> Option<String> {
        match self {
            GradingError::Provider(ProviderError::InvalidModel(_)) => Some(format!(
                "The configured model identifier is not valid. Set `model = \"{DEFAULT_MODEL}\"` \
                 under [oracle] in quizmark.toml (or export QUIZMARK_MODEL) and try again."
            )),
            GradingError::Provider(ProviderError::AuthenticationFailed(_)) => Some(
                "Check the API key under [oracle] in quizmark.toml or export QUIZMARK_API_KEY."
                    .to_string(),
            ),
            GradingError::Provider(ProviderError::RateLimited { .. }) => {
                Some("The grading service is busy. Wait a moment and submit again.".to_string())
            }
            GradingError::MalformedVerdict(_) | GradingError::VerdictOutOfBounds(_) => Some(
                "The grader produced an invalid verdict. Please submit again; if it keeps \
                 happening the selected model may be unreliable."
                    .to_string(),
            ),
            GradingError::Provider(_) => {
                Some("Could not reach the grading service. Check your connection and retry.".to_string())
            }
            _ => None,
        }
    }
}
