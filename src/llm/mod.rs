//! LLM Generation Interface
//!
//! `TigerStyle`: Trait seam consumed, not implemented; simulation-first.
//!
//! The engine never talks to a model service directly. It depends on
//! [`LlmProvider`], routing every call through a task type so the collaborator
//! can pick a model per task. Retry, backoff, and timeout policy belong to
//! that collaborator; callers here apply their own fallback text on failure.

pub mod prompts;
mod sim;

pub use sim::SimLlmProvider;

use async_trait::async_trait;

use crate::constants::LLM_PROMPT_BYTES_MAX;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from LLM generation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// Request timed out
    #[error("generation timed out")]
    Timeout,

    /// Rate limit exceeded
    #[error("rate limit exceeded, retry after {retry_after_secs:?}s")]
    RateLimit {
        /// Seconds until the limit resets, if known
        retry_after_secs: Option<u64>,
    },

    /// Backend unreachable or erroring
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// Reason for unavailability
        message: String,
    },

    /// Response could not be used
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// What was invalid
        message: String,
    },

    /// Request was malformed
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was invalid
        message: String,
    },
}

impl GenerationError {
    /// Create a timeout error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limit(retry_after_secs: Option<u64>) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether the collaborator may retry this failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimit { .. } | Self::Unavailable { .. }
        )
    }
}

// =============================================================================
// Task Types
// =============================================================================

/// Task categories the routing collaborator can map to different models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// General conversation and analysis
    Reasoning,
    /// Summaries, rephrasing, titles
    Summarization,
    /// Numeric quality/importance ratings
    Ranking,
}

impl TaskType {
    /// String form for logging and routing.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Summarization => "summarization",
            Self::Ranking => "ranking",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Request Type
// =============================================================================

/// A generation request.
///
/// `TigerStyle`: Explicit fields, no hidden defaults.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The prompt text
    pub prompt: String,
    /// Optional system message
    pub system: Option<String>,
}

impl GenerationRequest {
    /// Create a request with just a prompt.
    ///
    /// # Panics
    /// Panics if the prompt is empty or exceeds `LLM_PROMPT_BYTES_MAX`.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();

        // Preconditions
        assert!(!prompt.is_empty(), "prompt must not be empty");
        assert!(
            prompt.len() <= LLM_PROMPT_BYTES_MAX,
            "prompt exceeds {LLM_PROMPT_BYTES_MAX} bytes"
        );

        Self {
            prompt,
            system: None,
        }
    }

    /// Set the system message.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Trait for LLM generation collaborators.
///
/// Implementations own model selection, queueing, and retries. This crate
/// only supplies the task type and prompt, and treats every failure as
/// recoverable through a call-site fallback.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for the given task.
    ///
    /// # Errors
    /// Returns [`GenerationError`] when the backend is unreachable or errors.
    async fn generate(
        &self,
        task: TaskType,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_new() {
        let request = GenerationRequest::new("Summarize this.");
        assert_eq!(request.prompt, "Summarize this.");
        assert!(request.system.is_none());
    }

    #[test]
    fn test_request_with_system() {
        let request = GenerationRequest::new("Rank this.").with_system("Output only the rank.");
        assert_eq!(request.system.as_deref(), Some("Output only the rank."));
    }

    #[test]
    #[should_panic(expected = "prompt must not be empty")]
    fn test_request_empty_prompt() {
        let _ = GenerationRequest::new("");
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(GenerationError::timeout().is_retryable());
        assert!(GenerationError::rate_limit(Some(30)).is_retryable());
        assert!(GenerationError::unavailable("down").is_retryable());
        assert!(!GenerationError::invalid_response("garbled").is_retryable());
        assert!(!GenerationError::invalid_request("empty").is_retryable());
    }

    #[test]
    fn test_task_type_strings() {
        assert_eq!(TaskType::Summarization.as_str(), "summarization");
        assert_eq!(TaskType::Ranking.to_string(), "ranking");
    }
}
