// SPDX-License-Identifier: MIT

//! Typed error handling for kaizen-rs
//!
//! Internal operations return these errors and propagate them with `?`.
//! The public entry points (workflow `run`, `LlmProvider::generate`) never
//! surface them: they are mapped to fixed user-facing messages instead.

use thiserror::Error;

/// Top-level error type for kaizen-rs
#[derive(Debug, Error)]
pub enum KaizenError {
    /// Configuration errors (missing env vars, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// Rate limit exceeded (HTTP 429 / quota)
    #[error("Rate limit exceeded (429): {0}")]
    RateLimited(String),

    /// A single call exceeded its deadline
    #[error("timeout after {0}s")]
    Timeout(f64),

    /// The model answered with no usable text
    #[error("empty response text")]
    EmptyResponse,

    /// Non-success response from the model API
    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },

    /// Response could not be interpreted
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Transport errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ModelError {
    /// Whether this error belongs to the rate-limit class.
    ///
    /// Matches the typed variant first, then falls back to scanning the
    /// rendered message for the usual throttling tokens.
    pub fn is_rate_limit(&self) -> bool {
        if matches!(self, ModelError::RateLimited(_)) {
            return true;
        }
        let text = self.to_string().to_lowercase();
        ["429", "rate limit", "quota", "exceeded"]
            .iter()
            .any(|token| text.contains(token))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ModelError::Timeout(_))
    }
}

/// Tool handler errors
#[derive(Debug, Error)]
pub enum ToolError {
    /// The handler reported a failure
    #[error("{0}")]
    Failed(String),

    /// A blocking handler panicked or was cancelled
    #[error("tool task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::Failed(s.to_string())
    }
}

impl From<String> for ToolError {
    fn from(s: String) -> Self {
        Self::Failed(s)
    }
}

/// Checkpoint store errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("invalid correlation id for checkpoint key: {0:?}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl KaizenError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
