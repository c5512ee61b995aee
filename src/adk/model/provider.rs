// SPDX-License-Identifier: MIT

//! LLM provider client
//!
//! [`LlmProvider`] is the only interface agents and the classifier see.
//! It has two capabilities: report whether it is configured, and turn a
//! prompt into text. `generate` is total; every failure path ends in one
//! of the fixed messages below.
//!
//! [`RetryingProvider`] owns the retry policy:
//! - rate-limit errors sleep `base_backoff * 2^attempt` and retry
//! - timeouts and other errors stop the loop immediately
//! - an optional fallback model gets exactly one attempt afterwards

use super::{Content, Model};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Returned when no provider is configured
pub const LLM_NOT_CONFIGURED: &str =
    "申し訳ございません。現在Gemini APIが設定されていないため、回答を提供できません。API設定を確認してください。";
/// Returned when the last failure was rate-limit class
pub const LLM_BUSY: &str =
    "現在リクエストが集中しているため回答できません。数十秒後に再度お試しください。";
/// Returned when the last failure was a timeout
pub const LLM_TIMEOUT: &str =
    "LLMの応答に時間がかかっています。しばらくしてから再度お試しください。";
/// Returned for any other failure
pub const LLM_FAILED: &str =
    "申し訳ございません。現在回答を生成できませんでした。しばらくしてからお試しください。";

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Generate text for a prompt. Never fails; returns a fixed message instead.
    async fn generate(&self, prompt: &str) -> String;
}

/// Null provider used when no API key is available
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfigured;

#[async_trait]
impl LlmProvider for NotConfigured {
    fn is_configured(&self) -> bool {
        false
    }

    async fn generate(&self, _prompt: &str) -> String {
        LLM_NOT_CONFIGURED.to_string()
    }
}

/// Upper bound for a single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Retry/timeout policy for [`RetryingProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs_f64(2.0),
            call_timeout: Duration::from_secs_f64(30.0),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after a rate-limited attempt (0-based),
    /// saturating at [`MAX_BACKOFF`]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if self.base_backoff.is_zero() {
            return Duration::ZERO;
        }
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_backoff.checked_mul(factor))
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }
}

/// Provider client with retries, per-call timeout and a fallback model
pub struct RetryingProvider {
    primary: Arc<dyn Model>,
    fallback: Option<Arc<dyn Model>>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(primary: Arc<dyn Model>, policy: RetryPolicy) -> Self {
        Self {
            primary,
            fallback: None,
            policy,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Model>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// One bounded call; empty text counts as a failure
    async fn call(&self, model: &dyn Model, history: &[Content]) -> Result<String, ModelError> {
        let timeout = self.policy.call_timeout;
        let content = tokio::time::timeout(timeout, model.generate_content(history, None))
            .await
            .map_err(|_| ModelError::Timeout(timeout.as_secs_f64()))??;

        let text = content.text().trim().to_string();
        if text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &str) -> String {
        let history = [Content::user_text(prompt)];
        let mut last_err: Option<ModelError> = None;

        for attempt in 0..self.policy.max_retries {
            match self.call(self.primary.as_ref(), &history).await {
                Ok(text) => return text,
                Err(e) if e.is_timeout() => {
                    log::error!(
                        "llm_timeout model={} attempt={} timeout_s={}",
                        self.primary.name(),
                        attempt + 1,
                        self.policy.call_timeout.as_secs_f64()
                    );
                    last_err = Some(e);
                    break;
                }
                Err(e) if e.is_rate_limit() => {
                    let backoff = self.policy.backoff_delay(attempt);
                    log::warn!(
                        "llm_rate_limited model={} attempt={} backoff_s={} error={}",
                        self.primary.name(),
                        attempt + 1,
                        backoff.as_secs_f64(),
                        e
                    );
                    last_err = Some(e);
                    tokio::time::sleep(backoff).await;
                }
                Err(ModelError::EmptyResponse) => {
                    log::warn!(
                        "llm_empty_text model={} attempt={}",
                        self.primary.name(),
                        attempt + 1
                    );
                    last_err = Some(ModelError::EmptyResponse);
                    break;
                }
                Err(e) => {
                    log::error!(
                        "llm_error model={} attempt={} error={}",
                        self.primary.name(),
                        attempt + 1,
                        e
                    );
                    last_err = Some(e);
                    break;
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            log::info!("llm_fallback_try model={}", fallback.name());
            match self.call(fallback.as_ref(), &history).await {
                Ok(text) => {
                    log::info!("llm_fallback_used model={}", fallback.name());
                    return text;
                }
                // Blank fallback text keeps the primary's failure
                Err(ModelError::EmptyResponse) => {
                    log::warn!("llm_fallback_empty_text model={}", fallback.name());
                    if last_err.is_none() {
                        last_err = Some(ModelError::EmptyResponse);
                    }
                }
                Err(e) => {
                    log::error!("llm_fallback_error model={} error={}", fallback.name(), e);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if e.is_rate_limit() => LLM_BUSY.to_string(),
            Some(e) if e.is_timeout() => LLM_TIMEOUT.to_string(),
            _ => LLM_FAILED.to_string(),
        }
    }
}
