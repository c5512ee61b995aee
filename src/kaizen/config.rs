// SPDX-License-Identifier: MIT

//! Router configuration
//!
//! Resolved in order: defaults → optional YAML file → environment variables.

use crate::adk::error::KaizenError;
use crate::adk::model::provider::RetryPolicy;
use crate::kaizen::workflow::classifier::ClassifyStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_fallback_model: Option<String>,
    pub gemini_max_retries: u32,
    pub gemini_retry_backoff_seconds: f64,
    pub llm_generate_timeout_seconds: f64,
    pub workflow_invoke_timeout_seconds: f64,
    pub tool_timeout_seconds: f64,
    /// Durable mode: persist the message log per correlation id
    pub enable_checkpointer: bool,
    /// Directory for file checkpoints; in-memory store when unset
    pub checkpoint_dir: Option<PathBuf>,
    /// Emit decision-trace events on the streaming entry point
    pub debug_streaming: bool,
    pub classify_strategy: ClassifyStrategy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_fallback_model: Some("gemini-1.5-flash".to_string()),
            gemini_max_retries: 3,
            gemini_retry_backoff_seconds: 2.0,
            llm_generate_timeout_seconds: 30.0,
            workflow_invoke_timeout_seconds: 60.0,
            tool_timeout_seconds: 10.0,
            enable_checkpointer: false,
            checkpoint_dir: None,
            debug_streaming: false,
            classify_strategy: ClassifyStrategy::Auto,
        }
    }
}

impl RouterConfig {
    /// Load from an optional YAML file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, KaizenError> {
        let mut config = match path {
            Some(p) => Self::from_yaml(&std::fs::read_to_string(p)?)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, KaizenError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), KaizenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.gemini_api_key = key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini_model = model;
        }
        if let Some(fallback) = lookup("GEMINI_FALLBACK_MODEL") {
            let fallback = fallback.trim().to_string();
            self.gemini_fallback_model = (!fallback.is_empty()).then_some(fallback);
        }
        if let Some(v) = parse_var(&lookup, "GEMINI_MAX_RETRIES")? {
            self.gemini_max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "GEMINI_RETRY_BACKOFF_SECONDS")? {
            self.gemini_retry_backoff_seconds = v;
        }
        if let Some(v) = parse_var(&lookup, "LLM_GENERATE_TIMEOUT_SECONDS")? {
            self.llm_generate_timeout_seconds = v;
        }
        if let Some(v) = parse_var(&lookup, "WORKFLOW_INVOKE_TIMEOUT_SECONDS")? {
            self.workflow_invoke_timeout_seconds = v;
        }
        if let Some(v) = parse_var(&lookup, "TOOL_TIMEOUT_SECONDS")? {
            self.tool_timeout_seconds = v;
        }
        if let Some(v) = lookup("ENABLE_CHECKPOINTER") {
            self.enable_checkpointer = parse_bool("ENABLE_CHECKPOINTER", &v)?;
        }
        if let Some(dir) = lookup("CHECKPOINT_DIR") {
            self.checkpoint_dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir.trim()));
        }
        if let Some(v) = lookup("DEBUG_STREAMING") {
            self.debug_streaming = parse_bool("DEBUG_STREAMING", &v)?;
        }
        if let Some(v) = parse_var(&lookup, "CLASSIFY_STRATEGY")? {
            self.classify_strategy = v;
        }
        Ok(())
    }

    /// Reject values that cannot become durations
    pub fn validate(&self) -> Result<(), KaizenError> {
        let fields = [
            ("gemini_retry_backoff_seconds", self.gemini_retry_backoff_seconds),
            ("llm_generate_timeout_seconds", self.llm_generate_timeout_seconds),
            (
                "workflow_invoke_timeout_seconds",
                self.workflow_invoke_timeout_seconds,
            ),
            ("tool_timeout_seconds", self.tool_timeout_seconds),
        ];
        for (name, value) in fields {
            Duration::try_from_secs_f64(value).map_err(|e| {
                KaizenError::config(format!(
                    "{} must be a non-negative number of seconds, got {}: {}",
                    name, value, e
                ))
            })?;
        }
        Ok(())
    }

    pub fn is_llm_configured(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.gemini_max_retries,
            base_backoff: seconds(self.gemini_retry_backoff_seconds),
            call_timeout: seconds(self.llm_generate_timeout_seconds),
        }
    }

    pub fn workflow_timeout(&self) -> Duration {
        seconds(self.workflow_invoke_timeout_seconds)
    }

    pub fn tool_timeout(&self) -> Duration {
        seconds(self.tool_timeout_seconds)
    }
}

/// Saturating conversion for configs that skipped `validate`
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, KaizenError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| KaizenError::config(format!("invalid {}={:?}: {}", key, raw, e))),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, KaizenError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(KaizenError::config(format!(
            "invalid {}={:?}: expected a boolean",
            key, other
        ))),
    }
}
