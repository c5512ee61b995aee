// SPDX-License-Identifier: MIT

//! Agent module - defines agent types for query answering
//!
//! This module provides the core Agent trait and implementations:
//! - `PromptAgent` - role-specific prompt builder delegating to an `LlmProvider`

mod prompt;

pub use prompt::{PromptAgent, AGENT_GENERATION_ERROR};

use crate::adk::model::provider::LlmProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured agent input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentInput {
    pub user_query: String,
    #[serde(default)]
    pub conversation_history: String,
    #[serde(default)]
    pub file_context: String,
    /// Used only for log correlation
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl AgentInput {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ..Default::default()
        }
    }
}

/// Structured agent output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub content: String,
    pub error: Option<String>,
}

impl AgentOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            error: None,
        }
    }

    pub fn failed(content: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            error: Some(error.into()),
        }
    }
}

/// Core agent trait for all agent types
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name
    fn name(&self) -> &str;

    /// Produce a structured answer for the input
    async fn respond(&self, llm: &dyn LlmProvider, input: &AgentInput) -> AgentOutput;

    /// Plain-text form of [`Agent::respond`]
    async fn run(
        &self,
        llm: &dyn LlmProvider,
        user_query: &str,
        conversation_history: &str,
        file_context: &str,
    ) -> String {
        let input = AgentInput {
            user_query: user_query.to_string(),
            conversation_history: conversation_history.to_string(),
            file_context: file_context.to_string(),
            correlation_id: None,
        };
        self.respond(llm, &input).await.content
    }
}
