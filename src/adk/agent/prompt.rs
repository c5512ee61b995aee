// SPDX-License-Identifier: MIT

//! Prompt Agent - role instruction + context sections, delegated to the provider
//!
//! The agent never calls the provider when it reports itself unconfigured;
//! it answers with its fixed fallback text instead.

use super::{Agent, AgentInput, AgentOutput};
use crate::adk::model::provider::LlmProvider;
use async_trait::async_trait;

pub const AGENT_GENERATION_ERROR: &str =
    "回答の生成中にエラーが発生しました。しばらくしてから再度お試しください。";

const HISTORY_HEADER: &str = "過去の会話:";
const FILES_HEADER: &str = "関連ファイル:";
const QUESTION_LABEL: &str = "質問:";
const ANSWER_LABEL: &str = "回答:";

/// Placeholder in `fallback` replaced with the user's query
pub const QUERY_PLACEHOLDER: &str = "{query}";

pub struct PromptAgent {
    pub name: String,
    /// Routing key used in logs (e.g. "manufacturing")
    pub category: String,
    pub instruction: String,
    pub guidelines: Vec<String>,
    pub include_file_context: bool,
    pub fallback: String,
}

impl PromptAgent {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        instruction: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            instruction: instruction.into(),
            guidelines: Vec::new(),
            include_file_context: true,
            fallback: fallback.into(),
        }
    }

    pub fn with_guidelines<I, S>(mut self, guidelines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guidelines = guidelines.into_iter().map(Into::into).collect();
        self
    }

    pub fn without_file_context(mut self) -> Self {
        self.include_file_context = false;
        self
    }

    /// Render the full prompt for one request
    pub fn build_prompt(&self, input: &AgentInput) -> String {
        let mut prompt = format!(
            "{}\n\n{} {}",
            self.instruction.trim(),
            QUESTION_LABEL,
            input.user_query
        );

        if !input.conversation_history.is_empty() {
            prompt.push_str(&format!(
                "\n\n{}\n{}",
                HISTORY_HEADER, input.conversation_history
            ));
        }
        if self.include_file_context && !input.file_context.is_empty() {
            prompt.push_str(&format!("\n\n{}\n{}", FILES_HEADER, input.file_context));
        }

        if !self.guidelines.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(
                &self
                    .guidelines
                    .iter()
                    .map(|g| format!("- {}", g))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        prompt.push_str(&format!("\n\n{}", ANSWER_LABEL));
        prompt
    }

    fn fallback_for(&self, input: &AgentInput) -> String {
        self.fallback.replace(QUERY_PLACEHOLDER, &input.user_query)
    }
}

#[async_trait]
impl Agent for PromptAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, llm: &dyn LlmProvider, input: &AgentInput) -> AgentOutput {
        let cid = input.correlation_id.as_deref().unwrap_or("-");
        log::info!("agent_started [cid={}] agent={}", cid, self.category);

        if !llm.is_configured() {
            log::info!(
                "agent_completed [cid={}] agent={} fallback=true",
                cid,
                self.category
            );
            return AgentOutput::ok(self.fallback_for(input));
        }

        let text = llm.generate(&self.build_prompt(input)).await;
        if text.trim().is_empty() {
            log::error!(
                "agent_error [cid={}] agent={} error=empty_response",
                cid,
                self.category
            );
            return AgentOutput::failed(AGENT_GENERATION_ERROR, "empty_response");
        }

        log::info!(
            "agent_completed [cid={}] agent={} length={}",
            cid,
            self.category,
            text.len()
        );
        AgentOutput::ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::provider::NotConfigured;
    use std::sync::Mutex;

    struct RecordingProvider {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn is_configured(&self) -> bool {
            true
        }

        async fn generate(&self, prompt: &str) -> String {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn agent() -> PromptAgent {
        PromptAgent::new("tester", "test", "You are a tester.", "no llm for {query}")
            .with_guidelines(["be brief", "be kind"])
    }

    #[test]
    fn test_prompt_includes_context_sections() {
        let input = AgentInput {
            user_query: "Q1".to_string(),
            conversation_history: "user: hi".to_string(),
            file_context: "file body".to_string(),
            correlation_id: None,
        };
        let prompt = agent().build_prompt(&input);

        assert!(prompt.starts_with("You are a tester."));
        assert!(prompt.contains("質問: Q1"));
        assert!(prompt.contains("過去の会話:\nuser: hi"));
        assert!(prompt.contains("関連ファイル:\nfile body"));
        assert!(prompt.contains("- be brief\n- be kind"));
        assert!(prompt.ends_with("回答:"));
    }

    #[test]
    fn test_prompt_omits_empty_sections() {
        let prompt = agent().build_prompt(&AgentInput::new("Q"));
        assert!(!prompt.contains("過去の会話"));
        assert!(!prompt.contains("関連ファイル"));
    }

    #[test]
    fn test_prompt_skips_files_when_disabled() {
        let input = AgentInput {
            user_query: "Q".to_string(),
            file_context: "secret file".to_string(),
            ..Default::default()
        };
        let prompt = agent().without_file_context().build_prompt(&input);
        assert!(!prompt.contains("secret file"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_uses_fallback() {
        let out = agent().respond(&NotConfigured, &AgentInput::new("Q")).await;
        assert_eq!(out.content, "no llm for Q");
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn test_configured_provider_receives_prompt() {
        let llm = RecordingProvider::new("answer");
        let out = agent().respond(&llm, &AgentInput::new("Q")).await;

        assert_eq!(out, AgentOutput::ok("answer"));
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("質問: Q"));
    }

    #[tokio::test]
    async fn test_blank_generation_is_reported_as_error() {
        let llm = RecordingProvider::new("   ");
        let out = agent().respond(&llm, &AgentInput::new("Q")).await;

        assert_eq!(out.error.as_deref(), Some("empty_response"));
        assert_eq!(out.content, AGENT_GENERATION_ERROR);
    }
}
