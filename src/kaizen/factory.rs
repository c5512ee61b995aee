// SPDX-License-Identifier: MIT

//! Engine factory - wires provider, agents, tools and checkpoint store
//! from a [`RouterConfig`]

use crate::adk::model::gemini::GeminiModel;
use crate::adk::model::provider::{LlmProvider, NotConfigured, RetryingProvider};
use crate::kaizen::agents::default_agent_table;
use crate::kaizen::config::RouterConfig;
use crate::kaizen::tools::{builtin_registry, ToolExecutor};
use crate::kaizen::workflow::checkpoint::{
    CheckpointStore, DurableEngine, FileCheckpointStore, MemoryCheckpointStore,
};
use crate::kaizen::workflow::graph::WorkflowEngine;
use std::sync::Arc;

pub struct EngineFactory<'a> {
    config: &'a RouterConfig,
}

impl<'a> EngineFactory<'a> {
    pub fn new(config: &'a RouterConfig) -> Self {
        Self { config }
    }

    /// Gemini behind the retry policy, or the null provider without a key
    pub fn build_provider(&self) -> Arc<dyn LlmProvider> {
        if !self.config.is_llm_configured() {
            log::warn!("GEMINI_API_KEY not set; answering with fixed messages");
            return Arc::new(NotConfigured);
        }

        let key = self.config.gemini_api_key.trim();
        log::info!(
            "Using model '{}' (fallback: {})",
            self.config.gemini_model,
            self.config.gemini_fallback_model.as_deref().unwrap_or("none")
        );

        let primary = Arc::new(GeminiModel::new(self.config.gemini_model.clone(), key));
        let mut provider = RetryingProvider::new(primary, self.config.retry_policy());
        if let Some(fallback) = &self.config.gemini_fallback_model {
            provider = provider.with_fallback(Arc::new(GeminiModel::new(fallback.clone(), key)));
        }
        Arc::new(provider)
    }

    pub async fn build_engine(&self) -> WorkflowEngine {
        self.build_engine_with(self.build_provider()).await
    }

    /// Engine with an explicit provider (the config still sets timeouts)
    pub async fn build_engine_with(&self, llm: Arc<dyn LlmProvider>) -> WorkflowEngine {
        let tools = ToolExecutor::new(builtin_registry().await);
        WorkflowEngine::new(llm, default_agent_table(), tools).with_config(self.config)
    }

    pub fn build_checkpoint_store(&self) -> Arc<dyn CheckpointStore> {
        match &self.config.checkpoint_dir {
            Some(dir) => {
                log::info!("Checkpoints stored in {}", dir.display());
                Arc::new(FileCheckpointStore::new(dir.clone()))
            }
            None => Arc::new(MemoryCheckpointStore::new()),
        }
    }

    pub async fn build_durable(&self) -> DurableEngine {
        DurableEngine::new(
            self.build_engine().await,
            self.build_checkpoint_store(),
            self.config.enable_checkpointer,
        )
    }
}
