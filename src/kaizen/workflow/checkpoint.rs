// SPDX-License-Identifier: MIT

//! Durable mode: message log persistence keyed by correlation id
//!
//! The engine stays stateless; [`DurableEngine`] loads the log before a
//! run and saves it afterwards. Routing decisions are never persisted.
//!
//! Turns for the same correlation id are serialized inside one
//! `DurableEngine` (and its clones). Separate processes sharing a
//! checkpoint directory are not coordinated. Logs are never pruned.

use crate::adk::error::CheckpointError;
use crate::kaizen::workflow::graph::{WorkflowEngine, WorkflowOutcome};
use crate::kaizen::workflow::state::MessageLog;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Log for `correlation_id`; empty when nothing was saved
    async fn load(&self, correlation_id: &str) -> Result<MessageLog, CheckpointError>;

    async fn save(&self, correlation_id: &str, log: &MessageLog) -> Result<(), CheckpointError>;
}

#[derive(Clone, Default)]
pub struct MemoryCheckpointStore {
    logs: Arc<RwLock<HashMap<String, MessageLog>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, correlation_id: &str) -> Result<MessageLog, CheckpointError> {
        let logs = self.logs.read().await;
        Ok(logs.get(correlation_id).cloned().unwrap_or_default())
    }

    async fn save(&self, correlation_id: &str, log: &MessageLog) -> Result<(), CheckpointError> {
        let mut logs = self.logs.write().await;
        logs.insert(correlation_id.to_string(), log.clone());
        Ok(())
    }
}

/// One JSON file per correlation id under `dir`
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids become file names, so only a safe character set is accepted
    fn path_for(&self, correlation_id: &str) -> Result<PathBuf, CheckpointError> {
        let valid = !correlation_id.is_empty()
            && correlation_id.len() <= 128
            && correlation_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !correlation_id.starts_with('.');
        if !valid {
            return Err(CheckpointError::InvalidKey(correlation_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", correlation_id)))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, correlation_id: &str) -> Result<MessageLog, CheckpointError> {
        let path = self.path_for(correlation_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MessageLog::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, correlation_id: &str, log: &MessageLog) -> Result<(), CheckpointError> {
        let path = self.path_for(correlation_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Temp file first, then renamed into place
        let tmp = self.dir.join(format!(
            "{}.{}.tmp",
            correlation_id,
            uuid::Uuid::new_v4().simple()
        ));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(log)?).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Result of a durable run
#[derive(Debug, Clone)]
pub struct DurableOutcome {
    pub outcome: WorkflowOutcome,
    /// Full log after this turn (empty when durable mode did not apply)
    pub history: MessageLog,
}

/// Engine wrapper that persists the message log between turns
#[derive(Clone)]
pub struct DurableEngine {
    engine: WorkflowEngine,
    store: Arc<dyn CheckpointStore>,
    enabled: bool,
    turns: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl DurableEngine {
    pub fn new(engine: WorkflowEngine, store: Arc<dyn CheckpointStore>, enabled: bool) -> Self {
        Self {
            engine,
            store,
            enabled,
            turns: Arc::default(),
        }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Same contract as [`WorkflowEngine::run`]; checkpoint failures are
    /// logged and never change the response
    pub async fn run(
        &self,
        query: &str,
        conversation_history: &str,
        file_context: &str,
        correlation_id: Option<&str>,
        debug: bool,
    ) -> String {
        self.run_detailed(query, conversation_history, file_context, correlation_id, debug)
            .await
            .outcome
            .response
    }

    pub async fn run_detailed(
        &self,
        query: &str,
        conversation_history: &str,
        file_context: &str,
        correlation_id: Option<&str>,
        debug: bool,
    ) -> DurableOutcome {
        let key = correlation_id
            .map(str::trim)
            .filter(|id| self.enabled && !id.is_empty());

        let Some(key) = key else {
            let outcome = self
                .engine
                .run_detailed(query, conversation_history, file_context, correlation_id, debug)
                .await;
            return DurableOutcome {
                outcome,
                history: MessageLog::new(),
            };
        };

        let turn = self.turn_lock(key).await;
        let guard = turn.lock().await;

        let mut history = match self.store.load(key).await {
            Ok(history) => history,
            Err(e) => {
                log::warn!("checkpoint_load_failed [cid={}] error={}", key, e);
                MessageLog::new()
            }
        };

        let outcome = self
            .engine
            .run_detailed(query, conversation_history, file_context, Some(key), debug)
            .await;
        history.extend(outcome.state.messages.iter().cloned());

        match self.store.save(key, &history).await {
            Ok(()) => log::info!(
                "checkpoint_saved [cid={}] messages={}",
                key,
                history.len()
            ),
            Err(e) => log::error!("checkpoint_save_failed [cid={}] error={}", key, e),
        }

        drop(guard);
        self.release_turn_lock(key, turn).await;
        DurableOutcome { outcome, history }
    }

    /// Lock serializing load, run and save for one correlation id
    async fn turn_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut turns = self.turns.lock().await;
        turns.entry(key.to_string()).or_default().clone()
    }

    /// Drop the map entry once no other turn holds or waits on it
    async fn release_turn_lock(&self, key: &str, turn: Arc<Mutex<()>>) {
        let mut turns = self.turns.lock().await;
        if Arc::strong_count(&turn) <= 2 {
            turns.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::provider::NotConfigured;
    use crate::kaizen::agents::default_agent_table;
    use crate::kaizen::tools::{builtin_registry, ToolExecutor};
    use crate::kaizen::workflow::state::{Message, QueryType, Role};

    async fn engine() -> WorkflowEngine {
        WorkflowEngine::new(
            Arc::new(NotConfigured),
            default_agent_table(),
            ToolExecutor::new(builtin_registry().await),
        )
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCheckpointStore::new();
        assert!(store.load("a").await.unwrap().is_empty());

        store.save("a", &vec![Message::user("q")]).await.unwrap();
        assert_eq!(store.load("a").await.unwrap(), vec![Message::user("q")]);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let log = vec![Message::user("q"), Message::assistant("a")];

        FileCheckpointStore::new(dir.path())
            .save("session-1", &log)
            .await
            .unwrap();
        let reopened = FileCheckpointStore::new(dir.path());
        assert_eq!(reopened.load("session-1").await.unwrap(), log);
        assert!(reopened.load("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_rejects_unsafe_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        for key in ["../escape", "a/b", "", ".hidden"] {
            assert!(matches!(
                store.load(key).await,
                Err(CheckpointError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_durable_run_appends_each_turn() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let durable = DurableEngine::new(engine().await, store.clone(), true);

        durable.run("sql: SELECT 1", "", "", Some("c-1"), false).await;
        let second = durable
            .run_detailed("改善したい", "", "", Some("c-1"), false)
            .await;

        // Routing is recomputed per turn
        assert_eq!(second.outcome.state.query_type, QueryType::Manufacturing);
        let roles: Vec<Role> = second.history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(store.load("c-1").await.unwrap(), second.history);
    }

    #[tokio::test]
    async fn test_disabled_or_anonymous_runs_are_not_saved() {
        let store = Arc::new(MemoryCheckpointStore::new());

        let disabled = DurableEngine::new(engine().await, store.clone(), false);
        disabled.run("hello", "", "", Some("c-2"), false).await;
        assert!(store.load("c-2").await.unwrap().is_empty());

        let enabled = DurableEngine::new(engine().await, store.clone(), true);
        let outcome = enabled.run_detailed("hello", "", "", None, false).await;
        assert!(outcome.history.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_response() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCheckpointStore::new(dir.path()));
        let durable = DurableEngine::new(engine().await, store, true);

        let response = durable.run("hello", "", "", Some("../bad"), false).await;
        assert!(!response.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_turns_on_one_id_keep_every_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCheckpointStore::new(dir.path()));
        let durable = DurableEngine::new(engine().await, store.clone(), true);

        let turns = (0..8).map(|i| {
            let durable = durable.clone();
            tokio::spawn(async move {
                durable
                    .run(&format!("sql: SELECT {}", i), "", "", Some("shared"), false)
                    .await
            })
        });
        for turn in futures::future::join_all(turns).await {
            assert!(!turn.unwrap().is_empty());
        }

        assert_eq!(store.load("shared").await.unwrap().len(), 16);
        assert!(durable.turns.lock().await.is_empty());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
