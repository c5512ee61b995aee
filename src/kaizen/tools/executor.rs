// SPDX-License-Identifier: MIT

//! Tool executor - resolves a tool name and runs it under a timeout

use crate::kaizen::tools::unknown_tool_guidance;
use crate::kaizen::workflow::registry::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const UNKNOWN_TOOL: &str = "unknown_tool";
pub const UNSUPPORTED_TOOL: &str = "unsupported_tool";
pub const EMPTY_OUTPUT: &str = "empty_output";

/// Outcome of one tool call.
///
/// Success is `error == None` with non-empty `output`. Guidance results
/// (`unknown_tool`, `unsupported_tool`) carry both an error code and
/// a user-readable output; hard failures carry an error and empty output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    pub input: String,
    pub output: String,
    pub took_ms: u64,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Failed without anything worth showing the user
    pub fn is_hard_failure(&self) -> bool {
        self.error.is_some() && self.output.is_empty()
    }
}

#[derive(Clone)]
pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn execute(
        &self,
        tool_name: Option<&str>,
        argument: &str,
        timeout: Duration,
    ) -> ToolResult {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_millis() as u64;

        let name = match tool_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n,
            None => {
                return ToolResult {
                    tool: String::new(),
                    input: argument.to_string(),
                    output: unknown_tool_guidance().to_string(),
                    took_ms: elapsed_ms(),
                    error: Some(UNKNOWN_TOOL.to_string()),
                }
            }
        };

        let Some(tool) = self.registry.get(&name.to_lowercase()).await else {
            log::warn!("tool_unsupported tool={}", name);
            return ToolResult {
                tool: name.to_string(),
                input: argument.to_string(),
                output: format!("[Tool:{}] まだ有効化されていません。入力: {}", name, argument),
                took_ms: elapsed_ms(),
                error: Some(UNSUPPORTED_TOOL.to_string()),
            };
        };

        let (output, error) = match tokio::time::timeout(timeout, tool.execute(argument)).await {
            Ok(Ok(output)) if output.trim().is_empty() => {
                log::warn!("tool_empty_output tool={}", name);
                (String::new(), Some(EMPTY_OUTPUT.to_string()))
            }
            Ok(Ok(output)) => (output, None),
            Ok(Err(e)) => {
                log::error!("tool_error tool={} error={}", name, e);
                (String::new(), Some(e.to_string()))
            }
            Err(_) => {
                log::error!(
                    "tool_timeout tool={} timeout_s={}",
                    name,
                    timeout.as_secs_f64()
                );
                (
                    String::new(),
                    Some(format!("timeout after {}s", timeout.as_secs_f64())),
                )
            }
        };

        ToolResult {
            tool: name.to_string(),
            input: argument.to_string(),
            output,
            took_ms: elapsed_ms(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::ToolError;
    use crate::adk::tool::{BlockingTool, Tool};
    use crate::kaizen::tools::builtin_registry;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Sleeps for a long time"
        }

        async fn execute(&self, _input: &str) -> Result<String, ToolError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("done".to_string())
        }
    }

    async fn executor() -> ToolExecutor {
        let registry = builtin_registry().await;
        registry.register(Arc::new(SlowTool)).await;
        registry
            .register(Arc::new(BlockingTool::new("boom", "fails", |_| {
                Err("boom".into())
            })))
            .await;
        registry
            .register(Arc::new(BlockingTool::new("nap", "blocks", |_| {
                std::thread::sleep(Duration::from_millis(300));
                Ok("woke".to_string())
            })))
            .await;
        registry
            .register(Arc::new(BlockingTool::new("mute", "answers nothing", |_| {
                Ok("  \n".to_string())
            })))
            .await;
        ToolExecutor::new(registry)
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = executor().await.execute(None, "x", Duration::from_secs(5)).await;
        assert_eq!(result.error.as_deref(), Some(UNKNOWN_TOOL));
        assert!(result.output.contains("sql:"));
        assert!(!result.is_hard_failure());

        let blank = executor()
            .await
            .execute(Some("  "), "x", Duration::from_secs(5))
            .await;
        assert_eq!(blank.error.as_deref(), Some(UNKNOWN_TOOL));
    }

    #[tokio::test]
    async fn test_unsupported_tool() {
        let result = executor()
            .await
            .execute(Some("foo"), "x", Duration::from_secs(5))
            .await;
        assert_eq!(result.error.as_deref(), Some(UNSUPPORTED_TOOL));
        assert!(result.output.starts_with("[Tool:foo]"));
        assert!(result.output.ends_with("入力: x"));
    }

    #[tokio::test]
    async fn test_sql_success_echoes_argument() {
        let result = executor()
            .await
            .execute(Some("sql"), "SELECT 1", Duration::from_secs(5))
            .await;
        assert!(result.is_success());
        assert!(result.output.contains("SELECT 1"));
        assert_eq!(result.tool, "sql");
        assert_eq!(result.input, "SELECT 1");
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let result = executor()
            .await
            .execute(Some("WEB"), "rust", Duration::from_secs(5))
            .await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_blank_output_is_hard_failure() {
        let result = executor()
            .await
            .execute(Some("mute"), "x", Duration::from_secs(5))
            .await;
        assert_eq!(result.error.as_deref(), Some(EMPTY_OUTPUT));
        assert!(result.output.is_empty());
        assert!(!result.is_success());
        assert!(result.is_hard_failure());
    }

    #[tokio::test]
    async fn test_async_timeout() {
        let result = executor()
            .await
            .execute(Some("slow"), "x", Duration::from_millis(50))
            .await;
        let error = result.error.clone().unwrap();
        assert!(error.contains("timeout"));
        assert!(result.output.is_empty());
        assert!(result.is_hard_failure());
    }

    #[tokio::test]
    async fn test_blocking_timeout_does_not_wait_for_handler() {
        let started = Instant::now();
        let result = executor()
            .await
            .execute(Some("nap"), "x", Duration::from_millis(50))
            .await;
        assert!(result.error.unwrap().contains("timeout"));
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_handler_error() {
        let result = executor()
            .await
            .execute(Some("boom"), "x", Duration::from_secs(1))
            .await;
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(result.output.is_empty());
    }
}
