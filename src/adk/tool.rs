// SPDX-License-Identifier: MIT

use crate::adk::error::ToolError;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for side-effecting tools selected by an explicit query prefix.
///
/// `name()` and `description()` return `&str` to avoid allocation on every
/// call; implementations should store these values in struct fields.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (unique within a registry)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Execute the tool with the given argument and return rendered output
    async fn execute(&self, input: &str) -> Result<String, ToolError>;
}

type BlockingHandler = dyn Fn(&str) -> Result<String, ToolError> + Send + Sync;

/// Adapter for synchronous handlers.
///
/// The handler runs on tokio's blocking pool so a slow tool cannot stall the
/// async executor. Abandoning the returned future does not stop the handler.
pub struct BlockingTool {
    name: String,
    description: String,
    handler: Arc<BlockingHandler>,
}

impl BlockingTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            handler: Arc::new(handler),
        }
    }
}

#[async_trait]
impl Tool for BlockingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let handler = Arc::clone(&self.handler);
        let input = input.to_string();
        tokio::task::spawn_blocking(move || handler(&input)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocking_tool_runs_handler() {
        let tool = BlockingTool::new("upper", "Uppercases input", |s| Ok(s.to_uppercase()));
        assert_eq!(tool.name(), "upper");
        assert_eq!(tool.execute("abc").await.unwrap(), "ABC");
    }

    #[tokio::test]
    async fn test_blocking_tool_propagates_errors() {
        let tool = BlockingTool::new("boom", "Always fails", |_| Err("boom".into()));
        let err = tool.execute("x").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_blocking_tool_panic_becomes_join_error() {
        let tool = BlockingTool::new("panic", "Panics", |_| panic!("handler panicked"));
        let err = tool.execute("x").await.unwrap_err();
        assert!(matches!(err, ToolError::Join(_)));
    }
}
