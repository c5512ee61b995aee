// SPDX-License-Identifier: MIT

//! Tools selected by explicit query prefixes

pub mod detect;
pub mod executor;
pub mod sql;
pub mod web;

pub use detect::{detect_tool_request, ToolRequest};
pub use executor::{ToolExecutor, ToolResult, EMPTY_OUTPUT, UNKNOWN_TOOL, UNSUPPORTED_TOOL};

use crate::kaizen::workflow::registry::ToolRegistry;
use once_cell::sync::Lazy;
use std::sync::Arc;

static UNKNOWN_TOOL_GUIDANCE: Lazy<String> = Lazy::new(|| {
    let prefixes: Vec<&str> = detect::TOOL_PREFIXES.iter().map(|(p, _)| *p).collect();
    format!(
        "不明なツールが指定されました。サポートされている例: {}",
        prefixes.join(", ")
    )
});

/// Guidance shown when a tool request names no usable tool
pub fn unknown_tool_guidance() -> &'static str {
    UNKNOWN_TOOL_GUIDANCE.as_str()
}

/// Registry with the built-in `sql` and `web` placeholders
pub async fn builtin_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(sql::tool())).await;
    registry.register(Arc::new(web::WebSearchTool::new())).await;
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guidance_lists_prefixes() {
        let guidance = unknown_tool_guidance();
        assert!(guidance.contains("sql:"));
        assert!(guidance.contains("web:"));
        assert!(guidance.contains("search:"));
    }

    #[tokio::test]
    async fn test_builtin_registry() {
        let registry = builtin_registry().await;
        assert!(registry.get("sql").await.is_some());
        assert!(registry.get("web").await.is_some());
        assert!(registry.get("search").await.is_none());
    }
}
