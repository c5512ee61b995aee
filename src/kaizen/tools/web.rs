// SPDX-License-Identifier: MIT

//! Web search tool placeholder
//!
//! Performs no network calls; echoes the received search terms.

use crate::adk::error::ToolError;
use crate::adk::tool::Tool;
use async_trait::async_trait;

pub const NAME: &str = "web";

pub struct WebSearchTool {
    description: String,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            description: "Web search with cited summaries (placeholder, no network access)"
                .to_string(),
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        Ok(format!(
            "[Web Search Tool] まだ有効化されていません。\n\
             将来的には検索プロバイダ統合＋要約（ソース出典付き）・レート制御・キャッシュを提供予定です。\n\
             受領検索語: {}",
            input
        ))
    }
}
