// SPDX-License-Identifier: MIT

//! SQL tool placeholder
//!
//! Never touches a database; echoes the received query with guidance text.

use crate::adk::error::ToolError;
use crate::adk::tool::BlockingTool;

pub const NAME: &str = "sql";

pub fn render(query: &str) -> String {
    format!(
        "[SQL Tool] まだ有効化されていません。\n\
         将来的には安全な読み取り専用クエリ実行（パラメータ化・監査ログ・タイムアウト）を提供予定です。\n\
         受領クエリ候補: {}",
        query
    )
}

/// The placeholder as a blocking handler
pub fn tool() -> BlockingTool {
    BlockingTool::new(
        NAME,
        "Read-only SQL execution (placeholder, no database access)",
        |query| Ok::<_, ToolError>(render(query)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::tool::Tool;

    #[tokio::test]
    async fn test_sql_placeholder_echoes_query() {
        let out = tool().execute("SELECT 1").await.unwrap();
        assert!(out.starts_with("[SQL Tool]"));
        assert!(out.contains("受領クエリ候補: SELECT 1"));
    }
}
