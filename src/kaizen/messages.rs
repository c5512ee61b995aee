// SPDX-License-Identifier: MIT

//! Fixed user-facing strings.
//!
//! The workflow only chooses which of these to return; raw error text is
//! never formatted into user output.

/// Any unrecoverable agent/tool failure
pub const PROCESSING_ERROR: &str = "申し訳ございません。処理中にエラーが発生しました。";

/// Dispatch found no agent for the routed category
pub const AGENT_NOT_REGISTERED: &str =
    "申し訳ございません。このカテゴリを担当するエージェントが登録されていません。";

/// Overall workflow deadline exceeded
pub const WORKFLOW_TIMEOUT: &str =
    "処理がタイムアウトしました。しばらくしてから再度お試しください。";

/// Normalization backstop for empty responses
pub const EMPTY_RESPONSE: &str = "回答を生成できませんでした。";

/// Tool branch reached without a recognizable tool
pub const TOOL_NOT_RECOGNIZED: &str = "ツール実行リクエストを認識できませんでした。";

/// Header for rendered tool output
pub fn tool_result_header(tool: &str) -> String {
    format!("[tool:{}] 実行結果:", tool)
}

pub const MANUFACTURING_NOT_CONFIGURED: &str = "申し訳ございません。現在LLMプロバイダが設定されていないため、製造業に関する詳細なアドバイスを提供できません。API設定を確認してください。";

pub const PYTHON_NOT_CONFIGURED: &str = "申し訳ございません。現在LLMプロバイダが設定されていないため、Python技術指導を提供できません。API設定を確認してください。";

/// `{query}` is replaced with the user's query
pub const GENERAL_NOT_CONFIGURED: &str = "ご質問ありがとうございます。「{query}」についてですが、現在LLMプロバイダが設定されていないため、詳細な回答を提供できません。製造業の改善活動やPython技術についてのご質問でしたら、API設定後により具体的なアドバイスを提供できます。";
