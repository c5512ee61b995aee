// SPDX-License-Identifier: MIT

//! The three topic agents and the default dispatch table

use crate::adk::agent::PromptAgent;
use crate::kaizen::messages;
use crate::kaizen::workflow::dispatch::{AgentCategory, AgentTable};
use crate::kaizen::workflow::state::QueryType;
use std::sync::Arc;

fn agent_name(query_type: QueryType) -> &'static str {
    query_type.agent_name().unwrap_or("general_responder")
}

/// Improvement-activity consultant for manufacturing questions
pub fn manufacturing_advisor() -> PromptAgent {
    PromptAgent::new(
        agent_name(QueryType::Manufacturing),
        AgentCategory::Manufacturing.as_str(),
        "あなたは製造業の改善活動を専門とするAIコンサルタントです。\n\
         以下の質問に対して、実践的で具体的なアドバイスを提供してください。",
        messages::MANUFACTURING_NOT_CONFIGURED,
    )
    .with_guidelines([
        "製造業の現場で実際に適用できる実践的な提案",
        "改善活動のステップを具体的に説明",
        "可能であれば数値目標や測定方法も含める",
        "リスクや注意点も言及する",
        "日本語で丁寧に回答する",
    ])
}

/// Python instructor for manufacturing use cases
pub fn python_mentor() -> PromptAgent {
    PromptAgent::new(
        agent_name(QueryType::Python),
        AgentCategory::Python.as_str(),
        "あなたは製造業で使用するPythonの専門講師です。\n\
         以下の質問に対して、実用的で理解しやすい回答を提供してください。",
        messages::PYTHON_NOT_CONFIGURED,
    )
    .with_guidelines([
        "製造業の現場で活用できるPythonの使い方",
        "具体的なコード例を含める（可能な場合）",
        "初心者にも理解しやすい説明",
        "データ分析や自動化への応用も含める",
        "セキュリティや効率性も考慮する",
        "日本語で丁寧に回答する",
    ])
}

/// Catch-all responder; ignores file context
pub fn general_responder() -> PromptAgent {
    PromptAgent::new(
        agent_name(QueryType::General),
        AgentCategory::General.as_str(),
        "以下の質問に対して、親切で丁寧な回答を提供してください。",
        messages::GENERAL_NOT_CONFIGURED,
    )
    .with_guidelines([
        "製造業とPython技術指導を専門とするAIアシスタントとして、可能であれば専門分野との関連性も含めて回答する",
        "日本語で回答する",
    ])
    .without_file_context()
}

/// Table with all three categories registered
pub fn default_agent_table() -> AgentTable {
    AgentTable::new()
        .with(AgentCategory::Manufacturing, Arc::new(manufacturing_advisor()))
        .with(AgentCategory::Python, Arc::new(python_mentor()))
        .with(AgentCategory::General, Arc::new(general_responder()))
}
