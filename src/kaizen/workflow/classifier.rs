// SPDX-License-Identifier: MIT

//! Query classifier
//!
//! First match wins:
//! 1. explicit tool prefix (`sql:`, `web:`, `search:`, `tool:<prefix>:`)
//! 2. bare `tool:` with an unrecognised sub-prefix
//! 3. LLM classification into manufacturing | python | general
//! 4. keyword sets (when the LLM path is not taken)

use crate::adk::model::provider::LlmProvider;
use crate::kaizen::tools::{detect_tool_request, ToolRequest};
use crate::kaizen::workflow::state::QueryType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const REASON_TOOL_PREFIX: &str = "explicit tool prefix";
pub const REASON_LLM: &str = "LLM classification";
pub const REASON_KEYWORD: &str = "keyword match";

const MANUFACTURING_KEYWORDS: [&str; 5] = ["改善", "品質", "製造", "効率", "生産"];
const PYTHON_KEYWORDS: [&str; 4] = ["python", "プログラム", "コード", "スクリプト"];

/// How topic classification is performed once no tool prefix matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifyStrategy {
    /// LLM when the provider is configured, keywords otherwise
    #[default]
    Auto,
    /// Always ask the LLM (keywords if the provider is unconfigured)
    Llm,
    /// Never call the LLM
    Keyword,
}

impl fmt::Display for ClassifyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassifyStrategy::Auto => "auto",
            ClassifyStrategy::Llm => "llm",
            ClassifyStrategy::Keyword => "keyword",
        })
    }
}

impl FromStr for ClassifyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ClassifyStrategy::Auto),
            "llm" => Ok(ClassifyStrategy::Llm),
            "keyword" => Ok(ClassifyStrategy::Keyword),
            other => Err(format!(
                "unknown classify strategy '{}' (expected auto, llm or keyword)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub query_type: QueryType,
    pub tool_name: Option<String>,
    pub tool_input: Option<String>,
    pub reason: &'static str,
}

impl Classification {
    fn topic(query_type: QueryType, reason: &'static str) -> Self {
        Self {
            query_type,
            tool_name: None,
            tool_input: None,
            reason,
        }
    }

    fn tool(request: ToolRequest, reason: &'static str) -> Self {
        Self {
            query_type: QueryType::Tool,
            tool_name: request.tool_name().map(str::to_string),
            tool_input: Some(request.argument().to_string()),
            reason,
        }
    }
}

#[derive(Clone)]
pub struct QueryClassifier {
    llm: Arc<dyn LlmProvider>,
    strategy: ClassifyStrategy,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, strategy: ClassifyStrategy) -> Self {
        Self { llm, strategy }
    }

    pub fn strategy(&self) -> ClassifyStrategy {
        self.strategy
    }

    fn uses_llm(&self) -> bool {
        match self.strategy {
            ClassifyStrategy::Keyword => false,
            ClassifyStrategy::Auto | ClassifyStrategy::Llm => self.llm.is_configured(),
        }
    }

    pub async fn classify(&self, query: &str, cid: &str) -> Classification {
        if let Some(request) = detect_tool_request(query) {
            log::info!(
                "query_analyzed_tool [cid={}] tool={}",
                cid,
                request.tool_name().unwrap_or("unknown")
            );
            return Classification::tool(request, REASON_TOOL_PREFIX);
        }

        let classification = if self.uses_llm() {
            let reply = self.llm.generate(&classification_prompt(query)).await;
            let query_type = QueryType::from_topic_label(&reply).unwrap_or_else(|| {
                log::debug!(
                    "query_label_coerced [cid={}] reply_len={}",
                    cid,
                    reply.len()
                );
                QueryType::General
            });
            Classification::topic(query_type, REASON_LLM)
        } else {
            if self.strategy == ClassifyStrategy::Llm {
                log::warn!(
                    "query_classifier_fallback [cid={}] reason=llm_not_configured",
                    cid
                );
            }
            classify_by_keywords(query)
        };

        log::info!(
            "query_analyzed [cid={}] query_type={} reason={}",
            cid,
            classification.query_type,
            classification.reason
        );
        classification
    }
}

/// Case-insensitive keyword classification; first matching set wins
pub fn classify_by_keywords(query: &str) -> Classification {
    let lowered = query.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    if contains_any(&MANUFACTURING_KEYWORDS) {
        Classification::topic(QueryType::Manufacturing, REASON_KEYWORD)
    } else if contains_any(&PYTHON_KEYWORDS) {
        Classification::topic(QueryType::Python, REASON_KEYWORD)
    } else if let Some(request) = detect_tool_request(query) {
        Classification::tool(request, REASON_KEYWORD)
    } else {
        Classification::topic(QueryType::General, REASON_KEYWORD)
    }
}

pub fn classification_prompt(query: &str) -> String {
    format!(
        "以下のユーザーの質問を分析し、カテゴリを判定してください：\n\n\
         質問: {}\n\n\
         カテゴリ:\n\
         - manufacturing: 製造業、改善活動、品質管理、効率化に関する質問\n\
         - python: Pythonプログラミング、コード、技術に関する質問\n\
         - general: その他の一般的な質問\n\n\
         カテゴリ名のみを回答してください。",
        query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::provider::NotConfigured;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider that answers every prompt with a fixed label
    struct LabelProvider {
        label: String,
        prompts: Mutex<Vec<String>>,
    }

    impl LabelProvider {
        fn new(label: &str) -> Arc<Self> {
            Arc::new(Self {
                label: label.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for LabelProvider {
        fn is_configured(&self) -> bool {
            true
        }

        async fn generate(&self, prompt: &str) -> String {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.label.clone()
        }
    }

    fn keyword_classifier() -> QueryClassifier {
        QueryClassifier::new(Arc::new(NotConfigured), ClassifyStrategy::Auto)
    }

    #[tokio::test]
    async fn test_tool_prefix_wins_over_llm() {
        let llm = LabelProvider::new("python");
        let classifier = QueryClassifier::new(llm.clone(), ClassifyStrategy::Auto);

        let result = classifier.classify("  sql:  SELECT * FROM t ", "-").await;
        assert_eq!(result.query_type, QueryType::Tool);
        assert_eq!(result.tool_name.as_deref(), Some("sql"));
        assert_eq!(result.tool_input.as_deref(), Some("SELECT * FROM t"));
        assert_eq!(result.reason, REASON_TOOL_PREFIX);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_generic_unknown_tool() {
        let result = keyword_classifier().classify("tool:ftp: get x", "-").await;
        assert_eq!(result.query_type, QueryType::Tool);
        assert_eq!(result.tool_name, None);
        assert_eq!(result.tool_input.as_deref(), Some("ftp: get x"));
    }

    #[tokio::test]
    async fn test_llm_label_is_normalized() {
        let llm = LabelProvider::new("  Python\n");
        let classifier = QueryClassifier::new(llm.clone(), ClassifyStrategy::Auto);

        let result = classifier.classify("リストの使い方", "-").await;
        assert_eq!(result.query_type, QueryType::Python);
        assert_eq!(result.reason, REASON_LLM);
        assert!(llm.prompts.lock().unwrap()[0].contains("質問: リストの使い方"));
    }

    #[tokio::test]
    async fn test_unexpected_llm_label_becomes_general() {
        let classifier =
            QueryClassifier::new(LabelProvider::new("cooking"), ClassifyStrategy::Auto);
        let result = classifier.classify("品質について", "-").await;
        assert_eq!(result.query_type, QueryType::General);
        assert_eq!(result.reason, REASON_LLM);
    }

    #[tokio::test]
    async fn test_keywords_without_llm() {
        let classifier = keyword_classifier();

        let result = classifier.classify("改善活動について", "-").await;
        assert_eq!(result.query_type, QueryType::Manufacturing);
        assert_eq!(result.reason, REASON_KEYWORD);

        let result = classifier.classify("PYTHONでCSVを読む", "-").await;
        assert_eq!(result.query_type, QueryType::Python);

        let result = classifier.classify("こんにちは", "-").await;
        assert_eq!(result.query_type, QueryType::General);
        assert_eq!(result.reason, REASON_KEYWORD);
    }

    #[tokio::test]
    async fn test_manufacturing_set_checked_first() {
        let result = keyword_classifier().classify("生産管理のPythonスクリプト", "-").await;
        assert_eq!(result.query_type, QueryType::Manufacturing);
    }

    #[tokio::test]
    async fn test_keyword_strategy_skips_configured_llm() {
        let llm = LabelProvider::new("general");
        let classifier = QueryClassifier::new(llm.clone(), ClassifyStrategy::Keyword);

        let result = classifier.classify("コードレビュー", "-").await;
        assert_eq!(result.query_type, QueryType::Python);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_strategy_without_provider_uses_keywords() {
        let classifier = QueryClassifier::new(Arc::new(NotConfigured), ClassifyStrategy::Llm);
        let result = classifier.classify("品質", "-").await;
        assert_eq!(result.query_type, QueryType::Manufacturing);
        assert_eq!(result.reason, REASON_KEYWORD);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("LLM".parse::<ClassifyStrategy>(), Ok(ClassifyStrategy::Llm));
        assert_eq!(ClassifyStrategy::Keyword.to_string(), "keyword");
        assert!("magic".parse::<ClassifyStrategy>().is_err());
        assert_eq!(
            serde_json::to_string(&ClassifyStrategy::Auto).unwrap(),
            "\"auto\""
        );
    }
}
