// SPDX-License-Identifier: MIT

//! Request-scoped workflow state

use super::trace::DecisionTrace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification outcome; selects the branch the workflow takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Unclassified,
    Manufacturing,
    Python,
    General,
    Tool,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Unclassified => "unclassified",
            QueryType::Manufacturing => "manufacturing",
            QueryType::Python => "python",
            QueryType::General => "general",
            QueryType::Tool => "tool",
        }
    }

    /// Parse a topic label as returned by the classifier prompt.
    /// Only the three topic categories are accepted.
    pub fn from_topic_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "manufacturing" => Some(QueryType::Manufacturing),
            "python" => Some(QueryType::Python),
            "general" => Some(QueryType::General),
            _ => None,
        }
    }

    /// Name of the agent that answers this category, if any
    pub fn agent_name(&self) -> Option<&'static str> {
        match self {
            QueryType::Manufacturing => Some("manufacturing_advisor"),
            QueryType::Python => Some("python_mentor"),
            QueryType::General => Some("general_responder"),
            QueryType::Tool | QueryType::Unclassified => None,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unclassified" => Ok(QueryType::Unclassified),
            "tool" => Ok(QueryType::Tool),
            other => {
                QueryType::from_topic_label(other).ok_or_else(|| format!("unknown query type: {}", s))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the append-only message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The log persisted across turns in durable mode
pub type MessageLog = Vec<Message>;

/// State for one workflow execution.
///
/// Created fresh per call and moved through each transition.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub user_query: String,
    pub conversation_history: String,
    pub file_context: String,
    pub query_type: QueryType,
    pub tool_name: Option<String>,
    pub tool_input: Option<String>,
    pub response: String,
    pub error: Option<String>,
    pub correlation_id: Option<String>,
    pub debug: bool,
    pub decision_trace: DecisionTrace,
    /// Messages produced by this run (user first, assistant last)
    pub messages: MessageLog,
}

impl WorkflowState {
    pub fn new(
        user_query: impl Into<String>,
        conversation_history: impl Into<String>,
        file_context: impl Into<String>,
        correlation_id: Option<String>,
        debug: bool,
    ) -> Self {
        let user_query = user_query.into();
        Self {
            messages: vec![Message::user(user_query.clone())],
            user_query,
            conversation_history: conversation_history.into(),
            file_context: file_context.into(),
            query_type: QueryType::Unclassified,
            tool_name: None,
            tool_input: None,
            response: String::new(),
            error: None,
            correlation_id: correlation_id.filter(|id| !id.trim().is_empty()),
            debug,
            decision_trace: DecisionTrace::new(debug),
        }
    }

    /// Correlation id for log lines (`-` when absent)
    pub fn cid(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or("-")
    }

    /// Record the first unrecoverable failure; later failures are ignored
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Set the final response and close the message log
    pub fn finish(&mut self, response: impl Into<String>) {
        self.response = response.into();
        self.messages.push(Message::assistant(self.response.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_type_labels() {
        assert_eq!(
            QueryType::from_topic_label("  Manufacturing\n"),
            Some(QueryType::Manufacturing)
        );
        assert_eq!(QueryType::from_topic_label("tool"), None);
        assert_eq!(QueryType::from_topic_label("cooking"), None);
        assert_eq!("tool".parse::<QueryType>(), Ok(QueryType::Tool));
        assert!("cooking".parse::<QueryType>().is_err());
        assert_eq!(QueryType::Python.to_string(), "python");
    }

    #[test]
    fn test_agent_names() {
        assert_eq!(
            QueryType::Manufacturing.agent_name(),
            Some("manufacturing_advisor")
        );
        assert_eq!(QueryType::Tool.agent_name(), None);
    }

    #[test]
    fn test_new_state() {
        let state = WorkflowState::new("q", "", "", Some("  ".to_string()), false);
        assert_eq!(state.query_type, QueryType::Unclassified);
        assert_eq!(state.correlation_id, None);
        assert_eq!(state.cid(), "-");
        assert_eq!(state.messages, vec![Message::user("q")]);
        assert!(!state.decision_trace.is_enabled());
    }

    #[test]
    fn test_first_failure_wins() {
        let mut state = WorkflowState::new("q", "", "", None, false);
        state.fail("agent_not_registered");
        state.fail("later");
        assert_eq!(state.error.as_deref(), Some("agent_not_registered"));
        assert!(state.is_failed());
    }

    #[test]
    fn test_finish_appends_assistant_message() {
        let mut state = WorkflowState::new("q", "", "", Some("c1".to_string()), true);
        state.finish("a");
        assert_eq!(state.response, "a");
        assert_eq!(
            state.messages,
            vec![Message::user("q"), Message::assistant("a")]
        );
    }

    #[test]
    fn test_message_serde() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
