// SPDX-License-Identifier: MIT

//! Decision trace and the debug summary built from it

use super::store::{QueryType, WorkflowState};
use serde::{Deserialize, Serialize};

/// Maximum characters of tool input kept in a trace event
pub const TRACE_INPUT_LIMIT: usize = 120;

const NONE_PLACEHOLDER: &str = "none";
const NO_REASON_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventType {
    AgentSelected,
    ToolDetected,
    ToolInvoked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    #[serde(rename = "type")]
    pub event_type: TraceEventType,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub tool_input: Option<String>,
    pub took_ms: Option<u64>,
    pub error: Option<String>,
    pub timestamp_ms: i64,
}

impl TraceEvent {
    fn new(event_type: TraceEventType) -> Self {
        Self {
            event_type,
            name: None,
            reason: None,
            tool_input: None,
            took_ms: None,
            error: None,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn agent_selected(agent: &str, reason: &str) -> Self {
        Self {
            name: Some(agent.to_string()),
            reason: Some(reason.to_string()),
            ..Self::new(TraceEventType::AgentSelected)
        }
    }

    pub fn tool_detected(tool: Option<&str>, input: &str, reason: &str) -> Self {
        Self {
            name: tool.map(str::to_string),
            reason: Some(reason.to_string()),
            tool_input: Some(truncate_chars(input, TRACE_INPUT_LIMIT)),
            ..Self::new(TraceEventType::ToolDetected)
        }
    }

    pub fn tool_invoked(tool: &str, input: &str, took_ms: u64, error: Option<&str>) -> Self {
        Self {
            name: Some(tool.to_string()),
            tool_input: Some(truncate_chars(input, TRACE_INPUT_LIMIT)),
            took_ms: Some(took_ms),
            error: error.map(str::to_string),
            ..Self::new(TraceEventType::ToolInvoked)
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Trace sink chosen once per run. Recording never fails; a disabled
/// trace drops events.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionTrace {
    Disabled,
    Recording(Vec<TraceEvent>),
}

impl DecisionTrace {
    pub fn new(enabled: bool) -> Self {
        if enabled {
            DecisionTrace::Recording(Vec::new())
        } else {
            DecisionTrace::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, DecisionTrace::Recording(_))
    }

    pub fn record(&mut self, event: TraceEvent) {
        if let DecisionTrace::Recording(events) = self {
            events.push(event);
        }
    }

    pub fn events(&self) -> &[TraceEvent] {
        match self {
            DecisionTrace::Disabled => &[],
            DecisionTrace::Recording(events) => events,
        }
    }

    /// Reason of the most recent event of the first type (in priority
    /// order) that carries one
    pub fn latest_reason(&self) -> Option<&str> {
        const PRIORITY: [TraceEventType; 3] = [
            TraceEventType::AgentSelected,
            TraceEventType::ToolDetected,
            TraceEventType::ToolInvoked,
        ];
        PRIORITY.iter().find_map(|wanted| {
            self.events()
                .iter()
                .rev()
                .filter(|e| e.event_type == *wanted)
                .find_map(|e| e.reason.as_deref())
        })
    }
}

/// Human-readable summary of one debug run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugSummary {
    pub display_header: String,
    pub selected_agent: Option<String>,
    pub selected_tool: Option<String>,
    pub decision_trace: Vec<TraceEvent>,
    pub correlation_id: Option<String>,
}

impl DebugSummary {
    /// Build from a finished state. `None` unless the run was traced and
    /// did not fail.
    pub fn from_state(state: &WorkflowState) -> Option<Self> {
        if !state.decision_trace.is_enabled() || state.is_failed() {
            return None;
        }

        let selected_agent = state.query_type.agent_name().map(str::to_string);
        let selected_tool = match state.query_type {
            QueryType::Tool => state.tool_name.clone(),
            _ => None,
        };
        let reason = state.decision_trace.latest_reason();

        let display_header = format!(
            "Agent: {} / Tool: {} / 根拠: {}",
            selected_agent.as_deref().unwrap_or(NONE_PLACEHOLDER),
            selected_tool.as_deref().unwrap_or(NONE_PLACEHOLDER),
            reason.unwrap_or(NO_REASON_PLACEHOLDER),
        );

        Some(Self {
            display_header,
            selected_agent,
            selected_tool,
            decision_trace: state.decision_trace.events().to_vec(),
            correlation_id: state.correlation_id.clone(),
        })
    }

    /// Prefix a response with the debug header
    pub fn decorate(&self, response: &str) -> String {
        format!("[DEBUG] {}\n\n{}", self.display_header, response)
    }
}
