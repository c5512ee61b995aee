// SPDX-License-Identifier: MIT

//! Progress events for the streaming entry point
//!
//! Payloads are sanitized before they leave the engine: keys that may hold
//! raw internal state, inputs or configuration are removed, and long
//! strings are cut to [`MAX_STRING_CHARS`] with an ellipsis.

use crate::kaizen::workflow::state::{TraceEvent, WorkflowState};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const SENSITIVE_KEYS: [&str; 6] = ["state", "input", "inputs", "config", "configuration", "raw"];
/// Any key ending in one of these also carries raw input (`tool_input`)
pub const SENSITIVE_SUFFIXES: [&str; 2] = ["_input", "_inputs"];
pub const MAX_STRING_CHARS: usize = 500;
pub const ELLIPSIS: &str = "…";

pub const RUN_STARTED: &str = "run_started";
pub const NODE_STARTED: &str = "node_started";
pub const NODE_COMPLETED: &str = "node_completed";
pub const TRACE: &str = "trace";
pub const RUN_COMPLETED: &str = "run_completed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub event_type: String,
    pub timestamp_ms: i64,
    pub payload: Value,
}

impl StreamEvent {
    /// Build an event; the payload is sanitized here
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            payload: sanitize(payload),
        }
    }
}

/// Strip sensitive keys and truncate long strings, recursively
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_sensitive(key))
                .map(|(key, v)| (key, sanitize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        Value::String(s) => Value::String(truncate(s)),
        other => other,
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&key.as_str())
        || SENSITIVE_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

fn truncate(s: String) -> String {
    if s.chars().count() <= MAX_STRING_CHARS {
        return s;
    }
    let mut cut: String = s.chars().take(MAX_STRING_CHARS).collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// Where the engine sends progress events. Emission never blocks and never
/// fails; a dropped receiver just discards events.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<StreamEvent>>,
}

impl EventSink {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, event_type: &str, payload: Value) {
        if let Some(tx) = &self.tx {
            if tx.send(StreamEvent::new(event_type, payload)).is_err() {
                log::debug!("stream_event_dropped event_type={}", event_type);
            }
        }
    }

    pub fn run_started(&self, state: &WorkflowState) {
        self.emit(
            RUN_STARTED,
            json!({ "correlation_id": state.correlation_id, "debug": state.debug }),
        );
    }

    pub fn node_started(&self, node: &str) {
        self.emit(NODE_STARTED, json!({ "node": node }));
    }

    /// Trace events recorded by the node, then the completion marker
    pub fn node_completed(&self, node: &str, state: &WorkflowState, trace_from: usize) {
        for event in state.decision_trace.events().iter().skip(trace_from) {
            self.trace(event);
        }
        self.emit(
            NODE_COMPLETED,
            json!({
                "node": node,
                "query_type": state.query_type,
                "tool_name": state.tool_name,
                "error": state.error,
            }),
        );
    }

    fn trace(&self, event: &TraceEvent) {
        match serde_json::to_value(event) {
            Ok(payload) => self.emit(TRACE, payload),
            Err(e) => log::warn!("stream_trace_unserializable error={}", e),
        }
    }

    pub fn run_completed(&self, state: &WorkflowState, timed_out: bool) {
        self.emit(
            RUN_COMPLETED,
            json!({
                "response": state.response,
                "query_type": state.query_type,
                "error": state.error,
                "timed_out": timed_out,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_keys_are_removed_recursively() {
        let payload = json!({
            "node": "analyze_query",
            "state": {"user_query": "secret"},
            "Config": {"gemini_api_key": "k"},
            "nested": [{"raw": "x", "inputs": [1], "keep": true}],
            "tool_input": "SELECT * FROM secrets",
            "trace": {"type": "tool_invoked", "Tool_Input": "x", "name": "sql"},
        });
        let clean = sanitize(payload);
        assert_eq!(
            clean,
            json!({
                "node": "analyze_query",
                "nested": [{"keep": true}],
                "trace": {"type": "tool_invoked", "name": "sql"},
            })
        );
    }

    #[test]
    fn test_long_strings_truncated_with_ellipsis() {
        let long = "x".repeat(MAX_STRING_CHARS + 10);
        let clean = sanitize(json!({ "response": long, "short": "ok" }));
        let response = clean["response"].as_str().unwrap();
        assert_eq!(response.chars().count(), MAX_STRING_CHARS + 1);
        assert!(response.ends_with(ELLIPSIS));
        assert_eq!(clean["short"], "ok");
    }

    #[test]
    fn test_exact_limit_is_kept() {
        let exact = "あ".repeat(MAX_STRING_CHARS);
        assert_eq!(sanitize(Value::String(exact.clone())), Value::String(exact));
    }

    #[tokio::test]
    async fn test_sink_emits_sanitized_events() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(NODE_STARTED, json!({"node": "n", "input": "raw text"}));
        drop(sink);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, NODE_STARTED);
        assert_eq!(event.payload, json!({"node": "n"}));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_disabled_sink_and_closed_receiver_are_silent() {
        EventSink::disabled().emit(RUN_STARTED, json!({}));

        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(RUN_STARTED, json!({}));
    }
}
