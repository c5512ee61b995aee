// SPDX-License-Identifier: MIT

//! Query-routing workflow engine
//!
//! Topology: `analyze_query` → one of four branch nodes → end. No cycles.
//! Each transition takes the state by value and returns the next one.

use super::events::{EventSink, StreamEvent};
use crate::adk::agent::AgentInput;
use crate::adk::model::provider::LlmProvider;
use crate::kaizen::config::RouterConfig;
use crate::kaizen::messages::{
    tool_result_header, AGENT_NOT_REGISTERED, EMPTY_RESPONSE, PROCESSING_ERROR,
    TOOL_NOT_RECOGNIZED, WORKFLOW_TIMEOUT,
};
use crate::kaizen::tools::{ToolExecutor, UNKNOWN_TOOL};
use crate::kaizen::workflow::classifier::{ClassifyStrategy, QueryClassifier};
use crate::kaizen::workflow::dispatch::{AgentCategory, AgentTable};
use crate::kaizen::workflow::state::{DebugSummary, QueryType, TraceEvent, WorkflowState};
use futures::{FutureExt, Stream, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Nodes of the workflow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Classify,
    Agent(AgentCategory),
    Tool,
}

impl Node {
    pub const BRANCHES: [Node; 4] = [
        Node::Agent(AgentCategory::Manufacturing),
        Node::Agent(AgentCategory::Python),
        Node::Agent(AgentCategory::General),
        Node::Tool,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Node::Classify => "analyze_query",
            Node::Agent(AgentCategory::Manufacturing) => "process_manufacturing",
            Node::Agent(AgentCategory::Python) => "process_python",
            Node::Agent(AgentCategory::General) => "general_response",
            Node::Tool => "process_tool",
        }
    }

    /// Routing key on the edge from the classifier
    fn route_key(&self) -> &'static str {
        match self {
            Node::Classify => "start",
            Node::Agent(category) => category.as_str(),
            Node::Tool => QueryType::Tool.as_str(),
        }
    }

    /// Branch for a classification result; pure
    pub fn route(query_type: QueryType) -> Node {
        match AgentCategory::for_query_type(query_type) {
            Some(category) => Node::Agent(category),
            None => Node::Tool,
        }
    }
}

/// Final response plus the state it was produced from
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub response: String,
    pub state: WorkflowState,
    pub debug_summary: Option<DebugSummary>,
}

#[derive(Clone)]
pub struct WorkflowEngine {
    llm: Arc<dyn LlmProvider>,
    classifier: QueryClassifier,
    agents: AgentTable,
    tools: ToolExecutor,
    timeout: Duration,
    tool_timeout: Duration,
    debug_streaming: bool,
    last_debug: Arc<Mutex<Option<DebugSummary>>>,
}

impl WorkflowEngine {
    pub fn new(llm: Arc<dyn LlmProvider>, agents: AgentTable, tools: ToolExecutor) -> Self {
        let defaults = RouterConfig::default();
        Self {
            classifier: QueryClassifier::new(llm.clone(), defaults.classify_strategy),
            llm,
            agents,
            tools,
            timeout: defaults.workflow_timeout(),
            tool_timeout: defaults.tool_timeout(),
            debug_streaming: defaults.debug_streaming,
            last_debug: Arc::new(Mutex::new(None)),
        }
    }

    /// Apply timeouts, classification strategy and streaming flags
    pub fn with_config(self, config: &RouterConfig) -> Self {
        self.with_timeout(config.workflow_timeout())
            .with_tool_timeout(config.tool_timeout())
            .with_classify_strategy(config.classify_strategy)
            .with_debug_streaming(config.debug_streaming)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_classify_strategy(mut self, strategy: ClassifyStrategy) -> Self {
        self.classifier = QueryClassifier::new(self.llm.clone(), strategy);
        self
    }

    pub fn with_debug_streaming(mut self, enabled: bool) -> Self {
        self.debug_streaming = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one query and return the final text. Never fails.
    pub async fn run(
        &self,
        query: &str,
        conversation_history: &str,
        file_context: &str,
        correlation_id: Option<&str>,
        debug: bool,
    ) -> String {
        self.run_detailed(query, conversation_history, file_context, correlation_id, debug)
            .await
            .response
    }

    /// Like [`run`](Self::run), also returning the final state and summary
    pub async fn run_detailed(
        &self,
        query: &str,
        conversation_history: &str,
        file_context: &str,
        correlation_id: Option<&str>,
        debug: bool,
    ) -> WorkflowOutcome {
        let state = WorkflowState::new(
            query,
            conversation_history,
            file_context,
            correlation_id.map(str::to_string),
            debug,
        );
        let state = self.execute(state, &EventSink::disabled()).await;

        let debug_summary = if debug {
            DebugSummary::from_state(&state)
        } else {
            None
        };
        self.store_debug_summary(debug_summary.clone());

        WorkflowOutcome {
            response: state.response.clone(),
            state,
            debug_summary,
        }
    }

    /// Summary of the most recent `run`/`run_detailed` on this engine.
    /// `None` unless that run had `debug = true` and did not fail.
    pub fn get_last_debug_summary(&self) -> Option<DebugSummary> {
        match self.last_debug.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store_debug_summary(&self, summary: Option<DebugSummary>) {
        match self.last_debug.lock() {
            Ok(mut guard) => *guard = summary,
            Err(poisoned) => *poisoned.into_inner() = summary,
        }
    }

    /// Stream progress events for one query.
    ///
    /// Execution starts on first poll and runs on its own task, so a slow
    /// consumer never holds it up. The stream ends after `run_completed`.
    pub fn run_streaming(
        &self,
        query: &str,
        conversation_history: &str,
        file_context: &str,
        correlation_id: Option<&str>,
    ) -> impl Stream<Item = StreamEvent> + Send + 'static {
        let engine = self.clone();
        let state = WorkflowState::new(
            query,
            conversation_history,
            file_context,
            correlation_id.map(str::to_string),
            self.debug_streaming,
        );

        futures::stream::once(async move {
            let (sink, rx) = EventSink::channel();
            tokio::spawn(async move {
                engine.execute(state, &sink).await;
            });
            UnboundedReceiverStream::new(rx)
        })
        .flatten()
    }

    /// Mermaid rendering of the fixed topology
    pub fn export_mermaid(&self) -> String {
        let classify = Node::Classify.name();
        let mut lines = vec![
            "graph TD".to_string(),
            format!("    __start__([start]) --> {}", classify),
        ];
        for branch in Node::BRANCHES {
            lines.push(format!(
                "    {} -. {} .-> {}",
                classify,
                branch.route_key(),
                branch.name()
            ));
        }
        for branch in Node::BRANCHES {
            lines.push(format!("    {} --> __end__([end])", branch.name()));
        }
        lines.join("\n")
    }

    async fn execute(&self, state: WorkflowState, sink: &EventSink) -> WorkflowState {
        let started = Instant::now();
        sink.run_started(&state);
        let initial = state.clone();

        let (mut state, timed_out) =
            match tokio::time::timeout(self.timeout, self.transitions(state, sink)).await {
                Ok(state) => (state, false),
                Err(_) => {
                    log::error!(
                        "workflow_timeout [cid={}] timeout_s={}",
                        initial.cid(),
                        self.timeout.as_secs_f64()
                    );
                    let mut state = initial;
                    state.fail("workflow_timeout");
                    state.response = WORKFLOW_TIMEOUT.to_string();
                    (state, true)
                }
            };

        if let Some(error) = &state.error {
            log::error!("workflow_error [cid={}] error={}", state.cid(), error);
        }
        let response = normalize_response(&state.response);
        state.finish(response);

        log::info!(
            "workflow_completed [cid={}] query_type={} took_ms={}",
            state.cid(),
            state.query_type,
            started.elapsed().as_millis()
        );
        sink.run_completed(&state, timed_out);
        state
    }

    async fn transitions(&self, state: WorkflowState, sink: &EventSink) -> WorkflowState {
        let state = self.step(Node::Classify, state, sink).await;
        let branch = Node::route(state.query_type);
        self.step(branch, state, sink).await
    }

    async fn step(&self, node: Node, state: WorkflowState, sink: &EventSink) -> WorkflowState {
        sink.node_started(node.name());
        let trace_from = state.decision_trace.events().len();

        let state = match node {
            Node::Classify => self.classify(state).await,
            Node::Agent(category) => self.dispatch(category, state).await,
            Node::Tool => self.run_tool(state).await,
        };

        sink.node_completed(node.name(), &state, trace_from);
        state
    }

    async fn classify(&self, mut state: WorkflowState) -> WorkflowState {
        let classification = self
            .classifier
            .classify(&state.user_query, state.cid())
            .await;

        let event = match classification.query_type {
            QueryType::Tool => TraceEvent::tool_detected(
                classification.tool_name.as_deref(),
                classification.tool_input.as_deref().unwrap_or_default(),
                classification.reason,
            ),
            other => TraceEvent::agent_selected(
                other.agent_name().unwrap_or("general_responder"),
                classification.reason,
            ),
        };
        state.decision_trace.record(event);

        state.query_type = classification.query_type;
        state.tool_name = classification.tool_name;
        state.tool_input = classification.tool_input;
        state
    }

    async fn dispatch(&self, category: AgentCategory, mut state: WorkflowState) -> WorkflowState {
        let Some(agent) = self.agents.get(category) else {
            log::error!(
                "agent_not_registered [cid={}] category={}",
                state.cid(),
                category
            );
            state.fail("agent_not_registered");
            state.response = AGENT_NOT_REGISTERED.to_string();
            return state;
        };

        let input = AgentInput {
            user_query: state.user_query.clone(),
            conversation_history: state.conversation_history.clone(),
            file_context: state.file_context.clone(),
            correlation_id: state.correlation_id.clone(),
        };

        match AssertUnwindSafe(agent.respond(self.llm.as_ref(), &input))
            .catch_unwind()
            .await
        {
            Ok(output) => match output.error {
                None => state.response = output.content,
                Some(error) => {
                    state.fail(error);
                    state.response = PROCESSING_ERROR.to_string();
                }
            },
            Err(_) => {
                log::error!(
                    "agent_error [cid={}] agent={} error=panicked",
                    state.cid(),
                    agent.name()
                );
                state.fail("agent_panicked");
                state.response = PROCESSING_ERROR.to_string();
            }
        }
        state
    }

    async fn run_tool(&self, mut state: WorkflowState) -> WorkflowState {
        let argument = state
            .tool_input
            .clone()
            .unwrap_or_else(|| state.user_query.clone());
        let result = self
            .tools
            .execute(state.tool_name.as_deref(), &argument, self.tool_timeout)
            .await;

        state.decision_trace.record(TraceEvent::tool_invoked(
            if result.tool.is_empty() { "unknown" } else { &result.tool },
            &result.input,
            result.took_ms,
            result.error.as_deref(),
        ));
        log::info!(
            "tool_executed [cid={}] tool={} took_ms={} error={}",
            state.cid(),
            result.tool,
            result.took_ms,
            result.error.as_deref().unwrap_or("-")
        );

        if result.is_hard_failure() {
            log::error!(
                "tool_failed [cid={}] tool={} error={}",
                state.cid(),
                result.tool,
                result.error.as_deref().unwrap_or_default()
            );
            state.fail(result.error.unwrap_or_default());
            state.response = PROCESSING_ERROR.to_string();
        } else if result.error.as_deref() == Some(UNKNOWN_TOOL) {
            state.response = format!("{}\n{}", TOOL_NOT_RECOGNIZED, result.output);
        } else {
            state.response = format!("{}\n{}", tool_result_header(&result.tool), result.output);
        }
        state
    }
}

/// Trim; substitute the fixed message when nothing is left
pub fn normalize_response(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_RESPONSE.to_string()
    } else {
        trimmed.to_string()
    }
}
