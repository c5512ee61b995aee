// SPDX-License-Identifier: MIT

//! State for one workflow run
//!
//! This module provides:
//! - `WorkflowState` - request-scoped state moved through each transition
//! - `DecisionTrace` - optional structured trace of routing decisions
//! - `DebugSummary` - header and trace copy derived after the run

mod store;
mod trace;

pub use store::{Message, MessageLog, QueryType, Role, WorkflowState};
pub use trace::{DebugSummary, DecisionTrace, TraceEvent, TraceEventType, TRACE_INPUT_LIMIT};
