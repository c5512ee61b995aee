// SPDX-License-Identifier: MIT

//! Workflow graph execution
//!
//! This module provides the engine that runs the classify → branch graph,
//! and the sanitized progress events of its streaming entry point.

pub mod engine;
pub mod events;

pub use engine::{normalize_response, Node, WorkflowEngine, WorkflowOutcome};
pub use events::{sanitize, EventSink, StreamEvent};
